use anyhow::{Context, Result, bail};
use neuroplay_game::seed::WORD_LIST;
use neuroplay_game::{GameKind, decode_replay_code, encode_replay_code};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

const DEFAULT_SEED: u64 = 1337;

fn replay_code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^(SQ|DR|MP|FN|SC)-[A-Z]+\d{2}$").ok())
        .as_ref()
}

/// Whether `token` has the shape of a replay code. The word may still be
/// unknown.
#[must_use]
pub fn looks_like_replay_code(token: &str) -> bool {
    replay_code_pattern().is_some_and(|pattern| pattern.is_match(token.trim()))
}

/// Seed metadata used for simulation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
    pub source_game: Option<GameKind>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            code: None,
            source_game: None,
        }
    }

    #[must_use]
    pub fn from_replay_code(seed: u64, game: GameKind, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
            source_game: Some(game),
        }
    }

    /// Replay codes only apply to the game they were issued for.
    #[must_use]
    pub fn matches_game(&self, game: GameKind) -> bool {
        self.source_game.is_none_or(|source| source == game)
    }

    #[must_use]
    pub fn replay_code_for(&self, game: GameKind) -> String {
        if let (Some(code), Some(source)) = (&self.code, self.source_game)
            && source == game
        {
            return code.clone();
        }
        encode_replay_code(game, self.seed)
    }
}

/// Resolve CLI seed arguments into canonical seed metadata.
///
/// Accepts integers, replay codes, and `all`, which expands to every replay
/// code of every game.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") {
            request_all = true;
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if looks_like_replay_code(token) {
            let (game, seed) = decode_checked(token)?;
            pending.push(SeedInfo::from_replay_code(
                seed,
                game,
                token.trim().to_uppercase(),
            ));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(generate_all_replay_seeds()?);
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<(u64, Option<GameKind>), usize> = HashMap::new();

    for info in pending {
        let key = (info.seed, info.source_game);
        match index.get(&key).and_then(|at| deduped.get_mut(*at)) {
            Some(entry) => {
                if entry.code.is_none() && info.code.is_some() {
                    *entry = info;
                }
            }
            None => {
                index.insert(key, deduped.len());
                deduped.push(info);
            }
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }

    Ok(deduped)
}

fn generate_all_replay_seeds() -> Result<Vec<SeedInfo>> {
    let mut seeds = Vec::with_capacity(WORD_LIST.len() * 100 * GameKind::ALL.len());
    for game in GameKind::ALL {
        for word in WORD_LIST {
            for suffix in 0..100 {
                let code = format!("{}-{word}{suffix:02}", game.code_prefix());
                let (game, seed) = decode_checked(&code)?;
                seeds.push(SeedInfo::from_replay_code(seed, game, code));
            }
        }
    }
    Ok(seeds)
}

fn decode_checked(code: &str) -> Result<(GameKind, u64)> {
    decode_replay_code(code).with_context(|| format!("failed to parse replay code: {code}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_numeric_and_replay_codes() {
        let raw = vec!["42".to_string(), "-7".to_string(), "mp-comet19".to_string()];
        let seeds = resolve_seed_inputs(&raw).unwrap();
        assert!(seeds.iter().any(|s| s.seed == 42 && s.code.is_none()));
        assert!(seeds.iter().any(|s| s.seed == 7 && s.code.is_none()));
        let coded = seeds.iter().find(|s| s.code.is_some()).unwrap();
        assert_eq!(coded.code.as_deref(), Some("MP-COMET19"));
        assert_eq!(coded.source_game, Some(GameKind::MapNavigation));
        assert_eq!(coded.replay_code_for(GameKind::MapNavigation), "MP-COMET19");
        assert!(!coded.matches_game(GameKind::FaceName));
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(resolve_seed_inputs(&["banana".to_string()]).is_err());
        assert!(resolve_seed_inputs(&["SQ-NOTAWORD12".to_string()]).is_err());
    }

    #[test]
    fn empty_input_falls_back_to_default_seed() {
        let seeds = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(seeds, vec![SeedInfo::from_numeric(DEFAULT_SEED)]);
    }

    #[test]
    fn duplicate_seeds_collapse() {
        let raw = vec!["5".to_string(), "5".to_string(), "-5".to_string()];
        assert_eq!(resolve_seed_inputs(&raw).unwrap().len(), 1);
    }

    #[test]
    fn expands_all_replay_codes() {
        let seeds = resolve_seed_inputs(&["all".to_string()]).unwrap();
        assert_eq!(seeds.len(), WORD_LIST.len() * 100 * GameKind::ALL.len());
        assert!(seeds.iter().all(|s| s.code.is_some()));
    }

    #[test]
    fn numeric_seeds_encode_for_any_game() {
        let info = SeedInfo::from_numeric(99);
        assert!(info.matches_game(GameKind::Screening));
        assert!(looks_like_replay_code(
            &info.replay_code_for(GameKind::Screening)
        ));
    }
}
