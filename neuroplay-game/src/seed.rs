//! Reversible replay codes.
//! Code format: <GAME>-<WORD><NN>, e.g. SQ-MAPLE42, MP-HARBOR07

use crate::puzzle::GameKind;

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Words used in replay codes. Appending is safe; reordering breaks old codes.
pub const WORD_LIST: [&str; 64] = [
    "MAPLE", "RIVER", "CEDAR", "LANTERN", "HARBOR", "MEADOW", "PEBBLE", "COMET", "ORCHID", "TULIP",
    "BRIDGE", "CANYON", "WILLOW", "AMBER", "COBALT", "FALCON", "GARNET", "HAZEL", "IVORY",
    "JASMINE", "KESTREL", "LINDEN", "MARBLE", "NECTAR", "OLIVE", "PLUME", "QUARTZ", "RAVEN",
    "SAFFRON", "TIMBER", "UMBER", "VIOLET", "WALNUT", "YARROW", "ZEPHYR", "ACORN", "BIRCH",
    "CLOVER", "DAHLIA", "EMBER", "FERN", "GLACIER", "HERON", "ISLAND", "JUNIPER", "KITE", "LOTUS",
    "MOSS", "NORTH", "OTTER", "POPPY", "QUILL", "ROBIN", "SPRUCE", "THISTLE", "VALLEY", "WREN",
    "ASPEN", "BEACON", "CORAL", "DUNE", "FJORD", "GROVE", "HOLLOW",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x01FF | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    let nn = u8::try_from((packed >> 9) & 0x7F).unwrap_or_default();
    (packed & 0x01FF, nn)
}

fn compose_seed(kind: GameKind, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let prefix = kind.code_prefix().as_bytes();
    // Domain-separated FNV input
    let mut buf = [0u8; 11];
    buf[..6].copy_from_slice(b"NPLAY-");
    buf[6] = prefix.first().copied().unwrap_or(b'?');
    buf[7] = prefix.get(1).copied().unwrap_or(b'?');
    buf[8..10].copy_from_slice(&packed.to_le_bytes());
    buf[10] = 0xA5;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render the replay code for a session seed.
#[must_use]
pub fn encode_replay_code(kind: GameKind, seed: u64) -> String {
    let packed = u16::try_from(seed & 0xFFFF).unwrap_or_default();
    let (wi, nn) = unpack(packed);
    let word = WORD_LIST
        .get(usize::from(wi))
        .copied()
        .unwrap_or(WORD_LIST[0]);
    format!("{}-{word}{:02}", kind.code_prefix(), nn % 100)
}

/// Parse a replay code back into its game and seed.
#[must_use]
pub fn decode_replay_code(code: &str) -> Option<(GameKind, u64)> {
    let s = code.trim();
    let (prefix, rest) = s.split_once('-')?;
    let kind = GameKind::from_code_prefix(prefix)?;
    if rest.len() < 3 || !rest.is_char_boundary(rest.len() - 2) {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some((kind, compose_seed(kind, wi, nn)))
}

/// The seed a session for `kind` actually runs on: the one its replay code
/// decodes to. Seeds sharing their low 16 bits share a code and a session.
#[must_use]
pub fn canonical_seed(kind: GameKind, seed: u64) -> u64 {
    decode_replay_code(&encode_replay_code(kind, seed)).map_or(seed, |(_, canonical)| canonical)
}

/// Fresh replay code for `kind` from arbitrary entropy.
#[must_use]
pub fn generate_code_from_entropy(kind: GameKind, entropy: u64) -> String {
    let word_count = u64::try_from(WORD_LIST.len()).unwrap_or(1);
    let wi = u16::try_from(entropy % word_count).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode_replay_code(kind, compose_seed(kind, wi, nn))
}

/// Seed for a fresh code; the same as decoding the generated code.
#[must_use]
pub fn seed_from_entropy(kind: GameKind, entropy: u64) -> u64 {
    let code = generate_code_from_entropy(kind, entropy);
    decode_replay_code(&code).map_or(entropy, |(_, seed)| seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrips_code() {
        let seed = 0xDEAD_BEEF_CAFE_BABE;
        let code = encode_replay_code(GameKind::MapNavigation, seed);
        let (kind, new_seed) = decode_replay_code(&code).unwrap();
        assert_eq!(kind, GameKind::MapNavigation);
        assert_eq!(encode_replay_code(kind, new_seed), code);
    }

    #[test]
    fn sq_maple_42_stable() {
        let (kind, seed) = decode_replay_code("SQ-MAPLE42").unwrap();
        assert_eq!(kind, GameKind::SequenceRecall);
        assert_eq!(encode_replay_code(kind, seed), "SQ-MAPLE42");
        assert_eq!(decode_replay_code(" sq-maple42 "), Some((kind, seed)));
    }

    #[test]
    fn game_prefix_separates_seeds() {
        let (_, sequence) = decode_replay_code("SQ-RIVER10").unwrap();
        let (_, faces) = decode_replay_code("FN-RIVER10").unwrap();
        assert_ne!(sequence, faces);
        assert_eq!(sequence & 0xFFFF, faces & 0xFFFF);
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(decode_replay_code("XX-MAPLE42").is_none());
        assert!(decode_replay_code("SQ-NOTAWORD42").is_none());
        assert!(decode_replay_code("SQ-MAPLE").is_none());
        assert!(decode_replay_code("SQMAPLE42").is_none());
    }

    #[test]
    fn canonical_seeds_round_trip_through_their_code() {
        for seed in [0, 42, 0x1_0000_002A, 0xDEAD_BEEF_CAFE_BABE, u64::MAX] {
            let canonical = canonical_seed(GameKind::SequenceRecall, seed);
            let code = encode_replay_code(GameKind::SequenceRecall, seed);
            assert_eq!(encode_replay_code(GameKind::SequenceRecall, canonical), code);
            assert_eq!(
                decode_replay_code(&code),
                Some((GameKind::SequenceRecall, canonical))
            );
            assert_eq!(canonical_seed(GameKind::SequenceRecall, canonical), canonical);
        }
        assert_eq!(
            canonical_seed(GameKind::FaceName, 42),
            canonical_seed(GameKind::FaceName, 0x1_0000_002A)
        );
    }

    #[test]
    fn entropy_codes_decode_to_the_same_seed() {
        for entropy in [0, 7, 0xFFFF_FFFF, u64::MAX] {
            let code = generate_code_from_entropy(GameKind::Screening, entropy);
            assert!(code.starts_with("SC-"));
            let seed = seed_from_entropy(GameKind::Screening, entropy);
            assert_eq!(decode_replay_code(&code), Some((GameKind::Screening, seed)));
        }
    }
}
