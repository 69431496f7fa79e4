//! Seeded round content for every game family.
//!
//! Generation never fails from the session's point of view: a failed attempt
//! is retried with relaxed constraints, and after [`MAX_GENERATION_ATTEMPTS`]
//! a fixed template is used instead.
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

use crate::config::SessionSettings;
use crate::constants::{MAX_GENERATION_ATTEMPTS, MIN_GRID_SIDE, MIN_SEQUENCE_LENGTH};
use crate::data::GameContent;
use crate::graph::Graph;
use crate::puzzle::{CognitiveDomain, GameKind, PuzzleSpec};
use crate::rng::RngBundle;

mod direction;
mod faces;
mod fallback;
mod map;
mod options;
mod screening;
mod sequence;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("{family} constraints cannot be met: {reason}")]
    ConstraintUnsatisfiable { family: GameKind, reason: String },
    #[error("{family} needs {needed} candidates but only {available} are available")]
    CatalogTooSmall {
        family: GameKind,
        needed: usize,
        available: usize,
    },
    #[error("{0} has no content to draw from")]
    EmptyCatalog(GameKind),
}

/// Per-round inputs that change as the session progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRequest {
    /// Zero-based round index.
    pub index: u32,
    /// Sequence or walk length for adaptive families.
    pub length: u8,
}

/// Produces one [`PuzzleSpec`] per round from a seeded [`RngBundle`].
#[derive(Debug, Clone)]
pub struct ContentGenerator {
    kind: GameKind,
    rngs: RngBundle,
    content: Rc<GameContent>,
    settings: SessionSettings,
    map: Option<Rc<Graph>>,
    probed_faces: HashSet<String>,
    fallbacks: u32,
}

impl ContentGenerator {
    #[must_use]
    pub fn new(
        kind: GameKind,
        seed: u64,
        content: Rc<GameContent>,
        settings: SessionSettings,
    ) -> Self {
        let mut rngs = RngBundle::from_user_seed(seed);
        let map = match kind {
            GameKind::MapNavigation => Self::pick_map(&mut rngs, &content, &settings),
            _ => None,
        };
        Self {
            kind,
            rngs,
            content,
            settings,
            map,
            probed_faces: HashSet::new(),
            fallbacks: 0,
        }
    }

    fn pick_map(
        rngs: &mut RngBundle,
        content: &GameContent,
        settings: &SessionSettings,
    ) -> Option<Rc<Graph>> {
        if let Some(id) = settings.map_id.as_deref() {
            if let Some(graph) = content.map(id) {
                return Some(graph);
            }
            log::warn!("unknown map `{id}`; choosing one at random");
        }
        content.maps.choose(rngs.content()).cloned()
    }

    #[must_use]
    pub const fn kind(&self) -> GameKind {
        self.kind
    }

    /// Rounds in this session: the configured count for games, the whole
    /// bank for screening.
    #[must_use]
    pub fn planned_rounds(&self) -> u32 {
        if self.kind.is_screening() {
            u32::try_from(self.content.screening.len()).unwrap_or(u32::MAX)
        } else {
            self.settings.rounds
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Map used for every round of a navigation session.
    #[must_use]
    pub fn map(&self) -> Option<&Graph> {
        self.map.as_deref()
    }

    /// Rounds that ended up on a fixed template.
    #[must_use]
    pub const fn fallback_count(&self) -> u32 {
        self.fallbacks
    }

    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rngs.total_draws()
    }

    /// Content for one round. Never fails.
    pub fn generate(&mut self, request: RoundRequest) -> PuzzleSpec {
        for attempt in 0..MAX_GENERATION_ATTEMPTS {
            match self.try_generate(request, attempt) {
                Ok(spec) => return spec,
                Err(err) => {
                    log::debug!(
                        "{} round {} attempt {} failed: {err}",
                        self.kind,
                        request.index,
                        attempt + 1
                    );
                }
            }
        }
        log::warn!(
            "{} round {} fell back to a fixed template after {MAX_GENERATION_ATTEMPTS} attempts",
            self.kind,
            request.index
        );
        self.fallbacks = self.fallbacks.saturating_add(1);
        self.fallback(request)
    }

    /// One generation attempt. Later attempts relax the family's constraints.
    ///
    /// # Errors
    ///
    /// Returns why the attempt could not produce a valid round.
    pub fn try_generate(
        &mut self,
        request: RoundRequest,
        attempt: u8,
    ) -> Result<PuzzleSpec, GenerationError> {
        let relaxed = attempt > 0;
        match self.kind {
            GameKind::SequenceRecall => {
                let (grid, length) = self.grid_and_length(request, relaxed);
                sequence::generate(self.rngs.content(), grid, length).map(PuzzleSpec::Sequence)
            }
            GameKind::DirectionPath => {
                let (grid, length) = self.grid_and_length(request, relaxed);
                direction::generate(&mut self.rngs, grid, length, self.settings.direction_prompt)
                    .map(PuzzleSpec::Direction)
            }
            GameKind::MapNavigation => {
                let Some(graph) = self.map.clone() else {
                    return Err(GenerationError::EmptyCatalog(GameKind::MapNavigation));
                };
                let min_hops = self.settings.min_hops.saturating_sub(attempt).max(1);
                map::generate(&mut self.rngs, &graph, min_hops).map(PuzzleSpec::Map)
            }
            GameKind::FaceName => {
                let catalog = &self.content.faces;
                let mut count = self.settings.face_identities;
                if relaxed {
                    count = count.min(u8::try_from(catalog.len()).unwrap_or(u8::MAX));
                }
                faces::generate(&mut self.rngs, catalog, count, &mut self.probed_faces)
                    .map(PuzzleSpec::Face)
            }
            GameKind::Screening => {
                let index = usize::try_from(request.index).unwrap_or(usize::MAX);
                screening::resolve(
                    &mut self.rngs,
                    &self.content.screening,
                    index,
                    self.settings.today,
                )
                .map(PuzzleSpec::Screening)
            }
        }
    }

    fn grid_and_length(&self, request: RoundRequest, relaxed: bool) -> (u8, u8) {
        let grid = self.settings.grid_size;
        let length = request.length.min(self.settings.max_length);
        if relaxed {
            (grid.max(MIN_GRID_SIDE), length.max(MIN_SEQUENCE_LENGTH))
        } else {
            (grid, length)
        }
    }

    fn fallback(&self, request: RoundRequest) -> PuzzleSpec {
        match self.kind {
            GameKind::SequenceRecall => fallback::sequence(),
            GameKind::DirectionPath => fallback::direction(self.settings.direction_prompt),
            GameKind::MapNavigation => fallback::map(),
            GameKind::FaceName => fallback::face(),
            GameKind::Screening => {
                let slot = usize::try_from(request.index)
                    .ok()
                    .and_then(|index| self.content.screening.get(index));
                let (id, domain) = slot.map_or(("fallback", CognitiveDomain::Attention), |q| {
                    (q.id.as_str(), q.domain)
                });
                fallback::screening(id, domain)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DifficultyTable, GameConfig};
    use crate::data::{FaceCatalog, MapCatalog, ScreeningBank};
    use crate::difficulty::Difficulty;
    use chrono::NaiveDate;

    fn settings(difficulty: Difficulty) -> SessionSettings {
        GameConfig {
            today: NaiveDate::from_ymd_opt(2026, 3, 14),
            ..GameConfig::default()
        }
        .resolve(difficulty, DifficultyTable::bundled())
    }

    fn generator(kind: GameKind, seed: u64) -> ContentGenerator {
        let content = Rc::new(GameContent::bundled().unwrap());
        ContentGenerator::new(kind, seed, content, settings(Difficulty::Medium))
    }

    fn request(index: u32) -> RoundRequest {
        RoundRequest { index, length: 4 }
    }

    #[test]
    fn same_seed_same_rounds() {
        for kind in GameKind::ALL {
            let mut a = generator(kind, 1234);
            let mut b = generator(kind, 1234);
            for index in 0..5 {
                assert_eq!(a.generate(request(index)), b.generate(request(index)));
            }
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = generator(GameKind::SequenceRecall, 1);
        let mut b = generator(GameKind::SequenceRecall, 2);
        let rounds_a: Vec<_> = (0..5).map(|i| a.generate(request(i))).collect();
        let rounds_b: Vec<_> = (0..5).map(|i| b.generate(request(i))).collect();
        assert_ne!(rounds_a, rounds_b);
    }

    #[test]
    fn screening_plans_whole_bank() {
        assert_eq!(generator(GameKind::Screening, 9).planned_rounds(), 14);
        assert_eq!(generator(GameKind::FaceName, 9).planned_rounds(), 5);
    }

    #[test]
    fn configured_map_is_used() {
        let content = Rc::new(GameContent::bundled().unwrap());
        let mut settings = settings(Difficulty::Easy);
        settings.map_id = Some("house".to_string());
        let generator = ContentGenerator::new(GameKind::MapNavigation, 5, content, settings);
        assert_eq!(generator.map().map(Graph::id), Some("house"));
    }

    #[test]
    fn impossible_hops_relax_before_falling_back() {
        let content = Rc::new(GameContent::bundled().unwrap());
        let mut settings = settings(Difficulty::Hard);
        settings.map_id = Some("town".to_string());
        settings.min_hops = 6;
        let mut generator = ContentGenerator::new(GameKind::MapNavigation, 5, content, settings);
        assert!(generator.try_generate(request(0), 0).is_err());
        let spec = generator.generate(request(0));
        assert!(matches!(spec, PuzzleSpec::Map(_)));
    }

    #[test]
    fn tiny_face_catalog_falls_back_to_template() {
        let faces = r#"{"identities":[{"id":"a","name":"A"},{"id":"b","name":"B"}]}"#;
        let maps: MapCatalog =
            serde_json::from_str(include_str!("../../assets/data/maps.json")).unwrap();
        let bank: ScreeningBank =
            serde_json::from_str(include_str!("../../assets/data/screening.json")).unwrap();
        let faces: FaceCatalog = serde_json::from_str(faces).unwrap();
        let content = Rc::new(GameContent::new(maps, faces, bank).unwrap());
        let mut generator =
            ContentGenerator::new(GameKind::FaceName, 3, content, settings(Difficulty::Easy));
        let spec = generator.generate(request(0));
        let PuzzleSpec::Face(face) = spec else {
            panic!("expected face round");
        };
        assert_eq!(face.answer, "Ada");
        assert_eq!(generator.fallback_count(), 1);
    }

    #[test]
    fn screening_slot_beyond_bank_keeps_running() {
        let mut screening = generator(GameKind::Screening, 3);
        let spec = screening.generate(request(40));
        let PuzzleSpec::Screening(question) = spec else {
            panic!("expected screening round");
        };
        assert_eq!(question.id, "fallback");
        assert_eq!(screening.fallback_count(), 1);
    }
}
