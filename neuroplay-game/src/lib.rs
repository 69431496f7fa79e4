//! Neuroplay Game Engine
//!
//! Platform-agnostic runtime for a battery of short cognitive games and a
//! structured screening questionnaire: seeded content generation, answer
//! evaluation, scoring and the per-round session state machine. Rendering,
//! input and persistence belong to the host.

pub mod clock;
pub mod config;
pub mod constants;
pub mod data;
pub mod difficulty;
pub mod evaluator;
pub mod generator;
pub mod graph;
pub mod numbers;
pub mod pathfinder;
pub mod puzzle;
pub mod report;
pub mod rng;
pub mod scoring;
pub mod seed;
pub mod session;
pub mod timers;

use std::rc::Rc;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, DifficultyProfile, DifficultyTable, GameConfig, SessionSettings};
pub use data::{DataError, FaceCatalog, GameContent, MapCatalog, ScreeningBank};
pub use difficulty::Difficulty;
pub use evaluator::{Evaluation, evaluate, evaluate_question, normalize};
pub use generator::{ContentGenerator, GenerationError, RoundRequest};
pub use graph::{Graph, GraphDef, GraphError, NodeId};
pub use pathfinder::{find_path, find_path_by_name, first_hops, is_shortest_route};
pub use puzzle::{
    Answer, Cell, CognitiveDomain, Direction, DirectionPrompt, DirectionQuestion, DirectionSpec,
    FaceIdentity, FaceSpec, GameKind, MapSpec, PuzzleSpec, QuestionPayload, QuestionType,
    ScreeningQuestionSpec, SequenceSpec,
};
pub use report::{
    GameResult, RecordingReporter, ResultMetadata, ResultReporter, RoundSummary,
    ScreeningSummary,
};
pub use scoring::{DomainScores, ScoreAggregator, ScorePoint, Severity, Trend, classify_trend};
pub use seed::{
    canonical_seed, decode_replay_code, encode_replay_code, generate_code_from_entropy,
    seed_from_entropy,
};
pub use session::{Phase, RoundRecord, SessionMachine, SubmitOutcome};

/// Source of generator content and difficulty profiles.
/// Hosts implement this to ship localized or custom catalogs.
pub trait DataLoader {
    type Error: std::error::Error + 'static;

    /// Load maps, faces and the screening bank.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be loaded or fails validation.
    fn load_content(&self) -> Result<GameContent, Self::Error>;

    /// Load the difficulty table. Defaults to the bundled one.
    ///
    /// # Errors
    ///
    /// Returns an error if a custom table cannot be loaded.
    fn load_difficulty_table(&self) -> Result<DifficultyTable, Self::Error> {
        Ok(DifficultyTable::bundled().clone())
    }
}

/// Loader for the catalogs compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledContent;

impl DataLoader for BundledContent {
    type Error = DataError;

    fn load_content(&self) -> Result<GameContent, Self::Error> {
        GameContent::bundled()
    }
}

/// Creates session machines backed by a [`DataLoader`].
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Build an idle session for `kind`; call `start` on it to begin.
    ///
    /// # Errors
    ///
    /// Returns an error if content or the difficulty table cannot be loaded.
    pub fn create_session<C, R>(
        &self,
        kind: GameKind,
        seed: u64,
        clock: C,
        reporter: R,
    ) -> Result<SessionMachine<C, R>, L::Error>
    where
        C: Clock,
        R: ResultReporter,
    {
        let content = Rc::new(self.data_loader.load_content()?);
        let table = self.data_loader.load_difficulty_table()?;
        Ok(SessionMachine::new(kind, seed, content, table, clock, reporter))
    }

    /// Build a session that replays the content behind `code`.
    /// `Ok(None)` when the code is not a valid replay code.
    ///
    /// # Errors
    ///
    /// Returns an error if content or the difficulty table cannot be loaded.
    pub fn replay_session<C, R>(
        &self,
        code: &str,
        clock: C,
        reporter: R,
    ) -> Result<Option<SessionMachine<C, R>>, L::Error>
    where
        C: Clock,
        R: ResultReporter,
    {
        let Some((kind, seed)) = decode_replay_code(code) else {
            log::debug!("rejecting replay code `{code}`");
            return Ok(None);
        };
        self.create_session(kind, seed, clock, reporter).map(Some)
    }
}

impl Default for GameEngine<BundledContent> {
    fn default() -> Self {
        Self::new(BundledContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_content(&self) -> Result<GameContent, Self::Error> {
            let maps = MapCatalog {
                maps: vec![Graph::chain(
                    "lane",
                    &["Mill", "Bridge", "Well", "Inn", "Forge", "Chapel"],
                )],
            };
            let faces = FaceCatalog {
                identities: ["Ada", "Ben", "Cem", "Dora", "Eli"]
                    .into_iter()
                    .map(|name| FaceIdentity {
                        id: name.to_lowercase(),
                        name: name.to_string(),
                        portrait: format!("faces/{}.png", name.to_lowercase()),
                    })
                    .collect(),
            };
            let screening = GameContent::bundled().unwrap().screening;
            Ok(GameContent::new(
                maps,
                faces,
                ScreeningBank {
                    questions: screening,
                },
            )
            .unwrap())
        }
    }

    #[test]
    fn engine_builds_idle_sessions_from_loader() {
        let engine = GameEngine::new(FixtureLoader);
        let mut machine = engine
            .create_session(
                GameKind::MapNavigation,
                9,
                ManualClock::new(),
                RecordingReporter::new(),
            )
            .unwrap();
        assert_eq!(machine.phase(), Phase::Ready);
        machine.start(Difficulty::Easy, &GameConfig::default());
        assert_eq!(machine.phase(), Phase::Presenting);
        let Some(PuzzleSpec::Map(spec)) = machine.current_spec() else {
            panic!("expected a map round");
        };
        assert_eq!(spec.graph.id(), "lane");
    }

    #[test]
    fn replay_codes_restore_kind_and_seed() {
        let engine = GameEngine::default();
        let code = encode_replay_code(GameKind::FaceName, 1234);
        let machine = engine
            .replay_session(&code, ManualClock::new(), RecordingReporter::new())
            .unwrap()
            .expect("valid code");
        assert_eq!(machine.kind(), GameKind::FaceName);
        assert_eq!(machine.replay_code(), code);
        assert!(
            engine
                .replay_session("nonsense", ManualClock::new(), RecordingReporter::new())
                .unwrap()
                .is_none()
        );
    }
}
