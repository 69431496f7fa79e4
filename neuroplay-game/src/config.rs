//! Difficulty profiles and host-supplied tuning.
//!
//! Every host override is optional; absent values fall back to the bundled
//! profile for the chosen difficulty.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::{
    DEFAULT_FEEDBACK_MS, MAX_GRID_SIDE, MIN_GRID_SIDE, MIN_SEQUENCE_LENGTH,
};
use crate::difficulty::Difficulty;
use crate::puzzle::{DirectionPrompt, PuzzleSpec, QuestionPayload, ScreeningQuestionSpec};

const DEFAULT_DIFFICULTY_DATA: &str = include_str!("../assets/data/difficulty.json");

/// Documented defaults for one difficulty level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub rounds: u32,
    /// Side of the square grid used by grid and direction games.
    pub grid_size: u8,
    pub starting_length: u8,
    pub max_length: u8,
    /// Minimum shortest-path hop count between map question endpoints.
    pub min_hops: u8,
    pub face_identities: u8,
    /// Presentation time per sequence cell, walk step or recall word.
    pub item_ms: u64,
    pub map_study_ms: u64,
    /// Presentation time per face.
    pub face_study_ms: u64,
    #[serde(default = "default_feedback_ms")]
    pub feedback_ms: u64,
    #[serde(default)]
    pub response_limit_ms: Option<u64>,
}

const fn default_feedback_ms() -> u64 {
    DEFAULT_FEEDBACK_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyTable {
    pub easy: DifficultyProfile,
    pub medium: DifficultyProfile,
    pub hard: DifficultyProfile,
}

impl DifficultyTable {
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_DIFFICULTY_DATA).unwrap_or_else(|err| {
            log::warn!("bundled difficulty table unreadable ({err}); using coded defaults");
            Self::coded_defaults()
        })
    }

    /// Shared bundled table.
    #[must_use]
    pub fn bundled() -> &'static Self {
        static TABLE: OnceLock<DifficultyTable> = OnceLock::new();
        TABLE.get_or_init(Self::load_from_static)
    }

    #[must_use]
    pub const fn profile(&self, difficulty: Difficulty) -> &DifficultyProfile {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    fn coded_defaults() -> Self {
        Self {
            easy: DifficultyProfile {
                rounds: 4,
                grid_size: 3,
                starting_length: 3,
                max_length: 5,
                min_hops: 1,
                face_identities: 3,
                item_ms: 1_000,
                map_study_ms: 6_000,
                face_study_ms: 2_500,
                feedback_ms: DEFAULT_FEEDBACK_MS,
                response_limit_ms: None,
            },
            medium: DifficultyProfile {
                rounds: 5,
                grid_size: 4,
                starting_length: 4,
                max_length: 7,
                min_hops: 2,
                face_identities: 4,
                item_ms: 800,
                map_study_ms: 4_500,
                face_study_ms: 2_000,
                feedback_ms: DEFAULT_FEEDBACK_MS,
                response_limit_ms: None,
            },
            hard: DifficultyProfile {
                rounds: 6,
                grid_size: 5,
                starting_length: 5,
                max_length: 9,
                min_hops: 3,
                face_identities: 6,
                item_ms: 600,
                map_study_ms: 3_000,
                face_study_ms: 1_500,
                feedback_ms: DEFAULT_FEEDBACK_MS,
                response_limit_ms: Some(30_000),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("rounds must be at least 1")]
    ZeroRounds,
    #[error("grid_size must be between {min} and {max} (got {value})")]
    GridSize { value: u8, min: u8, max: u8 },
    #[error("starting_length must be at least {min} (got {value})")]
    StartingLength { value: u8, min: u8 },
    #[error("starting_length {starting} exceeds max_length {max}")]
    LengthRange { starting: u8, max: u8 },
    #[error("min_hops must be at least 1")]
    ZeroHops,
    #[error("face_identities must be at least 2 (got {value})")]
    FaceIdentities { value: u8 },
}

/// Optional per-session overrides supplied by the host before `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GameConfig {
    pub rounds: Option<u32>,
    pub grid_size: Option<u8>,
    pub starting_length: Option<u8>,
    pub max_length: Option<u8>,
    /// Fixed presentation time replacing the per-item computation.
    pub presentation_ms: Option<u64>,
    pub feedback_ms: Option<u64>,
    pub response_limit_ms: Option<u64>,
    pub direction_prompt: Option<DirectionPrompt>,
    pub map_id: Option<String>,
    pub min_hops: Option<u8>,
    pub face_identities: Option<u8>,
    /// Date used for orientation answers; defaults to the local date.
    pub today: Option<NaiveDate>,
}

impl GameConfig {
    /// Parse overrides from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the override shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check overrides against the profile they will be merged with.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self, profile: &DifficultyProfile) -> Result<(), ConfigError> {
        if self.rounds == Some(0) {
            return Err(ConfigError::ZeroRounds);
        }
        if let Some(value) = self.grid_size
            && !(MIN_GRID_SIDE..=MAX_GRID_SIDE).contains(&value)
        {
            return Err(ConfigError::GridSize {
                value,
                min: MIN_GRID_SIDE,
                max: MAX_GRID_SIDE,
            });
        }
        let starting = self.starting_length.unwrap_or(profile.starting_length);
        if starting < MIN_SEQUENCE_LENGTH {
            return Err(ConfigError::StartingLength {
                value: starting,
                min: MIN_SEQUENCE_LENGTH,
            });
        }
        let max = self.max_length.unwrap_or(profile.max_length);
        if starting > max {
            return Err(ConfigError::LengthRange { starting, max });
        }
        if self.min_hops == Some(0) {
            return Err(ConfigError::ZeroHops);
        }
        if let Some(value) = self.face_identities
            && value < 2
        {
            return Err(ConfigError::FaceIdentities { value });
        }
        Ok(())
    }

    /// Merge overrides into a profile, clamping anything out of range.
    #[must_use]
    pub fn resolve(&self, difficulty: Difficulty, table: &DifficultyTable) -> SessionSettings {
        let profile = table.profile(difficulty);
        if let Err(err) = self.validate(profile) {
            log::warn!("clamping invalid {difficulty} overrides: {err}");
        }
        let rounds = self.rounds.unwrap_or(profile.rounds).max(1);
        let grid_size = self
            .grid_size
            .unwrap_or(profile.grid_size)
            .clamp(MIN_GRID_SIDE, MAX_GRID_SIDE);
        let starting_length = self
            .starting_length
            .unwrap_or(profile.starting_length)
            .max(MIN_SEQUENCE_LENGTH);
        let max_length = self
            .max_length
            .unwrap_or(profile.max_length)
            .max(starting_length);
        SessionSettings {
            difficulty,
            rounds,
            grid_size,
            starting_length,
            max_length,
            min_hops: self.min_hops.unwrap_or(profile.min_hops).max(1),
            face_identities: self
                .face_identities
                .unwrap_or(profile.face_identities)
                .max(2),
            item_ms: profile.item_ms,
            map_study_ms: profile.map_study_ms,
            face_study_ms: profile.face_study_ms,
            presentation_override_ms: self.presentation_ms,
            feedback_ms: self.feedback_ms.unwrap_or(profile.feedback_ms),
            response_limit_ms: self.response_limit_ms.or(profile.response_limit_ms),
            direction_prompt: self.direction_prompt.unwrap_or_default(),
            map_id: self.map_id.clone(),
            today: self
                .today
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
        }
    }
}

/// Fully resolved settings for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub difficulty: Difficulty,
    pub rounds: u32,
    pub grid_size: u8,
    pub starting_length: u8,
    pub max_length: u8,
    pub min_hops: u8,
    pub face_identities: u8,
    pub item_ms: u64,
    pub map_study_ms: u64,
    pub face_study_ms: u64,
    pub presentation_override_ms: Option<u64>,
    pub feedback_ms: u64,
    pub response_limit_ms: Option<u64>,
    pub direction_prompt: DirectionPrompt,
    pub map_id: Option<String>,
    pub today: NaiveDate,
}

impl SessionSettings {
    /// How long the stimulus of `spec` stays on screen.
    ///
    /// Zero means the round goes straight to answering.
    #[must_use]
    pub fn presentation_ms(&self, spec: &PuzzleSpec) -> u64 {
        let items = u64::try_from(spec.stimulus_items()).unwrap_or(u64::MAX);
        let computed = match spec {
            PuzzleSpec::Sequence(_) | PuzzleSpec::Direction(_) => self.item_ms.saturating_mul(items),
            PuzzleSpec::Map(_) => self.map_study_ms,
            PuzzleSpec::Face(_) => self.face_study_ms.saturating_mul(items),
            PuzzleSpec::Screening(ScreeningQuestionSpec {
                payload: QuestionPayload::MemoryRecall { .. },
                ..
            }) => self.item_ms.saturating_mul(items),
            PuzzleSpec::Screening(_) => return 0,
        };
        self.presentation_override_ms.unwrap_or(computed)
    }
}
