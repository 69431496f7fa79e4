//! Centralized scoring and timing constants for the Neuroplay engine.
//!
//! Clinical bands and point values are policy, not derived data. They live
//! here so a change shows up in review as a code change rather than an
//! edited asset.

// Logging ------------------------------------------------------------------
pub(crate) const DEBUG_ENV_VAR: &str = "NEUROPLAY_DEBUG_LOGS";

// Scoring ------------------------------------------------------------------
/// Points awarded for each correctly answered game round.
pub const POINTS_PER_CORRECT_ROUND: u32 = 10;
/// Upper bound of an evaluator score.
pub const MAX_EVALUATION_SCORE: u8 = 100;
/// Maximum score of a screening session (the overall domain mean).
pub const SCREENING_MAX_SCORE: u32 = 100;

// Severity bands (overall screening score) ---------------------------------
pub const BAND_NORMAL_MIN: u8 = 80;
pub const BAND_MILD_MIN: u8 = 60;
pub const BAND_MODERATE_MIN: u8 = 40;

// Longitudinal trend -------------------------------------------------------
/// Mean difference (points) between consecutive weeks that counts as a change.
pub const TREND_THRESHOLD: f64 = 5.0;
pub const TREND_WINDOW_DAYS: u64 = 7;

// Content generation -------------------------------------------------------
/// Attempts made with progressively relaxed constraints before the fixed
/// fallback template is used.
pub const MAX_GENERATION_ATTEMPTS: u8 = 3;
/// Wrong options shown next to the correct one in multiple-choice rounds.
pub const DISTRACTOR_COUNT: usize = 3;
/// Smallest grid side that leaves a walking token somewhere to go.
pub const MIN_GRID_SIDE: u8 = 2;
pub const MAX_GRID_SIDE: u8 = 12;
pub const MIN_SEQUENCE_LENGTH: u8 = 1;

// Timing -------------------------------------------------------------------
pub const DEFAULT_FEEDBACK_MS: u64 = 1_500;
