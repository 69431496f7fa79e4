use serde::{Deserialize, Serialize};
use std::fmt;

/// Session lifecycle.
///
/// `Ready -> Presenting -> Responding -> RoundFeedback -> (Presenting | Complete)`.
/// `Complete` is terminal; entering it again is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Ready,
    /// Stimulus on screen; ends only when its timer expires.
    Presenting,
    /// Waiting for the round's single submission.
    Responding,
    /// Fixed pause showing correct/incorrect.
    RoundFeedback,
    Complete,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Presenting => "presenting",
            Self::Responding => "responding",
            Self::RoundFeedback => "round_feedback",
            Self::Complete => "complete",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Ready, Self::Presenting)
                | (Self::Presenting, Self::Responding)
                | (Self::Responding, Self::RoundFeedback)
                | (Self::RoundFeedback, Self::Presenting | Self::Complete)
                | (Self::Complete, Self::Complete)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
