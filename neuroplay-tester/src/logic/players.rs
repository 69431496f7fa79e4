use std::fmt;

use clap::ValueEnum;
use neuroplay_game::{Answer, Direction, DirectionQuestion, PuzzleSpec, QuestionPayload};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Chance that a sloppy player gets a round wrong.
const SLOPPY_ERROR_RATE: f64 = 0.3;

/// Policy interface for automated players.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Answer for the round on screen, or `None` to let the response window
    /// run out.
    fn answer(&mut self, spec: &PuzzleSpec) -> Option<Answer>;

    /// Whether multi-step answers are entered one tap at a time.
    fn taps(&self) -> bool {
        false
    }
}

/// Built-in player strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum PlayerStrategy {
    /// Canonical answers, submitted whole
    Perfect,
    /// Canonical answers, one cell or move per tap
    Tapping,
    /// Mostly right, with occasional random guesses
    Sloppy,
    /// Well-formed random guesses
    Random,
    /// Never answers; needs a response limit
    Idle,
}

impl PlayerStrategy {
    /// Whether every answer is the canonical one.
    #[must_use]
    pub const fn always_correct(self) -> bool {
        matches!(self, Self::Perfect | Self::Tapping)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Tapping => "Tapping",
            Self::Sloppy => "Sloppy",
            Self::Random => "Random",
            Self::Idle => "Idle",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy> {
        match self {
            Self::Perfect => Box::new(PerfectPlayer),
            Self::Tapping => Box::new(TappingPlayer),
            Self::Sloppy => Box::new(SloppyPlayer::new(seed)),
            Self::Random => Box::new(RandomPlayer::new(seed)),
            Self::Idle => Box::new(IdlePlayer),
        }
    }
}

impl fmt::Display for PlayerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Always submits the canonical answer in one go.
pub struct PerfectPlayer;

impl PlayerPolicy for PerfectPlayer {
    fn name(&self) -> &'static str {
        "perfect"
    }

    fn answer(&mut self, spec: &PuzzleSpec) -> Option<Answer> {
        Some(spec.expected_answer())
    }
}

/// Correct answers, entered one cell or move at a time where possible.
pub struct TappingPlayer;

impl PlayerPolicy for TappingPlayer {
    fn name(&self) -> &'static str {
        "tapping"
    }

    fn answer(&mut self, spec: &PuzzleSpec) -> Option<Answer> {
        Some(spec.expected_answer())
    }

    fn taps(&self) -> bool {
        true
    }
}

/// Mostly right, sometimes a random guess.
pub struct SloppyPlayer {
    rng: ChaCha20Rng,
}

impl SloppyPlayer {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed ^ 0x5107_9ABE),
        }
    }
}

impl PlayerPolicy for SloppyPlayer {
    fn name(&self) -> &'static str {
        "sloppy"
    }

    fn answer(&mut self, spec: &PuzzleSpec) -> Option<Answer> {
        if self.rng.gen_bool(SLOPPY_ERROR_RATE) {
            Some(random_answer(spec, &mut self.rng))
        } else {
            Some(spec.expected_answer())
        }
    }
}

pub struct RandomPlayer {
    rng: ChaCha20Rng,
}

impl RandomPlayer {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for RandomPlayer {
    fn name(&self) -> &'static str {
        "random"
    }

    fn answer(&mut self, spec: &PuzzleSpec) -> Option<Answer> {
        Some(random_answer(spec, &mut self.rng))
    }
}

/// Never answers.
pub struct IdlePlayer;

impl PlayerPolicy for IdlePlayer {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn answer(&mut self, _spec: &PuzzleSpec) -> Option<Answer> {
        None
    }
}

fn pick<R: Rng>(options: &[String], rng: &mut R) -> String {
    options.choose(rng).cloned().unwrap_or_default()
}

/// A well-formed but uninformed guess.
pub fn random_answer<R: Rng>(spec: &PuzzleSpec, rng: &mut R) -> Answer {
    match spec {
        PuzzleSpec::Sequence(sequence) => {
            let cells = usize::from(sequence.grid_size).pow(2).max(1);
            Answer::Cells(
                (0..sequence.cells.len())
                    .map(|_| rng.gen_range(0..cells))
                    .collect(),
            )
        }
        PuzzleSpec::Direction(direction) => match &direction.question {
            DirectionQuestion::Replay => Answer::Steps(
                (0..direction.steps.len())
                    .map(|_| Direction::ALL.choose(rng).copied().unwrap_or(Direction::Up))
                    .collect(),
            ),
            DirectionQuestion::StepRecall { options, .. } => Answer::Choice(
                options
                    .choose(rng)
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ),
        },
        PuzzleSpec::Map(map) => Answer::Choice(pick(&map.options, rng)),
        PuzzleSpec::Face(face) => Answer::Choice(pick(&face.options, rng)),
        PuzzleSpec::Screening(question) => match &question.payload {
            QuestionPayload::Choice { options, .. } => Answer::Choice(pick(options, rng)),
            QuestionPayload::Text { accepted } | QuestionPayload::Similarity { accepted } => {
                if rng.gen_bool(0.5) {
                    Answer::Text(pick(accepted, rng))
                } else {
                    Answer::Text("not sure".to_string())
                }
            }
            QuestionPayload::MemoryRecall { words } | QuestionPayload::DelayedRecall { words } => {
                Answer::Words(
                    words
                        .iter()
                        .filter(|_| rng.gen_bool(0.5))
                        .cloned()
                        .collect(),
                )
            }
            QuestionPayload::SerialSubtraction { start, step, count } => Answer::Numbers(
                QuestionPayload::subtraction_sequence(*start, *step, *count)
                    .into_iter()
                    .map(|value| value + rng.gen_range(-1..=1))
                    .collect(),
            ),
            QuestionPayload::Fluency {
                category,
                target_min,
            } => {
                let named = rng.gen_range(0..=*target_min);
                Answer::Items((0..named).map(|n| format!("{category} {n}")).collect())
            }
        },
    }
}

/// Break a multi-step answer into single taps.
#[must_use]
pub fn split_taps(answer: &Answer) -> Option<Vec<Answer>> {
    match answer {
        Answer::Cells(cells) if !cells.is_empty() => {
            Some(cells.iter().copied().map(Answer::Cell).collect())
        }
        Answer::Steps(steps) if !steps.is_empty() => {
            Some(steps.iter().copied().map(Answer::Step).collect())
        }
        _ => None,
    }
}
