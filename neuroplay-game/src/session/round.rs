use serde::{Deserialize, Serialize};

use crate::evaluator::Evaluation;
use crate::puzzle::{
    Answer, CognitiveDomain, Direction, DirectionQuestion, DirectionSpec, PuzzleSpec,
    ScreeningQuestionSpec,
};

/// One answered (or pending) round. Created on entering `Responding` and
/// resolved exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub index: u32,
    pub spec: PuzzleSpec,
    pub submitted: Option<Answer>,
    pub evaluation: Option<Evaluation>,
    /// When the stimulus for this round appeared.
    pub started_at_ms: u64,
    pub respond_started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    /// Closed by the response limit rather than a submission.
    pub timed_out: bool,
}

impl RoundRecord {
    pub(crate) const fn open(
        index: u32,
        spec: PuzzleSpec,
        started_at_ms: u64,
        respond_started_at_ms: u64,
    ) -> Self {
        Self {
            index,
            spec,
            submitted: None,
            evaluation: None,
            started_at_ms,
            respond_started_at_ms,
            ended_at_ms: None,
            timed_out: false,
        }
    }

    /// Store the outcome. Returns `false` if the round was already resolved.
    pub(crate) fn resolve(
        &mut self,
        answer: Answer,
        evaluation: Evaluation,
        at_ms: u64,
        timed_out: bool,
    ) -> bool {
        if self.evaluation.is_some() {
            return false;
        }
        self.submitted = Some(answer);
        self.evaluation = Some(evaluation);
        self.ended_at_ms = Some(at_ms);
        self.timed_out = timed_out;
        true
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.evaluation.is_some()
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.evaluation.is_some_and(|evaluation| evaluation.correct)
    }

    /// Time from entering `Responding` to the answer.
    #[must_use]
    pub fn latency_ms(&self) -> Option<u64> {
        self.ended_at_ms
            .map(|end| end.saturating_sub(self.respond_started_at_ms))
    }

    #[must_use]
    pub const fn domain(&self) -> Option<CognitiveDomain> {
        match &self.spec {
            PuzzleSpec::Screening(ScreeningQuestionSpec { domain, .. }) => Some(*domain),
            _ => None,
        }
    }
}

/// Result of feeding one tap into a multi-step answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StepProgress {
    /// Keep collecting.
    Pending { taken: usize, remaining: usize },
    /// The answer is complete, or a wrong step ended it early.
    Finished(Answer),
}

/// Taps collected so far for a round answered one step at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StepCursor {
    cells: Vec<usize>,
    steps: Vec<Direction>,
}

impl StepCursor {
    pub(crate) fn reset(&mut self) {
        self.cells.clear();
        self.steps.clear();
    }

    #[must_use]
    pub(crate) fn taken(&self) -> usize {
        self.cells.len() + self.steps.len()
    }

    /// Add one tap. A tap of the wrong kind counts as a wrong step.
    pub(crate) fn push(&mut self, spec: &PuzzleSpec, tap: &Answer) -> StepProgress {
        match (spec, tap) {
            (PuzzleSpec::Sequence(sequence), Answer::Cell(cell)) => {
                let position = self.cells.len();
                self.cells.push(*cell);
                let wrong = sequence.cells.get(position) != Some(cell);
                Self::progress(
                    wrong,
                    self.cells.len(),
                    sequence.cells.len(),
                    || Answer::Cells(self.cells.clone()),
                )
            }
            (
                PuzzleSpec::Direction(DirectionSpec {
                    steps,
                    question: DirectionQuestion::Replay,
                    ..
                }),
                Answer::Step(step),
            ) => {
                let position = self.steps.len();
                self.steps.push(*step);
                let wrong = steps.get(position) != Some(step);
                Self::progress(wrong, self.steps.len(), steps.len(), || {
                    Answer::Steps(self.steps.clone())
                })
            }
            (PuzzleSpec::Sequence(_), _) => {
                StepProgress::Finished(Answer::Cells(self.cells.clone()))
            }
            (PuzzleSpec::Direction(_), _) => {
                StepProgress::Finished(Answer::Steps(self.steps.clone()))
            }
            _ => StepProgress::Finished(tap.clone()),
        }
    }

    fn progress(
        wrong: bool,
        taken: usize,
        needed: usize,
        answer: impl FnOnce() -> Answer,
    ) -> StepProgress {
        if wrong || taken >= needed {
            StepProgress::Finished(answer())
        } else {
            StepProgress::Pending {
                taken,
                remaining: needed - taken,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::SequenceSpec;

    fn sequence() -> PuzzleSpec {
        PuzzleSpec::Sequence(SequenceSpec {
            grid_size: 3,
            length: 3,
            cells: vec![4, 0, 8],
        })
    }

    #[test]
    fn cursor_collects_until_complete() {
        let spec = sequence();
        let mut cursor = StepCursor::default();
        assert_eq!(
            cursor.push(&spec, &Answer::Cell(4)),
            StepProgress::Pending {
                taken: 1,
                remaining: 2
            }
        );
        cursor.push(&spec, &Answer::Cell(0));
        assert_eq!(
            cursor.push(&spec, &Answer::Cell(8)),
            StepProgress::Finished(Answer::Cells(vec![4, 0, 8]))
        );
    }

    #[test]
    fn wrong_tap_finishes_early() {
        let spec = sequence();
        let mut cursor = StepCursor::default();
        cursor.push(&spec, &Answer::Cell(4));
        assert_eq!(
            cursor.push(&spec, &Answer::Cell(1)),
            StepProgress::Finished(Answer::Cells(vec![4, 1]))
        );
        cursor.reset();
        assert_eq!(cursor.taken(), 0);
        assert_eq!(
            cursor.push(&spec, &Answer::Step(Direction::Up)),
            StepProgress::Finished(Answer::Cells(vec![]))
        );
    }

    #[test]
    fn record_resolves_once() {
        let mut record = RoundRecord::open(0, sequence(), 100, 2_500);
        assert!(record.resolve(Answer::Empty, Evaluation::INCORRECT, 3_000, true));
        assert!(!record.resolve(
            Answer::Cells(vec![4, 0, 8]),
            Evaluation::binary(true),
            3_100,
            false
        ));
        assert_eq!(record.latency_ms(), Some(500));
        assert!(record.timed_out);
        assert!(!record.is_correct());
    }
}
