//! Final result record and the host callback that receives it.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::difficulty::Difficulty;
use crate::evaluator::Evaluation;
use crate::numbers::ms_to_rounded_seconds;
use crate::puzzle::{Answer, GameKind, PuzzleSpec};
use crate::scoring::{DomainScores, ScoreAggregator, Severity};
use crate::session::RoundRecord;

/// Completion payload handed to the host exactly once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub score: u32,
    pub max_score: u32,
    /// 0-100.
    pub accuracy: u8,
    /// Seconds from the first stimulus to completion.
    pub duration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResultMetadata>,
    #[serde(flatten)]
    pub screening: Option<ScreeningSummary>,
}

/// Screening-only fields, flattened into the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningSummary {
    pub orientation_score: Option<u8>,
    pub memory_score: Option<u8>,
    pub attention_score: Option<u8>,
    pub language_score: Option<u8>,
    pub executive_score: Option<u8>,
    pub severity: Severity,
    /// Raw submissions keyed by question id.
    pub responses: BTreeMap<String, Answer>,
}

impl ScreeningSummary {
    #[must_use]
    pub const fn domain_scores(&self) -> DomainScores {
        DomainScores {
            orientation: self.orientation_score,
            memory: self.memory_score,
            attention: self.attention_score,
            language: self.language_score,
            executive: self.executive_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub index: u32,
    pub correct: bool,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default)]
    pub timed_out: bool,
    /// Sequence or walk length, for adaptive games.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub game: GameKind,
    pub difficulty: Difficulty,
    pub replay_code: String,
    pub rounds: Vec<RoundSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_latency_ms: Option<u64>,
    #[serde(default)]
    pub fallback_rounds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<String>,
}

/// Receives the completed result. Persistence and its failures belong to the
/// implementor.
pub trait ResultReporter {
    fn report(&mut self, result: &GameResult);
}

impl<F> ResultReporter for F
where
    F: FnMut(&GameResult),
{
    fn report(&mut self, result: &GameResult) {
        self(result);
    }
}

/// Keeps every reported result; clones share storage.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    results: Rc<RefCell<Vec<GameResult>>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn results(&self) -> Vec<GameResult> {
        self.results.borrow().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.results.borrow().len()
    }

    #[must_use]
    pub fn last(&self) -> Option<GameResult> {
        self.results.borrow().last().cloned()
    }
}

impl ResultReporter for RecordingReporter {
    fn report(&mut self, result: &GameResult) {
        self.results.borrow_mut().push(result.clone());
    }
}

/// Everything the result is built from.
pub(crate) struct ReportInput<'a> {
    pub kind: GameKind,
    pub difficulty: Difficulty,
    pub replay_code: String,
    pub aggregator: &'a ScoreAggregator,
    pub planned_rounds: u32,
    pub duration_ms: u64,
    pub rounds: &'a [RoundRecord],
    pub fallback_rounds: u32,
    pub map_id: Option<String>,
}

pub(crate) fn assemble(input: ReportInput<'_>) -> GameResult {
    let max_score = input.aggregator.max_score(input.planned_rounds);
    let score = input.aggregator.total_score().min(max_score);

    let rounds: Vec<RoundSummary> = input
        .rounds
        .iter()
        .map(|round| {
            let evaluation = round.evaluation.unwrap_or(Evaluation::INCORRECT);
            RoundSummary {
                index: round.index,
                correct: evaluation.correct,
                score: evaluation.score,
                latency_ms: round.latency_ms(),
                timed_out: round.timed_out,
                length: match &round.spec {
                    PuzzleSpec::Sequence(spec) => Some(spec.cells.len()),
                    PuzzleSpec::Direction(spec) => Some(spec.steps.len()),
                    _ => None,
                },
            }
        })
        .collect();
    let latencies: Vec<u64> = rounds.iter().filter_map(|r| r.latency_ms).collect();
    let average_latency_ms = u64::try_from(latencies.len())
        .ok()
        .filter(|count| *count > 0)
        .map(|count| latencies.iter().sum::<u64>() / count);

    let screening = input.kind.is_screening().then(|| {
        let domains = input.aggregator.domain_scores();
        let responses = input
            .rounds
            .iter()
            .filter_map(|round| match &round.spec {
                PuzzleSpec::Screening(question) => Some((
                    question.id.clone(),
                    round.submitted.clone().unwrap_or(Answer::Empty),
                )),
                _ => None,
            })
            .collect();
        ScreeningSummary {
            orientation_score: domains.orientation,
            memory_score: domains.memory,
            attention_score: domains.attention,
            language_score: domains.language,
            executive_score: domains.executive,
            severity: Severity::from_score(domains.overall().unwrap_or(0)),
            responses,
        }
    });

    GameResult {
        score,
        max_score,
        accuracy: input.aggregator.accuracy(),
        duration: ms_to_rounded_seconds(input.duration_ms),
        data: Some(ResultMetadata {
            game: input.kind,
            difficulty: input.difficulty,
            replay_code: input.replay_code,
            rounds,
            average_latency_ms,
            fallback_rounds: input.fallback_rounds,
            map_id: input.map_id,
        }),
        screening,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::{CognitiveDomain, QuestionPayload, ScreeningQuestionSpec, SequenceSpec};

    fn resolved(index: u32, spec: PuzzleSpec, answer: Answer, evaluation: Evaluation) -> RoundRecord {
        let mut record = RoundRecord::open(index, spec, 0, 1_000);
        record.resolve(answer, evaluation, 1_400, false);
        record
    }

    #[test]
    fn game_result_serializes_camel_case_without_screening_fields() {
        let spec = PuzzleSpec::Sequence(SequenceSpec {
            grid_size: 3,
            length: 2,
            cells: vec![0, 1],
        });
        let rounds = vec![resolved(0, spec, Answer::Cells(vec![0, 1]), Evaluation::binary(true))];
        let aggregator = ScoreAggregator::from_history(
            GameKind::SequenceRecall,
            [(Evaluation::binary(true), None)],
        );
        let result = assemble(ReportInput {
            kind: GameKind::SequenceRecall,
            difficulty: Difficulty::Easy,
            replay_code: "SQ-MAPLE42".into(),
            aggregator: &aggregator,
            planned_rounds: 1,
            duration_ms: 2_600,
            rounds: &rounds,
            fallback_rounds: 0,
            map_id: None,
        });
        assert_eq!(result.score, 10);
        assert_eq!(result.max_score, 10);
        assert_eq!(result.duration, 3);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["maxScore"], 10);
        assert_eq!(json["data"]["replayCode"], "SQ-MAPLE42");
        assert_eq!(json["data"]["averageLatencyMs"], 400);
        assert!(json.get("orientation_score").is_none());
    }

    #[test]
    fn screening_result_flattens_domains_and_responses() {
        let spec = PuzzleSpec::Screening(ScreeningQuestionSpec {
            id: "orientation_year".into(),
            domain: CognitiveDomain::Orientation,
            prompt: "?".into(),
            payload: QuestionPayload::Text {
                accepted: vec!["2026".into()],
            },
        });
        let answer = Answer::Text("2026".into());
        let rounds = vec![resolved(0, spec, answer.clone(), Evaluation::binary(true))];
        let aggregator = ScoreAggregator::from_history(
            GameKind::Screening,
            [(Evaluation::binary(true), Some(CognitiveDomain::Orientation))],
        );
        let result = assemble(ReportInput {
            kind: GameKind::Screening,
            difficulty: Difficulty::Medium,
            replay_code: "SC-RIVER01".into(),
            aggregator: &aggregator,
            planned_rounds: 1,
            duration_ms: 0,
            rounds: &rounds,
            fallback_rounds: 0,
            map_id: None,
        });
        assert_eq!(result.score, 100);
        assert_eq!(result.max_score, 100);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["orientation_score"], 100);
        assert!(json["memory_score"].is_null());
        assert_eq!(json["severity"], "normal");
        assert_eq!(json["responses"]["orientation_year"]["value"], "2026");
        let back: GameResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn closures_are_reporters() {
        let mut seen = Vec::new();
        {
            let mut reporter = |result: &GameResult| seen.push(result.score);
            let result = GameResult {
                score: 7,
                max_score: 10,
                accuracy: 70,
                duration: 1,
                data: None,
                screening: None,
            };
            reporter.report(&result);
        }
        assert_eq!(seen, vec![7]);
    }
}
