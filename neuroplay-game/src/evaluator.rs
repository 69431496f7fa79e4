//! Answer evaluation.
//!
//! Every function here is pure and total: an answer of the wrong shape, an
//! empty list or blank text is a valid input that evaluates to
//! [`Evaluation::INCORRECT`].
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::MAX_EVALUATION_SCORE;
use crate::numbers::percent;
use crate::pathfinder::is_shortest_route;
use crate::puzzle::{
    Answer, Direction, DirectionQuestion, DirectionSpec, MapSpec, PuzzleSpec, QuestionPayload,
};

/// Outcome of evaluating one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Evaluation {
    pub correct: bool,
    /// 0-100.
    pub score: u8,
}

impl Evaluation {
    pub const INCORRECT: Self = Self {
        correct: false,
        score: 0,
    };

    #[must_use]
    pub const fn binary(correct: bool) -> Self {
        Self {
            correct,
            score: if correct { MAX_EVALUATION_SCORE } else { 0 },
        }
    }

    /// Partial credit; correct only when everything matched.
    #[must_use]
    pub fn ratio(matched: usize, total: usize) -> Self {
        if total == 0 {
            return Self::INCORRECT;
        }
        Self {
            correct: matched == total,
            score: percent(matched, total),
        }
    }
}

/// Lowercase, trim and collapse internal whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Evaluate `answer` against the round's puzzle.
#[must_use]
pub fn evaluate(spec: &PuzzleSpec, answer: &Answer) -> Evaluation {
    match spec {
        PuzzleSpec::Sequence(sequence) => match answer {
            Answer::Cells(cells) => positional(sequence.cells.as_slice(), cells.as_slice()),
            _ => Evaluation::INCORRECT,
        },
        PuzzleSpec::Direction(direction) => evaluate_direction(direction, answer),
        PuzzleSpec::Map(map) => evaluate_map(map, answer),
        PuzzleSpec::Face(face) => match answer {
            Answer::Choice(choice) => evaluate_choice(&face.answer, choice),
            _ => Evaluation::INCORRECT,
        },
        PuzzleSpec::Screening(question) => evaluate_question(&question.payload, answer),
    }
}

/// Evaluate a screening answer by question type.
#[must_use]
pub fn evaluate_question(payload: &QuestionPayload, answer: &Answer) -> Evaluation {
    match (payload, answer) {
        (QuestionPayload::Text { accepted }, Answer::Text(text)) => evaluate_text(accepted, text),
        (QuestionPayload::Choice { answer: expected, .. }, Answer::Choice(choice)) => {
            evaluate_choice(expected, choice)
        }
        (
            QuestionPayload::MemoryRecall { words } | QuestionPayload::DelayedRecall { words },
            Answer::Words(submitted) | Answer::Items(submitted),
        ) => evaluate_recall(words, submitted),
        (QuestionPayload::SerialSubtraction { start, step, count }, Answer::Numbers(numbers)) => {
            let expected = QuestionPayload::subtraction_sequence(*start, *step, *count);
            positional(expected.as_slice(), numbers.as_slice())
        }
        (QuestionPayload::Similarity { accepted }, Answer::Text(text)) => {
            evaluate_similarity(accepted, text)
        }
        (
            QuestionPayload::Fluency { target_min, .. },
            Answer::Items(items) | Answer::Words(items),
        ) => evaluate_fluency(items, usize::from(*target_min)),
        _ => Evaluation::INCORRECT,
    }
}

/// Normalized equality, or containment in either direction.
#[must_use]
pub fn evaluate_text(accepted: &[String], submitted: &str) -> Evaluation {
    let submitted = normalize(submitted);
    if submitted.is_empty() {
        return Evaluation::INCORRECT;
    }
    let hit = accepted.iter().map(|a| normalize(a)).any(|expected| {
        !expected.is_empty() && (submitted.contains(&expected) || expected.contains(&submitted))
    });
    Evaluation::binary(hit)
}

/// Exact equality against the single correct option.
#[must_use]
pub fn evaluate_choice(expected: &str, submitted: &str) -> Evaluation {
    Evaluation::binary(!submitted.is_empty() && submitted == expected)
}

/// Unordered, case-insensitive word recall scored against the expected set.
#[must_use]
pub fn evaluate_recall(expected: &[String], submitted: &[String]) -> Evaluation {
    let expected: HashSet<String> = expected
        .iter()
        .map(|word| normalize(word))
        .filter(|word| !word.is_empty())
        .collect();
    let recalled: HashSet<String> = submitted
        .iter()
        .map(|word| normalize(word))
        .filter(|word| expected.contains(word))
        .collect();
    Evaluation::ratio(recalled.len(), expected.len())
}

/// Free text containing at least one accepted answer.
#[must_use]
pub fn evaluate_similarity(accepted: &[String], submitted: &str) -> Evaluation {
    let submitted = normalize(submitted);
    let hit = accepted
        .iter()
        .map(|a| normalize(a))
        .any(|expected| !expected.is_empty() && submitted.contains(&expected));
    Evaluation::binary(hit)
}

/// Distinct normalized items relative to the target count, capped at 100.
#[must_use]
pub fn evaluate_fluency(items: &[String], target_min: usize) -> Evaluation {
    if target_min == 0 {
        return Evaluation::INCORRECT;
    }
    let distinct = items
        .iter()
        .map(|item| normalize(item))
        .filter(|item| !item.is_empty())
        .collect::<HashSet<_>>()
        .len();
    Evaluation {
        correct: distinct >= target_min,
        score: percent(distinct.min(target_min), target_min),
    }
}

/// Position-by-position comparison; an out-of-place value earns nothing.
#[must_use]
pub fn positional<T: PartialEq>(expected: &[T], submitted: &[T]) -> Evaluation {
    let matched = expected
        .iter()
        .zip(submitted)
        .filter(|(want, got)| want == got)
        .count();
    let mut evaluation = Evaluation::ratio(matched, expected.len());
    evaluation.correct &= submitted.len() == expected.len();
    evaluation
}

fn evaluate_direction(spec: &DirectionSpec, answer: &Answer) -> Evaluation {
    match (&spec.question, answer) {
        (DirectionQuestion::Replay, Answer::Steps(steps)) => {
            positional(spec.steps.as_slice(), steps.as_slice())
        }
        (DirectionQuestion::Replay, Answer::Target(cell)) => Evaluation::binary(*cell == spec.target),
        (DirectionQuestion::StepRecall { answer: expected, .. }, Answer::Step(step)) => {
            Evaluation::binary(step == expected)
        }
        (DirectionQuestion::StepRecall { answer: expected, .. }, Answer::Choice(choice)) => {
            Evaluation::binary(choice.parse::<Direction>().ok() == Some(*expected))
        }
        _ => Evaluation::INCORRECT,
    }
}

fn evaluate_map(spec: &MapSpec, answer: &Answer) -> Evaluation {
    match answer {
        Answer::Choice(choice) => evaluate_choice(&spec.answer, choice),
        Answer::Route(names) => {
            let route: Option<Vec<_>> = names.iter().map(|name| spec.graph.id_of(name)).collect();
            Evaluation::binary(
                route.is_some_and(|route| is_shortest_route(&spec.graph, &route, spec.from, spec.to)),
            )
        }
        _ => Evaluation::INCORRECT,
    }
}
