use chrono::NaiveDate;
use rand::seq::SliceRandom;

use super::GenerationError;
use crate::data::{QuestionBody, QuestionDef};
use crate::puzzle::{GameKind, QuestionPayload, ScreeningQuestionSpec};
use crate::rng::RngBundle;

fn unsatisfiable(question: &QuestionDef, reason: &str) -> GenerationError {
    GenerationError::ConstraintUnsatisfiable {
        family: GameKind::Screening,
        reason: format!("question `{}`: {reason}", question.id),
    }
}

/// Turn the authored question at `index` into a concrete spec for `today`.
pub(super) fn resolve(
    rngs: &mut RngBundle,
    bank: &[QuestionDef],
    index: usize,
    today: NaiveDate,
) -> Result<ScreeningQuestionSpec, GenerationError> {
    let Some(question) = bank.get(index) else {
        return Err(GenerationError::ConstraintUnsatisfiable {
            family: GameKind::Screening,
            reason: format!("battery has {} questions, asked for #{index}", bank.len()),
        });
    };

    let payload = match &question.body {
        QuestionBody::Text { accepted } | QuestionBody::Similarity { accepted }
            if accepted.iter().all(|a| a.trim().is_empty()) =>
        {
            return Err(unsatisfiable(question, "no accepted answers"));
        }
        QuestionBody::Text { accepted } => QuestionPayload::Text {
            accepted: accepted.clone(),
        },
        QuestionBody::Similarity { accepted } => QuestionPayload::Similarity {
            accepted: accepted.clone(),
        },
        QuestionBody::DatePart { part, labels } => QuestionPayload::Text {
            accepted: part.accepted_answers(today, labels),
        },
        QuestionBody::Choice { options, answer } => {
            if !options.contains(answer) {
                return Err(unsatisfiable(question, "answer missing from options"));
            }
            let mut options = options.clone();
            options.shuffle(rngs.shuffle());
            QuestionPayload::Choice {
                options,
                answer: answer.clone(),
            }
        }
        QuestionBody::MemoryRecall { words } => QuestionPayload::MemoryRecall {
            words: words.clone(),
        },
        QuestionBody::DelayedRecall { recall_of } => {
            let words = bank.iter().find_map(|other| match &other.body {
                QuestionBody::MemoryRecall { words } if other.id == *recall_of => {
                    Some(words.clone())
                }
                _ => None,
            });
            let Some(words) = words else {
                return Err(unsatisfiable(question, "recalls an unknown word list"));
            };
            QuestionPayload::DelayedRecall { words }
        }
        QuestionBody::SerialSubtraction { start, step, count } => {
            if *count == 0 {
                return Err(unsatisfiable(question, "zero subtractions"));
            }
            QuestionPayload::SerialSubtraction {
                start: *start,
                step: *step,
                count: *count,
            }
        }
        QuestionBody::Fluency {
            category,
            target_min,
        } => {
            if *target_min == 0 {
                return Err(unsatisfiable(question, "fluency target of zero"));
            }
            QuestionPayload::Fluency {
                category: category.clone(),
                target_min: *target_min,
            }
        }
    };

    Ok(ScreeningQuestionSpec {
        id: question.id.clone(),
        domain: question.domain,
        prompt: question.prompt.clone(),
        payload,
    })
}
