//! Multiple-choice option lists.
use rand::seq::SliceRandom;

use super::GenerationError;
use crate::constants::DISTRACTOR_COUNT;
use crate::puzzle::GameKind;
use crate::rng::RngBundle;

/// The correct value plus [`DISTRACTOR_COUNT`] distinct wrong values drawn
/// from `pool`, in shuffled order.
///
/// Values equal to `correct` and repeats in `pool` are ignored.
pub(crate) fn with_distractors<T: Clone + PartialEq>(
    family: GameKind,
    correct: T,
    pool: impl IntoIterator<Item = T>,
    rngs: &mut RngBundle,
) -> Result<Vec<T>, GenerationError> {
    let mut candidates: Vec<T> = Vec::new();
    for value in pool {
        if value != correct && !candidates.contains(&value) {
            candidates.push(value);
        }
    }
    if candidates.len() < DISTRACTOR_COUNT {
        return Err(GenerationError::CatalogTooSmall {
            family,
            needed: DISTRACTOR_COUNT,
            available: candidates.len(),
        });
    }

    let mut options: Vec<T> = candidates
        .choose_multiple(rngs.distractors(), DISTRACTOR_COUNT)
        .cloned()
        .collect();
    options.push(correct);
    options.shuffle(rngs.shuffle());
    Ok(options)
}
