use rand::Rng;
use rand::seq::SliceRandom;

use super::GenerationError;
use super::options::with_distractors;
use crate::puzzle::{
    Cell, Direction, DirectionPrompt, DirectionQuestion, DirectionSpec, GameKind, StepList,
};
use crate::rng::RngBundle;

fn unsatisfiable(reason: String) -> GenerationError {
    GenerationError::ConstraintUnsatisfiable {
        family: GameKind::DirectionPath,
        reason,
    }
}

/// A random in-bounds walk of `length` moves.
pub(super) fn generate(
    rngs: &mut RngBundle,
    grid: u8,
    length: u8,
    prompt: DirectionPrompt,
) -> Result<DirectionSpec, GenerationError> {
    if grid < 2 {
        return Err(unsatisfiable(format!("a {grid}x{grid} grid has no moves")));
    }
    if length == 0 {
        return Err(unsatisfiable("walk needs at least one move".to_string()));
    }

    let rng = rngs.content();
    let start = Cell::new(rng.gen_range(0..grid), rng.gen_range(0..grid));
    let mut steps = StepList::new();
    let mut cursor = start;
    for _ in 0..length {
        let legal: Vec<(Direction, Cell)> = Direction::ALL
            .into_iter()
            .filter_map(|dir| cursor.step(dir, grid).map(|next| (dir, next)))
            .collect();
        let Some(&(dir, next)) = legal.choose(rng) else {
            return Err(unsatisfiable(format!("token stuck at {cursor:?}")));
        };
        steps.push(dir);
        cursor = next;
    }

    let question = match prompt {
        DirectionPrompt::Replay => DirectionQuestion::Replay,
        DirectionPrompt::StepRecall => {
            let index = rngs.content().gen_range(0..steps.len());
            let answer = steps[index];
            let options =
                with_distractors(GameKind::DirectionPath, answer, Direction::ALL, rngs)?;
            DirectionQuestion::StepRecall {
                index,
                options,
                answer,
            }
        }
    };

    Ok(DirectionSpec {
        grid,
        start,
        steps,
        target: cursor,
        question,
    })
}
