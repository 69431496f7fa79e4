use rand::Rng;
use std::rc::Rc;

use super::GenerationError;
use super::options::with_distractors;
use crate::graph::Graph;
use crate::pathfinder::{find_path, first_hops};
use crate::puzzle::{GameKind, MapSpec};
use crate::rng::RngBundle;

/// Random endpoint pairs tried before the hop constraint is reported as
/// unsatisfiable for this attempt.
const PAIR_DRAWS: usize = 48;

fn unsatisfiable(reason: String) -> GenerationError {
    GenerationError::ConstraintUnsatisfiable {
        family: GameKind::MapNavigation,
        reason,
    }
}

/// A "first stop from A towards B" question whose endpoints are at least
/// `min_hops` apart.
pub(super) fn generate(
    rngs: &mut RngBundle,
    graph: &Rc<Graph>,
    min_hops: u8,
) -> Result<MapSpec, GenerationError> {
    let count = graph.node_count();
    if count < 2 {
        return Err(unsatisfiable(format!("map `{}` has one landmark", graph.id())));
    }
    let min_hops = usize::from(min_hops.max(1));

    for _ in 0..PAIR_DRAWS {
        let rng = rngs.content();
        let from = rng.gen_range(0..count);
        let to = rng.gen_range(0..count);
        if from == to {
            continue;
        }
        let path = find_path(graph, from, to);
        if path.len() < min_hops + 1 {
            continue;
        }
        let Some(answer) = graph.name(path[1]).map(str::to_string) else {
            continue;
        };

        // Any neighbour that starts another shortest route is also correct,
        // so none of them may appear as a distractor.
        let valid = first_hops(graph, from, to);
        let pool: Vec<String> = (0..count)
            .filter(|node| *node != from && !valid.contains(node))
            .filter_map(|node| graph.name(node).map(str::to_string))
            .collect();
        let options = with_distractors(GameKind::MapNavigation, answer.clone(), pool, rngs)?;

        return Ok(MapSpec {
            graph: Rc::clone(graph),
            from,
            to,
            path,
            options,
            answer,
        });
    }

    Err(unsatisfiable(format!(
        "no pair {min_hops}+ hops apart found on `{}`",
        graph.id()
    )))
}
