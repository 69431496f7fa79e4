//! Breadth-first shortest paths over static graphs.
//!
//! Ties between equally short routes resolve to the first one discovered in
//! breadth-first order, which follows adjacency declaration order. The UI
//! shows "the" shortest path, so the choice must be stable.
use std::collections::VecDeque;

use crate::graph::{Graph, NodeId};

/// Shortest node sequence from `start` to `goal`, both included.
///
/// Returns `[start]` when `start == goal` and an empty vector when no path
/// exists or either id is out of range.
#[must_use]
pub fn find_path(graph: &Graph, start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let count = graph.node_count();
    if start >= count || goal >= count {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }

    let mut visited = vec![false; count];
    let mut parent: Vec<Option<NodeId>> = vec![None; count];
    let mut queue = VecDeque::new();
    visited[start] = true;
    queue.push_back(start);

    while let Some(node) = queue.pop_front() {
        for &next in graph.neighbors(node) {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            parent[next] = Some(node);
            if next == goal {
                return reconstruct(&parent, start, goal);
            }
            queue.push_back(next);
        }
    }
    Vec::new()
}

fn reconstruct(parent: &[Option<NodeId>], start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        let Some(previous) = parent[cursor] else {
            return Vec::new();
        };
        path.push(previous);
        cursor = previous;
    }
    path.reverse();
    path
}

/// Shortest path by landmark names; empty when a name is unknown.
#[must_use]
pub fn find_path_by_name(graph: &Graph, start: &str, goal: &str) -> Vec<String> {
    let (Some(from), Some(to)) = (graph.id_of(start), graph.id_of(goal)) else {
        return Vec::new();
    };
    find_path(graph, from, to)
        .into_iter()
        .filter_map(|id| graph.name(id).map(str::to_string))
        .collect()
}

/// Hop distance from `start` to every node (`None` when unreachable).
#[must_use]
pub fn distances_from(graph: &Graph, start: NodeId) -> Vec<Option<usize>> {
    let count = graph.node_count();
    let mut distance = vec![None; count];
    if start >= count {
        return distance;
    }
    let mut queue = VecDeque::new();
    distance[start] = Some(0);
    queue.push_back(start);
    while let Some(node) = queue.pop_front() {
        let next_distance = distance[node].map_or(0, |d| d + 1);
        for &next in graph.neighbors(node) {
            if distance[next].is_none() {
                distance[next] = Some(next_distance);
                queue.push_back(next);
            }
        }
    }
    distance
}

/// Hops on the shortest path between two nodes.
#[must_use]
pub fn shortest_distance(graph: &Graph, start: NodeId, goal: NodeId) -> Option<usize> {
    distances_from(graph, start).get(goal).copied().flatten()
}

/// Neighbours of `start` that begin *some* shortest path to `goal`.
#[must_use]
pub fn first_hops(graph: &Graph, start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let to_goal = distances_from(graph, goal);
    let Some(Some(total)) = to_goal.get(start).copied() else {
        return Vec::new();
    };
    if total == 0 {
        return Vec::new();
    }
    graph
        .neighbors(start)
        .iter()
        .copied()
        .filter(|next| to_goal[*next] == Some(total - 1))
        .collect()
}

/// Whether `route` is a walk from `start` to `goal` along edges whose hop
/// count equals the shortest distance.
#[must_use]
pub fn is_shortest_route(graph: &Graph, route: &[NodeId], start: NodeId, goal: NodeId) -> bool {
    let (Some(first), Some(last)) = (route.first(), route.last()) else {
        return false;
    };
    if *first != start || *last != goal {
        return false;
    }
    if !route.windows(2).all(|pair| graph.are_adjacent(pair[0], pair[1])) {
        return false;
    }
    shortest_distance(graph, start, goal) == Some(route.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    // a - b - c - d
    // |           |
    // e --------- f      g (isolated)
    fn sample() -> Graph {
        Graph::from_edges(
            "sample",
            &["a", "b", "c", "d", "e", "f", "g"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "d"),
                ("a", "e"),
                ("e", "f"),
                ("f", "d"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn finds_known_minimum() {
        let graph = sample();
        assert_eq!(find_path(&graph, 0, 2), vec![0, 1, 2]);
        assert_eq!(find_path(&graph, 4, 2).len() - 1, 3);
        assert_eq!(shortest_distance(&graph, 0, 3), Some(3));
    }

    #[test]
    fn tie_breaks_by_declaration_order() {
        let graph = sample();
        // a→d is 3 hops both via b-c and via e-f; b is declared first.
        assert_eq!(find_path(&graph, 0, 3), vec![0, 1, 2, 3]);
        assert_eq!(first_hops(&graph, 0, 3), vec![1, 4]);
    }

    #[test]
    fn disconnected_or_invalid_pairs_are_empty() {
        let graph = sample();
        assert!(find_path(&graph, 0, 6).is_empty());
        assert!(find_path(&graph, 0, 99).is_empty());
        assert_eq!(shortest_distance(&graph, 6, 0), None);
        assert!(first_hops(&graph, 6, 0).is_empty());
    }

    #[test]
    fn same_node_is_single_element_path() {
        let graph = sample();
        assert_eq!(find_path(&graph, 2, 2), vec![2]);
        assert!(first_hops(&graph, 2, 2).is_empty());
    }

    #[test]
    fn validates_routes() {
        let graph = sample();
        assert!(is_shortest_route(&graph, &[0, 4, 5, 3], 0, 3));
        assert!(is_shortest_route(&graph, &[0, 1, 2, 3], 0, 3));
        assert!(!is_shortest_route(&graph, &[0, 1, 2], 0, 3));
        assert!(!is_shortest_route(&graph, &[0, 2, 3], 0, 3));
        assert!(!is_shortest_route(&graph, &[], 0, 3));
    }

    #[test]
    fn name_lookup_wraps_ids() {
        let graph = sample();
        assert_eq!(find_path_by_name(&graph, "e", "c").len(), 4);
        assert!(find_path_by_name(&graph, "e", "zz").is_empty());
    }
}
