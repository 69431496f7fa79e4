//! Static landmark/room graphs.
//!
//! Graphs are built once from content data and only read afterwards. Node
//! ids are positions in declaration order, and each adjacency list keeps
//! edge declaration order so that breadth-first tie breaking is stable.
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("graph `{graph}` has no nodes")]
    Empty { graph: String },
    #[error("graph `{graph}` declares node `{node}` more than once")]
    DuplicateNode { graph: String, node: String },
    #[error("graph `{graph}` has an edge to unknown node `{node}`")]
    UnknownNode { graph: String, node: String },
    #[error("graph `{graph}` has a self-loop on `{node}`")]
    SelfLoop { graph: String, node: String },
}

/// Serialized form: node names plus undirected edges by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDef {
    pub id: String,
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<[String; 2]>,
}

/// Undirected graph with named nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphDef", into = "GraphDef")]
pub struct Graph {
    id: String,
    names: Vec<String>,
    adjacency: Vec<Vec<NodeId>>,
    edges: Vec<(NodeId, NodeId)>,
}

impl Graph {
    /// Build a graph from node names and name pairs.
    ///
    /// # Errors
    ///
    /// Returns an error for empty graphs, duplicate node names, self-loops, or
    /// edges naming unknown nodes.
    pub fn from_edges<S: AsRef<str>>(
        id: &str,
        nodes: &[S],
        edges: &[(S, S)],
    ) -> Result<Self, GraphError> {
        if nodes.is_empty() {
            return Err(GraphError::Empty {
                graph: id.to_string(),
            });
        }
        let mut names: Vec<String> = Vec::with_capacity(nodes.len());
        for node in nodes {
            let node = node.as_ref().trim();
            if names.iter().any(|existing| existing == node) {
                return Err(GraphError::DuplicateNode {
                    graph: id.to_string(),
                    node: node.to_string(),
                });
            }
            names.push(node.to_string());
        }

        let mut graph = Self {
            id: id.to_string(),
            adjacency: vec![Vec::new(); names.len()],
            names,
            edges: Vec::with_capacity(edges.len()),
        };
        for (a, b) in edges {
            let from = graph.require(a.as_ref())?;
            let to = graph.require(b.as_ref())?;
            if from == to {
                return Err(GraphError::SelfLoop {
                    graph: id.to_string(),
                    node: a.as_ref().to_string(),
                });
            }
            if graph.are_adjacent(from, to) {
                continue;
            }
            graph.adjacency[from].push(to);
            graph.adjacency[to].push(from);
            graph.edges.push((from, to));
        }
        Ok(graph)
    }

    /// A simple chain `names[0] - names[1] - ...`. Names are assumed unique.
    #[must_use]
    pub fn chain(id: &str, names: &[&str]) -> Self {
        let count = names.len();
        let adjacency = (0..count)
            .map(|node| {
                let mut next = Vec::with_capacity(2);
                if node > 0 {
                    next.push(node - 1);
                }
                if node + 1 < count {
                    next.push(node + 1);
                }
                next
            })
            .collect();
        Self {
            id: id.to_string(),
            names: names.iter().map(|name| (*name).to_string()).collect(),
            adjacency,
            edges: (1..count).map(|node| (node - 1, node)).collect(),
        }
    }

    fn require(&self, name: &str) -> Result<NodeId, GraphError> {
        self.id_of(name).ok_or_else(|| GraphError::UnknownNode {
            graph: self.id.clone(),
            node: name.trim().to_string(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.names.get(node).map(String::as_str)
    }

    /// Exact (trimmed) name lookup.
    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        let name = name.trim();
        self.names.iter().position(|candidate| candidate == name)
    }

    /// Neighbours in edge declaration order.
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency.get(node).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).contains(&b)
    }
}

impl TryFrom<GraphDef> for Graph {
    type Error = GraphError;

    fn try_from(def: GraphDef) -> Result<Self, Self::Error> {
        let edges: Vec<(&str, &str)> = def
            .edges
            .iter()
            .map(|[a, b]| (a.as_str(), b.as_str()))
            .collect();
        let nodes: Vec<&str> = def.nodes.iter().map(String::as_str).collect();
        Self::from_edges(&def.id, &nodes, &edges)
    }
}

impl From<Graph> for GraphDef {
    fn from(graph: Graph) -> Self {
        let edges = graph
            .edges
            .iter()
            .map(|(a, b)| [graph.names[*a].clone(), graph.names[*b].clone()])
            .collect();
        Self {
            id: graph.id,
            nodes: graph.names,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Graph {
        Graph::from_edges(
            "square",
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "a")],
        )
        .unwrap()
    }

    #[test]
    fn adjacency_keeps_declaration_order() {
        let graph = square();
        assert_eq!(graph.neighbors(0), &[1, 3]);
        assert_eq!(graph.neighbors(2), &[1, 3]);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn rejects_bad_definitions() {
        let unknown = Graph::from_edges("g", &["a", "b"], &[("a", "z")]);
        assert!(matches!(unknown, Err(GraphError::UnknownNode { .. })));
        let dup = Graph::from_edges::<&str>("g", &["a", "a"], &[]);
        assert!(matches!(dup, Err(GraphError::DuplicateNode { .. })));
        let looped = Graph::from_edges("g", &["a"], &[("a", "a")]);
        assert!(matches!(looped, Err(GraphError::SelfLoop { .. })));
        let empty = Graph::from_edges::<&str>("g", &[], &[]);
        assert!(matches!(empty, Err(GraphError::Empty { .. })));
    }

    #[test]
    fn duplicate_edges_are_collapsed() {
        let graph = Graph::from_edges("g", &["a", "b"], &[("a", "b"), ("b", "a")]).unwrap();
        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn chain_matches_edge_built_graph() {
        let chain = Graph::chain("line", &["a", "b", "c"]);
        let built = Graph::from_edges("line", &["a", "b", "c"], &[("a", "b"), ("b", "c")]).unwrap();
        assert_eq!(chain, built);
    }

    #[test]
    fn serde_roundtrip_preserves_order() {
        let graph = square();
        let json = serde_json::to_string(&graph).unwrap();
        let back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn invalid_json_graph_is_rejected() {
        let json = r#"{"id":"g","nodes":["a"],"edges":[["a","b"]]}"#;
        assert!(serde_json::from_str::<Graph>(json).is_err());
    }
}
