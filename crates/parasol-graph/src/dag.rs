//! Directed acyclic graphs keyed by vertex identity
//!
//! A thin wrapper over a petgraph [`DiGraph`] that keeps a vertex → index
//! map, refuses duplicate edges and refuses edges that would close a cycle.
//! A cycle here means the resolver let one through, which is a defect in
//! the compiler rather than in the program being compiled, so it panics.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Display;
use std::hash::Hash;

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;

use parasol_core::Position;

/// Why an edge exists: the position of the referencing token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct Dag<V> {
    graph: DiGraph<V, Reference>,
    indices: HashMap<V, NodeIndex>,
}

impl<V> Default for Dag<V> {
    fn default() -> Self {
        Self {
            graph: DiGraph::new(),
            indices: HashMap::new(),
        }
    }
}

impl<V> Dag<V>
where
    V: Clone + Eq + Hash + Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vertex if it is absent
    pub fn add_vertex(&mut self, vertex: V) -> NodeIndex {
        if let Some(&index) = self.indices.get(&vertex) {
            return index;
        }
        let index = self.graph.add_node(vertex.clone());
        self.indices.insert(vertex, index);
        index
    }

    /// Insert both endpoints if absent, then the edge if absent
    ///
    /// Returns whether a new edge was inserted.
    ///
    /// # Panics
    ///
    /// Panics if the edge would introduce a cycle.
    pub fn add_edge(&mut self, source: V, target: V, reference: Reference) -> bool {
        let from = self.add_vertex(source);
        let to = self.add_vertex(target);

        if self.graph.find_edge(from, to).is_some() {
            return false;
        }

        if has_path_connecting(&self.graph, to, from, None) {
            panic!(
                "internal error: reference {} -> {} at {} would introduce a cycle",
                self.graph[from], self.graph[to], reference.position
            );
        }

        self.graph.add_edge(from, to, reference);
        true
    }

    pub fn contains_vertex(&self, vertex: &V) -> bool {
        self.indices.contains_key(vertex)
    }

    pub fn contains_edge(&self, source: &V, target: &V) -> bool {
        self.reference(source, target).is_some()
    }

    pub fn reference(&self, source: &V, target: &V) -> Option<&Reference> {
        let from = *self.indices.get(source)?;
        let to = *self.indices.get(target)?;
        self.graph
            .find_edge(from, to)
            .map(|edge| &self.graph[edge])
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Vertices in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.graph.node_weights()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&V, &V, &Reference)> {
        self.graph.edge_indices().filter_map(move |edge| {
            let (from, to) = self.graph.edge_endpoints(edge)?;
            Some((&self.graph[from], &self.graph[to], &self.graph[edge]))
        })
    }

    /// Direct successors of a vertex in the order they were first added
    pub fn successors(&self, vertex: &V) -> Vec<&V> {
        self.successor_indices(vertex)
            .into_iter()
            .map(|index| &self.graph[index])
            .collect()
    }

    fn successor_indices(&self, vertex: &V) -> Vec<NodeIndex> {
        let Some(&index) = self.indices.get(vertex) else {
            return Vec::new();
        };
        let mut successors: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .collect();
        successors.sort();
        successors
    }

    /// Every vertex reachable from `starts`, breadth first, starts included
    pub fn breadth_first<'a>(&'a self, starts: impl IntoIterator<Item = &'a V>) -> Vec<&'a V> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut order = Vec::new();

        for start in starts {
            if let Some(&index) = self.indices.get(start) {
                if visited.insert(index) {
                    queue.push_back(index);
                }
            }
        }

        while let Some(index) = queue.pop_front() {
            order.push(&self.graph[index]);
            for next in self.successor_indices(&self.graph[index]) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        order
    }

    /// Every vertex reachable from `start`, depth first, start included
    pub fn depth_first(&self, start: &V) -> Vec<&V> {
        let Some(&index) = self.indices.get(start) else {
            return Vec::new();
        };

        let mut visited = HashSet::new();
        let mut stack = vec![index];
        let mut order = Vec::new();

        while let Some(index) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            order.push(&self.graph[index]);
            let successors = self.successor_indices(&self.graph[index]);
            for next in successors.into_iter().rev() {
                if !visited.contains(&next) {
                    stack.push(next);
                }
            }
        }

        order
    }

    /// A path with the fewest edges from `from` to `to`, both included
    pub fn shortest_path(&self, from: &V, to: &V) -> Option<Vec<&V>> {
        let start = *self.indices.get(from)?;
        let goal = *self.indices.get(to)?;

        let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(index) = queue.pop_front() {
            if index == goal {
                let mut path = vec![&self.graph[goal]];
                let mut current = goal;
                while let Some(&prior) = previous.get(&current) {
                    path.push(&self.graph[prior]);
                    current = prior;
                }
                path.reverse();
                return Some(path);
            }

            for next in self.successor_indices(&self.graph[index]) {
                if visited.insert(next) {
                    previous.insert(next, index);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Every vertex, each before all vertices it references
    pub fn topological_order(&self) -> Vec<&V> {
        match toposort(&self.graph, None) {
            Ok(indices) => indices.into_iter().map(|index| &self.graph[index]).collect(),
            Err(cycle) => panic!(
                "internal error: dependency graph contains a cycle through {}",
                self.graph[cycle.node_id()]
            ),
        }
    }

    /// Export to serializable format for diagnostics
    pub fn to_serializable(&self) -> SerializableDag {
        let vertices = self.vertices().map(|vertex| vertex.to_string()).collect();
        let edges = self
            .edges()
            .map(|(from, to, reference)| SerializableEdge {
                from: from.to_string(),
                to: to.to_string(),
                position: reference.position.clone(),
            })
            .collect();

        SerializableDag { vertices, edges }
    }
}

impl<V> Serialize for Dag<V>
where
    V: Clone + Eq + Hash + Display,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_serializable().serialize(serializer)
    }
}

/// Serializable version of a graph for diagnostics export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializableDag {
    pub vertices: Vec<String>,
    pub edges: Vec<SerializableEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializableEdge {
    pub from: String,
    pub to: String,
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn r() -> Reference {
        Reference {
            position: Position::new("test.p", 1, 1),
        }
    }

    fn dag(edges: &[(&'static str, &'static str)]) -> Dag<&'static str> {
        let mut dag = Dag::new();
        for (source, target) in edges {
            dag.add_edge(*source, *target, r());
        }
        dag
    }

    #[test]
    fn test_insertion_is_idempotent() {
        let mut dag = Dag::new();
        dag.add_vertex("a");
        dag.add_vertex("a");
        assert!(dag.add_edge("a", "b", r()));
        assert!(!dag.add_edge("a", "b", r()));
        assert_eq!(dag.vertex_count(), 2);
        assert_eq!(dag.edge_count(), 1);
        assert!(dag.contains_edge(&"a", &"b"));
        assert!(!dag.contains_edge(&"b", &"a"));
    }

    #[test]
    #[should_panic(expected = "would introduce a cycle")]
    fn test_back_edge_is_a_defect() {
        let mut dag = dag(&[("a", "b")]);
        dag.add_edge("b", "a", r());
    }

    #[test]
    #[should_panic(expected = "would introduce a cycle")]
    fn test_self_edge_is_a_defect() {
        let mut dag = Dag::new();
        dag.add_edge("a", "a", r());
    }

    #[test]
    #[should_panic(expected = "would introduce a cycle")]
    fn test_transitive_back_edge_is_a_defect() {
        let mut dag = dag(&[("a", "b"), ("b", "c")]);
        dag.add_edge("c", "a", r());
    }

    #[test]
    fn test_successors_in_insertion_order() {
        let dag = dag(&[("a", "c"), ("a", "b"), ("a", "d")]);
        assert_eq!(dag.successors(&"a"), vec![&"c", &"b", &"d"]);
        assert!(dag.successors(&"missing").is_empty());
    }

    #[test]
    fn test_breadth_first() {
        let dag = dag(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("e", "f")]);
        assert_eq!(dag.breadth_first([&"a"]), vec![&"a", &"b", &"c", &"d"]);
    }

    #[test]
    fn test_depth_first() {
        let dag = dag(&[("a", "b"), ("a", "c"), ("b", "d")]);
        assert_eq!(dag.depth_first(&"a"), vec![&"a", &"b", &"d", &"c"]);
    }

    #[test]
    fn test_shortest_path_prefers_fewest_edges() {
        let dag = dag(&[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")]);
        assert_eq!(dag.shortest_path(&"a", &"d"), Some(vec![&"a", &"d"]));
        assert_eq!(dag.shortest_path(&"b", &"d"), Some(vec![&"b", &"c", &"d"]));
        assert_eq!(dag.shortest_path(&"a", &"a"), Some(vec![&"a"]));
        assert_eq!(dag.shortest_path(&"d", &"a"), None);
    }

    #[test]
    fn test_topological_order() {
        let dag = dag(&[("x", "y"), ("y", "z")]);
        assert_eq!(dag.topological_order(), vec![&"x", &"y", &"z"]);
    }

    #[test]
    fn test_serializable_keeps_insertion_order() {
        let dag = dag(&[("b", "a"), ("b", "c")]);
        let exported = dag.to_serializable();
        assert_eq!(exported.vertices, vec!["b", "a", "c"]);
        assert_eq!(exported.edges.len(), 2);
        assert_eq!(exported.edges[1].from, "b");
        assert_eq!(exported.edges[1].to, "c");
    }

    proptest! {
        #[test]
        fn prop_forward_edges_never_panic_and_sort(
            edges in proptest::collection::vec((0u8..12, 0u8..12), 0..40)
        ) {
            // Edges from lower to higher numbers can never form a cycle.
            let mut dag: Dag<u8> = Dag::new();
            for (a, b) in edges {
                if a < b {
                    dag.add_edge(a, b, r());
                }
            }
            let order = dag.topological_order();
            prop_assert_eq!(order.len(), dag.vertex_count());
            for (source, target, _) in dag.edges() {
                let s = order.iter().position(|v| *v == source);
                let t = order.iter().position(|v| *v == target);
                prop_assert!(s < t);
            }
        }
    }
}
