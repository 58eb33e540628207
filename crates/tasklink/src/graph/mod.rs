//! Pure dependency graph algorithms.
//!
//! Every function in this module is a pure function of the current edge set
//! and task statuses. Nothing here is cached between calls; callers rebuild
//! from a fresh snapshot after each mutation.
//!
//! # Edge Direction Convention
//!
//! Arcs point from **dependent -> blocking**, matching [`DependencyEdge`]:
//!
//! - Following [`Direction::Outgoing`] walks *upstream* (towards blockers)
//! - Following [`Direction::Incoming`] walks *downstream* (towards dependents)
//!
//! Neighbours are always visited in edge creation order so traversal output is
//! deterministic.

mod bulk;
mod cycle;
mod index;
mod traversal;
mod validator;

pub use bulk::{blocked_tasks_info, plan_bulk_start};
pub use cycle::would_create_cycle;
pub use index::{build_index, dependency_info, is_blocked};
pub use traversal::{
    downstream_chain, downstream_ids, eligible_blockers, format_cycle_path, upstream_chain,
    upstream_ids,
};
pub use validator::validate;

use crate::domain::{DependencyEdge, EdgeId, Task, TaskId};
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::hash::BuildHasher;

/// Answers whether a task exists, for edge admission checks.
pub trait TaskLookup {
    /// Whether a task with this ID exists.
    fn contains_task(&self, id: &TaskId) -> bool;
}

impl<S: BuildHasher> TaskLookup for HashMap<TaskId, Task, S> {
    fn contains_task(&self, id: &TaskId) -> bool {
        self.contains_key(id)
    }
}

impl<S: BuildHasher> TaskLookup for HashMap<&TaskId, &Task, S> {
    fn contains_task(&self, id: &TaskId) -> bool {
        self.contains_key(id)
    }
}

impl<S: BuildHasher> TaskLookup for HashSet<TaskId, S> {
    fn contains_task(&self, id: &TaskId) -> bool {
        self.contains(id)
    }
}

/// Index a task slice by ID.
pub(crate) fn tasks_by_id(tasks: &[Task]) -> HashMap<&TaskId, &Task> {
    tasks.iter().map(|task| (&task.id, task)).collect()
}

/// Read-only petgraph view over an edge slice.
///
/// Nodes borrow task IDs and edges borrow edge IDs from the slice, so building
/// a snapshot allocates only the graph structure itself.
pub struct DependencyGraph<'a> {
    graph: DiGraph<&'a TaskId, &'a EdgeId>,
    node_map: HashMap<&'a TaskId, NodeIndex>,
}

impl<'a> DependencyGraph<'a> {
    /// Build a snapshot from the given edges.
    pub fn from_edges(edges: &'a [DependencyEdge]) -> Self {
        let mut graph = DiGraph::with_capacity(edges.len(), edges.len());
        let mut node_map: HashMap<&'a TaskId, NodeIndex> = HashMap::new();

        for edge in edges {
            let from = *node_map
                .entry(&edge.dependent_task_id)
                .or_insert_with(|| graph.add_node(&edge.dependent_task_id));
            let to = *node_map
                .entry(&edge.blocking_task_id)
                .or_insert_with(|| graph.add_node(&edge.blocking_task_id));
            graph.add_edge(from, to, &edge.id);
        }

        Self { graph, node_map }
    }

    /// Whether the task appears in any edge.
    pub fn contains(&self, id: &TaskId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Number of edges in the snapshot.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the edge set contains a cycle.
    pub fn is_cyclic(&self) -> bool {
        algo::is_cyclic_directed(&self.graph)
    }

    /// Direct blockers of a task, in edge creation order.
    pub fn blockers(&self, id: &TaskId) -> Vec<&'a TaskId> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    /// Direct dependents of a task, in edge creation order.
    pub fn dependents(&self, id: &TaskId) -> Vec<&'a TaskId> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    pub(crate) fn node(&self, id: &TaskId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    pub(crate) fn task_id(&self, node: NodeIndex) -> &'a TaskId {
        self.graph[node]
    }

    /// Neighbouring nodes in the given direction, ordered by edge creation.
    ///
    /// petgraph iterates adjacency lists newest-first, so edges are re-sorted
    /// by index (which is insertion order for a graph that never removes edges).
    pub(crate) fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut adjacent: Vec<_> = self
            .graph
            .edges_directed(node, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (edge.id(), other)
            })
            .collect();
        adjacent.sort_by_key(|(edge_id, _)| *edge_id);
        adjacent.into_iter().map(|(_, other)| other).collect()
    }

    fn neighbor_ids(&self, id: &TaskId, direction: Direction) -> Vec<&'a TaskId> {
        self.node(id)
            .map(|node| {
                self.neighbors(node, direction)
                    .into_iter()
                    .map(|n| self.task_id(n))
                    .collect()
            })
            .unwrap_or_default()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{edge, ids};
    use super::*;

    #[test]
    fn test_neighbors_follow_creation_order() {
        let edges = vec![edge("a", "b"), edge("a", "c"), edge("a", "d")];
        let graph = DependencyGraph::from_edges(&edges);

        let blockers: Vec<TaskId> = graph
            .blockers(&TaskId::new("a"))
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(blockers, ids(&["b", "c", "d"]));
    }

    #[test]
    fn test_dependents_walk_incoming_edges() {
        let edges = vec![edge("a", "c"), edge("b", "c")];
        let graph = DependencyGraph::from_edges(&edges);

        let dependents: Vec<TaskId> = graph
            .dependents(&TaskId::new("c"))
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(dependents, ids(&["a", "b"]));
        assert!(graph.dependents(&TaskId::new("a")).is_empty());
    }

    #[test]
    fn test_unknown_task_has_no_neighbors() {
        let edges = vec![edge("a", "b")];
        let graph = DependencyGraph::from_edges(&edges);

        assert!(!graph.contains(&TaskId::new("z")));
        assert!(graph.blockers(&TaskId::new("z")).is_empty());
    }

    #[test]
    fn test_is_cyclic() {
        let acyclic = vec![edge("a", "b"), edge("b", "c")];
        assert!(!DependencyGraph::from_edges(&acyclic).is_cyclic());

        let cyclic = vec![edge("a", "b"), edge("b", "c"), edge("c", "a")];
        assert!(DependencyGraph::from_edges(&cyclic).is_cyclic());
    }
}
