//! Cycle detection for proposed dependency edges.

use super::DependencyGraph;
use crate::domain::{CycleCheck, DependencyEdge, TaskId};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use std::collections::HashSet;

/// Check whether adding `dependent -> blocking` would close a cycle.
///
/// The new arc closes a loop exactly when `blocking` already (transitively)
/// depends on `dependent`. A depth-first search runs from `blocking` along
/// existing depends-on arcs; reaching `dependent` confirms the cycle.
///
/// The returned path starts at `dependent`, followed by the chain from
/// `blocking` to the last task before the walk returns to `dependent`. For an
/// existing edge `(T1, T2)`, checking `(T2, T1)` yields `[T2, T1]`.
///
/// Runs in O(V + E). The visited set keeps the search finite even if the
/// edge set was somehow already cyclic.
pub fn would_create_cycle(
    dependent: &TaskId,
    blocking: &TaskId,
    edges: &[DependencyEdge],
) -> CycleCheck {
    if dependent == blocking {
        return CycleCheck::cycle(vec![dependent.clone()]);
    }

    let graph = DependencyGraph::from_edges(edges);
    match find_path(&graph, blocking, dependent) {
        Some(chain) => {
            let mut path = Vec::with_capacity(chain.len() + 1);
            path.push(dependent.clone());
            path.extend(chain);
            tracing::debug!(
                %dependent,
                %blocking,
                path_len = path.len(),
                "Edge would create a cycle"
            );
            CycleCheck::cycle(path)
        }
        None => CycleCheck::clear(),
    }
}

/// Depth-first search from `start` for a node with a direct arc to `target`.
///
/// Returns the DFS stack (from `start` to that node) at the moment `target`
/// is reached.
fn find_path(graph: &DependencyGraph<'_>, start: &TaskId, target: &TaskId) -> Option<Vec<TaskId>> {
    let start_node = graph.node(start)?;
    let target_node = graph.node(target)?;

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    visited.insert(start_node);

    let mut stack: Vec<(NodeIndex, std::vec::IntoIter<NodeIndex>)> = vec![(
        start_node,
        graph.neighbors(start_node, Direction::Outgoing).into_iter(),
    )];

    loop {
        let next = match stack.last_mut() {
            Some((_, pending)) => pending.next(),
            None => return None,
        };

        match next {
            Some(node) if node == target_node => {
                return Some(
                    stack
                        .iter()
                        .map(|(n, _)| graph.task_id(*n).clone())
                        .collect(),
                );
            }
            Some(node) => {
                if visited.insert(node) {
                    let children = graph.neighbors(node, Direction::Outgoing).into_iter();
                    stack.push((node, children));
                }
            }
            None => {
                stack.pop();
            }
        }
    }
}
