//! Transitive upstream/downstream walks and reachability helpers.

use super::{tasks_by_id, DependencyGraph};
use crate::domain::{ChainEntry, DependencyEdge, Task, TaskId, MAX_DEPENDENCIES_PER_TASK};
use petgraph::Direction;
use std::collections::{HashSet, VecDeque};

/// All tasks `task_id` transitively depends on, tagged with depth.
///
/// Depth 1 is a direct blocker, depth 2 a blocker of a blocker and so on.
/// Output is ordered by depth, then by discovery order within a depth.
/// Tasks referenced by edges but absent from `tasks` are walked through but
/// not reported.
pub fn upstream_chain(
    task_id: &TaskId,
    edges: &[DependencyEdge],
    tasks: &[Task],
) -> Vec<ChainEntry> {
    chain(task_id, edges, tasks, Direction::Outgoing)
}

/// All tasks that transitively depend on `task_id`, tagged with depth.
pub fn downstream_chain(
    task_id: &TaskId,
    edges: &[DependencyEdge],
    tasks: &[Task],
) -> Vec<ChainEntry> {
    chain(task_id, edges, tasks, Direction::Incoming)
}

/// IDs of every task `task_id` transitively depends on.
pub fn upstream_ids(task_id: &TaskId, edges: &[DependencyEdge]) -> HashSet<TaskId> {
    reachable(task_id, edges, Direction::Outgoing)
}

/// IDs of every task that transitively depends on `task_id`.
pub fn downstream_ids(task_id: &TaskId, edges: &[DependencyEdge]) -> HashSet<TaskId> {
    reachable(task_id, edges, Direction::Incoming)
}

/// Tasks that could be added as a new blocker of `task_id` right now.
///
/// One downstream reachability pass replaces a cycle check per candidate: a
/// candidate closes a loop exactly when it already depends on `task_id`.
/// Excludes the task itself and its existing direct blockers, and returns
/// nothing when the task is unknown or already at the fan-out limit.
pub fn eligible_blockers(task_id: &TaskId, edges: &[DependencyEdge], tasks: &[Task]) -> Vec<Task> {
    if !tasks.iter().any(|task| &task.id == task_id) {
        return Vec::new();
    }

    let graph = DependencyGraph::from_edges(edges);
    let direct: HashSet<&TaskId> = graph.blockers(task_id).into_iter().collect();
    if direct.len() >= MAX_DEPENDENCIES_PER_TASK {
        return Vec::new();
    }

    let downstream = walk(&graph, task_id, Direction::Incoming);
    let excluded: HashSet<&TaskId> = downstream.iter().map(|(id, _)| *id).collect();

    tasks
        .iter()
        .filter(|task| &task.id != task_id)
        .filter(|task| !direct.contains(&task.id))
        .filter(|task| !excluded.contains(&task.id))
        .cloned()
        .collect()
}

/// Render a cycle path as a closed loop of task titles.
///
/// `["b", "a"]` renders as `"Title B → Title A → Title B"`. IDs with no
/// matching task are shown as-is.
pub fn format_cycle_path(path: &[TaskId], tasks: &[Task]) -> String {
    let by_id = tasks_by_id(tasks);
    let name = |id: &TaskId| {
        by_id
            .get(id)
            .map_or_else(|| id.to_string(), |task| task.title.clone())
    };

    let Some(first) = path.first() else {
        return String::new();
    };

    path.iter()
        .chain(std::iter::once(first))
        .map(name)
        .collect::<Vec<_>>()
        .join(" → ")
}

fn chain(
    task_id: &TaskId,
    edges: &[DependencyEdge],
    tasks: &[Task],
    direction: Direction,
) -> Vec<ChainEntry> {
    let graph = DependencyGraph::from_edges(edges);
    let by_id = tasks_by_id(tasks);

    let entries: Vec<ChainEntry> = walk(&graph, task_id, direction)
        .into_iter()
        .filter_map(|(id, depth)| {
            by_id.get(id).map(|task| ChainEntry {
                task: (*task).clone(),
                depth,
            })
        })
        .collect();

    tracing::debug!(%task_id, ?direction, found = entries.len(), "Walked dependency chain");
    entries
}

fn reachable(task_id: &TaskId, edges: &[DependencyEdge], direction: Direction) -> HashSet<TaskId> {
    let graph = DependencyGraph::from_edges(edges);
    walk(&graph, task_id, direction)
        .into_iter()
        .map(|(id, _)| id.clone())
        .collect()
}

/// Breadth-first walk from `start`, excluding `start` itself.
///
/// The visited set makes the walk terminate on cyclic input.
fn walk<'a>(
    graph: &DependencyGraph<'a>,
    start: &TaskId,
    direction: Direction,
) -> Vec<(&'a TaskId, usize)> {
    let Some(start_node) = graph.node(start) else {
        return Vec::new();
    };

    let mut visited = HashSet::from([start_node]);
    let mut queue = VecDeque::from([(start_node, 0usize)]);
    let mut found = Vec::new();

    while let Some((node, depth)) = queue.pop_front() {
        for next in graph.neighbors(node, direction) {
            if visited.insert(next) {
                found.push((graph.task_id(next), depth + 1));
                queue.push_back((next, depth + 1));
            }
        }
    }

    found
}
