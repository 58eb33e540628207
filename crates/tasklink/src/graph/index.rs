//! Derived per-task dependency view.
//!
//! Blocking is **direct only**: a task is blocked when one of its own
//! blockers is not completed. Blockers further upstream are never consulted.

use super::tasks_by_id;
use crate::domain::{DependencyEdge, DependencyInfo, DependencyStatus, Task, TaskId};
use std::collections::{HashMap, HashSet};

/// Build the dependency view for every task in `tasks`.
///
/// Edges whose other endpoint is missing from `tasks` still count towards
/// `dependency_count`, but a missing blocker never blocks.
pub fn build_index(edges: &[DependencyEdge], tasks: &[Task]) -> HashMap<TaskId, DependencyInfo> {
    let by_id = tasks_by_id(tasks);
    index_subjects(edges.iter(), &by_id, tasks.iter())
}

/// Build the dependency view for a single task.
///
/// Returns `None` when the task is not in `tasks`.
pub fn dependency_info(
    task_id: &TaskId,
    edges: &[DependencyEdge],
    tasks: &[Task],
) -> Option<DependencyInfo> {
    let by_id = tasks_by_id(tasks);
    let task = by_id.get(task_id).copied()?;
    let relevant = edges.iter().filter(|edge| edge.touches(task_id));
    index_subjects(relevant, &by_id, std::iter::once(task)).remove(task_id)
}

/// Whether any direct blocker of `task_id` is incomplete.
pub fn is_blocked(task_id: &TaskId, edges: &[DependencyEdge], tasks: &[Task]) -> bool {
    let by_id = tasks_by_id(tasks);
    edges
        .iter()
        .filter(|edge| &edge.dependent_task_id == task_id)
        .any(|edge| {
            by_id
                .get(&edge.blocking_task_id)
                .is_some_and(|blocker| blocker.status.is_blocking())
        })
}

fn index_subjects<'a>(
    edges: impl Iterator<Item = &'a DependencyEdge>,
    by_id: &HashMap<&TaskId, &Task>,
    subjects: impl Iterator<Item = &'a Task>,
) -> HashMap<TaskId, DependencyInfo> {
    let mut index: HashMap<TaskId, DependencyInfo> = subjects
        .map(|task| (task.id.clone(), DependencyInfo::default()))
        .collect();
    let mut touched: HashSet<TaskId> = HashSet::new();

    for edge in edges {
        if let Some(info) = index.get_mut(&edge.dependent_task_id) {
            touched.insert(edge.dependent_task_id.clone());
            info.dependency_count += 1;
            if let Some(blocker) = by_id.get(&edge.blocking_task_id) {
                if blocker.status.is_blocking() {
                    info.blocked_by.push((*blocker).clone());
                    info.blocked_by_ids.push(blocker.id.clone());
                }
            }
        }

        if let Some(info) = index.get_mut(&edge.blocking_task_id) {
            touched.insert(edge.blocking_task_id.clone());
            if let Some(dependent) = by_id.get(&edge.dependent_task_id) {
                info.blocks.push((*dependent).clone());
                info.blocks_ids.push(dependent.id.clone());
            }
        }
    }

    for (id, info) in &mut index {
        info.is_blocked = !info.blocked_by.is_empty();
        info.dependency_status = if info.is_blocked {
            Some(DependencyStatus::Blocked)
        } else if touched.contains(id) {
            Some(DependencyStatus::Ready)
        } else {
            None
        };
    }

    index
}
