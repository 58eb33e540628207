//! Integrity checks for bulk "move to in progress" requests.
//!
//! Blocked findings are advisory data for the caller, not errors. Only
//! unknown task IDs abort a request.

use super::tasks_by_id;
use crate::domain::{
    BlockedTaskInfo, BulkStartOutcome, BulkStartPolicy, DependencyEdge, Task, TaskId,
};
use crate::error::DependencyError;
use std::collections::{HashMap, HashSet};

/// Report which of `task_ids` are currently blocked.
///
/// The result holds exactly the requested tasks with at least one incomplete
/// direct blocker, in request order, each with the number of such blockers.
/// Repeated IDs are reported once.
///
/// # Errors
///
/// Returns [`DependencyError::TaskNotFound`] for the first unknown ID. Every
/// ID is checked before any blocker is counted.
pub fn blocked_tasks_info(
    task_ids: &[TaskId],
    edges: &[DependencyEdge],
    tasks: &[Task],
) -> Result<Vec<BlockedTaskInfo>, DependencyError> {
    let by_id = tasks_by_id(tasks);
    let requested = resolve(task_ids, &by_id)?;
    let counts = incomplete_blocker_counts(edges, &by_id);

    Ok(requested
        .into_iter()
        .filter_map(|task| {
            counts
                .get(&task.id)
                .copied()
                .filter(|count| *count > 0)
                .map(|blocked_by_count| BlockedTaskInfo {
                    task_id: task.id.clone(),
                    task_name: task.title.clone(),
                    blocked_by_count,
                })
        })
        .collect())
}

/// Decide which requested tasks a bulk start moves to in progress.
///
/// With [`BulkStartPolicy::SkipBlocked`] blocked tasks are left out and
/// reported in `skipped`. With [`BulkStartPolicy::ForceAll`] every requested
/// task is started and `skipped` is empty.
///
/// # Errors
///
/// Returns [`DependencyError::TaskNotFound`] if any ID is unknown.
pub fn plan_bulk_start(
    task_ids: &[TaskId],
    policy: BulkStartPolicy,
    edges: &[DependencyEdge],
    tasks: &[Task],
) -> Result<BulkStartOutcome, DependencyError> {
    let blocked = blocked_tasks_info(task_ids, edges, tasks)?;
    let requested = dedupe(task_ids);

    let outcome = match policy {
        BulkStartPolicy::ForceAll => BulkStartOutcome {
            started: requested,
            skipped: Vec::new(),
        },
        BulkStartPolicy::SkipBlocked => {
            let blocked_ids: HashSet<&TaskId> = blocked.iter().map(|info| &info.task_id).collect();
            let started = requested
                .into_iter()
                .filter(|id| !blocked_ids.contains(id))
                .collect();
            BulkStartOutcome {
                started,
                skipped: blocked,
            }
        }
    };

    Ok(outcome)
}

fn resolve<'a>(
    task_ids: &[TaskId],
    by_id: &HashMap<&TaskId, &'a Task>,
) -> Result<Vec<&'a Task>, DependencyError> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(task_ids.len());

    for id in task_ids {
        let task = by_id
            .get(id)
            .copied()
            .ok_or_else(|| DependencyError::TaskNotFound(id.clone()))?;
        if seen.insert(id) {
            resolved.push(task);
        }
    }

    Ok(resolved)
}

fn dedupe(task_ids: &[TaskId]) -> Vec<TaskId> {
    let mut seen = HashSet::new();
    task_ids
        .iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

fn incomplete_blocker_counts(
    edges: &[DependencyEdge],
    by_id: &HashMap<&TaskId, &Task>,
) -> HashMap<TaskId, usize> {
    let mut counts: HashMap<TaskId, usize> = HashMap::new();
    for edge in edges {
        let incomplete = by_id
            .get(&edge.blocking_task_id)
            .is_some_and(|blocker| blocker.status.is_blocking());
        if incomplete {
            *counts.entry(edge.dependent_task_id.clone()).or_default() += 1;
        }
    }
    counts
}
