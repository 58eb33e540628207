//! Admission check for new dependency edges.

use super::{would_create_cycle, TaskLookup};
use crate::domain::{DependencyEdge, TaskId, MAX_DEPENDENCIES_PER_TASK};
use crate::error::DependencyError;

/// Decide whether `dependent -> blocking` may be added to `edges`.
///
/// Checks run in a fixed order and the first failure wins, so the reported
/// reason is deterministic and cheap checks run before the traversal:
///
/// 1. self reference
/// 2. either task missing
/// 3. duplicate ordered pair
/// 4. fan-out limit on `dependent`
/// 5. cycle
///
/// # Errors
///
/// Returns the [`DependencyError`] for the first failing check.
pub fn validate<L: TaskLookup + ?Sized>(
    dependent: &TaskId,
    blocking: &TaskId,
    edges: &[DependencyEdge],
    tasks: &L,
) -> Result<(), DependencyError> {
    if dependent == blocking {
        return Err(DependencyError::SelfReference {
            task_id: dependent.clone(),
        });
    }

    for id in [dependent, blocking] {
        if !tasks.contains_task(id) {
            return Err(DependencyError::TaskNotFound(id.clone()));
        }
    }

    let outgoing: Vec<&DependencyEdge> = edges
        .iter()
        .filter(|edge| &edge.dependent_task_id == dependent)
        .collect();

    if outgoing
        .iter()
        .any(|edge| &edge.blocking_task_id == blocking)
    {
        return Err(DependencyError::DuplicateEdge {
            dependent: dependent.clone(),
            blocking: blocking.clone(),
        });
    }

    if outgoing.len() >= MAX_DEPENDENCIES_PER_TASK {
        return Err(DependencyError::LimitExceeded {
            task_id: dependent.clone(),
            limit: MAX_DEPENDENCIES_PER_TASK,
        });
    }

    let check = would_create_cycle(dependent, blocking, edges);
    if check.would_cycle {
        return Err(DependencyError::CircularDependency {
            path: check.path.unwrap_or_default(),
        });
    }

    Ok(())
}
