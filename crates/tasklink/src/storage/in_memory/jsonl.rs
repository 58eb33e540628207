//! JSONL persistence for the in-memory stores.
//!
//! Tasks and edges live in separate files, one record per line. Loading never
//! fails on bad data: bad records are skipped and reported as
//! [`LoadWarning`]s, and every edge that survives loading satisfies the same
//! admission rules as an edge created through the engine.

use super::{new_in_memory_edge_store, new_in_memory_task_store};
use crate::domain::{DependencyEdge, EdgeId, Task, TaskId};
use crate::error::Result;
use crate::graph::{self, TaskLookup};
use crate::storage::jsonl_io::{read_jsonl_resilient, write_jsonl_atomic, MalformedLine};
use crate::storage::{EdgeStore, TaskStore};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Non-fatal problems found while loading a JSONL file.
///
/// The store is still usable; the offending record was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Line that could not be parsed.
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// Task record that failed validation (e.g. empty title).
    InvalidTask {
        /// ID of the rejected task
        task_id: TaskId,
        /// 1-based line number
        line_number: usize,
        /// Validation message
        error: String,
    },

    /// A record whose ID was already loaded from an earlier line.
    DuplicateId {
        /// The repeated ID
        id: String,
        /// 1-based line number of the later record
        line_number: usize,
    },

    /// Edge referencing a task that does not exist.
    OrphanedDependency {
        /// Edge ID
        edge_id: EdgeId,
        /// Dependent end
        dependent: TaskId,
        /// Blocking end
        blocking: TaskId,
    },

    /// Edge rejected by the admission checks (self-loop, duplicate pair,
    /// fan-out limit, or cycle).
    RejectedDependency {
        /// Edge ID
        edge_id: EdgeId,
        /// 1-based line number
        line_number: usize,
        /// Why it was rejected
        reason: String,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed JSON: {error}")
            }
            LoadWarning::InvalidTask {
                task_id,
                line_number,
                error,
            } => write!(f, "line {line_number}: invalid task {task_id}: {error}"),
            LoadWarning::DuplicateId { id, line_number } => {
                write!(f, "line {line_number}: duplicate id {id}")
            }
            LoadWarning::OrphanedDependency {
                edge_id,
                dependent,
                blocking,
            } => write!(
                f,
                "dependency {edge_id} references a missing task ({dependent} -> {blocking})"
            ),
            LoadWarning::RejectedDependency {
                edge_id,
                line_number,
                reason,
            } => write!(f, "line {line_number}: dependency {edge_id} rejected: {reason}"),
        }
    }
}

impl From<MalformedLine> for LoadWarning {
    fn from(line: MalformedLine) -> Self {
        LoadWarning::MalformedJson {
            line_number: line.line_number,
            error: line.error,
        }
    }
}

/// Accepts every task ID; used when only structural checks apply.
struct AnyTask;

impl TaskLookup for AnyTask {
    fn contains_task(&self, _id: &TaskId) -> bool {
        true
    }
}

/// Load a task store from a JSONL file.
///
/// # Errors
///
/// Returns an error only if the file cannot be read.
pub async fn load_tasks_from_jsonl(
    path: &Path,
    prefix: String,
) -> Result<(Box<dyn TaskStore>, Vec<LoadWarning>)> {
    let (records, malformed) = read_jsonl_resilient::<Task>(path).await?;
    let mut warnings: Vec<LoadWarning> = malformed.into_iter().map(Into::into).collect();

    let mut seen: HashSet<TaskId> = HashSet::new();
    let mut tasks = Vec::with_capacity(records.len());
    for (line_number, task) in records {
        if let Err(error) = task.validate() {
            warnings.push(LoadWarning::InvalidTask {
                task_id: task.id,
                line_number,
                error,
            });
            continue;
        }
        if !seen.insert(task.id.clone()) {
            warnings.push(LoadWarning::DuplicateId {
                id: task.id.to_string(),
                line_number,
            });
            continue;
        }
        tasks.push(task);
    }

    let mut store = new_in_memory_task_store(prefix);
    store.import_tasks(tasks).await?;
    Ok((store, warnings))
}

/// Load an edge store from a JSONL file.
///
/// Edges are admitted in file order. With `known_tasks`, edges referencing
/// any other task are dropped as orphans; without it, only the structural
/// checks run.
///
/// # Errors
///
/// Returns an error only if the file cannot be read.
pub async fn load_edges_from_jsonl(
    path: &Path,
    known_tasks: Option<&HashSet<TaskId>>,
) -> Result<(Box<dyn EdgeStore>, Vec<LoadWarning>)> {
    let (records, malformed) = read_jsonl_resilient::<DependencyEdge>(path).await?;
    let mut warnings: Vec<LoadWarning> = malformed.into_iter().map(Into::into).collect();

    let mut seen: HashSet<EdgeId> = HashSet::new();
    let mut accepted: Vec<DependencyEdge> = Vec::with_capacity(records.len());
    for (line_number, edge) in records {
        if !seen.insert(edge.id.clone()) {
            warnings.push(LoadWarning::DuplicateId {
                id: edge.id.to_string(),
                line_number,
            });
            continue;
        }

        if let Some(known) = known_tasks {
            if !known.contains(&edge.dependent_task_id) || !known.contains(&edge.blocking_task_id)
            {
                warnings.push(LoadWarning::OrphanedDependency {
                    edge_id: edge.id,
                    dependent: edge.dependent_task_id,
                    blocking: edge.blocking_task_id,
                });
                continue;
            }
        }

        let admitted = graph::validate(
            &edge.dependent_task_id,
            &edge.blocking_task_id,
            &accepted,
            &AnyTask,
        );
        if let Err(reason) = admitted {
            warnings.push(LoadWarning::RejectedDependency {
                edge_id: edge.id,
                line_number,
                reason: reason.to_string(),
            });
            continue;
        }

        accepted.push(edge);
    }

    let mut store = new_in_memory_edge_store();
    store.import_edges(accepted).await?;
    Ok((store, warnings))
}

/// Write every task to `path` atomically, oldest first.
///
/// # Errors
///
/// Returns an error if writing or renaming the file fails.
pub async fn save_tasks_to_jsonl(store: &dyn TaskStore, path: &Path) -> Result<()> {
    let tasks = store.export_all().await?;
    write_jsonl_atomic(path, &tasks).await
}

/// Write every edge to `path` atomically, in creation order.
///
/// # Errors
///
/// Returns an error if writing or renaming the file fails.
pub async fn save_edges_to_jsonl(store: &dyn EdgeStore, path: &Path) -> Result<()> {
    let edges = store.list().await?;
    write_jsonl_atomic(path, &edges).await
}
