//! Domain types for the task dependency graph.
//!
//! Tasks are owned by an external task store and are only ever read here.
//! Dependency edges are owned by the engine and follow the
//! **dependent -> blocking** direction: the edge `(A, B)` means "A cannot
//! start until B is completed".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of blocking tasks a single dependent task may reference.
pub const MAX_DEPENDENCIES_PER_TASK: usize = 10;

/// Maximum task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Unique identifier for a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new task ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create a new edge ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    Pending,

    /// Currently being worked on
    #[serde(rename = "in_progress")]
    InProgress,

    /// Done; no longer blocks anything
    Completed,
}

impl TaskStatus {
    /// Whether a task in this status still blocks its dependents.
    pub fn is_blocking(self) -> bool {
        self != TaskStatus::Completed
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A task as seen by the dependency engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier for the task
    pub id: TaskId,

    /// Human-readable title, used when rendering cycle paths
    pub title: String,

    /// Current status
    pub status: TaskStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Validate task data.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)
    }
}

/// Data for creating a new task
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Task title
    pub title: String,
}

impl NewTask {
    /// Create a new task request with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Validate the new task data.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {} characters",
            MAX_TITLE_LENGTH
        ));
    }
    Ok(())
}

/// A directed "depends-on" relation between two tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Unique identifier for the edge
    pub id: EdgeId,

    /// The task that cannot start yet
    pub dependent_task_id: TaskId,

    /// The task that must be completed first
    pub blocking_task_id: TaskId,

    /// Who created the edge
    pub created_by: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl DependencyEdge {
    /// Whether this edge references the given task at either end.
    pub fn touches(&self, task_id: &TaskId) -> bool {
        &self.dependent_task_id == task_id || &self.blocking_task_id == task_id
    }
}

/// Data for inserting a new dependency edge.
///
/// The store assigns the ID and creation timestamp.
#[derive(Debug, Clone)]
pub struct NewDependency {
    /// The task that cannot start yet
    pub dependent_task_id: TaskId,

    /// The task that must be completed first
    pub blocking_task_id: TaskId,

    /// Who is creating the edge
    pub created_by: String,
}

/// Outcome of a cycle pre-flight check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleCheck {
    /// Whether the proposed edge would close a cycle
    pub would_cycle: bool,

    /// The offending loop, starting at the proposed dependent task.
    ///
    /// `None` when no cycle would be created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<TaskId>>,
}

impl CycleCheck {
    /// No cycle
    pub fn clear() -> Self {
        Self::default()
    }

    /// A cycle along the given path
    pub fn cycle(path: Vec<TaskId>) -> Self {
        Self {
            would_cycle: true,
            path: Some(path),
        }
    }
}

/// Derived readiness of a task that has dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    /// At least one direct blocker is not completed
    Blocked,

    /// Every direct blocker is completed
    Ready,
}

impl fmt::Display for DependencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyStatus::Blocked => write!(f, "blocked"),
            DependencyStatus::Ready => write!(f, "ready"),
        }
    }
}

/// Per-task view derived from the edge set and task statuses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// Whether any direct blocker is incomplete
    pub is_blocked: bool,

    /// Direct blockers whose status is not completed
    pub blocked_by: Vec<Task>,

    /// IDs of `blocked_by`
    pub blocked_by_ids: Vec<TaskId>,

    /// Tasks for which this task is a direct blocker
    pub blocks: Vec<Task>,

    /// IDs of `blocks`
    pub blocks_ids: Vec<TaskId>,

    /// `None` when the task has no dependency edges at all
    pub dependency_status: Option<DependencyStatus>,

    /// Number of direct blockers, completed or not
    pub dependency_count: usize,
}

/// One entry of an upstream or downstream chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    /// The reached task
    pub task: Task,

    /// Distance from the starting task (1 = direct neighbour)
    pub depth: usize,
}

/// Bulk integrity report for one blocked task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedTaskInfo {
    /// The blocked task
    pub task_id: TaskId,

    /// Its title, for display
    pub task_name: String,

    /// Number of incomplete direct blockers
    pub blocked_by_count: usize,
}

/// Result of removing edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    /// Number of edges removed
    pub deleted_count: usize,
}

/// Remediation chosen by the caller when a bulk start hits blocked tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkStartPolicy {
    /// Only transition tasks that are not blocked
    SkipBlocked,

    /// Transition every requested task regardless of blockers
    ForceAll,
}

/// Result of a bulk "move to in-progress" operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkStartOutcome {
    /// Tasks moved to in-progress
    pub started: Vec<TaskId>,

    /// Blocked tasks left untouched (always empty under `ForceAll`)
    pub skipped: Vec<BlockedTaskInfo>,
}
