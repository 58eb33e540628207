//! Error types for tasklink operations.

use crate::domain::{EdgeId, TaskId};
use std::io;
use thiserror::Error;

/// Reasons a dependency mutation is rejected.
///
/// Variants are listed in the order the validator checks them; the first
/// failing check wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    /// A task cannot depend on itself.
    #[error("Task {task_id} cannot depend on itself")]
    SelfReference {
        /// The offending task
        task_id: TaskId,
    },

    /// A referenced task does not exist.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// The ordered pair already exists.
    #[error("Dependency already exists: {dependent} -> {blocking}")]
    DuplicateEdge {
        /// Dependent end of the existing edge
        dependent: TaskId,
        /// Blocking end of the existing edge
        blocking: TaskId,
    },

    /// The dependent task already references the maximum number of blockers.
    #[error("Task {task_id} already has the maximum of {limit} dependencies")]
    LimitExceeded {
        /// The dependent task
        task_id: TaskId,
        /// The fan-out limit
        limit: usize,
    },

    /// The edge would close a loop.
    #[error("Circular dependency: {}", format_path(.path))]
    CircularDependency {
        /// The loop, starting at the proposed dependent task
        path: Vec<TaskId>,
    },

    /// No edge has the given ID.
    #[error("Dependency not found: {0}")]
    EdgeNotFound(EdgeId),
}

fn format_path(path: &[TaskId]) -> String {
    let mut parts: Vec<&str> = path.iter().map(TaskId::as_str).collect();
    if let Some(first) = path.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Record failed to serialize.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Record data failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// ID generation failed.
    #[error("ID generation failed: {0}")]
    IdGeneration(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.tasklink/` directory found.
    #[error("Not a tasklink repository (or any parent up to the filesystem root). Run 'tasklink init' first.")]
    NotInitialized,

    /// Repository already initialized.
    #[error("Tasklink is already initialized in this directory. Found existing '{0}'")]
    AlreadyInitialized(String),

    /// The ID prefix is invalid.
    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),

    /// The configuration file could not be parsed or written.
    #[error("YAML error: {0}")]
    Yaml(String),

    /// Unsupported storage backend name.
    #[error("Unsupported storage backend: {0}")]
    UnsupportedBackend(String),
}

/// The error type for tasklink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A dependency mutation or query was rejected.
    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// Storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns the dependency rejection, if this is one.
    pub fn as_dependency(&self) -> Option<&DependencyError> {
        match self {
            Error::Dependency(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized Result type for tasklink operations.
pub type Result<T> = std::result::Result<T, Error>;
