//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::TaskStatus;

/// Task status for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatusArg {
    /// Not started yet
    Pending,
    /// Currently being worked on
    #[value(name = "in_progress", alias = "in-progress")]
    InProgress,
    /// Done
    #[value(alias = "done")]
    Completed,
}

impl std::fmt::Display for TaskStatusArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        TaskStatus::from(*self).fmt(f)
    }
}

impl From<TaskStatusArg> for TaskStatus {
    fn from(arg: TaskStatusArg) -> Self {
        match arg {
            TaskStatusArg::Pending => TaskStatus::Pending,
            TaskStatusArg::InProgress => TaskStatus::InProgress,
            TaskStatusArg::Completed => TaskStatus::Completed,
        }
    }
}
