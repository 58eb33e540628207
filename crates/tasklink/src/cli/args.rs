//! CLI argument structs for all commands.

use clap::{ArgGroup, Args, Parser, Subcommand};

use super::types::TaskStatusArg;
use super::validators::{validate_actor, validate_id, validate_prefix, validate_title};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Task ID prefix (e.g., "proj" for "proj-a3f8")
    ///
    /// Must be 2-20 alphanumeric characters.
    #[arg(short, long, value_parser = validate_prefix)]
    pub prefix: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {}

/// Arguments for the `task` command
#[derive(Parser, Debug, Clone)]
pub struct TaskArgs {
    /// Task action to perform
    #[command(subcommand)]
    pub action: TaskAction,
}

/// Task subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title (maximum 200 characters)
        #[arg(value_parser = validate_title)]
        title: String,
    },

    /// List tasks
    List {
        /// Only show tasks with this status
        #[arg(short, long, value_enum)]
        status: Option<TaskStatusArg>,
    },

    /// Change the status of a task
    ///
    /// Completing a task unblocks its dependents.
    Status {
        /// Task ID
        #[arg(value_parser = validate_id)]
        task_id: String,

        /// New status
        #[arg(value_enum)]
        status: TaskStatusArg,
    },

    /// Delete a task and every dependency that references it
    Delete {
        /// Task ID
        #[arg(value_parser = validate_id)]
        task_id: String,
    },
}

/// Arguments for the `dep` command
#[derive(Parser, Debug, Clone)]
pub struct DepArgs {
    /// Dependency action to perform
    #[command(subcommand)]
    pub action: DepAction,
}

/// Dependency subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DepAction {
    /// Record that DEPENDENT cannot start until BLOCKING is completed
    Add {
        /// Task that depends on the other
        #[arg(value_parser = validate_id)]
        dependent: String,

        /// Task that must be completed first
        #[arg(value_parser = validate_id)]
        blocking: String,

        /// Who is creating the dependency
        #[arg(long = "by", default_value = "cli", value_parser = validate_actor)]
        created_by: String,
    },

    /// Remove one dependency by ID, or every dependency of a task
    Remove(DepRemoveArgs),

    /// List dependencies
    ///
    /// Without a task, lists every dependency in creation order.
    List {
        /// Only dependencies where this task is the dependent
        #[arg(value_parser = validate_id)]
        task_id: Option<String>,

        /// With a task, list dependencies where it is the blocker instead
        #[arg(short, long, requires = "task_id")]
        reverse: bool,
    },

    /// Check whether a dependency would create a cycle, without adding it
    Check {
        /// Proposed dependent task
        #[arg(value_parser = validate_id)]
        dependent: String,

        /// Proposed blocking task
        #[arg(value_parser = validate_id)]
        blocking: String,
    },

    /// List tasks that could be added as blockers of a task
    Candidates {
        /// Task ID
        #[arg(value_parser = validate_id)]
        task_id: String,
    },
}

/// Arguments for `dep remove`
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("target").required(true).args(["edge_id", "task"])))]
pub struct DepRemoveArgs {
    /// Dependency ID
    #[arg(value_parser = validate_id)]
    pub edge_id: Option<String>,

    /// Remove every dependency that references this task
    #[arg(long, value_parser = validate_id)]
    pub task: Option<String>,
}

/// Arguments for the `show` command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Task ID to display
    #[arg(value_parser = validate_id)]
    pub task_id: String,
}

/// Arguments for the `chain` command
#[derive(Parser, Debug, Clone)]
pub struct ChainArgs {
    /// Task ID to start from
    #[arg(value_parser = validate_id)]
    pub task_id: String,

    /// Walk downstream (tasks that depend on this one) instead of upstream
    #[arg(short, long)]
    pub down: bool,
}

/// Arguments for the `blocked` command
#[derive(Parser, Debug, Clone)]
pub struct BlockedArgs {
    /// Task IDs to check; all tasks when omitted
    #[arg(value_parser = validate_id)]
    pub task_ids: Vec<String>,
}

/// Arguments for the `start` command
#[derive(Parser, Debug, Clone)]
pub struct StartArgs {
    /// Task IDs to move to in_progress
    #[arg(required = true, value_parser = validate_id)]
    pub task_ids: Vec<String>,

    /// Start only the tasks that are not blocked
    #[arg(long, conflicts_with = "force")]
    pub skip_blocked: bool,

    /// Start every task, even blocked ones
    #[arg(long)]
    pub force: bool,
}
