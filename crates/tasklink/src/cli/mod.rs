//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a new tasklink repository
//! - `info`: Show repository information
//! - `task`: Add, list, update or delete tasks
//! - `dep`: Add, remove, list, check and suggest dependencies
//! - `show`: Show the dependency view of one task
//! - `chain`: Show the upstream or downstream chain of a task
//! - `blocked`: Report blocked tasks
//! - `start`: Move tasks to in progress
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! tasklink task add "Design schema"
//! tasklink dep add task-a3f8 task-9k2x
//! tasklink start task-a3f8 --skip-blocked
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    BlockedArgs, ChainArgs, DepAction, DepArgs, DepRemoveArgs, InfoArgs, InitArgs, ShowArgs,
    StartArgs, TaskAction, TaskArgs,
};
pub use types::TaskStatusArg;
pub use validators::{validate_actor, validate_id, validate_prefix, validate_title};

/// Tasklink - dependency tracking between tasks
///
/// Records which tasks block which, refuses dependencies that would form a
/// cycle, and reports what is ready to start. Data lives in `.tasklink/`.
#[derive(Parser, Debug)]
#[command(name = "tasklink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new tasklink repository
    ///
    /// Creates the `.tasklink/` directory with configuration and empty data
    /// files. Run this once in your project root.
    Init(InitArgs),

    /// Show repository information
    Info(InfoArgs),

    /// Manage tasks
    Task(TaskArgs),

    /// Manage dependencies between tasks
    Dep(DepArgs),

    /// Show the dependency view of a task
    ///
    /// Lists its incomplete blockers, the tasks it blocks, and whether it is
    /// ready to start.
    Show(ShowArgs),

    /// Show every task a task transitively depends on (or, with --down,
    /// every task that transitively depends on it)
    Chain(ChainArgs),

    /// Report blocked tasks
    Blocked(BlockedArgs),

    /// Move tasks to in progress
    ///
    /// Blocked tasks stop the whole request unless --skip-blocked or
    /// --force is given.
    Start(StartArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any error from repository discovery or the command itself.
    pub async fn execute(&self) -> Result<()> {
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("Tasklink dependency tracker");
            println!("Use --help for more information");
            return Ok(());
        };

        match command {
            Commands::Init(args) => execute::execute_init(args).await,
            Commands::Info(args) => {
                execute::execute_info(&open_app().await?, args, output_mode).await
            }
            Commands::Task(args) => {
                execute::execute_task(&open_app().await?, args, output_mode).await
            }
            Commands::Dep(args) => {
                execute::execute_dep(&open_app().await?, args, output_mode).await
            }
            Commands::Show(args) => {
                execute::execute_show(&open_app().await?, args, output_mode).await
            }
            Commands::Chain(args) => {
                execute::execute_chain(&open_app().await?, args, output_mode).await
            }
            Commands::Blocked(args) => {
                execute::execute_blocked(&open_app().await?, args, output_mode).await
            }
            Commands::Start(args) => {
                execute::execute_start(&open_app().await?, args, output_mode).await
            }
        }
    }
}

/// Open the repository containing the current directory.
async fn open_app() -> Result<crate::app::App> {
    Ok(crate::app::App::from_directory(&std::env::current_dir()?).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_command() {
        let cli = Cli::try_parse_from(["tasklink"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_global_json_flag() {
        let cli = Cli::try_parse_from(["tasklink", "task", "list", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Commands::Task(_))));
    }

    #[test]
    fn test_parse_init_with_prefix() {
        let cli = Cli::try_parse_from(["tasklink", "init", "--prefix", "myproj", "-q"]).unwrap();
        match cli.command {
            Some(Commands::Init(args)) => {
                assert_eq!(args.prefix, Some("myproj".to_string()));
                assert!(args.quiet);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_parse_init_invalid_prefix() {
        assert!(Cli::try_parse_from(["tasklink", "init", "--prefix", "x"]).is_err());
    }

    #[test]
    fn test_parse_task_add_trims_title() {
        let cli = Cli::try_parse_from(["tasklink", "task", "add", "  Write docs "]).unwrap();
        match cli.command {
            Some(Commands::Task(TaskArgs {
                action: TaskAction::Add { title },
            })) => assert_eq!(title, "Write docs"),
            _ => panic!("Expected task add"),
        }
    }

    #[test]
    fn test_parse_task_status_alias() {
        let cli =
            Cli::try_parse_from(["tasklink", "task", "status", "task-a1", "in-progress"]).unwrap();
        match cli.command {
            Some(Commands::Task(TaskArgs {
                action: TaskAction::Status { task_id, status },
            })) => {
                assert_eq!(task_id, "task-a1");
                assert_eq!(status, TaskStatusArg::InProgress);
            }
            _ => panic!("Expected task status"),
        }
    }

    #[test]
    fn test_parse_dep_add_default_author() {
        let cli = Cli::try_parse_from(["tasklink", "dep", "add", "task-a1", "task-b2"]).unwrap();
        match cli.command {
            Some(Commands::Dep(DepArgs {
                action:
                    DepAction::Add {
                        dependent,
                        blocking,
                        created_by,
                    },
            })) => {
                assert_eq!(dependent, "task-a1");
                assert_eq!(blocking, "task-b2");
                assert_eq!(created_by, "cli");
            }
            _ => panic!("Expected dep add"),
        }
    }

    #[test]
    fn test_parse_dep_remove_requires_target() {
        assert!(Cli::try_parse_from(["tasklink", "dep", "remove"]).is_err());
        assert!(
            Cli::try_parse_from(["tasklink", "dep", "remove", "dep-x1", "--task", "task-a1"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["tasklink", "dep", "remove", "--task", "task-a1"]).unwrap();
        match cli.command {
            Some(Commands::Dep(DepArgs {
                action: DepAction::Remove(args),
            })) => {
                assert!(args.edge_id.is_none());
                assert_eq!(args.task.as_deref(), Some("task-a1"));
            }
            _ => panic!("Expected dep remove"),
        }
    }

    #[test]
    fn test_parse_dep_list_reverse_requires_task() {
        assert!(Cli::try_parse_from(["tasklink", "dep", "list", "--reverse"]).is_err());
        assert!(Cli::try_parse_from(["tasklink", "dep", "list", "task-a1", "-r"]).is_ok());
    }

    #[test]
    fn test_parse_chain_down() {
        let cli = Cli::try_parse_from(["tasklink", "chain", "task-a1", "--down"]).unwrap();
        match cli.command {
            Some(Commands::Chain(args)) => assert!(args.down),
            _ => panic!("Expected chain"),
        }
    }

    #[test]
    fn test_parse_blocked_without_ids() {
        let cli = Cli::try_parse_from(["tasklink", "blocked"]).unwrap();
        match cli.command {
            Some(Commands::Blocked(args)) => assert!(args.task_ids.is_empty()),
            _ => panic!("Expected blocked"),
        }
    }

    #[test]
    fn test_parse_start_flags() {
        assert!(Cli::try_parse_from(["tasklink", "start"]).is_err());
        assert!(
            Cli::try_parse_from(["tasklink", "start", "task-a1", "--skip-blocked", "--force"])
                .is_err()
        );

        let cli =
            Cli::try_parse_from(["tasklink", "start", "task-a1", "task-b2", "--skip-blocked"])
                .unwrap();
        match cli.command {
            Some(Commands::Start(args)) => {
                assert_eq!(args.task_ids, vec!["task-a1", "task-b2"]);
                assert!(args.skip_blocked);
                assert!(!args.force);
            }
            _ => panic!("Expected start"),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_id() {
        assert!(Cli::try_parse_from(["tasklink", "show", "nohyphen"]).is_err());
    }
}
