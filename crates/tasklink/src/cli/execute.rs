//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands.

use anyhow::Result;

use super::args::{
    BlockedArgs, ChainArgs, DepAction, DepArgs, DepRemoveArgs, InfoArgs, InitArgs, ShowArgs,
    StartArgs, TaskAction, TaskArgs,
};
use crate::app::App;
use crate::domain::{BulkStartPolicy, EdgeId, NewTask, TaskId, TaskStatus};
use crate::error::{DependencyError, Error};
use crate::output::{self, ChainDirection, OutputMode};

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;

    if !args.quiet {
        println!(
            "Initializing tasklink repository{}...",
            args.prefix
                .as_ref()
                .map(|p| format!(" with prefix '{p}'"))
                .unwrap_or_default()
        );
    }

    let result = init::init(&current_dir, args.prefix.as_deref()).await?;

    if !args.quiet {
        println!("Initialized tasklink in {}", result.tasklink_dir.display());
        println!("  Config:       {}", result.config_file.display());
        println!("  Tasks:        {}", result.tasks_file.display());
        println!("  Dependencies: {}", result.dependencies_file.display());
        println!("  Task prefix:  {}", result.prefix);
    }

    Ok(())
}

/// Execute the info command
pub async fn execute_info(app: &App, _args: &InfoArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();
    let tasks = engine.list_tasks().await?;
    let edge_count = engine.list_dependencies().await?.len();
    let index = engine.dependency_index().await?;

    let (pending, in_progress, completed) =
        tasks
            .iter()
            .fold((0, 0, 0), |(p, ip, c), task| match task.status {
                TaskStatus::Pending => (p + 1, ip, c),
                TaskStatus::InProgress => (p, ip + 1, c),
                TaskStatus::Completed => (p, ip, c + 1),
            });
    let blocked = index.values().filter(|info| info.is_blocked).count();

    match output_mode {
        OutputMode::Json => {
            output::print_json(&serde_json::json!({
                "tasklink_dir": app.tasklink_dir().display().to_string(),
                "task_prefix": app.prefix(),
                "tasks": {
                    "total": tasks.len(),
                    "pending": pending,
                    "in_progress": in_progress,
                    "completed": completed,
                    "blocked": blocked,
                },
                "dependencies": edge_count,
            }))?;
        }
        OutputMode::Text => {
            println!("Tasklink Repository Information");
            println!("==============================");
            println!();
            println!("Directory:    {}", app.tasklink_dir().display());
            println!("Task prefix:  {}", app.prefix());
            println!();
            println!(
                "Tasks: {} total ({pending} pending, {in_progress} in progress, \
                 {completed} completed)",
                tasks.len()
            );
            println!("Blocked tasks: {blocked}");
            println!("Dependencies:  {edge_count}");
        }
    }

    Ok(())
}

/// Execute the task command
pub async fn execute_task(app: &App, args: &TaskArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();

    match &args.action {
        TaskAction::Add { title } => {
            let task = engine.create_task(NewTask::new(title.clone())).await?;
            match output_mode {
                OutputMode::Json => output::print_json(&task)?,
                OutputMode::Text => println!("Created task: {} {}", task.id, task.title),
            }
        }
        TaskAction::List { status } => {
            let mut tasks = engine.list_tasks().await?;
            if let Some(status) = status {
                let status = TaskStatus::from(*status);
                tasks.retain(|task| task.status == status);
            }
            output::print_tasks(&tasks, output_mode)?;
        }
        TaskAction::Status { task_id, status } => {
            let task = engine
                .set_status(&TaskId::new(task_id), (*status).into())
                .await?;
            match output_mode {
                OutputMode::Json => output::print_json(&task)?,
                OutputMode::Text => println!("Updated {}: status is now {}", task.id, task.status),
            }
        }
        TaskAction::Delete { task_id } => {
            let summary = engine.delete_task(&TaskId::new(task_id)).await?;
            match output_mode {
                OutputMode::Json => output::print_json(&serde_json::json!({
                    "deleted_task": task_id,
                    "deleted_count": summary.deleted_count,
                }))?,
                OutputMode::Text => println!(
                    "Deleted task {task_id} and {} dependency(ies)",
                    summary.deleted_count
                ),
            }
        }
    }

    Ok(())
}

/// Execute the dep command
pub async fn execute_dep(app: &App, args: &DepArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();

    match &args.action {
        DepAction::Add {
            dependent,
            blocking,
            created_by,
        } => {
            let dependent = TaskId::new(dependent);
            let blocking = TaskId::new(blocking);
            let edge = match engine
                .create_dependency(&dependent, &blocking, created_by.as_str())
                .await
            {
                Ok(edge) => edge,
                Err(e) => return Err(describe_rejection(app, e).await),
            };

            match output_mode {
                OutputMode::Json => output::print_json(&edge)?,
                OutputMode::Text => println!(
                    "Added dependency {}: {} depends on {}",
                    edge.id, edge.dependent_task_id, edge.blocking_task_id
                ),
            }
        }
        DepAction::Remove(remove) => execute_dep_remove(app, remove, output_mode).await?,
        DepAction::List { task_id, reverse } => {
            let edges = match task_id {
                Some(id) if *reverse => engine.dependents_of(&TaskId::new(id)).await?,
                Some(id) => engine.dependencies_of(&TaskId::new(id)).await?,
                None => engine.list_dependencies().await?,
            };
            output::print_edges(&edges, output_mode)?;
        }
        DepAction::Check {
            dependent,
            blocking,
        } => {
            let check = engine
                .would_create_cycle(&TaskId::new(dependent), &TaskId::new(blocking))
                .await?;
            let rendered = match &check.path {
                Some(path) => engine.format_cycle_path(path).await?,
                None => String::new(),
            };
            output::print_cycle_check(&check, &rendered, output_mode)?;
        }
        DepAction::Candidates { task_id } => {
            let candidates = engine.eligible_blockers(&TaskId::new(task_id)).await?;
            output::print_tasks(&candidates, output_mode)?;
        }
    }

    Ok(())
}

async fn execute_dep_remove(
    app: &App,
    args: &DepRemoveArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let engine = app.engine();

    if let Some(edge_id) = &args.edge_id {
        engine.delete_dependency(&EdgeId::new(edge_id)).await?;
        match output_mode {
            OutputMode::Json => output::print_json(&serde_json::json!({
                "deleted_edge": edge_id,
                "deleted_count": 1,
            }))?,
            OutputMode::Text => println!("Removed dependency {edge_id}"),
        }
        return Ok(());
    }

    if let Some(task_id) = &args.task {
        let summary = engine
            .delete_dependencies_for_task(&TaskId::new(task_id))
            .await?;
        match output_mode {
            OutputMode::Json => output::print_json(&summary)?,
            OutputMode::Text => println!(
                "Removed {} dependency(ies) referencing {task_id}",
                summary.deleted_count
            ),
        }
    }

    Ok(())
}

/// Turn a rejected dependency into a user-facing error, spelling out cycles
/// with task titles.
async fn describe_rejection(app: &App, err: Error) -> anyhow::Error {
    if let Some(DependencyError::CircularDependency { path }) = err.as_dependency() {
        if let Ok(rendered) = app.engine().format_cycle_path(path).await {
            return anyhow::Error::new(err).context(format!("Cycle: {rendered}"));
        }
    }
    err.into()
}

/// Execute the show command
pub async fn execute_show(app: &App, args: &ShowArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();
    let task_id = TaskId::new(&args.task_id);

    let Some(task) = engine.get_task(&task_id).await? else {
        return Err(Error::from(DependencyError::TaskNotFound(task_id)).into());
    };
    let info = engine.dependency_info(&task_id).await?;

    output::print_dependency_info(&task, &info, output_mode)?;
    Ok(())
}

/// Execute the chain command
pub async fn execute_chain(app: &App, args: &ChainArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();
    let task_id = TaskId::new(&args.task_id);

    let Some(task) = engine.get_task(&task_id).await? else {
        return Err(Error::from(DependencyError::TaskNotFound(task_id)).into());
    };

    let (entries, direction) = if args.down {
        (
            engine.downstream_chain(&task_id).await?,
            ChainDirection::Downstream,
        )
    } else {
        (
            engine.upstream_chain(&task_id).await?,
            ChainDirection::Upstream,
        )
    };

    output::print_chain(&task, &entries, direction, output_mode)?;
    Ok(())
}

/// Execute the blocked command
pub async fn execute_blocked(app: &App, args: &BlockedArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();

    let task_ids: Vec<TaskId> = if args.task_ids.is_empty() {
        engine
            .list_tasks()
            .await?
            .into_iter()
            .map(|task| task.id)
            .collect()
    } else {
        args.task_ids.iter().map(TaskId::new).collect()
    };

    let blocked = engine.blocked_tasks_info(&task_ids).await?;
    output::print_blocked(&blocked, output_mode)?;
    Ok(())
}

/// Execute the start command
///
/// Without `--skip-blocked` or `--force`, any blocked task aborts the whole
/// request after printing the report; nothing is changed.
pub async fn execute_start(app: &App, args: &StartArgs, output_mode: OutputMode) -> Result<()> {
    let engine = app.engine();
    let task_ids: Vec<TaskId> = args.task_ids.iter().map(TaskId::new).collect();

    let policy = match (args.skip_blocked, args.force) {
        (true, _) => BulkStartPolicy::SkipBlocked,
        (_, true) => BulkStartPolicy::ForceAll,
        (false, false) => {
            let blocked = engine.blocked_tasks_info(&task_ids).await?;
            if !blocked.is_empty() {
                output::print_blocked(&blocked, output_mode)?;
                anyhow::bail!(
                    "{} task(s) are blocked; rerun with --skip-blocked or --force",
                    blocked.len()
                );
            }
            // Re-checked under the engine's write lock in case a blocker
            // changed since the report.
            BulkStartPolicy::SkipBlocked
        }
    };

    let outcome = engine.start_tasks(&task_ids, policy).await?;
    output::print_bulk_start(&outcome, output_mode)?;
    Ok(())
}
