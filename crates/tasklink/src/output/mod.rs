//! Output formatting for CLI commands.
//!
//! Every printer has a text rendering, written against a generic writer so
//! it can be tested, and a JSON rendering for programmatic use.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons)

pub mod color;

use crate::domain::{
    BlockedTaskInfo, BulkStartOutcome, ChainEntry, CycleCheck, DependencyEdge, DependencyInfo,
    Task,
};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success, warning};

use color::{
    arrow, bold, colored_status_icon, colorize_dependency_status, colorize_id, colorize_status,
    dimmed,
};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: u16 = 80;
const DEFAULT_MAX_CONTENT_WIDTH: usize = 80;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Maximum content width for text wrapping.
    pub max_width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(max_width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `TASKLINK_MAX_WIDTH`: Maximum content width (default: 80)
    /// - `TASKLINK_ASCII`: Set to "1" or "true" for ASCII-only icons
    /// - `NO_COLOR`: Any value disables colors
    /// - `TASKLINK_COLOR`: Set to "0" or "false" to disable colors
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let max_width = match lookup("TASKLINK_MAX_WIDTH") {
            Some(s) if !s.is_empty() => match s.parse() {
                Ok(width) => width,
                Err(_) => {
                    tracing::warn!(
                        env_var = "TASKLINK_MAX_WIDTH",
                        value = %s,
                        default = DEFAULT_MAX_CONTENT_WIDTH,
                        "Invalid value, using default"
                    );
                    DEFAULT_MAX_CONTENT_WIDTH
                }
            },
            _ => DEFAULT_MAX_CONTENT_WIDTH,
        };

        let use_ascii = match lookup("TASKLINK_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "TASKLINK_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // https://no-color.org/
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("TASKLINK_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            max_width,
            use_ascii,
            use_colors,
        }
    }

    /// Content width bounded by both the terminal and `max_width`.
    fn effective_width(&self) -> usize {
        terminal_width().min(self.max_width).max(20)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_CONTENT_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| usize::from(w.0))
        .unwrap_or(usize::from(DEFAULT_TERMINAL_WIDTH))
}

fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    textwrap::wrap(text, max_width)
        .into_iter()
        .map(|s| s.into_owned())
        .collect()
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Direction of a rendered chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainDirection {
    /// Tasks the root depends on
    Upstream,
    /// Tasks that depend on the root
    Downstream,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print a JSON-formatted result for any serializable value
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(w, "{json}")
}

/// Print a simple message
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print one task
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_task(task: &Task, mode: OutputMode) -> io::Result<()> {
    dispatch(mode, task, |w, config| write_task_line(w, task, config))
}

/// Print a list of tasks
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_tasks(tasks: &[Task], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, tasks, |w, config| write_tasks_text(w, tasks, config))
}

/// Print a list of dependency edges
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_edges(edges: &[DependencyEdge], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, edges, |w, config| write_edges_text(w, edges, config))
}

/// Print the dependency view of one task (for the show command)
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_dependency_info(
    task: &Task,
    info: &DependencyInfo,
    mode: OutputMode,
) -> io::Result<()> {
    let json = serde_json::json!({ "task": task, "dependencies": info });
    dispatch(mode, &json, |w, config| {
        write_dependency_info_text(w, task, info, config)
    })
}

/// Print an upstream or downstream chain rooted at `root`
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_chain(
    root: &Task,
    entries: &[ChainEntry],
    direction: ChainDirection,
    mode: OutputMode,
) -> io::Result<()> {
    dispatch(mode, entries, |w, config| {
        write_chain_text(w, root, entries, direction, config)
    })
}

/// Print the outcome of a cycle pre-flight check
///
/// `rendered` is the human-readable loop, empty when there is none.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_cycle_check(check: &CycleCheck, rendered: &str, mode: OutputMode) -> io::Result<()> {
    dispatch(mode, check, |w, config| {
        write_cycle_check_text(w, check, rendered, config)
    })
}

/// Print the bulk blocked-task report
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_blocked(blocked: &[BlockedTaskInfo], mode: OutputMode) -> io::Result<()> {
    dispatch(mode, blocked, |w, config| {
        write_blocked_text(w, blocked, config)
    })
}

/// Print the result of a bulk start
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn print_bulk_start(outcome: &BulkStartOutcome, mode: OutputMode) -> io::Result<()> {
    dispatch(mode, outcome, |w, config| {
        write_bulk_start_text(w, outcome, config)
    })
}

fn dispatch<T, F>(mode: OutputMode, value: &T, text: F) -> io::Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut io::StdoutLock<'static>, &OutputConfig) -> io::Result<()>,
{
    let mut handle = io::stdout().lock();
    match mode {
        OutputMode::Json => write_json(&mut handle, value),
        OutputMode::Text => text(&mut handle, &OutputConfig::from_env()),
    }
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_task_line<W: Write>(w: &mut W, task: &Task, config: &OutputConfig) -> io::Result<()> {
    let prefix = format!(
        "{} {} ",
        colored_status_icon(task.status, config),
        colorize_id(task.id.as_str(), config)
    );
    // Unstyled width of "<icon> <id> ".
    let indent = task.id.as_str().chars().count() + 3;
    let width = config.effective_width().saturating_sub(indent).max(10);

    let mut lines = wrap_text(&task.title, width).into_iter();
    writeln!(w, "{prefix}{}", lines.next().unwrap_or_default())?;
    for line in lines {
        writeln!(w, "{:indent$}{line}", "")?;
    }
    Ok(())
}

fn write_tasks_text<W: Write>(w: &mut W, tasks: &[Task], config: &OutputConfig) -> io::Result<()> {
    if tasks.is_empty() {
        return writeln!(w, "No tasks found.");
    }
    for task in tasks {
        write_task_line(w, task, config)?;
    }
    writeln!(w)?;
    writeln!(w, "{}", dimmed(&format!("{} task(s)", tasks.len()), config))
}

fn write_edges_text<W: Write>(
    w: &mut W,
    edges: &[DependencyEdge],
    config: &OutputConfig,
) -> io::Result<()> {
    if edges.is_empty() {
        return writeln!(w, "No dependencies found.");
    }
    for edge in edges {
        writeln!(
            w,
            "{}  {} {} {}  {}",
            colorize_id(edge.id.as_str(), config),
            edge.dependent_task_id,
            arrow(config),
            edge.blocking_task_id,
            dimmed(&format!("by {}", edge.created_by), config)
        )?;
    }
    Ok(())
}

fn write_task_refs<W: Write>(
    w: &mut W,
    heading: &str,
    tasks: &[Task],
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{} ({}):", bold(heading, config), tasks.len())?;
    if tasks.is_empty() {
        return writeln!(w, "  {}", dimmed("(none)", config));
    }
    for task in tasks {
        writeln!(
            w,
            "  {} {} {}",
            colored_status_icon(task.status, config),
            colorize_id(task.id.as_str(), config),
            task.title
        )?;
    }
    Ok(())
}

fn write_dependency_info_text<W: Write>(
    w: &mut W,
    task: &Task,
    info: &DependencyInfo,
    config: &OutputConfig,
) -> io::Result<()> {
    write_task_line(w, task, config)?;
    writeln!(w)?;
    writeln!(
        w,
        "{} {}",
        dimmed("Status:           ", config),
        colorize_status(task.status, config)
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Dependency status:", config),
        colorize_dependency_status(info.dependency_status, config)
    )?;
    writeln!(
        w,
        "{} {}",
        dimmed("Direct blockers:  ", config),
        info.dependency_count
    )?;

    write_task_refs(w, "Blocked by", &info.blocked_by, config)?;
    write_task_refs(w, "Blocks", &info.blocks, config)
}

fn write_chain_text<W: Write>(
    w: &mut W,
    root: &Task,
    entries: &[ChainEntry],
    direction: ChainDirection,
    config: &OutputConfig,
) -> io::Result<()> {
    let heading = match direction {
        ChainDirection::Upstream => "depends on",
        ChainDirection::Downstream => "is required by",
    };
    writeln!(
        w,
        "{} {} {}",
        colorize_id(root.id.as_str(), config),
        root.title,
        dimmed(heading, config)
    )?;

    if entries.is_empty() {
        return writeln!(w, "  {}", dimmed("(nothing)", config));
    }

    for entry in entries {
        let indent = "  ".repeat(entry.depth);
        writeln!(
            w,
            "{indent}{} {} {} {}",
            dimmed(&format!("[{}]", entry.depth), config),
            colored_status_icon(entry.task.status, config),
            colorize_id(entry.task.id.as_str(), config),
            entry.task.title
        )?;
    }
    Ok(())
}

fn write_cycle_check_text<W: Write>(
    w: &mut W,
    check: &CycleCheck,
    rendered: &str,
    config: &OutputConfig,
) -> io::Result<()> {
    if !check.would_cycle {
        return writeln!(w, "{}", success("No cycle: the dependency can be added.", config));
    }
    writeln!(w, "{}", error("Adding this dependency would create a cycle:", config))?;
    writeln!(w, "  {rendered}")
}

fn write_blocked_text<W: Write>(
    w: &mut W,
    blocked: &[BlockedTaskInfo],
    config: &OutputConfig,
) -> io::Result<()> {
    if blocked.is_empty() {
        return writeln!(w, "No blocked tasks found.");
    }

    writeln!(w, "Found {} blocked task(s):", blocked.len())?;
    writeln!(w)?;
    for entry in blocked {
        writeln!(
            w,
            "  {} {}  {}",
            colorize_id(entry.task_id.as_str(), config),
            entry.task_name,
            warning(
                &format!("blocked by {} incomplete task(s)", entry.blocked_by_count),
                config
            )
        )?;
    }
    Ok(())
}

fn write_bulk_start_text<W: Write>(
    w: &mut W,
    outcome: &BulkStartOutcome,
    config: &OutputConfig,
) -> io::Result<()> {
    for id in &outcome.started {
        writeln!(
            w,
            "{} {}",
            success("Started", config),
            colorize_id(id.as_str(), config)
        )?;
    }
    for entry in &outcome.skipped {
        writeln!(
            w,
            "{} {} ({} blocker(s))",
            warning("Skipped", config),
            colorize_id(entry.task_id.as_str(), config),
            entry.blocked_by_count
        )?;
    }
    if outcome.started.is_empty() && outcome.skipped.is_empty() {
        writeln!(w, "Nothing to start.")?;
    }
    Ok(())
}
