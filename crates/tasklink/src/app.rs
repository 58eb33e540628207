//! Application context for CLI command execution.
//!
//! # Example
//!
//! ```no_run
//! use tasklink::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let tasks = app.engine().list_tasks().await?;
//!     println!("{} tasks", tasks.len());
//!     Ok(())
//! }
//! ```

use crate::commands::init::find_tasklink_root;
use crate::config::{TasklinkConfig, CONFIG_FILE_NAME, TASKLINK_DIR_NAME};
use crate::engine::DependencyEngine;
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
///
/// Locates the repository, loads its configuration, and opens the engine
/// over the configured stores.
#[derive(Debug)]
pub struct App {
    engine: DependencyEngine,
    tasklink_dir: PathBuf,
    prefix: String,
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.tasklink/`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No repository is found in the directory tree
    /// - Configuration cannot be loaded
    /// - Storage initialization fails
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_tasklink_root(working_dir).ok_or(ConfigError::NotInitialized)?;

        let tasklink_dir = root_dir.join(TASKLINK_DIR_NAME);
        let config = TasklinkConfig::load(&tasklink_dir.join(CONFIG_FILE_NAME)).await?;

        let backend = config.storage.to_backend(&root_dir)?;
        tracing::debug!(?backend, prefix = %config.task_prefix, "Opening stores");
        let engine = DependencyEngine::open(backend, config.task_prefix.clone()).await?;

        Ok(Self {
            engine,
            tasklink_dir,
            prefix: config.task_prefix,
        })
    }

    /// The dependency engine.
    pub fn engine(&self) -> &DependencyEngine {
        &self.engine
    }

    /// The task ID prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path to the `.tasklink` directory.
    pub fn tasklink_dir(&self) -> &Path {
        &self.tasklink_dir
    }
}
