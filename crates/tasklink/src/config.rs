//! Repository configuration (`.tasklink/config.yaml`).

use crate::error::{ConfigError, Result};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Default task ID prefix if none specified
pub const DEFAULT_PREFIX: &str = "task";

/// Name of the tasklink directory
pub const TASKLINK_DIR_NAME: &str = ".tasklink";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the task data file
pub const TASKS_FILE_NAME: &str = "tasks.jsonl";

/// Name of the dependency data file
pub const DEPENDENCIES_FILE_NAME: &str = "dependencies.jsonl";

/// Backend name for JSONL-persisted in-memory stores
pub const BACKEND_JSONL: &str = "jsonl";

/// Backend name for ephemeral in-memory stores
pub const BACKEND_MEMORY: &str = "memory";

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TasklinkConfig {
    /// Task ID prefix (e.g., "task" for "task-a3f8")
    #[serde(rename = "task-prefix")]
    pub task_prefix: String,

    /// Storage configuration
    pub storage: StorageConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Backend type: "jsonl" or "memory"
    pub backend: String,

    /// Task file, relative to the repository root
    pub tasks_file: String,

    /// Dependency file, relative to the repository root
    pub dependencies_file: String,
}

impl StorageConfig {
    /// Resolve this section into a backend rooted at `root_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedBackend`] for an unknown backend name.
    pub fn to_backend(&self, root_dir: &Path) -> Result<StorageBackend> {
        match self.backend.as_str() {
            BACKEND_JSONL => Ok(StorageBackend::Jsonl {
                tasks: root_dir.join(&self.tasks_file),
                dependencies: root_dir.join(&self.dependencies_file),
            }),
            BACKEND_MEMORY => Ok(StorageBackend::InMemory),
            other => Err(ConfigError::UnsupportedBackend(other.to_string()).into()),
        }
    }
}

impl TasklinkConfig {
    /// Create a configuration with the given prefix and JSONL storage
    pub fn new(prefix: &str) -> Self {
        Self {
            task_prefix: prefix.to_string(),
            storage: StorageConfig {
                backend: BACKEND_JSONL.to_string(),
                tasks_file: format!("{TASKLINK_DIR_NAME}/{TASKS_FILE_NAME}"),
                dependencies_file: format!("{TASKLINK_DIR_NAME}/{DEPENDENCIES_FILE_NAME}"),
            },
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Yaml(e.to_string()).into())
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

impl Default for TasklinkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
