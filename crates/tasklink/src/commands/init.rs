//! Implementation of the `init` command.
//!
//! Creates the `.tasklink/` directory with configuration, empty data files,
//! and a `.gitignore`.

use crate::config::{
    TasklinkConfig, CONFIG_FILE_NAME, DEFAULT_PREFIX, DEPENDENCIES_FILE_NAME, TASKLINK_DIR_NAME,
    TASKS_FILE_NAME,
};
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within .tasklink
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Minimum prefix length
pub const MIN_PREFIX_LENGTH: usize = 2;

/// Maximum prefix length
pub const MAX_PREFIX_LENGTH: usize = 20;

/// Maximum directory depth to traverse when searching for the repository root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created tasklink directory
    pub tasklink_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created task file
    pub tasks_file: PathBuf,
    /// Path to the created dependency file
    pub dependencies_file: PathBuf,
    /// The prefix used for task IDs
    pub prefix: String,
}

/// Validate task ID prefix format.
///
/// 2-20 ASCII alphanumeric characters. Expects pre-trimmed input.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPrefix`] describing the first violated rule.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.len() < MIN_PREFIX_LENGTH {
        return Err(ConfigError::InvalidPrefix(format!(
            "Prefix must be at least {MIN_PREFIX_LENGTH} characters"
        ))
        .into());
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(ConfigError::InvalidPrefix(format!(
            "Prefix cannot exceed {MAX_PREFIX_LENGTH} characters"
        ))
        .into());
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::InvalidPrefix(
            "Prefix must contain only alphanumeric characters".to_string(),
        )
        .into());
    }

    Ok(())
}

/// Initialize a new tasklink repository in `base_dir`.
///
/// # Errors
///
/// Returns an error if `.tasklink/` already exists, the prefix is invalid,
/// or a file system operation fails.
pub async fn init(base_dir: &Path, prefix: Option<&str>) -> Result<InitResult> {
    let prefix = prefix.unwrap_or(DEFAULT_PREFIX).trim();
    validate_prefix(prefix)?;

    let tasklink_dir = base_dir.join(TASKLINK_DIR_NAME);
    if tasklink_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(TASKLINK_DIR_NAME.to_string()).into());
    }

    fs::create_dir_all(&tasklink_dir).await?;

    let config_file = tasklink_dir.join(CONFIG_FILE_NAME);
    TasklinkConfig::new(prefix).save(&config_file).await?;

    let tasks_file = tasklink_dir.join(TASKS_FILE_NAME);
    fs::write(&tasks_file, "").await?;

    let dependencies_file = tasklink_dir.join(DEPENDENCIES_FILE_NAME);
    fs::write(&dependencies_file, "").await?;

    let gitignore_content = "\
# Temp files from interrupted atomic writes
*.tmp
";
    fs::write(tasklink_dir.join(GITIGNORE_FILE_NAME), gitignore_content).await?;

    tracing::info!(path = %tasklink_dir.display(), prefix, "Initialized tasklink repository");

    Ok(InitResult {
        tasklink_dir,
        config_file,
        tasks_file,
        dependencies_file,
        prefix: prefix.to_string(),
    })
}

/// Find the repository root by searching up the directory tree.
///
/// Returns the directory containing `.tasklink/`, or `None` if none is found
/// before the filesystem root or the depth limit.
pub fn find_tasklink_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(TASKLINK_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::valid_short("ab")]
    #[case::valid_default("task")]
    #[case::valid_alphanumeric("test123")]
    #[case::valid_mixed_case("ProjTest123")]
    #[case::valid_max_length("a1b2c3d4e5f6g7h8i9j0")]
    fn test_validate_prefix_valid(#[case] prefix: &str) {
        assert!(validate_prefix(prefix).is_ok());
    }

    #[rstest]
    #[case::too_short_single("a", "at least 2")]
    #[case::too_short_empty("", "at least 2")]
    #[case::too_long("a".repeat(21), "cannot exceed 20")]
    #[case::hyphen("proj-test", "alphanumeric")]
    #[case::space("proj test", "alphanumeric")]
    fn test_validate_prefix_invalid(#[case] prefix: impl AsRef<str>, #[case] expected: &str) {
        let err = validate_prefix(prefix.as_ref()).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidPrefix(_))));
        assert!(
            err.to_string().contains(expected),
            "expected '{expected}' in '{err}'"
        );
    }

    #[tokio::test]
    async fn test_init_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), Some("  demo  ")).await.unwrap();

        assert_eq!(result.prefix, "demo");
        assert!(result.config_file.exists());
        assert!(result.tasks_file.exists());
        assert!(result.dependencies_file.exists());
        assert!(result.tasklink_dir.join(GITIGNORE_FILE_NAME).exists());

        let config = TasklinkConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config.task_prefix, "demo");
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).await.unwrap();

        let err = init(temp_dir.path(), None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::AlreadyInitialized(_))
        ));
    }

    #[tokio::test]
    async fn test_find_root_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        init(temp_dir.path(), None).await.unwrap();

        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_tasklink_root(&nested).as_deref(),
            Some(temp_dir.path())
        );
    }

    #[test]
    fn test_find_root_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(find_tasklink_root(temp_dir.path()).is_none());
    }
}
