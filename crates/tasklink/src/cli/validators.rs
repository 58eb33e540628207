//! CLI input validation functions.
//!
//! These run as clap `value_parser`s so bad input is rejected at parse time.

use crate::domain::MAX_TITLE_LENGTH;

/// Validate task ID prefix format.
///
/// Delegates to `commands::init::validate_prefix` so the rules live in one place.
pub fn validate_prefix(s: &str) -> Result<String, String> {
    use crate::commands::init;

    let trimmed = s.trim();
    init::validate_prefix(trimmed).map_err(|e| e.to_string())?;
    Ok(trimmed.to_string())
}

/// Validate a task or edge ID.
///
/// Expected format: `prefix-suffix`, where the prefix follows
/// [`validate_prefix`] and the suffix is alphanumeric segments joined by
/// single hyphens.
///
/// Examples: `task-a3f8`, `proj-12x`, `dep-k2m9`
pub fn validate_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("ID cannot be empty".to_string());
    }

    let Some((prefix, suffix)) = s.split_once('-') else {
        return Err(format!(
            "Invalid ID format: '{s}'. Expected format: prefix-suffix (e.g., task-a3f8)"
        ));
    };

    validate_prefix(prefix).map_err(|e| format!("ID {}", e.to_lowercase()))?;

    if suffix.is_empty() {
        return Err("ID suffix cannot be empty".to_string());
    }

    if !suffix
        .split('-')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()))
    {
        return Err(
            "ID suffix must be alphanumeric segments separated by single hyphens".to_string(),
        );
    }

    Ok(s.to_string())
}

/// Validate a task title.
///
/// Non-empty after trimming, at most [`MAX_TITLE_LENGTH`] characters, single
/// line, and free of control characters.
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    let length = s.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters, got {length} characters"
        ));
    }

    if s.contains('\n') || s.contains('\r') {
        return Err("Title cannot contain newline characters".to_string());
    }

    // Tab is allowed.
    if let Some(pos) = s.chars().position(|c| c != '\t' && c.is_control()) {
        return Err(format!(
            "Title contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Validate the `created_by` attribution recorded on new edges.
pub fn validate_actor(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Author cannot be empty".to_string());
    }
    if s.chars().any(char::is_control) {
        return Err("Author cannot contain control characters".to_string());
    }
    Ok(s.to_string())
}
