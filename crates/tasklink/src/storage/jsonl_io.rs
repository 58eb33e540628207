//! Line-oriented JSON file reading and atomic writing.
//!
//! Reading is resilient: a malformed line is reported and skipped rather
//! than failing the whole file. Writing goes through a sibling temp file that
//! is renamed over the target, so a crash mid-write leaves the old file intact.

use crate::error::{Result, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// A line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number
    pub line_number: usize,
    /// Parser message
    pub error: String,
}

/// A parsed record and the 1-based line it came from.
pub type Numbered<T> = (usize, T);

/// Read every parseable record from a JSONL file.
///
/// Blank lines are ignored. Lines that fail to parse are returned as
/// [`MalformedLine`]s.
///
/// # Errors
///
/// Returns an error only if the file cannot be opened or read.
pub async fn read_jsonl_resilient<T: DeserializeOwned>(
    path: &Path,
) -> Result<(Vec<Numbered<T>>, Vec<MalformedLine>)> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut records = Vec::new();
    let mut malformed = Vec::new();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(trimmed) {
            Ok(record) => records.push((line_number, record)),
            Err(e) => malformed.push(MalformedLine {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    Ok((records, malformed))
}

/// Atomically replace `path` with one JSON line per value.
///
/// # Errors
///
/// Returns an error if serialization, writing, or the final rename fails.
/// The temp file is removed on a failed write.
pub async fn write_jsonl_atomic<T: Serialize>(path: &Path, values: &[T]) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Err(e) = write_lines(&temp_path, values).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

async fn write_lines<T: Serialize>(temp_path: &Path, values: &[T]) -> Result<()> {
    let file = File::create(temp_path).await?;
    let mut writer = BufWriter::new(file);

    for value in values {
        let json = serde_json::to_string(value).map_err(StorageError::Serialization)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    Ok(())
}

/// `tasks.jsonl` becomes `tasks.jsonl.tmp`; a bare name gets `.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let extension = match path.extension() {
        Some(ext) => {
            let mut ext = ext.to_os_string();
            ext.push(".tmp");
            ext
        }
        None => OsString::from("tmp"),
    };
    path.with_extension(extension)
}
