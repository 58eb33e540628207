//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tasklink::domain::{NewTask, TaskId};
use tasklink::engine::DependencyEngine;
use tempfile::NamedTempFile;

/// Run the tasklink binary in the specified directory
pub fn run_tasklink_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tasklink"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute tasklink binary")
}

/// Run the binary with `--json` and parse stdout
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = run_tasklink_in_dir(dir, &full);
    assert!(
        output.status.success(),
        "tasklink {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

/// An in-memory engine with one pending task per title, IDs in title order
pub async fn engine_with(titles: &[&str]) -> (DependencyEngine, Vec<TaskId>) {
    let engine = DependencyEngine::in_memory("test");
    let mut ids = Vec::with_capacity(titles.len());
    for title in titles {
        let task = engine
            .create_task(NewTask::new(*title))
            .await
            .expect("create task");
        ids.push(task.id);
    }
    (engine, ids)
}

/// Write `content` to a fresh temp file
pub fn create_temp_jsonl_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

fn timestamp(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(offset_secs)
}

/// One task record as stored on disk
pub fn task_json(id: &str, title: &str, status: &str) -> String {
    let now = timestamp(0).to_rfc3339();
    serde_json::json!({
        "id": id,
        "title": title,
        "status": status,
        "created_at": now,
        "updated_at": now,
    })
    .to_string()
}

/// One edge record as stored on disk, created `order` seconds after the epoch used
pub fn edge_json(id: &str, dependent: &str, blocking: &str, order: i64) -> String {
    serde_json::json!({
        "id": id,
        "dependent_task_id": dependent,
        "blocking_task_id": blocking,
        "created_by": "test",
        "created_at": timestamp(order).to_rfc3339(),
    })
    .to_string()
}
