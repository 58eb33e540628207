//! Integration tests for the tasklink binary.

mod common;

use common::{run_json, run_tasklink_in_dir};
use std::path::Path;
use tempfile::TempDir;

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let output = run_tasklink_in_dir(dir.path(), &["init", "--prefix", "demo", "-q"]);
    assert!(output.status.success());
    dir
}

fn add_task(dir: &Path, title: &str) -> String {
    let task = run_json(dir, &["task", "add", title]);
    task["id"].as_str().unwrap().to_string()
}

#[test]
fn test_command_outside_repository_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_tasklink_in_dir(dir.path(), &["task", "list"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not a tasklink repository"), "{stderr}");
}

#[test]
fn test_init_twice_fails() {
    let dir = init_repo();
    let output = run_tasklink_in_dir(dir.path(), &["init", "-q"]);
    assert!(!output.status.success());
}

#[test]
fn test_dependency_workflow() {
    let dir = init_repo();
    let design = add_task(dir.path(), "Design");
    let build = add_task(dir.path(), "Build");
    assert!(design.starts_with("demo-"));

    let edge = run_json(dir.path(), &["dep", "add", &build, &design, "--by", "alice"]);
    assert_eq!(edge["dependent_task_id"], build.as_str());
    assert_eq!(edge["created_by"], "alice");

    let check = run_json(dir.path(), &["dep", "check", &design, &build]);
    assert_eq!(check["would_cycle"], true);
    assert_eq!(check["path"][0], design.as_str());

    let output = run_tasklink_in_dir(dir.path(), &["dep", "add", &design, &build]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Design → Build → Design"), "{stderr}");

    let show = run_json(dir.path(), &["show", &build]);
    assert_eq!(show["dependencies"]["is_blocked"], true);
    assert_eq!(show["dependencies"]["dependency_status"], "blocked");

    run_json(dir.path(), &["task", "status", &design, "completed"]);
    let show = run_json(dir.path(), &["show", &build]);
    assert_eq!(show["dependencies"]["is_blocked"], false);

    let chain = run_json(dir.path(), &["chain", &design, "--down"]);
    assert_eq!(chain[0]["task"]["id"], build.as_str());
    assert_eq!(chain[0]["depth"], 1);
}

#[test]
fn test_start_requires_policy_when_blocked() {
    let dir = init_repo();
    let blocker = add_task(dir.path(), "Blocker");
    let blocked = add_task(dir.path(), "Blocked");
    let free = add_task(dir.path(), "Free");
    run_json(dir.path(), &["dep", "add", &blocked, &blocker]);

    let output = run_tasklink_in_dir(dir.path(), &["start", &blocked, &free]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Found 1 blocked task(s)"), "{stdout}");

    let tasks = run_json(dir.path(), &["task", "list", "--status", "in_progress"]);
    assert_eq!(tasks.as_array().unwrap().len(), 0);

    let outcome = run_json(dir.path(), &["start", &blocked, &free, "--skip-blocked"]);
    assert_eq!(outcome["started"], serde_json::json!([free]));
    assert_eq!(outcome["skipped"][0]["task_id"], blocked.as_str());

    let outcome = run_json(dir.path(), &["start", &blocked, "--force"]);
    assert_eq!(outcome["started"], serde_json::json!([blocked]));
}

#[test]
fn test_start_without_policy_when_nothing_blocked() {
    let dir = init_repo();
    let done = add_task(dir.path(), "Done");
    let next = add_task(dir.path(), "Next");
    run_json(dir.path(), &["dep", "add", &next, &done]);
    run_json(dir.path(), &["task", "status", &done, "completed"]);

    let outcome = run_json(dir.path(), &["start", &next]);
    assert_eq!(outcome["started"], serde_json::json!([next]));
    assert_eq!(outcome["skipped"], serde_json::json!([]));
}

#[test]
fn test_task_delete_cascades() {
    let dir = init_repo();
    let a = add_task(dir.path(), "A");
    let b = add_task(dir.path(), "B");
    let c = add_task(dir.path(), "C");
    run_json(dir.path(), &["dep", "add", &a, &b]);
    run_json(dir.path(), &["dep", "add", &b, &c]);

    let result = run_json(dir.path(), &["task", "delete", &b]);
    assert_eq!(result["deleted_count"], 2);

    let edges = run_json(dir.path(), &["dep", "list"]);
    assert_eq!(edges.as_array().unwrap().len(), 0);

    let blocked = run_json(dir.path(), &["blocked"]);
    assert_eq!(blocked.as_array().unwrap().len(), 0);
}

#[test]
fn test_info_text() {
    let dir = init_repo();
    add_task(dir.path(), "Only");

    let output = run_tasklink_in_dir(dir.path(), &["info"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Task prefix:  demo"));
    assert!(stdout.contains("Tasks: 1 total (1 pending"));
}
