//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary home directory.

use chrono::Utc;
use focustodo_core::Database;
use std::process::Command;
use tempfile::TempDir;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &TempDir, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_focustodo"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("FOCUSTODO_ENV")
        .env_remove("FOCUSTODO_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).expect("stdout is JSON")
}

#[test]
fn test_task_add_and_list() {
    let home = TempDir::new().unwrap();
    let (code, stdout, stderr) = run_cli(&home, &["task", "add", "Write report"]);
    assert_eq!(code, 0, "task add failed: {stderr}");
    assert!(stderr.contains("Task created:"));
    let task = json(&stdout);
    assert_eq!(task["title"], "Write report");
    assert_eq!(task["completed_pomodoros"], 0);

    let (code, stdout, _) = run_cli(&home, &["task", "list"]);
    assert_eq!(code, 0);
    let tasks = json(&stdout);
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["id"], task["id"]);
}

#[test]
fn test_task_done_hides_from_default_list() {
    let home = TempDir::new().unwrap();
    let (_, stdout, _) = run_cli(&home, &["task", "add", "Inbox zero"]);
    let id = json(&stdout)["id"].as_str().unwrap().to_string();

    let (code, stdout, _) = run_cli(&home, &["task", "done", &id[..8]]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["completed"], true);

    let (_, stdout, _) = run_cli(&home, &["task", "list"]);
    assert!(json(&stdout).as_array().unwrap().is_empty());
    let (_, stdout, _) = run_cli(&home, &["task", "list", "--all"]);
    assert_eq!(json(&stdout).as_array().unwrap().len(), 1);
}

#[test]
fn test_timer_start_then_status() {
    let home = TempDir::new().unwrap();
    let (code, stdout, stderr) = run_cli(&home, &["timer", "start"]);
    assert_eq!(code, 0, "timer start failed: {stderr}");
    let event = json(&stdout);
    assert_eq!(event["type"], "timer_started");
    assert_eq!(event["interval"], "work");

    let (code, stdout, _) = run_cli(&home, &["timer", "status"]);
    assert_eq!(code, 0);
    let status = json(&stdout);
    assert_eq!(status["type"], "state_snapshot");
    assert_eq!(status["running"], true);
    assert_eq!(status["total_secs"], 1500);

    let (code, stdout, _) = run_cli(&home, &["timer", "pause"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["type"], "timer_paused");
}

#[test]
fn test_timer_status_short_when_idle() {
    let home = TempDir::new().unwrap();
    let (code, stdout, _) = run_cli(&home, &["timer", "status", "--short"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("25:00"));
    assert!(stdout.contains("paused"));
}

#[test]
fn test_config_set_and_get() {
    let home = TempDir::new().unwrap();
    let (code, _, _) = run_cli(&home, &["config", "set", "timer.work_duration", "50"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(&home, &["config", "get", "timer.work_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "50");
}

#[test]
fn test_config_set_rejects_zero_duration() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["config", "set", "timer.work_duration", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));

    let (_, stdout, _) = run_cli(&home, &["config", "get", "timer.work_duration"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_unknown_task_id_fails() {
    let home = TempDir::new().unwrap();
    let (code, _, stderr) = run_cli(&home, &["timer", "select", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_stats_summary_json() {
    let home = TempDir::new().unwrap();
    run_cli(&home, &["task", "add", "Read"]);
    let (code, stdout, stderr) = run_cli(&home, &["stats", "summary", "--json"]);
    assert_eq!(code, 0, "stats summary failed: {stderr}");
    let summary = json(&stdout);
    assert_eq!(summary["total_tasks"], 1);
    assert_eq!(summary["total_pomodoros"], 0);
}

#[test]
fn test_project_remove_uncategorizes_tasks() {
    let home = TempDir::new().unwrap();
    let (_, stdout, _) = run_cli(&home, &["project", "add", "Home"]);
    let project = json(&stdout)["id"].as_str().unwrap().to_string();
    run_cli(&home, &["task", "add", "Laundry", "--project", &project]);

    let (_, stdout, _) = run_cli(&home, &["task", "list"]);
    let updated_at = json(&stdout)[0]["updated_at"].clone();

    let (code, stdout, _) = run_cli(&home, &["project", "remove", &project]);
    assert_eq!(code, 0);
    assert!(stdout.contains("1 tasks uncategorized"));

    let (_, stdout, _) = run_cli(&home, &["task", "list"]);
    let task = &json(&stdout)[0];
    assert!(task["project_id"].is_null());
    assert_eq!(task["updated_at"], updated_at);
}

/// The database the CLI uses under `home`, opened from this process as if
/// it were another running `focustodo`.
fn open_db(home: &TempDir) -> Database {
    let dir = home.path().join(".config").join("focustodo");
    std::fs::create_dir_all(&dir).unwrap();
    Database::open_at(&dir.join("focustodo.db")).unwrap()
}

#[test]
fn test_second_runner_is_refused() {
    let home = TempDir::new().unwrap();
    let db = open_db(&home);
    let _lease = db.acquire_timer_lease(Utc::now()).unwrap();

    let (code, stdout, stderr) = run_cli(&home, &["timer", "run"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert_eq!(stderr.trim(), "error: timer already running in another process");
}

#[test]
fn test_timer_changes_refused_while_runner_active() {
    let home = TempDir::new().unwrap();
    let (code, _, _) = run_cli(&home, &["timer", "start"]);
    assert_eq!(code, 0);

    let db = open_db(&home);
    let lease = db.acquire_timer_lease(Utc::now()).unwrap();

    for args in [
        &["timer", "pause"][..],
        &["timer", "reset"][..],
        &["timer", "reset-all"][..],
        &["timer", "type", "short-break"][..],
        &["timer", "deselect"][..],
    ] {
        let (code, _, stderr) = run_cli(&home, args);
        assert_eq!(code, 1, "{args:?} should be refused");
        assert!(stderr.contains("timer already running in another process"));
    }

    // Reading is still allowed and reports the runner's state.
    let (code, stdout, _) = run_cli(&home, &["timer", "status"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["running"], true);

    drop(lease);
    let (code, stdout, _) = run_cli(&home, &["timer", "pause"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["type"], "timer_paused");
}
