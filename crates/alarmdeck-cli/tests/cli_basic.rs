//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data
//! directory and verify outputs.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "alarmdeck-cli", "--"])
        .args(args)
        .env("ALARMDECK_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_alarm_list() {
    let (_, _, code) = run_cli(&["alarm", "list"]);
    assert_eq!(code, 0, "alarm list failed");
}

#[test]
fn test_alarm_list_json() {
    let (stdout, _, code) = run_cli(&["alarm", "list", "--json"]);
    assert_eq!(code, 0, "alarm list --json failed");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout).is_ok());
}

#[test]
fn test_alarm_add_and_delete() {
    let (stdout, _, code) = run_cli(&["alarm", "add", "CLI test alarm", "--hours", "2"]);
    assert_eq!(code, 0, "alarm add failed");
    let id = stdout
        .lines()
        .find_map(|l| l.strip_prefix("created "))
        .expect("no created id in output")
        .trim()
        .to_string();

    let (stdout, _, code) = run_cli(&["alarm", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("CLI test alarm"));

    let (_, _, code) = run_cli(&["alarm", "delete", &id]);
    assert_eq!(code, 0, "alarm delete failed");
}

#[test]
fn test_weekly_without_days_is_rejected() {
    let (_, stderr, code) = run_cli(&[
        "alarm",
        "add",
        "Bad weekly",
        "--hours",
        "1",
        "--recurrence",
        "weekly",
    ]);
    assert_ne!(code, 0, "weekly alarm without days should fail");
    assert!(stderr.contains("daysOfWeek"));
}

#[test]
fn test_out_of_range_duration_is_rejected() {
    let (_, stderr, code) = run_cli(&[
        "alarm",
        "add",
        "Heat death",
        "--days",
        "99999999999999",
    ]);
    assert_ne!(code, 0, "out-of-range duration should fail");
    assert!(stderr.contains("out of range"));
}

#[test]
fn test_config_get() {
    let (stdout, _, code) = run_cli(&["config", "get", "sync.enabled"]);
    assert_eq!(code, 0, "config get failed");
    assert!(stdout.trim() == "true" || stdout.trim() == "false");
}

#[test]
fn test_config_set() {
    let (_, _, code) = run_cli(&["config", "set", "sync.tick_interval_secs", "30"]);
    assert_eq!(code, 0, "config set failed");
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout).is_ok());
}

#[test]
fn test_sync_watch_bounded_ticks() {
    let (stdout, _, code) = run_cli(&["sync", "watch", "--ticks", "1"]);
    assert_eq!(code, 0, "sync watch --ticks 1 failed");
    assert!(stdout.contains("saved:"));
}

#[test]
fn test_sync_status() {
    let (stdout, _, code) = run_cli(&["sync", "status"]);
    assert_eq!(code, 0, "sync status failed");
    assert!(stdout.contains("alarms:"));
}
