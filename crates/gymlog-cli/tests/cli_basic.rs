//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated HOME so each
//! test gets its own database and config.

use std::path::{Path, PathBuf};
use std::process::Command;

fn temp_home(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gymlog-cli-test-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).expect("create temp home");
    dir
}

fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "-p", "gymlog-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env("GYMLOG_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_gym_set_and_show() {
    let home = temp_home("gym-set-show");

    let (_, stderr, code) = run_cli(
        &home,
        &["gym", "set", "Iron Temple", "--lat", "-34.6037", "--lon", "-58.3816"],
    );
    assert_eq!(code, 0, "gym set failed: {stderr}");

    let (stdout, _, code) = run_cli(&home, &["gym", "show"]);
    assert_eq!(code, 0);
    let gym: serde_json::Value = serde_json::from_str(&stdout).expect("gym show prints JSON");
    assert_eq!(gym["name"], "Iron Temple");
}

#[test]
fn test_tick_while_idle_reports_not_tracking() {
    let home = temp_home("tick-idle");

    run_cli(
        &home,
        &["gym", "set", "Iron Temple", "--lat", "-34.6037", "--lon", "-58.3816"],
    );
    let (stdout, _, code) = run_cli(
        &home,
        &["track", "tick", "--lat", "-34.6037", "--lon", "-58.3816"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("not_tracking"), "got: {stdout}");
}

#[test]
fn test_full_visit_flow_shows_in_stats() {
    let home = temp_home("full-flow");

    run_cli(
        &home,
        &["gym", "set", "Iron Temple", "--lat", "-34.6037", "--lon", "-58.3816"],
    );
    run_cli(&home, &["gym", "routines", "Chest", "Back", "Legs"]);
    run_cli(&home, &["gym", "pay", "--date", "2024-03-01"]);

    let (_, stderr, code) = run_cli(&home, &["track", "start"]);
    assert_eq!(code, 0, "track start failed: {stderr}");

    for at in ["2024-03-04T18:05:00Z", "2024-03-04T19:02:00Z"] {
        let (stdout, _, code) = run_cli(
            &home,
            &[
                "track", "tick", "--lat", "-34.6037", "--lon", "-58.3816", "--at", at,
            ],
        );
        assert_eq!(code, 0);
        assert!(stdout.contains("recorded"), "got: {stdout}");
    }

    let (stdout, _, code) = run_cli(&home, &["stats"]);
    assert_eq!(code, 0);
    let stats: serde_json::Value = serde_json::from_str(&stdout).expect("stats prints JSON");
    assert_eq!(stats["count_since_payment"], 1);
    assert_eq!(stats["attendance_days"][0], "2024-03-04");

    let (stdout, _, _) = run_cli(&home, &["gym", "show"]);
    let line = stdout.lines().last().unwrap_or_default();
    assert_eq!(line, "current routine: Back");
}
