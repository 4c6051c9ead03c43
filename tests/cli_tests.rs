//! Tests for the `planner` maintenance binary

mod common;

use common::*;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_planner(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_planner"))
        .args(args)
        .env("LOG_LEVEL", "warn")
        .output()
        .expect("Failed to run planner binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_init_creates_databases() {
    let dir = TempDir::new().unwrap();
    let db_dir = dir.path().to_str().unwrap();

    let output = run_planner(&["--db-dir", db_dir, "init"]);
    assert!(output.status.success());
    assert!(dir.path().join("planner.db").exists());
    assert!(dir.path().join("mail_outbox.db").exists());

    // Running it again validates the existing files
    assert!(run_planner(&["--db-dir", db_dir, "init"]).status.success());
}

#[test]
fn test_version_includes_build_commit() {
    let output = run_planner(&["--version"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let prefix = concat!(env!("CARGO_PKG_VERSION"), "-");
    let build = text
        .trim()
        .split_once(prefix)
        .map(|(_, build)| build)
        .expect("version without build suffix");
    assert!(!build.is_empty());
    assert!(!build.contains(char::is_whitespace));
}

#[test]
fn test_missing_db_dir_fails() {
    let output = run_planner(&["init"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("db_dir must be specified"));
}

#[test]
fn test_open_requests_report() {
    let (dir, _) = create_test_planner_db().unwrap();
    let db_dir = dir.path().to_str().unwrap();

    let output = run_planner(&["--db-dir", db_dir, "open-requests", "--user", "1"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("As requester (3)"));
    assert!(text.contains("As approver (2)"));
    assert!(text.contains("As resource (1)"));
}

#[test]
fn test_config_file_overrides_db_dir() {
    let (dir, _) = create_test_planner_db().unwrap();
    let config_path = dir.path().join("planner.toml");
    std::fs::write(
        &config_path,
        format!("db_dir = {:?}\n", dir.path().to_str().unwrap()),
    )
    .unwrap();

    let output = run_planner(&[
        "--config",
        config_path.to_str().unwrap(),
        "--db-dir",
        "/nonexistent",
        "pending-mail",
    ]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("0 pending mail(s)"));
}
