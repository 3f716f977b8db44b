//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a temporary data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_sitegate"))
        .arg("--data-dir")
        .arg(dir)
        .args(args)
        .env_remove("SITEGATE_LOG")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command failed {:?}: {}", args, stderr);
    stdout
}

#[test]
fn test_settings_defaults() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(dir.path(), &["settings", "show", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["start_hour"], 9);
    assert_eq!(json["end_hour"], 17);
    assert_eq!(json["blocked_sites"].as_array().unwrap().len(), 0);
}

#[test]
fn test_settings_edit_keeps_other_fields() {
    let dir = TempDir::new().unwrap();
    let out = run_ok(
        dir.path(),
        &["settings", "edit", "--sites", "example.com, news.site", "--start", "22", "--end", "6"],
    );
    assert!(out.contains("Settings saved!"));

    run_ok(dir.path(), &["settings", "edit", "--end", "7"]);
    let out = run_ok(dir.path(), &["settings", "show", "--json"]);
    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["blocked_sites"][1], "news.site");
    assert_eq!(json["start_hour"], 22);
    assert_eq!(json["end_hour"], 7);
}

#[test]
fn test_reconcile_blocks_then_clears() {
    let dir = TempDir::new().unwrap();
    run_ok(
        dir.path(),
        &["settings", "edit", "--sites", "example.com", "--start", "22", "--end", "6"],
    );

    let out = run_ok(dir.path(), &["reconcile", "--hour", "23", "--json"]);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["should_block"], true);
    assert_eq!(report["added"][0], 1000);

    let out = run_ok(dir.path(), &["rules", "--json"]);
    let rules: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(rules.as_array().unwrap().len(), 1);
    assert_eq!(rules[0]["condition"]["urlFilter"], "example.com");

    let out = run_ok(dir.path(), &["reconcile", "--hour", "10"]);
    assert!(out.contains("not blocking"));
    assert!(run_ok(dir.path(), &["rules"]).contains("no rules"));
}

#[test]
fn test_status_reports_window() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["settings", "edit", "--sites", "a.com,b.com"]);
    let out = run_ok(dir.path(), &["status", "--hour", "10", "--json"]);
    let status: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(status["window"], "09:00-17:00");
    assert_eq!(status["should_block"], true);
    assert_eq!(status["owned"]["count"], 2);
}

#[test]
fn test_invalid_stored_hour_fails() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["settings", "edit", "--sites", "a.com", "--start", "30"]);
    let (_, stderr, code) = run_cli(dir.path(), &["reconcile", "--hour", "10"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Invalid hour"), "stderr: {stderr}");
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "rules.base_offset"]).trim(), "1000");
    run_ok(dir.path(), &["config", "set", "rules.base_offset", "2000"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "rules.base_offset"]).trim(), "2000");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "rules.nope"]);
    assert_ne!(code, 0);

    run_ok(dir.path(), &["config", "reset"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "rules.base_offset"]).trim(), "1000");
}

#[test]
fn test_config_reset_recovers_unreadable_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "daemon = [").unwrap();

    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "rules.base_offset"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Failed to load configuration"), "stderr: {stderr}");

    run_ok(dir.path(), &["config", "reset"]);
    assert_eq!(run_ok(dir.path(), &["config", "get", "rules.base_offset"]).trim(), "1000");
}

#[test]
fn test_config_set_rejects_base_offset_past_id_space() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "rules.base_offset", "4294967295"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("rules.base_offset"), "stderr: {stderr}");
    assert_eq!(run_ok(dir.path(), &["config", "get", "rules.base_offset"]).trim(), "1000");
}

#[test]
fn test_hour_flag_is_range_checked() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["reconcile", "--hour", "24"]);
    assert_ne!(code, 0);
}
