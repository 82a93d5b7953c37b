//! Integration tests for `stackweave config` command.
//!
//! All filesystem-touching tests set `STACKWEAVE_CONFIG` to a temp path so
//! they never read or write `~/.stackweave/config.yaml`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn stackweave() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stackweave"));
    cmd.env("NO_COLOR", "1").env_remove("STACKWEAVE_ENVIRONMENT");
    cmd
}

/// Returns a `TempDir` and the path string for a config file inside it.
fn temp_config_path() -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir
        .path()
        .join("config.yaml")
        .to_string_lossy()
        .into_owned();
    (dir, path)
}

// ---------------------------------------------------------------------------
// Subcommand registration
// ---------------------------------------------------------------------------

#[test]
fn test_config_help_shows_subcommands() {
    stackweave()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("path"));
}

// ---------------------------------------------------------------------------
// `stackweave config show`
// ---------------------------------------------------------------------------

#[test]
fn test_config_show_no_config_file_uses_defaults() {
    let (_dir, path) = temp_config_path();
    stackweave()
        .args(["config", "show"])
        .env("STACKWEAVE_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("application.name"))
        .stdout(predicate::str::contains("Moodle"))
        .stdout(predicate::str::contains("DEV"));
}

#[test]
fn test_config_show_does_not_create_file() {
    let (_dir, path) = temp_config_path();
    stackweave()
        .args(["config", "show"])
        .env("STACKWEAVE_CONFIG", &path)
        .assert()
        .success();
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_show_json_includes_path_and_config() {
    let (_dir, path) = temp_config_path();
    let output = stackweave()
        .args(["config", "show", "--json"])
        .env("STACKWEAVE_CONFIG", &path)
        .output()
        .expect("spawn");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["path"], path.as_str());
    assert_eq!(value["config"]["application"]["name"], "Moodle");
    assert_eq!(value["config"]["network"]["az_count"], 2);
}

// ---------------------------------------------------------------------------
// `stackweave config set`
// ---------------------------------------------------------------------------

#[test]
fn test_config_set_persists_value() {
    let (_dir, path) = temp_config_path();
    stackweave()
        .args(["config", "set", "engine.region", "eu-west-1"])
        .env("STACKWEAVE_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Set engine.region = eu-west-1"));

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("eu-west-1"));

    stackweave()
        .args(["config", "show"])
        .env("STACKWEAVE_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("eu-west-1"));
}

#[test]
fn test_config_set_unknown_key_fails() {
    let (_dir, path) = temp_config_path();
    stackweave()
        .args(["config", "set", "database.password", "hunter2"])
        .env("STACKWEAVE_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("database.password"));
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_config_set_invalid_name_fails() {
    let (_dir, path) = temp_config_path();
    stackweave()
        .args(["config", "set", "application.environment", "prod-eu"])
        .env("STACKWEAVE_CONFIG", &path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("application.environment"));
}

#[test]
fn test_config_set_gateways_above_zones_fails() {
    let (_dir, path) = temp_config_path();
    stackweave()
        .args(["config", "set", "network.nat_gateways", "3"])
        .env("STACKWEAVE_CONFIG", &path)
        .assert()
        .failure();
}

#[test]
fn test_config_set_zones_then_gateways_succeeds() {
    let (_dir, path) = temp_config_path();
    for (key, value) in [("network.az_count", "3"), ("network.nat_gateways", "3")] {
        stackweave()
            .args(["config", "set", key, value])
            .env("STACKWEAVE_CONFIG", &path)
            .assert()
            .success();
    }
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("nat_gateways: 3"));
}

#[cfg(unix)]
#[test]
fn test_config_set_writes_owner_only_file() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = temp_config_path();
    stackweave()
        .args(["config", "set", "engine.profile", "ops"])
        .env("STACKWEAVE_CONFIG", &path)
        .assert()
        .success();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

// ---------------------------------------------------------------------------
// `stackweave config path`
// ---------------------------------------------------------------------------

#[test]
fn test_config_path_honours_env_override() {
    let (_dir, path) = temp_config_path();
    stackweave()
        .args(["config", "path"])
        .env("STACKWEAVE_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains(path.as_str()));
}
