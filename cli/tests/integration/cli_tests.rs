//! Integration tests for argument parsing and global flags.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn stackweave() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stackweave"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    stackweave().assert().code(2).stderr(predicate::str::contains(
        "Compose and deploy a multi-stack web application",
    ));
}

#[test]
fn test_cli_help_lists_commands() {
    stackweave()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("synth"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("destroy"))
        .stdout(predicate::str::contains("outputs"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    stackweave()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stackweave"));
}

#[test]
fn test_version_command_shows_version() {
    stackweave()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stackweave v0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = stackweave()
        .args(["version", "--json"])
        .output()
        .expect("spawn");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(value["version"], "0.1.0");
}

// --- Argument errors ---

#[test]
fn test_unknown_command_fails() {
    stackweave()
        .arg("launch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_outputs_rejects_unknown_group() {
    stackweave()
        .args(["outputs", "--group", "cache"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_destroy_help_mentions_reverse_order() {
    stackweave()
        .args(["destroy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reverse dependency order"));
}
