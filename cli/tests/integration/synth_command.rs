//! Integration tests for `validate`, `plan` and `synth`.
//!
//! These commands compose and write locally; none of them calls the
//! provisioning engine.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DEV_STACKS: [&str; 5] = [
    "MoodleVPCDEV",
    "MoodleLoadBalancerDEV",
    "MoodleDatabaseDEV",
    "MoodleFileSystemDEV",
    "MoodleApplicationDEV",
];

/// A command pointed at an empty config in `dir`.
fn stackweave(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stackweave"));
    cmd.env("NO_COLOR", "1")
        .env_remove("STACKWEAVE_ENVIRONMENT")
        .env("STACKWEAVE_CONFIG", dir.path().join("config.yaml"))
        .current_dir(dir.path());
    cmd
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("spawn");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}

fn manifest_stacks(value: &serde_json::Value) -> Vec<String> {
    value["stacks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["stack"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn test_validate_default_config_succeeds() {
    let dir = TempDir::new().unwrap();
    stackweave(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration is valid: 5 stacks"));
}

#[test]
fn test_validate_json_reports_manifest_in_deploy_order() {
    let dir = TempDir::new().unwrap();
    let value = json_stdout(stackweave(&dir).args(["validate", "--json"]));
    assert_eq!(value["valid"], true);
    assert_eq!(manifest_stacks(&value["manifest"]), DEV_STACKS);
}

#[test]
fn test_validate_rejects_gateways_above_zones_in_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        "network:\n  az_count: 2\n  nat_gateways: 3\n",
    )
    .unwrap();
    stackweave(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_environment_flag_fails() {
    let dir = TempDir::new().unwrap();
    stackweave(&dir)
        .args(["validate", "-e", "prod-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("prod-1"));
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

#[test]
fn test_plan_lists_stacks_subnets_and_image() {
    let dir = TempDir::new().unwrap();
    stackweave(&dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("MoodleVPCDEV"))
        .stdout(predicate::str::contains("MoodleApplicationDEV"))
        .stdout(predicate::str::contains("Subnets:"))
        .stdout(predicate::str::contains("bitnami/moodle:latest"));
}

#[test]
fn test_plan_json_has_one_subnet_per_zone_and_kind() {
    let dir = TempDir::new().unwrap();
    let value = json_stdout(stackweave(&dir).args(["plan", "--json"]));
    assert_eq!(value["application"], "Moodle");
    assert_eq!(value["stacks"].as_array().unwrap().len(), 5);
    assert_eq!(value["subnets"].as_array().unwrap().len(), 4);
}

// ---------------------------------------------------------------------------
// synth
// ---------------------------------------------------------------------------

#[test]
fn test_synth_writes_templates_and_manifest() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    stackweave(&dir)
        .args(["synth", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote 5 templates"));

    for stack in DEV_STACKS {
        let file = out.join(format!("{stack}.template.json"));
        let body: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert!(body["Resources"].is_object(), "{stack} has no resources");
    }
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest_stacks(&manifest), DEV_STACKS);
}

#[test]
fn test_synth_defaults_to_configured_out_dir() {
    let dir = TempDir::new().unwrap();
    stackweave(&dir).arg("synth").assert().success();
    assert!(
        Path::new(&dir.path().join("stackweave.out").join("manifest.json")).exists()
    );
}

#[test]
fn test_synth_environment_flag_renames_stacks() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let value = json_stdout(
        stackweave(&dir)
            .args(["synth", "--json", "-e", "PROD", "--out"])
            .arg(&out),
    );
    let stacks = manifest_stacks(&value["manifest"]);
    assert!(stacks.iter().all(|s| s.ends_with("PROD")), "{stacks:?}");
    assert!(out.join("MoodleVPCPROD.template.json").exists());
    assert!(!out.join("MoodleVPCDEV.template.json").exists());
}

#[test]
fn test_synth_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a");
    let second = dir.path().join("b");
    for out in [&first, &second] {
        stackweave(&dir).args(["synth", "--out"]).arg(out).assert().success();
    }
    for stack in DEV_STACKS {
        let name = format!("{stack}.template.json");
        assert_eq!(
            std::fs::read(first.join(&name)).unwrap(),
            std::fs::read(second.join(&name)).unwrap(),
            "{name} differs between runs"
        );
    }
}

#[test]
fn test_synth_environment_override_is_not_persisted() {
    let dir = TempDir::new().unwrap();
    stackweave(&dir)
        .args(["synth", "-e", "QA", "--out"])
        .arg(dir.path().join("out"))
        .assert()
        .success();
    assert!(!dir.path().join("config.yaml").exists());
}
