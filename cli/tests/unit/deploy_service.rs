//! Unit tests for the deploy use-case.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use stackweave_cli::application::services::deploy_service::{DeployPorts, deploy};
use stackweave_cli::domain::EngineError;
use stackweave_cli::domain::application::{DNS_OUTPUT, ImageAsset, ImageSource};
use stackweave_cli::domain::config::StackConfig;
use stackweave_common::StackStatus;

use crate::mocks::{
    CollectingReporter, FixedDigester, MemoryArtifacts, RecordingEngine, RecordingImages, STACKS,
};

const DIGESTER: FixedDigester = FixedDigester("3f2a");

fn ports<'a>(
    engine: &'a RecordingEngine,
    images: &'a RecordingImages,
    store: &'a MemoryArtifacts,
) -> DeployPorts<'a, RecordingEngine, RecordingImages, MemoryArtifacts, FixedDigester> {
    DeployPorts {
        engine,
        images,
        store,
        digester: &DIGESTER,
    }
}

fn deploy_calls(engine: &RecordingEngine) -> Vec<String> {
    engine
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("deploy "))
        .collect()
}

// ── Happy path ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_deploy_submits_every_stack_in_dependency_order() {
    let engine = RecordingEngine::default().with_output(
        "MoodleApplicationDEV",
        DNS_OUTPUT,
        "moodle-lb-123.eu-west-1.elb.amazonaws.com",
    );
    let images = RecordingImages::default();
    let store = MemoryArtifacts::default();
    let reporter = CollectingReporter::default();

    let report = deploy(ports(&engine, &images, &store), &StackConfig::default(), &reporter)
        .await
        .expect("deploy");

    let expected: Vec<String> = STACKS.iter().map(|s| format!("deploy {s}")).collect();
    assert_eq!(deploy_calls(&engine), expected);
    assert_eq!(report.stacks.len(), 5);
    assert!(report.stacks.iter().all(|s| s.status == StackStatus::Deployed));
    assert_eq!(
        report.load_balancer_dns.as_deref(),
        Some("moodle-lb-123.eu-west-1.elb.amazonaws.com")
    );
    assert_eq!(report.application, "Moodle");
    assert_eq!(report.environment, "DEV");
}

#[tokio::test]
async fn test_deploy_writes_artifacts_before_engine_calls() {
    let engine = RecordingEngine::default();
    let images = RecordingImages::default();
    let store = MemoryArtifacts::default();

    deploy(
        ports(&engine, &images, &store),
        &StackConfig::default(),
        &CollectingReporter::default(),
    )
    .await
    .expect("deploy");

    let (names, manifest) = store.written.lock().unwrap().clone().expect("written");
    assert_eq!(names, STACKS);
    assert!(manifest.is_topologically_ordered());
}

#[tokio::test]
async fn test_deploy_warns_when_dns_output_missing() {
    let engine = RecordingEngine::default();
    let images = RecordingImages::default();
    let store = MemoryArtifacts::default();
    let reporter = CollectingReporter::default();

    let report = deploy(ports(&engine, &images, &store), &StackConfig::default(), &reporter)
        .await
        .expect("deploy");

    assert!(report.load_balancer_dns.is_none());
    assert!(
        reporter.events().iter().any(|e| e.starts_with("warn:") && e.contains(DNS_OUTPUT)),
        "events: {:?}",
        reporter.events()
    );
}

// ── Failure handling ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_deploy_stops_at_first_failed_stack() {
    let engine = RecordingEngine::default().failing_on("MoodleDatabaseDEV");
    let images = RecordingImages::default();
    let store = MemoryArtifacts::default();

    let err = deploy(
        ports(&engine, &images, &store),
        &StackConfig::default(),
        &CollectingReporter::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        deploy_calls(&engine),
        [
            "deploy MoodleVPCDEV",
            "deploy MoodleLoadBalancerDEV",
            "deploy MoodleDatabaseDEV"
        ]
    );
    assert!(matches!(
        err.downcast_ref::<EngineError>(),
        Some(EngineError::CommandFailed { stack, .. }) if stack == "MoodleDatabaseDEV"
    ));
    assert!(format!("{err:#}").contains("deploying MoodleDatabaseDEV"));
}

#[tokio::test]
async fn test_deploy_invalid_config_never_reaches_engine() {
    let mut config = StackConfig::default();
    config.network.nat_gateways = 3;
    let engine = RecordingEngine::default();
    let images = RecordingImages::default();
    let store = MemoryArtifacts::default();

    let result = deploy(
        ports(&engine, &images, &store),
        &config,
        &CollectingReporter::default(),
    )
    .await;

    assert!(result.is_err());
    assert!(engine.calls().is_empty());
    assert!(store.written.lock().unwrap().is_none());
}

// ── Image assets ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_deploy_builds_asset_with_content_digest_tag() {
    let mut config = StackConfig::default();
    config.service.image = ImageSource::Asset(ImageAsset {
        directory: PathBuf::from("docker/moodle"),
        dockerfile: "Dockerfile".into(),
        repository: "123456789012.dkr.ecr.eu-west-1.amazonaws.com/moodle".into(),
    });
    let engine = RecordingEngine::default();
    let images = RecordingImages::default();
    let store = MemoryArtifacts::default();

    deploy(ports(&engine, &images, &store), &config, &CollectingReporter::default())
        .await
        .expect("deploy");

    let built = images.built.lock().unwrap().clone();
    assert_eq!(built, [(PathBuf::from("docker/moodle"), "3f2a".to_string())]);
}

#[tokio::test]
async fn test_deploy_registry_image_skips_build() {
    let engine = RecordingEngine::default();
    let images = RecordingImages::default();
    let store = MemoryArtifacts::default();

    deploy(
        ports(&engine, &images, &store),
        &StackConfig::default(),
        &CollectingReporter::default(),
    )
    .await
    .expect("deploy");

    assert!(images.built.lock().unwrap().is_empty());
}
