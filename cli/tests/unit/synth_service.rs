//! Unit tests for composition and synthesis use-cases.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use stackweave_cli::application::services::synth_service::{check, compose_graph, plan, synth};
use stackweave_cli::domain::application::{ImageAsset, ImageSource};
use stackweave_cli::domain::config::StackConfig;
use stackweave_common::GroupKind;

use crate::mocks::{FixedDigester, MemoryArtifacts, STACKS};

fn asset_config() -> StackConfig {
    let mut config = StackConfig::default();
    config.service.image = ImageSource::Asset(ImageAsset {
        directory: PathBuf::from("docker/moodle"),
        dockerfile: "Dockerfile".into(),
        repository: "registry.example.com/moodle".into(),
    });
    config
}

#[test]
fn test_compose_graph_tags_asset_image_with_digest() {
    let graph = compose_graph(&asset_config(), &FixedDigester("abc123")).expect("compose");
    assert_eq!(graph.context.image_tag.as_deref(), Some("abc123"));
    assert_eq!(
        graph.application.task.container.image,
        "registry.example.com/moodle:abc123"
    );
}

#[test]
fn test_compose_graph_registry_image_needs_no_digest() {
    let graph = compose_graph(&StackConfig::default(), &FixedDigester("unused")).expect("compose");
    assert!(graph.context.image_tag.is_none());
}

#[test]
fn test_plan_lists_stacks_in_deploy_order() {
    let plan = plan(&StackConfig::default(), &FixedDigester("x")).expect("plan");
    let names: Vec<&str> = plan.stacks.iter().map(|s| s.stack.as_str()).collect();
    assert_eq!(names, STACKS);
    assert!(plan.stacks[0].depends_on.is_empty());
}

#[test]
fn test_check_does_not_write() {
    let synthesis = check(&StackConfig::default(), &FixedDigester("x")).expect("check");
    assert!(synthesis.stack(GroupKind::Database).is_some());
}

#[test]
fn test_synth_writes_manifest_and_returns_tag() {
    let store = MemoryArtifacts::default();

    let outcome = synth(&asset_config(), &FixedDigester("feed"), &store).expect("synth");

    assert_eq!(outcome.out_dir, PathBuf::from("/mem"));
    assert_eq!(outcome.image_tag.as_deref(), Some("feed"));
    let (names, manifest) = store.written.lock().unwrap().clone().expect("written");
    assert_eq!(names.len(), 5);
    assert_eq!(manifest.stacks.len(), 5);
}
