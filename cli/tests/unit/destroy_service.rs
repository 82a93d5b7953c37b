//! Unit tests for the destroy use-case.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use stackweave_cli::application::services::destroy_service::destroy;
use stackweave_cli::domain::config::StackConfig;
use stackweave_common::{GroupKind, StackStatus};

use crate::mocks::{CollectingReporter, RecordingEngine, STACKS};

fn deletes(engine: &RecordingEngine) -> Vec<String> {
    engine
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("delete "))
        .collect()
}

#[tokio::test]
async fn test_destroy_deletes_in_reverse_dependency_order() {
    let engine = RecordingEngine::with_existing(&STACKS);

    let results = destroy(&engine, &StackConfig::default(), &CollectingReporter::default())
        .await
        .expect("destroy");

    let expected: Vec<String> = STACKS.iter().rev().map(|s| format!("delete {s}")).collect();
    assert_eq!(deletes(&engine), expected);
    assert_eq!(results[0].group, GroupKind::Application);
    assert!(results.iter().all(|r| r.status == StackStatus::Deleted));
}

#[tokio::test]
async fn test_destroy_reports_absent_stacks_without_deleting() {
    let engine = RecordingEngine::with_existing(&["MoodleVPCDEV", "MoodleLoadBalancerDEV"]);

    let results = destroy(&engine, &StackConfig::default(), &CollectingReporter::default())
        .await
        .expect("destroy");

    assert_eq!(
        deletes(&engine),
        ["delete MoodleLoadBalancerDEV", "delete MoodleVPCDEV"]
    );
    let absent = results
        .iter()
        .filter(|r| r.status == StackStatus::Absent)
        .count();
    assert_eq!(absent, 3);
}

#[tokio::test]
async fn test_destroy_stops_when_a_deletion_fails() {
    let engine = RecordingEngine::with_existing(&STACKS).failing_on("MoodleDatabaseDEV");

    let err = destroy(&engine, &StackConfig::default(), &CollectingReporter::default())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("MoodleDatabaseDEV"));
    assert_eq!(
        deletes(&engine),
        [
            "delete MoodleApplicationDEV",
            "delete MoodleFileSystemDEV",
            "delete MoodleDatabaseDEV"
        ]
    );
}

#[tokio::test]
async fn test_destroy_works_when_config_no_longer_composes() {
    let mut config = StackConfig::default();
    config.network.cidr = "not-a-cidr".into();
    let engine = RecordingEngine::with_existing(&["MoodleVPCDEV"]);

    let results = destroy(&engine, &config, &CollectingReporter::default())
        .await
        .expect("destroy");

    assert_eq!(deletes(&engine), ["delete MoodleVPCDEV"]);
    assert_eq!(results.len(), 5);
}
