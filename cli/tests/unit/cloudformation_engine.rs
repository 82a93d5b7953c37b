//! Unit tests for the CloudFormation engine adapter, driven by a scripted
//! command runner.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use stackweave_cli::application::ports::ProvisioningEngine;
use stackweave_cli::domain::config::StackConfig;
use stackweave_cli::domain::{EngineError, synthesize};
use stackweave_cli::domain::graph::{CompositionContext, compose};
use stackweave_cli::infra::cloudformation::{CloudFormationEngine, EngineTarget};
use stackweave_common::GroupKind;

use crate::mocks::{ScriptedRunner, err_output, ok_output};

const MISSING: &[u8] = b"An error occurred (ValidationError) when calling the DescribeStacks \
    operation: Stack with id MoodleVPCDEV does not exist";

fn engine(runner: ScriptedRunner) -> CloudFormationEngine<ScriptedRunner> {
    engine_with(
        runner,
        EngineTarget {
            region: Some("eu-west-1".into()),
            profile: None,
        },
    )
}

fn engine_with(
    runner: ScriptedRunner,
    target: EngineTarget,
) -> CloudFormationEngine<ScriptedRunner> {
    CloudFormationEngine::new(runner, target, Duration::from_secs(5))
}

// ── stack_status / describe_outputs ───────────────────────────────────────────

#[tokio::test]
async fn test_stack_status_none_when_stack_missing() {
    let engine = engine(ScriptedRunner::new(vec![err_output(255, MISSING)]));
    assert_eq!(engine.stack_status("MoodleVPCDEV").await.unwrap(), None);
}

#[tokio::test]
async fn test_stack_status_reads_status() {
    let body = br#"{"Stacks":[{"StackName":"MoodleVPCDEV","StackStatus":"UPDATE_COMPLETE"}]}"#;
    let engine = engine(ScriptedRunner::new(vec![ok_output(body)]));
    assert_eq!(
        engine.stack_status("MoodleVPCDEV").await.unwrap().as_deref(),
        Some("UPDATE_COMPLETE")
    );
}

#[tokio::test]
async fn test_describe_outputs_missing_stack_is_typed_error() {
    let engine = engine(ScriptedRunner::new(vec![err_output(255, MISSING)]));
    let err = engine.describe_outputs("MoodleVPCDEV").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EngineError>(),
        Some(EngineError::StackNotFound(s)) if s == "MoodleVPCDEV"
    ));
}

#[tokio::test]
async fn test_describe_outputs_passes_region() {
    let body = br#"{"Stacks":[{
        "StackStatus":"CREATE_COMPLETE",
        "Outputs":[{"OutputKey":"VpcId","OutputValue":"vpc-1"}]
    }]}"#;
    let engine = engine(ScriptedRunner::new(vec![ok_output(body)]));

    let outputs = engine.describe_outputs("MoodleVPCDEV").await.unwrap();

    assert_eq!(outputs["VpcId"], "vpc-1");
    let argv = &engine.runner().invocations()[0];
    assert!(argv.windows(2).any(|w| w == ["--region", "eu-west-1"]));
}

// ── deploy_stack ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_deploy_failure_carries_exit_code_and_stderr() {
    let ctx = CompositionContext::resolve(&StackConfig::default()).unwrap();
    let graph = compose(&ctx, &StackConfig::default()).unwrap();
    let synthesis = synthesize(&graph).unwrap();
    let stack = synthesis.stack(GroupKind::Network).unwrap();
    let engine = engine(ScriptedRunner::new(vec![err_output(
        255,
        b"Waiter StackCreateComplete failed: ROLLBACK_COMPLETE",
    )]));

    let err = engine
        .deploy_stack(stack, Path::new("out/MoodleVPCDEV.template.json"))
        .await
        .unwrap_err();

    match err.downcast_ref::<EngineError>() {
        Some(EngineError::CommandFailed {
            command,
            stack,
            code,
            stderr,
        }) => {
            assert_eq!(command, "deploy");
            assert_eq!(stack, "MoodleVPCDEV");
            assert_eq!(*code, 255);
            assert!(stderr.contains("ROLLBACK_COMPLETE"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_deploy_missing_dependency_is_not_a_missing_stack() {
    let ctx = CompositionContext::resolve(&StackConfig::default()).unwrap();
    let graph = compose(&ctx, &StackConfig::default()).unwrap();
    let synthesis = synthesize(&graph).unwrap();
    let stack = synthesis.stack(GroupKind::Network).unwrap();
    let engine = engine(ScriptedRunner::new(vec![err_output(
        255,
        b"An error occurred (ValidationError) when calling the CreateChangeSet operation: \
          Role arn:aws:iam::123456789012:role/cfn-exec does not exist",
    )]));

    let err = engine
        .deploy_stack(stack, Path::new("out/MoodleVPCDEV.template.json"))
        .await
        .unwrap_err();

    let engine_err = err.downcast_ref::<EngineError>().unwrap();
    assert!(matches!(engine_err, EngineError::CommandFailed { .. }));
    assert_eq!(engine_err.code(), "ENGINE_COMMAND_FAILED");
}

#[tokio::test]
async fn test_deploy_invokes_aws_cli_with_region() {
    let ctx = CompositionContext::resolve(&StackConfig::default()).unwrap();
    let graph = compose(&ctx, &StackConfig::default()).unwrap();
    let synthesis = synthesize(&graph).unwrap();
    let stack = synthesis.stack(GroupKind::Network).unwrap();
    let engine = engine_with(
        ScriptedRunner::new(vec![ok_output(b"")]),
        EngineTarget {
            region: Some("eu-west-1".into()),
            profile: Some("ops".into()),
        },
    );

    engine
        .deploy_stack(stack, Path::new("out/MoodleVPCDEV.template.json"))
        .await
        .unwrap();

    let calls = engine.runner().invocations();
    assert_eq!(calls.len(), 1);
    let argv = &calls[0];
    assert_eq!(argv[0], "aws");
    assert_eq!(&argv[1..3], ["cloudformation", "deploy"]);
    let tail = &argv[argv.len() - 4..];
    assert_eq!(tail, ["--region", "eu-west-1", "--profile", "ops"]);
}

// ── delete_stack ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_waits_for_completion() {
    let engine = engine_with(
        ScriptedRunner::new(vec![ok_output(b""), ok_output(b"")]),
        EngineTarget::default(),
    );

    engine.delete_stack("MoodleVPCDEV").await.unwrap();

    let calls = engine.runner().invocations();
    assert_eq!(calls[0][1..3], ["cloudformation", "delete-stack"]);
    assert_eq!(calls[1][1..4], ["cloudformation", "wait", "stack-delete-complete"]);
}
