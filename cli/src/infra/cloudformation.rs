//! `ProvisioningEngine` backed by the `aws cloudformation` CLI.
//!
//! All process execution goes through the injected [`CommandRunner`], so
//! tests drive this adapter with canned outputs.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

use crate::application::ports::{CommandRunner, ProvisioningEngine};
use crate::domain::config::EngineConfig;
use crate::domain::error::EngineError;
use crate::domain::synth::StackTemplate;
use crate::infra::command_runner::QUERY_TIMEOUT;

const AWS: &str = "aws";
const CAPABILITIES: [&str; 3] = [
    "CAPABILITY_IAM",
    "CAPABILITY_NAMED_IAM",
    "CAPABILITY_AUTO_EXPAND",
];

/// Region and credentials profile applied to every engine call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineTarget {
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl EngineTarget {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            region: config.region.clone(),
            profile: config.profile.clone(),
        }
    }

    pub(crate) fn push_args(&self, args: &mut Vec<String>) {
        if let Some(region) = &self.region {
            args.extend(["--region".to_string(), region.clone()]);
        }
        if let Some(profile) = &self.profile {
            args.extend(["--profile".to_string(), profile.clone()]);
        }
    }
}

pub struct CloudFormationEngine<R> {
    runner: R,
    target: EngineTarget,
    timeout: Duration,
}

impl<R: CommandRunner> CloudFormationEngine<R> {
    /// `timeout` bounds stack creation, update and deletion waits.
    #[must_use]
    pub fn new(runner: R, target: EngineTarget, timeout: Duration) -> Self {
        Self {
            runner,
            target,
            timeout,
        }
    }

    /// The command runner every engine call goes through.
    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    async fn call(
        &self,
        command: &str,
        stack: &str,
        mut args: Vec<String>,
        timeout: Duration,
    ) -> Result<Result<Vec<u8>, EngineError>> {
        self.target.push_args(&mut args);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.runner.run_with_timeout(AWS, &argv, timeout).await?;
        if output.status.success() {
            return Ok(Ok(output.stdout));
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if is_missing_stack(&stderr, stack) {
            return Ok(Err(EngineError::StackNotFound(stack.to_string())));
        }
        Ok(Err(EngineError::CommandFailed {
            command: command.to_string(),
            stack: stack.to_string(),
            code: output.status.code().unwrap_or(-1),
            stderr,
        }))
    }

    async fn describe(&self, stack: &str) -> Result<Option<DescribedStack>> {
        let args = vec![
            "cloudformation".to_string(),
            "describe-stacks".to_string(),
            "--stack-name".to_string(),
            stack.to_string(),
            "--output".to_string(),
            "json".to_string(),
        ];
        match self.call("describe-stacks", stack, args, QUERY_TIMEOUT).await? {
            Ok(stdout) => Ok(Some(parse_describe_stacks(stack, &stdout)?)),
            Err(EngineError::StackNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: CommandRunner> ProvisioningEngine for CloudFormationEngine<R> {
    async fn deploy_stack(&self, stack: &StackTemplate, template: &Path) -> Result<()> {
        let args = deploy_args(stack, template);
        self.call("deploy", &stack.name, args, self.timeout).await??;
        Ok(())
    }

    async fn describe_outputs(&self, stack_name: &str) -> Result<BTreeMap<String, String>> {
        let described = self
            .describe(stack_name)
            .await?
            .ok_or_else(|| EngineError::StackNotFound(stack_name.to_string()))?;
        Ok(described.outputs())
    }

    async fn stack_status(&self, stack_name: &str) -> Result<Option<String>> {
        Ok(self.describe(stack_name).await?.map(|s| s.stack_status))
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        let base = |verb: &[&str]| -> Vec<String> {
            let mut args = vec!["cloudformation".to_string()];
            args.extend(verb.iter().map(ToString::to_string));
            args.extend(["--stack-name".to_string(), stack_name.to_string()]);
            args
        };
        self.call(
            "delete-stack",
            stack_name,
            base(&["delete-stack"]),
            QUERY_TIMEOUT,
        )
        .await??;
        self.call(
            "wait stack-delete-complete",
            stack_name,
            base(&["wait", "stack-delete-complete"]),
            self.timeout,
        )
        .await??;
        Ok(())
    }
}

/// Arguments of `aws cloudformation deploy` for one stack, without the
/// region and profile flags.
#[must_use]
pub fn deploy_args(stack: &StackTemplate, template: &Path) -> Vec<String> {
    let mut args: Vec<String> = [
        "cloudformation",
        "deploy",
        "--template-file",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    args.push(template.display().to_string());
    args.extend(["--stack-name".to_string(), stack.name.clone()]);
    args.push("--capabilities".to_string());
    args.extend(CAPABILITIES.iter().map(ToString::to_string));
    args.push("--no-fail-on-empty-changeset".to_string());
    if !stack.tags.is_empty() {
        args.push("--tags".to_string());
        args.extend(stack.tags.iter().map(|(k, v)| format!("{k}={v}")));
    }
    args
}

/// Only the engine's own stack lookup error counts; other "does not exist"
/// failures (roles, buckets, parameters) stay command failures.
fn is_missing_stack(stderr: &str, stack: &str) -> bool {
    stderr.contains(&format!("Stack with id {stack} does not exist"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacks {
    stacks: Vec<DescribedStack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribedStack {
    stack_status: String,
    #[serde(default)]
    outputs: Vec<DescribedOutput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribedOutput {
    output_key: String,
    output_value: String,
}

impl DescribedStack {
    fn outputs(self) -> BTreeMap<String, String> {
        self.outputs
            .into_iter()
            .map(|o| (o.output_key, o.output_value))
            .collect()
    }
}

fn parse_describe_stacks(stack: &str, stdout: &[u8]) -> Result<DescribedStack, EngineError> {
    let parsed: DescribeStacks =
        serde_json::from_slice(stdout).map_err(|e| EngineError::MalformedOutput {
            stack: stack.to_string(),
            reason: e.to_string(),
        })?;
    parsed
        .stacks
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::MalformedOutput {
            stack: stack.to_string(),
            reason: "no stacks in describe-stacks response".to_string(),
        })
}
