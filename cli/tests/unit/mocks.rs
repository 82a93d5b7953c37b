//! Shared mock ports for unit tests.
//!
//! Every mock records what it was asked to do so tests can assert on the
//! exact sequence of engine calls.

#![allow(dead_code, clippy::expect_used)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use stackweave_cli::application::ports::{
    ArtifactStore, CommandRunner, ConfigStore, DirectoryDigester, ImageBuilder, ProgressReporter,
    ProvisioningEngine,
};
use stackweave_cli::domain::application::ImageAsset;
use stackweave_cli::domain::config::StackConfig;
use stackweave_cli::domain::{EngineError, StackTemplate};
use stackweave_common::Manifest;

// ── Output helpers ────────────────────────────────────────────────────────────

/// Build an `ExitStatus` from a logical exit code (0 = success).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// In-memory provisioning engine.
///
/// Deployed stacks become existing; `fail_on` makes one stack's deploy or
/// delete fail with a `CommandFailed` error.
#[derive(Default)]
pub struct RecordingEngine {
    pub calls: Mutex<Vec<String>>,
    pub existing: Mutex<BTreeSet<String>>,
    pub outputs: BTreeMap<String, BTreeMap<String, String>>,
    pub fail_on: Option<String>,
}

impl RecordingEngine {
    pub fn with_existing(stacks: &[&str]) -> Self {
        Self {
            existing: Mutex::new(stacks.iter().map(ToString::to_string).collect()),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, stack: &str, key: &str, value: &str) -> Self {
        self.outputs
            .entry(stack.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn failing_on(mut self, stack: &str) -> Self {
        self.fail_on = Some(stack.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("lock").push(call);
    }

    fn check_failure(&self, command: &str, stack: &str) -> Result<()> {
        if self.fail_on.as_deref() == Some(stack) {
            return Err(EngineError::CommandFailed {
                command: command.to_string(),
                stack: stack.to_string(),
                code: 255,
                stderr: "ROLLBACK_COMPLETE".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl ProvisioningEngine for RecordingEngine {
    async fn deploy_stack(&self, stack: &StackTemplate, _template: &Path) -> Result<()> {
        self.record(format!("deploy {}", stack.name));
        self.check_failure("deploy", &stack.name)?;
        self.existing.lock().expect("lock").insert(stack.name.clone());
        Ok(())
    }

    async fn describe_outputs(&self, stack_name: &str) -> Result<BTreeMap<String, String>> {
        self.record(format!("outputs {stack_name}"));
        if !self.existing.lock().expect("lock").contains(stack_name) {
            return Err(EngineError::StackNotFound(stack_name.to_string()).into());
        }
        Ok(self.outputs.get(stack_name).cloned().unwrap_or_default())
    }

    async fn stack_status(&self, stack_name: &str) -> Result<Option<String>> {
        self.record(format!("status {stack_name}"));
        Ok(self
            .existing
            .lock()
            .expect("lock")
            .contains(stack_name)
            .then(|| "CREATE_COMPLETE".to_string()))
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.record(format!("delete {stack_name}"));
        self.check_failure("delete-stack", stack_name)?;
        self.existing.lock().expect("lock").remove(stack_name);
        Ok(())
    }
}

// ── Images ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingImages {
    pub built: Mutex<Vec<(PathBuf, String)>>,
}

impl ImageBuilder for RecordingImages {
    async fn build_and_push(&self, asset: &ImageAsset, tag: &str) -> Result<String> {
        self.built
            .lock()
            .expect("lock")
            .push((asset.directory.clone(), tag.to_string()));
        Ok(asset.image_uri(tag))
    }
}

pub struct FixedDigester(pub &'static str);

impl DirectoryDigester for FixedDigester {
    fn digest_dir(&self, _dir: &Path) -> Result<String> {
        Ok(self.0.to_string())
    }
}

// ── Storage ───────────────────────────────────────────────────────────────────

/// Keeps the last written stacks and manifest in memory.
#[derive(Default)]
pub struct MemoryArtifacts {
    pub written: Mutex<Option<(Vec<String>, Manifest)>>,
}

impl ArtifactStore for MemoryArtifacts {
    fn write_stacks(&self, stacks: &[StackTemplate], manifest: &Manifest) -> Result<PathBuf> {
        let names = stacks.iter().map(|s| s.name.clone()).collect();
        *self.written.lock().expect("lock") = Some((names, manifest.clone()));
        Ok(PathBuf::from("/mem"))
    }

    fn template_path(&self, stack: &StackTemplate) -> PathBuf {
        Path::new("/mem").join(stack.file_name())
    }
}

#[derive(Default)]
pub struct MemoryConfigStore {
    pub config: Mutex<StackConfig>,
    pub saves: Mutex<usize>,
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<StackConfig> {
        Ok(self.config.lock().expect("lock").clone())
    }

    fn save(&self, config: &StackConfig) -> Result<()> {
        *self.config.lock().expect("lock") = config.clone();
        *self.saves.lock().expect("lock") += 1;
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/mem/config.yaml"))
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct CollectingReporter {
    pub events: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock").clone()
    }
}

impl ProgressReporter for CollectingReporter {
    fn step(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("ok: {message}"));
    }
    fn warn(&self, message: &str) {
        self.events.lock().expect("lock").push(format!("warn: {message}"));
    }
}

// ── Command runner ────────────────────────────────────────────────────────────

/// Returns queued outputs in order and records every invocation.
#[derive(Default)]
pub struct ScriptedRunner {
    pub responses: Mutex<VecDeque<Output>>,
    pub invocations: Mutex<Vec<Vec<String>>>,
    pub stdin: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedRunner {
    pub fn new(responses: Vec<Output>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.lock().expect("lock").clone()
    }

    fn next(&self, program: &str, args: &[&str]) -> Result<Output> {
        let mut argv = vec![program.to_string()];
        argv.extend(args.iter().map(ToString::to_string));
        self.invocations.lock().expect("lock").push(argv);
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("unexpected call: {program} {args:?}"))
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.next(program, args)
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
        self.stdin.lock().expect("lock").push(input.to_vec());
        self.next(program, args)
    }
}

/// Default stack names for application `Moodle` in environment `DEV`.
pub const STACKS: [&str; 5] = [
    "MoodleVPCDEV",
    "MoodleLoadBalancerDEV",
    "MoodleDatabaseDEV",
    "MoodleFileSystemDEV",
    "MoodleApplicationDEV",
];
