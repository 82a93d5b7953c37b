//! Seams between the use-case services and the outside world.
//!
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::Result;
use stackweave_common::Manifest;

use crate::domain::application::ImageAsset;
use crate::domain::config::StackConfig;
use crate::domain::synth::StackTemplate;

// ── Provisioning Engine Port ─────────────────────────────────────────────────

/// The external declarative-infrastructure engine.
///
/// Implementations submit whole stacks and report the engine's verdict. They
/// never retry and never attempt local recovery; a failed stack is surfaced
/// as an error and rollback is left to the engine.
#[allow(async_fn_in_trait)]
pub trait ProvisioningEngine {
    /// Create or update `stack` from the template file at `template`.
    async fn deploy_stack(&self, stack: &StackTemplate, template: &Path) -> Result<()>;
    /// Outputs of a deployed stack, keyed by output name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::EngineError::StackNotFound`] when the stack
    /// does not exist.
    async fn describe_outputs(&self, stack_name: &str) -> Result<BTreeMap<String, String>>;
    /// Current status of a stack, or `None` if it does not exist.
    async fn stack_status(&self, stack_name: &str) -> Result<Option<String>>;
    /// Delete a stack and wait until the engine reports it gone.
    async fn delete_stack(&self, stack_name: &str) -> Result<()>;
}

// ── Image Port ───────────────────────────────────────────────────────────────

/// Builds a container image from a local context and pushes it.
#[allow(async_fn_in_trait)]
pub trait ImageBuilder {
    /// Build `asset`, tag it with `tag` and push it. Returns the image URI.
    async fn build_and_push(&self, asset: &ImageAsset, tag: &str) -> Result<String>;
}

/// Content digest of a directory tree, used as an image tag.
pub trait DirectoryDigester {
    /// Lowercase hex digest over every file path and content under `dir`.
    fn digest_dir(&self, dir: &Path) -> Result<String>;
}

// ── Processes ────────────────────────────────────────────────────────────────

/// Child-process execution. Every engine and image adapter goes through it.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `program` to completion.
    ///
    /// # Errors
    ///
    /// Fails when the program cannot be started or outlives `timeout`; an
    /// expired child is killed, never left running.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;

    /// Run `program` under the runner's own timeout with `input` fed to
    /// stdin. Credentials travel this way instead of through argv.
    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output>;
}

// ── Progress ─────────────────────────────────────────────────────────────────

/// Progress events from long-running services. Implemented by the terminal
/// reporter; tests collect the events instead.
pub trait ProgressReporter {
    /// A step has started.
    fn step(&self, message: &str);
    /// The current step finished.
    fn success(&self, message: &str);
    /// The current step finished with something worth a look.
    fn warn(&self, message: &str);
}

// ── Storage Ports ─────────────────────────────────────────────────────────────

/// Persists synthesized templates and their manifest.
pub trait ArtifactStore {
    /// Write every stack template plus the manifest. Returns the directory.
    fn write_stacks(&self, stacks: &[StackTemplate], manifest: &Manifest) -> Result<PathBuf>;
    /// Where the template of `stack` is (or will be) written.
    fn template_path(&self, stack: &StackTemplate) -> PathBuf;
}

/// Loads and saves the user configuration file.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when no file exists.
    fn load(&self) -> Result<StackConfig>;
    /// Persist the configuration.
    fn save(&self, config: &StackConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
