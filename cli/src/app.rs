//! Per-invocation context handed to every command: output settings, the
//! config store, and factories for the engine-facing adapters.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::services::config_service;
use crate::domain::config::StackConfig;
use crate::infra::cloudformation::{CloudFormationEngine, EngineTarget};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::docker::DockerImageBuilder;
use crate::infra::fs::FsArtifactStore;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer, TerminalReporter};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    /// One JSON document on stdout, no progress output.
    Json,
}

/// Global options of one invocation, taken from the command line.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub json: bool,
    pub quiet: bool,
    pub no_color: bool,
    /// Answer yes to confirmations. `CI` and `STACKWEAVE_YES` do the same.
    pub yes: bool,
    /// Replaces `application.environment` for this run only.
    pub environment: Option<String>,
}

/// State shared by every command handler of one invocation.
pub struct AppContext {
    pub output: OutputContext,
    pub mode: OutputMode,
    pub config_store: YamlConfigStore,
    pub environment: Option<String>,
    /// Confirmations are skipped and treated as accepted.
    pub non_interactive: bool,
}

impl AppContext {
    #[must_use]
    pub fn new(options: RunOptions) -> Self {
        let unattended = ["CI", "STACKWEAVE_YES"]
            .iter()
            .any(|var| std::env::var_os(var).is_some());
        Self {
            output: OutputContext::new(options.no_color, options.quiet),
            mode: if options.json {
                OutputMode::Json
            } else {
                OutputMode::Human
            },
            config_store: YamlConfigStore::new(),
            environment: options.environment,
            non_interactive: options.yes || unattended,
        }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Progress reporter for long-running services. Silent in JSON mode.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        match self.mode {
            OutputMode::Human => TerminalReporter::new(&self.output),
            OutputMode::Json => TerminalReporter::silent(&self.output),
        }
    }

    /// Configuration file contents with the environment override applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the override is invalid.
    pub fn load_config(&self) -> Result<StackConfig> {
        config_service::load_effective(&self.config_store, self.environment.as_deref())
    }

    #[must_use]
    pub fn engine(&self, config: &StackConfig) -> CloudFormationEngine<TokioCommandRunner> {
        let timeout = command_timeout(config);
        CloudFormationEngine::new(
            TokioCommandRunner::new(timeout),
            EngineTarget::from_config(&config.engine),
            timeout,
        )
    }

    #[must_use]
    pub fn image_builder(&self, config: &StackConfig) -> DockerImageBuilder<TokioCommandRunner> {
        let timeout = command_timeout(config);
        DockerImageBuilder::new(
            TokioCommandRunner::new(timeout),
            EngineTarget::from_config(&config.engine),
            timeout,
        )
    }

    /// Artifact store rooted at `out`, or the configured output directory.
    #[must_use]
    pub fn artifact_store(&self, config: &StackConfig, out: Option<PathBuf>) -> FsArtifactStore {
        FsArtifactStore::new(out.unwrap_or_else(|| config.engine.out_dir.clone()))
    }

    /// Yes/no prompt defaulting to no. Accepted without asking when
    /// non-interactive.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be shown, e.g. without a TTY.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.non_interactive {
            return Ok(true);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("confirmation prompt failed")
    }
}

fn command_timeout(config: &StackConfig) -> Duration {
    Duration::from_secs(config.engine.command_timeout_secs)
}
