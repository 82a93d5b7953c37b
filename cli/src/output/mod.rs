//! Terminal and JSON presentation of command results.

pub mod human;
pub mod json;
pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
use stackweave_common::{DeployReport, StackOutputs, StackResult};

pub use human::HumanRenderer;
pub use json::JsonRenderer;
pub use reporter::TerminalReporter;
pub use styles::Styles;

use crate::domain::config::StackConfig;
use crate::domain::graph::Plan;
use crate::domain::synth::Synthesis;

/// Colors need a terminal and neither `--no-color` nor `NO_COLOR`.
fn wants_color(no_color_flag: bool, is_tty: bool, no_color_env: bool) -> bool {
    is_tty && !no_color_flag && !no_color_env
}

/// Styling and terminal state shared by renderers and the reporter.
pub struct OutputContext {
    pub styles: Styles,
    /// stdout is a terminal; spinners are drawn only then.
    pub is_tty: bool,
    /// Only errors are printed.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors follow `--no-color`, `NO_COLOR` and whether stdout is a terminal.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let colored = wants_color(no_color, is_tty, std::env::var_os("NO_COLOR").is_some());
        Self {
            styles: if colored { Styles::colored() } else { Styles::plain() },
            is_tty,
            quiet,
        }
    }

    #[must_use]
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.is_tty
    }

    fn marked(&self, mark: &str, style: owo_colors::Style, msg: &str) {
        if self.quiet {
            return;
        }
        println!("  {} {msg}", mark.style(style));
    }

    pub fn success(&self, msg: &str) {
        self.marked("✓", self.styles.success, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.marked("⚠", self.styles.warning, msg);
    }

    pub fn info(&self, msg: &str) {
        self.marked("ℹ", self.styles.info, msg);
    }

    /// Goes to stderr and ignores `quiet`.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// `key` dimmed, then `value`.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}

/// Mode-dispatching renderer returned by `AppContext::renderer`.
pub enum Renderer<'a> {
    Human(HumanRenderer<'a>),
    Json(JsonRenderer),
}

impl Renderer<'_> {
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_plan(&self, plan: &Plan) -> anyhow::Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_plan(plan);
                Ok(())
            }
            Renderer::Json(r) => r.print(plan),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_validate(&self, synthesis: &Synthesis) -> anyhow::Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_validate(synthesis);
                Ok(())
            }
            Renderer::Json(r) => r.render_validate(synthesis),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_synth(
        &self,
        synthesis: &Synthesis,
        out_dir: &std::path::Path,
    ) -> anyhow::Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_synth(synthesis, out_dir);
                Ok(())
            }
            Renderer::Json(r) => r.render_synth(synthesis, out_dir),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_deploy(&self, report: &DeployReport) -> anyhow::Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_deploy(report);
                Ok(())
            }
            Renderer::Json(r) => r.print(report),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_destroy(&self, results: &[StackResult]) -> anyhow::Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_destroy(results);
                Ok(())
            }
            Renderer::Json(r) => r.print(&results),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_outputs(&self, outputs: &[StackOutputs]) -> anyhow::Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_outputs(outputs);
                Ok(())
            }
            Renderer::Json(r) => r.print(&outputs),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_config(
        &self,
        config: &StackConfig,
        path: &std::path::Path,
    ) -> anyhow::Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_config(config, path);
                Ok(())
            }
            Renderer::Json(r) => r.render_config(config, path),
        }
    }

    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render_version(&self, version: &str) -> anyhow::Result<()> {
        match self {
            Renderer::Human(r) => {
                r.render_version(version);
                Ok(())
            }
            Renderer::Json(r) => r.render_version(version),
        }
    }
}
