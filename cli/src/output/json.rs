//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed JSON document
//! on stdout; failures print the error object from [`format_error`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::config::StackConfig;
use crate::domain::synth::Synthesis;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Machine-readable renderer.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Print any serializable value as one JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn print<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!(
            "{}",
            serde_json::to_string_pretty(value).context("JSON serialization failed")?
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_validate(&self, synthesis: &Synthesis) -> Result<()> {
        self.print(&serde_json::json!({
            "valid": true,
            "manifest": synthesis.manifest,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_synth(&self, synthesis: &Synthesis, out_dir: &Path) -> Result<()> {
        self.print(&serde_json::json!({
            "out_dir": out_dir.display().to_string(),
            "manifest": synthesis.manifest,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config(&self, config: &StackConfig, path: &Path) -> Result<()> {
        self.print(&serde_json::json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_version(&self, version: &str) -> Result<()> {
        self.print(&serde_json::json!({ "version": version }))
    }
}
