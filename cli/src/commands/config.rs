//! `stackweave config`: show and set configuration values.

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print every settable key and its value
    Show,
    /// Validate and store one value, e.g. `network.az_count 3`
    Set {
        /// One of the keys listed by `config show`
        key: String,
        value: String,
    },
    /// Print the configuration file path
    Path,
}

/// Dispatch a `config` subcommand.
///
/// # Errors
///
/// Returns an error if the key or value is invalid or the file cannot be
/// read or written.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => {
            let stored = config_service::load_config(&app.config_store)?;
            app.renderer()
                .render_config(&stored, &app.config_store.path()?)?;
        }
        ConfigCommand::Set { key, value } => {
            config_service::set_value(&app.config_store, &key, &value)?;
            app.output.success(&format!("Set {key} = {value}"));
        }
        ConfigCommand::Path => {
            println!("{}", app.config_store.path()?.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}
