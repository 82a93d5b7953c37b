//! `stackweave outputs`: show outputs of the deployed stacks.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use stackweave_common::GroupKind;

use crate::app::AppContext;
use crate::application::services::outputs_service;

#[derive(Args)]
pub struct OutputsArgs {
    /// Only show this group's stack
    #[arg(long, value_enum)]
    pub group: Option<GroupKind>,
}

/// Run the outputs command.
///
/// # Errors
///
/// Returns an error if the engine cannot be queried.
pub async fn run(app: &AppContext, args: OutputsArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let engine = app.engine(&config);
    let outputs = outputs_service::outputs(&engine, &config, args.group).await?;
    app.renderer().render_outputs(&outputs)?;
    Ok(ExitCode::SUCCESS)
}
