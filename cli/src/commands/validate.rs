//! `stackweave validate`: compose and synthesize without writing anything.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::synth_service;
use crate::infra::digest::Sha256Digester;

/// Run the validate command.
///
/// # Errors
///
/// Returns the first configuration or composition error.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let config = app.load_config()?;
    let synthesis = synth_service::check(&config, &Sha256Digester)?;
    app.renderer().render_validate(&synthesis)?;
    Ok(ExitCode::SUCCESS)
}
