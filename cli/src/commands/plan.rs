//! `stackweave plan`: show what a deploy would create.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::synth_service;
use crate::infra::digest::Sha256Digester;

/// Run the plan command.
///
/// # Errors
///
/// Returns the first configuration or composition error.
pub fn run(app: &AppContext) -> Result<ExitCode> {
    let config = app.load_config()?;
    let plan = synth_service::plan(&config, &Sha256Digester)?;
    app.renderer().render_plan(&plan)?;
    Ok(ExitCode::SUCCESS)
}
