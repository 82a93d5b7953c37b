//! `stackweave synth`: write templates and the manifest.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::synth_service;
use crate::infra::digest::Sha256Digester;

#[derive(Args)]
pub struct SynthArgs {
    /// Output directory (defaults to engine.out_dir)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Run the synth command.
///
/// # Errors
///
/// Returns composition errors or an error if the files cannot be written.
pub fn run(app: &AppContext, args: SynthArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let store = app.artifact_store(&config, args.out);
    let outcome = synth_service::synth(&config, &Sha256Digester, &store)?;
    app.renderer()
        .render_synth(&outcome.synthesis, &outcome.out_dir)?;
    Ok(ExitCode::SUCCESS)
}
