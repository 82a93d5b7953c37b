//! `stackweave deploy`: synthesize and deploy every stack.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::deploy_service::{self, DeployPorts};
use crate::infra::digest::Sha256Digester;

#[derive(Args)]
pub struct DeployArgs {
    /// Output directory for the synthesized templates (defaults to engine.out_dir)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Run the deploy command.
///
/// # Errors
///
/// Returns composition errors before anything is deployed, or the first
/// stack the engine rejects.
pub async fn run(app: &AppContext, args: DeployArgs) -> Result<ExitCode> {
    let config = app.load_config()?;
    let engine = app.engine(&config);
    let images = app.image_builder(&config);
    let store = app.artifact_store(&config, args.out);
    let reporter = app.reporter();

    let ports = DeployPorts {
        engine: &engine,
        images: &images,
        store: &store,
        digester: &Sha256Digester,
    };
    let report = match deploy_service::deploy(ports, &config, &reporter).await {
        Ok(report) => report,
        Err(e) => {
            reporter.abandon("deploy stopped");
            return Err(e);
        }
    };
    app.renderer().render_deploy(&report)?;
    Ok(ExitCode::SUCCESS)
}
