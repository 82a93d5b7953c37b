//! `stackweave destroy`: delete every stack, dependents first.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::destroy_service;
use crate::domain::graph::CompositionContext;

/// Run the destroy command.
///
/// # Errors
///
/// Returns an error on the first stack that fails to delete.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = app.load_config()?;
    let ctx = CompositionContext::resolve(&config)?;

    if !app.is_json() && !app.output.quiet {
        println!();
        println!(
            "This will delete every {} stack in {}.",
            ctx.application, ctx.environment
        );
        println!("The database is kept as a final snapshot when its removal policy says so.");
        println!();
    }
    if !app.confirm("Continue?")? {
        app.output.info("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let engine = app.engine(&config);
    let reporter = app.reporter();
    let results = match destroy_service::destroy(&engine, &config, &reporter).await {
        Ok(results) => results,
        Err(e) => {
            reporter.abandon("destroy stopped");
            return Err(e);
        }
    };
    app.renderer().render_destroy(&results)?;
    Ok(ExitCode::SUCCESS)
}
