//! stackweave: compose and deploy a multi-stack web application

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use stackweave_cli::cli::Cli;
use stackweave_cli::domain::EngineError;
use stackweave_cli::output::json;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let as_json = cli.json;

    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            if as_json {
                let code = e
                    .downcast_ref::<EngineError>()
                    .map_or("ERROR", EngineError::code);
                match json::format_error(&format!("{e:#}"), code) {
                    Ok(body) => println!("{body}"),
                    Err(_) => eprintln!("Error: {e:#}"),
                }
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

/// `STACKWEAVE_LOG` wins over `RUST_LOG`; `--verbose` raises the default
/// from `warn` to `debug`. Logs always go to stderr.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("STACKWEAVE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
