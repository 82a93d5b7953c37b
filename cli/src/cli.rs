//! Command-line surface: global flags, subcommands and dispatch.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, RunOptions};
use crate::commands;

/// Compose and deploy a multi-stack web application
#[derive(Parser)]
#[command(
    name = "stackweave",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Print the result as one JSON document
    #[arg(long, global = true)]
    pub json: bool,

    /// Print errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Never color output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log engine commands and composition details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Environment tag for this run, e.g. DEV or PROD
    #[arg(short, long, global = true, env = "STACKWEAVE_ENVIRONMENT")]
    pub environment: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check that the configuration composes and synthesizes
    Validate,

    /// Show the stacks, subnets and access rules a deploy would create
    Plan,

    /// Write stack templates and the manifest without deploying
    Synth(commands::synth::SynthArgs),

    /// Deploy every stack in dependency order
    Deploy(commands::deploy::DeployArgs),

    /// Delete every stack in reverse dependency order
    Destroy,

    /// Show outputs of the deployed stacks
    Outputs(commands::outputs::OutputsArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Build the context and run the selected command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            json,
            quiet,
            no_color,
            yes,
            environment,
            command,
            ..
        } = self;
        let app = AppContext::new(RunOptions {
            json,
            quiet,
            no_color,
            yes,
            environment,
        });

        match command {
            Command::Validate => commands::validate::run(&app),
            Command::Plan => commands::plan::run(&app),
            Command::Synth(args) => commands::synth::run(&app, args),
            Command::Deploy(args) => commands::deploy::run(&app, args).await,
            Command::Destroy => commands::destroy::run(&app).await,
            Command::Outputs(args) => commands::outputs::run(&app, args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => commands::version::run(&app),
        }
    }
}
