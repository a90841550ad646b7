//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Ephemeral Azure Pipelines agent: register, run one job, deregister.
#[derive(Parser)]
#[command(
    name = "pool-agent",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log at debug level (overridden by `RUST_LOG`)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Register, run a single job, then deregister (container entrypoint)
    Run,

    /// Validate configuration and resolve the agent package without registering
    Check,

    /// Deregister the agent configured in the install directory
    Remove,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command and return the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails before it can produce an exit code.
    pub async fn run(self) -> Result<i32> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            no_color,
            quiet,
            json,
        });
        match command {
            Command::Run => commands::run::run(&app).await,
            Command::Check => commands::check::run(&app).await.map(|()| 0),
            Command::Remove => commands::remove::run(&app).await,
            Command::Version => commands::version::run(&app).map(|()| 0),
        }
    }
}
