//! pool-agent - ephemeral Azure Pipelines agent bootstrap

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pool_agent::cli::Cli;
use pool_agent::output::json;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let as_json = cli.json;
    let code = match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "pool-agent failed");
            if as_json {
                if let Ok(text) = json::format_error(&format!("{e:#}"), json::error_code(&e)) {
                    println!("{text}");
                }
            }
            eprintln!("Error: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

/// Structured logs go to stderr so stdout stays free for command output.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}
