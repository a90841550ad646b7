//! Run command: the container entrypoint lifecycle.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::bootstrap::{BootstrapPorts, RunReport, run_agent};
use crate::infra::agent_tool::ScriptAgentTool;
use crate::infra::clock::TokioClock;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::load_settings;
use crate::infra::identity::{IdentityEndpoint, ManagedIdentityClient};
use crate::infra::packages::DevOpsPackages;
use crate::infra::signals::SignalTermination;
use crate::output::{TerminalReporter, json};

/// Entry point for `pool-agent run`. Returns the process exit code.
///
/// # Errors
///
/// Returns configuration, authentication, package, registration, or
/// deregistration errors.
pub async fn run(app: &AppContext) -> Result<i32> {
    let settings = load_settings()?;
    let mut termination = SignalTermination::install()?;
    tracing::info!(
        url = %settings.url,
        pool = %settings.pool,
        agent = %settings.agent_name,
        placeholder = settings.placeholder,
        "bootstrap starting"
    );

    let tokens = ManagedIdentityClient::new(IdentityEndpoint::from_env())?;
    let packages = DevOpsPackages::new()?;
    let tool = ScriptAgentTool::new(TokioCommandRunner::default(), settings.agent_dir.clone());
    let reporter = TerminalReporter::new(&app.output);
    let ports = BootstrapPorts {
        tokens: &tokens,
        packages: &packages,
        tool: &tool,
        clock: &TokioClock,
        reporter: &reporter,
    };

    let report = run_agent(&ports, &settings, &mut termination).await?;
    tracing::info!(
        termination = %report.termination,
        job = ?report.job,
        removal_attempts = report.removal_attempts,
        exit_code = report.exit_code(),
        "bootstrap finished"
    );
    if app.is_json() {
        json::print(&summary(&report))?;
    }
    Ok(report.exit_code())
}

fn summary(report: &RunReport) -> serde_json::Value {
    use crate::application::ports::JobOutcome;

    let job = match report.job {
        Some(JobOutcome::Succeeded) => serde_json::json!({ "succeeded": true }),
        Some(JobOutcome::Failed { code }) => {
            serde_json::json!({ "succeeded": false, "exit_code": code })
        }
        None => serde_json::Value::Null,
    };
    serde_json::json!({
        "termination": report.termination.to_string(),
        "placeholder": report.placeholder,
        "job": job,
        "removal_attempts": report.removal_attempts,
        "exit_code": report.exit_code(),
    })
}
