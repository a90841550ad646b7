//! Remove command: operator recovery of an orphaned registration.
//!
//! Uses the agent already configured in `AZP_AGENT_DIR` and the same retry
//! policy as the lifecycle's cleanup.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::TerminationSource;
use crate::application::services::{cleanup, credential};
use crate::infra::agent_tool::{ScriptAgentTool, is_agent_dir};
use crate::infra::clock::TokioClock;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::load_settings;
use crate::infra::identity::{IdentityEndpoint, ManagedIdentityClient};
use crate::infra::signals::SignalTermination;
use crate::output::{TerminalReporter, json};

/// Entry point for `pool-agent remove`. Returns the process exit code.
///
/// # Errors
///
/// Returns an error if no agent is installed, the token cannot be acquired,
/// or a configured retry cap is exhausted.
pub async fn run(app: &AppContext) -> Result<i32> {
    let settings = load_settings()?;
    anyhow::ensure!(
        is_agent_dir(&settings.agent_dir),
        "no agent is installed in {}",
        settings.agent_dir.display()
    );
    let mut termination = SignalTermination::install()?;
    let reporter = TerminalReporter::new(&app.output);

    let tokens = ManagedIdentityClient::new(IdentityEndpoint::from_env())?;
    let token = credential::resolve_credential(&tokens, &settings.identity, &reporter).await?;
    let tool = ScriptAgentTool::new(TokioCommandRunner::default(), settings.agent_dir.clone());

    let attempts = tokio::select! {
        removed = cleanup::deregister(&tool, &token, &settings.retry, &TokioClock, &reporter) => removed?,
        signal = termination.recv() => {
            tracing::warn!(%signal, "agent removal abandoned");
            return Ok(signal.exit_code());
        }
    };

    if app.is_json() {
        json::print(&serde_json::json!({
            "agent_name": settings.agent_name,
            "pool": settings.pool,
            "removal_attempts": attempts,
        }))?;
    }
    Ok(0)
}
