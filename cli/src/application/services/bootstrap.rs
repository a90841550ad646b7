//! Application service: the full agent lifecycle.
//!
//! Resolve → Register → Run → Cleanup, strictly in that order. Termination
//! requests are consumed from an injected `TerminationSource`; once the agent
//! is registered every exit path goes through cleanup.

use anyhow::Result;

use crate::application::ports::{
    AgentPackages, AgentTool, Clock, JobOutcome, ProgressReporter, TerminationSource,
    TokenProvider,
};
use crate::application::services::job_runner::{JobCycle, run_single_job};
use crate::application::services::{cleanup, credential, registrar};
use crate::domain::{AccessToken, AgentSettings, Lifecycle, Termination};

/// Infrastructure the lifecycle runs against.
pub struct BootstrapPorts<'a, P, K, T, C, R> {
    pub tokens: &'a P,
    pub packages: &'a K,
    pub tool: &'a T,
    pub clock: &'a C,
    pub reporter: &'a R,
}

/// What happened during one lifecycle run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub termination: Termination,
    /// `None` when no job cycle finished (signal, placeholder).
    pub job: Option<JobOutcome>,
    pub removal_attempts: u32,
    pub placeholder: bool,
}

impl RunReport {
    /// 0 on clean completion, 130/143 after signal-driven cleanup, 1 if the
    /// job itself failed.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.termination.is_signal() {
            return self.termination.exit_code();
        }
        match self.job {
            Some(JobOutcome::Failed { .. }) => 1,
            _ => 0,
        }
    }

    fn aborted(termination: Termination) -> Self {
        Self {
            termination,
            job: None,
            removal_attempts: 0,
            placeholder: false,
        }
    }
}

/// Run the agent lifecycle once.
///
/// # Errors
///
/// Returns the first fatal error (authentication, package resolution,
/// registration). Errors after registration are returned only after
/// cleanup has removed the agent.
pub async fn run_agent<P, K, T, C, R>(
    ports: &BootstrapPorts<'_, P, K, T, C, R>,
    settings: &AgentSettings,
    termination: &mut impl TerminationSource,
) -> Result<RunReport>
where
    P: TokenProvider,
    K: AgentPackages,
    T: AgentTool,
    C: Clock,
    R: ProgressReporter,
{
    // Nothing is registered yet, so a signal here simply aborts.
    let token = tokio::select! {
        prepared = prepare(ports, settings) => prepared?,
        signal = termination.recv() => {
            tracing::warn!(%signal, "termination requested before registration");
            return Ok(RunReport::aborted(signal));
        }
    };

    let mut lifecycle = Lifecycle::new();
    registrar::register(
        ports.tool,
        &settings.url,
        &settings.registration(),
        &token,
        ports.reporter,
    )
    .await?;

    if settings.placeholder {
        lifecycle.discard_placeholder()?;
        tracing::info!(agent = %settings.agent_name, "placeholder registered, exiting");
        ports
            .reporter
            .success("Placeholder agent registered; skipping job execution");
        return Ok(RunReport {
            termination: Termination::Completed,
            job: None,
            removal_attempts: 0,
            placeholder: true,
        });
    }
    lifecycle.registered()?;

    let (trigger, job, job_error, running) = match pending_termination(termination).await {
        Some(signal) => {
            tracing::warn!(%signal, "termination requested during registration");
            (signal, None, None, None)
        }
        None => execute_job(ports, termination).await,
    };

    let removed = cleanup::cleanup(
        &mut lifecycle,
        trigger,
        ports.tool,
        &token,
        &settings.retry,
        ports.clock,
        ports.reporter,
    )
    .await;
    // The agent process outlives the signal until removal succeeds.
    drop(running);
    drop(token);

    let removal_attempts = match removed {
        Ok(attempts) => attempts,
        Err(e) => {
            if lifecycle.owns_registration() {
                tracing::error!(agent = %settings.agent_name, "agent left registered in pool");
            }
            if let Some(job_error) = &job_error {
                tracing::error!(error = %format!("{job_error:#}"), "job runner failed");
            }
            return Err(e);
        }
    };
    debug_assert!(!lifecycle.owns_registration());
    if let Some(e) = job_error {
        return Err(e);
    }

    // A signal that arrived while removal was retrying still decides the
    // exit status.
    let trigger = match trigger {
        Termination::Completed => match pending_termination(termination).await {
            Some(signal) => {
                tracing::warn!(%signal, "termination requested during cleanup");
                signal
            }
            None => trigger,
        },
        signal => signal,
    };

    Ok(RunReport {
        termination: trigger,
        job,
        removal_attempts,
        placeholder: false,
    })
}

/// Credential and package installation, the cancellable part.
async fn prepare<P, K, T, C, R>(
    ports: &BootstrapPorts<'_, P, K, T, C, R>,
    settings: &AgentSettings,
) -> Result<AccessToken>
where
    P: TokenProvider,
    K: AgentPackages,
    R: ProgressReporter,
{
    let token =
        credential::resolve_credential(ports.tokens, &settings.identity, ports.reporter).await?;
    let package =
        registrar::resolve_package(ports.packages, &settings.url, &token, ports.reporter).await?;
    registrar::install(ports.packages, &package, &settings.agent_dir, ports.reporter).await?;
    Ok(token)
}

type JobResult<J> = (
    Termination,
    Option<JobOutcome>,
    Option<anyhow::Error>,
    Option<J>,
);

/// Start and watch the single job cycle. Failures are captured rather than
/// propagated so cleanup still runs.
async fn execute_job<P, K, T, C, R>(
    ports: &BootstrapPorts<'_, P, K, T, C, R>,
    termination: &mut impl TerminationSource,
) -> JobResult<T::Job>
where
    T: AgentTool,
    R: ProgressReporter,
{
    ports.reporter.step("Running Azure Pipelines agent...");
    let mut job = match ports.tool.start_job().await {
        Ok(job) => job,
        Err(e) => return (Termination::Completed, None, Some(e), None),
    };
    match run_single_job(&mut job, termination).await {
        Ok(JobCycle::Finished(outcome)) => {
            if let JobOutcome::Failed { code } = outcome {
                ports
                    .reporter
                    .warn(&format!("Agent exited with failure (code {code:?})"));
            }
            (Termination::Completed, Some(outcome), None, Some(job))
        }
        Ok(JobCycle::Interrupted(signal)) => (signal, None, None, Some(job)),
        Err(e) => (Termination::Completed, None, Some(e), Some(job)),
    }
}

/// A termination request that is already waiting, without blocking.
async fn pending_termination(termination: &mut impl TerminationSource) -> Option<Termination> {
    tokio::select! {
        biased;
        signal = termination.recv() => Some(signal),
        () = std::future::ready(()) => None,
    }
}
