//! Application service: Job Runner.

use anyhow::Result;

use crate::application::ports::{JobHandle, JobOutcome, TerminationSource};
use crate::domain::Termination;

/// How the job cycle ended from the orchestrator's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCycle {
    /// The agent process exited by itself.
    Finished(JobOutcome),
    /// A termination request arrived first. The job is still running.
    Interrupted(Termination),
}

/// Wait for one job cycle, or for a termination request, whichever is first.
///
/// On interruption the job is left running: the caller keeps `job` alive
/// while deregistration waits for the in-flight job to finish.
///
/// # Errors
///
/// Returns an error if waiting on the agent process fails.
pub async fn run_single_job(
    job: &mut impl JobHandle,
    termination: &mut impl TerminationSource,
) -> Result<JobCycle> {
    tokio::select! {
        outcome = job.wait() => {
            let outcome = outcome?;
            tracing::info!(?outcome, "job cycle finished");
            Ok(JobCycle::Finished(outcome))
        }
        signal = termination.recv() => {
            tracing::warn!(%signal, "termination requested while the job is running");
            Ok(JobCycle::Interrupted(signal))
        }
    }
}
