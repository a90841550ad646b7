//! Application service: Cleanup Handler.
//!
//! Deregistration is the only retried operation: a stale pool entry is
//! worse than a delayed shutdown.

use anyhow::Result;

use crate::application::ports::{AgentTool, Clock, ProgressReporter};
use crate::domain::{
    AccessToken, DeregistrationConflict, DeregistrationExhausted, Lifecycle, RetryDecision,
    RetryPolicy, Termination,
};

/// Drive `Registered → Cleaning → Removed` for `trigger`.
///
/// Returns the number of removal attempts made.
///
/// # Errors
///
/// Returns `LifecycleError` if nothing is registered, or
/// `DeregistrationExhausted` if a retry cap is configured and runs out.
pub async fn cleanup(
    lifecycle: &mut Lifecycle,
    trigger: Termination,
    tool: &impl AgentTool,
    token: &AccessToken,
    policy: &RetryPolicy,
    clock: &impl Clock,
    reporter: &impl ProgressReporter,
) -> Result<u32> {
    lifecycle.begin_cleanup(trigger)?;
    tracing::info!(%trigger, "cleanup started");
    let attempts = deregister(tool, token, policy, clock, reporter).await?;
    lifecycle.removed()?;
    Ok(attempts)
}

/// Remove the agent from its pool, retrying at a fixed interval.
///
/// # Errors
///
/// Returns `DeregistrationExhausted` once `policy.max_attempts` failures
/// have been seen. Without a cap this only returns on success.
pub async fn deregister(
    tool: &impl AgentTool,
    token: &AccessToken,
    policy: &RetryPolicy,
    clock: &impl Clock,
    reporter: &impl ProgressReporter,
) -> Result<u32> {
    reporter.step("Cleanup. Removing Azure Pipelines agent...");
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match tool.remove(token).await {
            Ok(()) => {
                tracing::info!(attempt, "agent removed from pool");
                reporter.success("Agent removed from pool");
                return Ok(attempt);
            }
            Err(e) => {
                let conflict = DeregistrationConflict {
                    attempt,
                    detail: format!("{e:#}"),
                };
                match policy.after_failure(attempt) {
                    RetryDecision::RetryAfter(delay) => {
                        tracing::warn!(
                            attempt,
                            retry_in_secs = delay.as_secs(),
                            error = %conflict,
                            "agent removal failed, retrying"
                        );
                        reporter.warn(&format!("Retrying in {} seconds...", delay.as_secs()));
                        clock.sleep(delay).await;
                    }
                    RetryDecision::GiveUp => {
                        tracing::error!(attempt, error = %conflict, "giving up on agent removal");
                        return Err(DeregistrationExhausted { attempts: attempt }.into());
                    }
                }
            }
        }
    }
}
