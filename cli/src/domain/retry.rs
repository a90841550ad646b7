//! Fixed-interval retry policy for agent deregistration.

use std::num::NonZeroU32;
use std::time::Duration;

/// Back-off used when the pool refuses to remove the agent.
pub const DEFAULT_REMOVE_INTERVAL: Duration = Duration::from_secs(30);

/// Fixed back-off, optionally capped.
///
/// `max_attempts: None` retries until removal succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REMOVE_INTERVAL,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// What to do after `attempt` (1-based) has failed.
    #[must_use]
    pub fn after_failure(&self, attempt: u32) -> RetryDecision {
        match self.max_attempts {
            Some(max) if attempt >= max.get() => RetryDecision::GiveUp,
            _ => RetryDecision::RetryAfter(self.interval),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}
