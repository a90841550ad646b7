//! Agent lifecycle state machine and termination reasons.
//!
//! `Idle → Registered → Cleaning → Removed`, plus the placeholder shortcut
//! `Idle → Removed`. Pure: no I/O, no async.

use crate::domain::error::LifecycleError;

/// Where the process is in the bootstrap lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing registered yet.
    Idle,
    /// The agent is in the pool and owned by this process.
    Registered,
    /// Deregistration is in progress.
    Cleaning,
    /// Terminal. No registration owned by this process remains.
    Removed,
}

/// Why the lifecycle is ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The job cycle finished (or there was nothing to run).
    Completed,
    /// SIGINT.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl Termination {
    /// Process exit status for this termination, following the shell
    /// convention of `128 + signal` for signal-driven exits.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Completed => 0,
            Self::Interrupt => 130,
            Self::Terminate => 143,
        }
    }

    #[must_use]
    pub fn is_signal(self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Interrupt => "interrupt",
            Self::Terminate => "terminate",
        })
    }
}

/// Tracks and validates lifecycle transitions.
#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// `Idle → Registered`.
    pub fn registered(&mut self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Idle, LifecycleState::Registered)
    }

    /// `Registered → Cleaning`. Every termination reason takes the same path.
    pub fn begin_cleanup(&mut self, _trigger: Termination) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Registered, LifecycleState::Cleaning)
    }

    /// `Cleaning → Removed`, only after a successful removal call.
    pub fn removed(&mut self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Cleaning, LifecycleState::Removed)
    }

    /// `Idle → Removed` for placeholder runs, which own no registration.
    pub fn discard_placeholder(&mut self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Idle, LifecycleState::Removed)
    }

    /// Whether exiting now would leave this process's agent in the pool.
    #[must_use]
    pub fn owns_registration(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::Registered | LifecycleState::Cleaning
        )
    }

    fn transition(
        &mut self,
        expected: LifecycleState,
        to: LifecycleState,
    ) -> Result<(), LifecycleError> {
        if self.state != expected {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!(from = ?self.state, to = ?to, "lifecycle transition");
        self.state = to;
        Ok(())
    }
}
