//! OS signal handling: implements the `TerminationSource` port.

use anyhow::{Context, Result};

use crate::application::ports::TerminationSource;
use crate::domain::Termination;

/// SIGINT / SIGTERM listener. Install once, before any work starts, so a
/// signal arriving early is queued rather than killing the process.
#[cfg(unix)]
pub struct SignalTermination {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalTermination {
    /// # Errors
    ///
    /// Returns an error if the signal handlers cannot be registered.
    pub fn install() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).context("installing SIGINT handler")?,
            terminate: signal(SignalKind::terminate()).context("installing SIGTERM handler")?,
        })
    }
}

#[cfg(unix)]
impl TerminationSource for SignalTermination {
    async fn recv(&mut self) -> Termination {
        let termination = tokio::select! {
            _ = self.interrupt.recv() => Termination::Interrupt,
            _ = self.terminate.recv() => Termination::Terminate,
        };
        tracing::info!(%termination, "termination signal received");
        termination
    }
}

/// Ctrl-C only; Windows has no SIGTERM.
#[cfg(not(unix))]
pub struct SignalTermination;

#[cfg(not(unix))]
impl SignalTermination {
    /// # Errors
    ///
    /// Never fails on this platform.
    pub fn install() -> Result<Self> {
        Ok(Self)
    }
}

#[cfg(not(unix))]
impl TerminationSource for SignalTermination {
    async fn recv(&mut self) -> Termination {
        if tokio::signal::ctrl_c().await.is_err() {
            return std::future::pending().await;
        }
        tracing::info!("termination signal received");
        Termination::Interrupt
    }
}
