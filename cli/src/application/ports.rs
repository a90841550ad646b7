//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and the shared wire types;
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use pool_common::{AgentPackage, Platform};

use crate::domain::{AccessToken, IdentityReference, RegistrationRecord, Termination};

// ── Value Types ───────────────────────────────────────────────────────────────

/// How the single job cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    /// `code` is `None` when the agent was killed by a signal.
    Failed { code: Option<i32> },
}

/// A process invocation. Borrowed so secrets in `envs` are not copied
/// into long-lived owned buffers. No `Debug`: `envs` may hold the token.
#[derive(Clone, Copy)]
pub struct CommandSpec<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
    pub current_dir: Option<&'a Path>,
    pub envs: &'a [(&'a str, &'a str)],
    pub env_remove: &'a [&'a str],
}

// ── Credential Port ───────────────────────────────────────────────────────────

/// Exchanges a managed identity for a CI-platform access token.
#[allow(async_fn_in_trait)]
pub trait TokenProvider {
    /// # Errors
    ///
    /// Returns an `AuthenticationError` if the endpoint is unreachable,
    /// rejects the identity, or returns an unusable body.
    async fn acquire(&self, identity: &IdentityReference) -> Result<AccessToken>;
}

// ── Agent Package Port ────────────────────────────────────────────────────────

/// Locates and installs the agent package for the running platform.
#[allow(async_fn_in_trait)]
pub trait AgentPackages {
    /// Latest package for `platform` published by the organization at `url`.
    ///
    /// # Errors
    ///
    /// Returns `PackageResolutionError::NoMatch` for any failure to list a
    /// usable package (bad URL, bad token, empty listing).
    async fn latest(
        &self,
        url: &str,
        token: &AccessToken,
        platform: Platform,
    ) -> Result<AgentPackage>;

    /// Download, verify, and unpack `package` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns a `PackageResolutionError` on download, checksum, or unpack failure.
    async fn install(&self, package: &AgentPackage, dest: &Path) -> Result<()>;
}

// ── Agent Tool Port ───────────────────────────────────────────────────────────

/// The unpacked agent's own scripts: register, run one job, remove.
#[allow(async_fn_in_trait)]
pub trait AgentTool {
    type Job: JobHandle;

    /// Unattended registration of `record` into the organization at `url`.
    async fn configure(
        &self,
        url: &str,
        record: &RegistrationRecord,
        token: &AccessToken,
    ) -> Result<()>;

    /// Start the agent for exactly one job cycle.
    async fn start_job(&self) -> Result<Self::Job>;

    /// Remove this agent's registration from its pool.
    ///
    /// Fails while the pool still has a job assigned to the agent.
    async fn remove(&self, token: &AccessToken) -> Result<()>;
}

/// A running job cycle.
#[allow(async_fn_in_trait)]
pub trait JobHandle {
    /// Wait for the agent process to exit.
    async fn wait(&mut self) -> Result<JobOutcome>;
}

// ── Time and Signals ──────────────────────────────────────────────────────────

/// Injectable time source for back-off sleeps.
#[allow(async_fn_in_trait)]
pub trait Clock {
    async fn sleep(&self, duration: Duration);
}

/// Delivers process termination requests (SIGINT / SIGTERM).
///
/// Implementations only report; the orchestrator decides what to do.
#[allow(async_fn_in_trait)]
pub trait TerminationSource {
    /// Resolves when a termination request arrives. Never resolves with
    /// `Termination::Completed`.
    async fn recv(&mut self) -> Termination;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program to completion and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, spec: &CommandSpec<'_>) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(&self, spec: &CommandSpec<'_>, timeout: Duration) -> Result<Output>;

    /// Spawn a program with inherited stdio without waiting for it.
    ///
    /// The child must be killed when the returned handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn spawn(&self, spec: &CommandSpec<'_>) -> Result<tokio::process::Child>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
