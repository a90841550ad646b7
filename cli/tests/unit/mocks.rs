//! Shared hand-written mocks of the application ports.
//!
//! Each mock records what it was asked to do so tests can assert on the
//! sequence of calls without touching the network or spawning processes.

#![allow(dead_code, clippy::expect_used)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use pool_agent::application::ports::{
    AgentPackages, AgentTool, Clock, JobHandle, JobOutcome, ProgressReporter, TerminationSource,
    TokenProvider,
};
use pool_agent::domain::{
    AccessToken, AgentEnv, AgentSettings, AuthenticationError, IdentityReference,
    PackageResolutionError, RegistrationError, RegistrationRecord, Termination,
};
use pool_common::{AgentPackage, PackageVersion, Platform};
use tokio::sync::Notify;

pub const ORG_URL: &str = "https://dev.azure.com/contoso";
pub const TOKEN: &str = "eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiJ9.secret-part";

// ── Settings ─────────────────────────────────────────────────────────────────

pub fn settings() -> AgentSettings {
    settings_with(AgentEnv::default())
}

/// Valid settings with `overrides` applied on top of URL and client id.
pub fn settings_with(overrides: AgentEnv) -> AgentSettings {
    let env = AgentEnv {
        url: Some(format!("{ORG_URL}/")),
        clientid: Some("11111111-2222-3333-4444-555555555555".into()),
        pool: overrides.pool.or_else(|| Some("containers".into())),
        agent_dir: overrides.agent_dir.or_else(|| Some("/azp/agent".into())),
        ..overrides
    };
    AgentSettings::from_env(env, "aca-replica-1").expect("valid settings")
}

// ── ProgressReporter ─────────────────────────────────────────────────────────

/// Records every message with its kind.
#[derive(Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("lock").clone()
    }

    fn push(&self, kind: &str, message: &str) {
        self.messages
            .lock()
            .expect("lock")
            .push(format!("{kind}: {message}"));
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.push("step", message);
    }
    fn success(&self, message: &str) {
        self.push("success", message);
    }
    fn warn(&self, message: &str) {
        self.push("warn", message);
    }
}

// ── TokenProvider ────────────────────────────────────────────────────────────

pub enum Tokens {
    Issue,
    Unreachable,
    /// Never answers; used to hold the lifecycle before registration.
    Hang,
}

pub struct FakeTokens {
    mode: Tokens,
    calls: Mutex<u32>,
}

impl FakeTokens {
    pub fn new(mode: Tokens) -> Self {
        Self {
            mode,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().expect("lock")
    }
}

impl TokenProvider for FakeTokens {
    async fn acquire(&self, _: &IdentityReference) -> Result<AccessToken> {
        *self.calls.lock().expect("lock") += 1;
        match self.mode {
            Tokens::Issue => Ok(AccessToken::new(TOKEN.to_string(), None)),
            Tokens::Unreachable => Err(AuthenticationError::Unreachable(
                "connection refused".into(),
            )
            .into()),
            Tokens::Hang => std::future::pending().await,
        }
    }
}

// ── AgentPackages ────────────────────────────────────────────────────────────

pub fn package() -> AgentPackage {
    let platform = Platform::current().expect("tests run on a supported platform");
    AgentPackage {
        package_type: "agent".into(),
        platform: platform.to_string(),
        created_on: None,
        version: PackageVersion {
            major: 3,
            minor: 236,
            patch: 1,
        },
        download_url: format!(
            "https://download.agent.dev.azure.com/agent/3.236.1/vsts-agent-{platform}-3.236.1.tar.gz"
        ),
        filename: format!("vsts-agent-{platform}-3.236.1.tar.gz"),
        hash_value: None,
    }
}

pub struct FakePackages {
    listed: Option<AgentPackage>,
    installs: Mutex<Vec<PathBuf>>,
    seen_tokens: Mutex<Vec<String>>,
}

impl FakePackages {
    pub fn with(listed: Option<AgentPackage>) -> Self {
        Self {
            listed,
            installs: Mutex::new(Vec::new()),
            seen_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn installs(&self) -> Vec<PathBuf> {
        self.installs.lock().expect("lock").clone()
    }

    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen_tokens.lock().expect("lock").clone()
    }
}

impl AgentPackages for FakePackages {
    async fn latest(
        &self,
        url: &str,
        token: &AccessToken,
        platform: Platform,
    ) -> Result<AgentPackage> {
        self.seen_tokens
            .lock()
            .expect("lock")
            .push(token.expose().to_string());
        self.listed.clone().ok_or_else(|| {
            PackageResolutionError::NoMatch {
                url: url.to_string(),
                platform: platform.to_string(),
            }
            .into()
        })
    }

    async fn install(&self, _: &AgentPackage, dest: &Path) -> Result<()> {
        self.installs.lock().expect("lock").push(dest.to_path_buf());
        Ok(())
    }
}

// ── AgentTool ────────────────────────────────────────────────────────────────

/// Which point of the lifecycle fires a scripted termination signal.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SignalAt {
    Configure,
    StartJob,
    /// The first removal attempt.
    Remove,
}

/// How the fake agent process ends its job cycle.
#[derive(Clone, Copy)]
pub enum JobScript {
    Exit(JobOutcome),
    /// Keeps running until dropped.
    Hang,
}

/// An in-memory agent pool plus the agent scripts that talk to it.
pub struct InMemoryPool {
    agents: Mutex<BTreeSet<String>>,
    pub configure_calls: Mutex<Vec<RegistrationRecord>>,
    pub start_calls: Mutex<u32>,
    pub remove_calls: Mutex<u32>,
    remove_failures_left: Mutex<u32>,
    job: JobScript,
    job_alive: Arc<AtomicBool>,
    /// Whether the agent process was still alive at each removal attempt.
    removal_saw_job: Mutex<Vec<bool>>,
    signal: Option<(SignalAt, Arc<Notify>)>,
    registered_name: Mutex<Option<String>>,
}

impl InMemoryPool {
    pub fn new(job: JobScript) -> Self {
        Self {
            agents: Mutex::new(BTreeSet::new()),
            configure_calls: Mutex::new(Vec::new()),
            start_calls: Mutex::new(0),
            remove_calls: Mutex::new(0),
            remove_failures_left: Mutex::new(0),
            job,
            job_alive: Arc::new(AtomicBool::new(false)),
            removal_saw_job: Mutex::new(Vec::new()),
            signal: None,
            registered_name: Mutex::new(None),
        }
    }

    /// Removal is rejected `n` times (job still assigned) before succeeding.
    #[must_use]
    pub fn failing_removals(self, n: u32) -> Self {
        *self.remove_failures_left.lock().expect("lock") = n;
        self
    }

    /// An agent with this name is already in the pool.
    #[must_use]
    pub fn with_existing(self, name: &str) -> Self {
        self.agents.lock().expect("lock").insert(name.to_string());
        self
    }

    #[must_use]
    pub fn signal_at(mut self, at: SignalAt, notify: Arc<Notify>) -> Self {
        self.signal = Some((at, notify));
        self
    }

    pub fn agents(&self) -> Vec<String> {
        self.agents.lock().expect("lock").iter().cloned().collect()
    }

    pub fn configure_count(&self) -> usize {
        self.configure_calls.lock().expect("lock").len()
    }

    pub fn start_count(&self) -> u32 {
        *self.start_calls.lock().expect("lock")
    }

    pub fn remove_count(&self) -> u32 {
        *self.remove_calls.lock().expect("lock")
    }

    pub fn job_alive(&self) -> bool {
        self.job_alive.load(Ordering::SeqCst)
    }

    pub fn removal_saw_job(&self) -> Vec<bool> {
        self.removal_saw_job.lock().expect("lock").clone()
    }

    fn fire(&self, at: SignalAt) {
        if let Some((when, notify)) = &self.signal {
            if *when == at {
                notify.notify_one();
            }
        }
    }
}

impl AgentTool for InMemoryPool {
    type Job = FakeJob;

    async fn configure(
        &self,
        _: &str,
        record: &RegistrationRecord,
        token: &AccessToken,
    ) -> Result<()> {
        assert_eq!(token.expose(), TOKEN, "configure must receive the acquired token");
        self.configure_calls
            .lock()
            .expect("lock")
            .push(record.clone());
        let mut agents = self.agents.lock().expect("lock");
        if agents.contains(&record.agent_name) && !record.replace {
            return Err(RegistrationError::Rejected {
                pool: record.pool.clone(),
                code: "1".into(),
                detail: format!("agent '{}' already exists", record.agent_name),
            }
            .into());
        }
        agents.insert(record.agent_name.clone());
        drop(agents);
        *self.registered_name.lock().expect("lock") = Some(record.agent_name.clone());
        self.fire(SignalAt::Configure);
        Ok(())
    }

    async fn start_job(&self) -> Result<FakeJob> {
        *self.start_calls.lock().expect("lock") += 1;
        self.job_alive.store(true, Ordering::SeqCst);
        self.fire(SignalAt::StartJob);
        Ok(FakeJob {
            script: self.job,
            alive: Arc::clone(&self.job_alive),
        })
    }

    async fn remove(&self, token: &AccessToken) -> Result<()> {
        assert_eq!(token.expose(), TOKEN, "remove must receive the acquired token");
        let attempt = {
            let mut calls = self.remove_calls.lock().expect("lock");
            *calls += 1;
            *calls
        };
        self.removal_saw_job
            .lock()
            .expect("lock")
            .push(self.job_alive());
        if attempt == 1 {
            self.fire(SignalAt::Remove);
        }
        let mut left = self.remove_failures_left.lock().expect("lock");
        if *left > 0 {
            *left -= 1;
            anyhow::bail!("agent is still assigned a running job");
        }
        drop(left);
        if let Some(name) = self.registered_name.lock().expect("lock").take() {
            self.agents.lock().expect("lock").remove(&name);
        }
        Ok(())
    }
}

/// Clears the pool's "job alive" flag when its process exits or the handle
/// is dropped, like a `kill_on_drop` child.
pub struct FakeJob {
    script: JobScript,
    alive: Arc<AtomicBool>,
}

impl JobHandle for FakeJob {
    async fn wait(&mut self) -> Result<JobOutcome> {
        match self.script {
            JobScript::Exit(outcome) => {
                self.alive.store(false, Ordering::SeqCst);
                Ok(outcome)
            }
            JobScript::Hang => std::future::pending().await,
        }
    }
}

impl Drop for FakeJob {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

// ── Clock ────────────────────────────────────────────────────────────────────

/// Returns immediately and records requested sleeps.
#[derive(Default)]
pub struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("lock").clone()
    }
}

impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("lock").push(duration);
    }
}

// ── TerminationSource ────────────────────────────────────────────────────────

/// Never delivers a signal.
pub struct NoSignals;

impl TerminationSource for NoSignals {
    async fn recv(&mut self) -> Termination {
        std::future::pending().await
    }
}

/// Delivers `signal` once `notify` fires, then nothing more.
pub struct ScriptedSignal {
    signal: Option<Termination>,
    notify: Arc<Notify>,
}

impl ScriptedSignal {
    pub fn new(signal: Termination) -> (Self, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        (
            Self {
                signal: Some(signal),
                notify: Arc::clone(&notify),
            },
            notify,
        )
    }

    /// Fires on the first `recv`.
    pub fn immediate(signal: Termination) -> Self {
        let (source, notify) = Self::new(signal);
        notify.notify_one();
        source
    }
}

impl TerminationSource for ScriptedSignal {
    async fn recv(&mut self) -> Termination {
        match self.signal {
            Some(signal) => {
                self.notify.notified().await;
                self.signal = None;
                signal
            }
            None => std::future::pending().await,
        }
    }
}
