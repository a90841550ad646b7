//! Agent tool infrastructure: drives the unpacked agent's `config.sh` and
//! `run.sh` through the `CommandRunner` port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{AgentTool, CommandRunner, CommandSpec, JobHandle, JobOutcome};
use crate::domain::registration::{
    SCRUBBED_ENV, TOKEN_ENV, agent_ignore_list, configure_args, remove_args, run_once_args,
};
use crate::domain::{AccessToken, RegistrationError, RegistrationRecord};

// Only Linux and macOS packages are resolved, so the shell scripts are the
// only entry points.
const CONFIG_SCRIPT: &str = "config.sh";
const RUN_SCRIPT: &str = "run.sh";

const STDERR_TAIL_LINES: usize = 5;

/// `AgentTool` backed by the agent's own scripts in `agent_dir`.
pub struct ScriptAgentTool<R> {
    runner: R,
    agent_dir: PathBuf,
}

impl<R: CommandRunner> ScriptAgentTool<R> {
    #[must_use]
    pub fn new(runner: R, agent_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            agent_dir: agent_dir.into(),
        }
    }

    fn script(&self, name: &str) -> PathBuf {
        self.agent_dir.join(name)
    }
}

impl<R: CommandRunner> AgentTool for ScriptAgentTool<R> {
    type Job = ChildJob;

    async fn configure(
        &self,
        url: &str,
        record: &RegistrationRecord,
        token: &AccessToken,
    ) -> Result<()> {
        let program = self.script(CONFIG_SCRIPT);
        let args = configure_args(url, record);
        let envs = [(TOKEN_ENV, token.expose())];
        let output = self
            .runner
            .run(&CommandSpec {
                program: &program,
                args: &args,
                current_dir: Some(&self.agent_dir),
                envs: &envs,
                env_remove: &[],
            })
            .await?;

        if !output.status.success() {
            return Err(RegistrationError::Rejected {
                pool: record.pool.clone(),
                code: exit_code_label(output.status.code()),
                detail: stderr_tail(&output.stderr),
            }
            .into());
        }
        tracing::info!(agent = %record.agent_name, pool = %record.pool, "agent configured");
        Ok(())
    }

    async fn start_job(&self) -> Result<ChildJob> {
        let program = self.script(RUN_SCRIPT);
        let args = run_once_args();
        let ignore = agent_ignore_list();
        let envs = [
            ("VSO_AGENT_IGNORE", ignore.as_str()),
            ("AGENT_ALLOW_RUNASROOT", "1"),
        ];
        let child = self.runner.spawn(&CommandSpec {
            program: &program,
            args: &args,
            current_dir: Some(&self.agent_dir),
            envs: &envs,
            env_remove: SCRUBBED_ENV,
        })?;
        tracing::info!(pid = child.id(), "agent started for one job");
        Ok(ChildJob { child })
    }

    async fn remove(&self, token: &AccessToken) -> Result<()> {
        let program = self.script(CONFIG_SCRIPT);
        let args = remove_args();
        let envs = [(TOKEN_ENV, token.expose())];
        let output = self
            .runner
            .run(&CommandSpec {
                program: &program,
                args: &args,
                current_dir: Some(&self.agent_dir),
                envs: &envs,
                env_remove: &[],
            })
            .await?;

        anyhow::ensure!(
            output.status.success(),
            "{CONFIG_SCRIPT} remove exited with {}: {}",
            exit_code_label(output.status.code()),
            stderr_tail(&output.stderr)
        );
        Ok(())
    }
}

/// The agent process running its single job.
pub struct ChildJob {
    child: tokio::process::Child,
}

impl JobHandle for ChildJob {
    async fn wait(&mut self) -> Result<JobOutcome> {
        let status = self.child.wait().await.context("waiting for agent")?;
        tracing::info!(%status, "agent exited");
        if status.success() {
            Ok(JobOutcome::Succeeded)
        } else {
            Ok(JobOutcome::Failed {
                code: status.code(),
            })
        }
    }
}

fn exit_code_label(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Last few non-empty lines of stderr, for error messages.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Whether `dir` looks like an unpacked agent.
#[must_use]
pub fn is_agent_dir(dir: &Path) -> bool {
    dir.join(CONFIG_SCRIPT).is_file() && dir.join(RUN_SCRIPT).is_file()
}
