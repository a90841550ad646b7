//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with guaranteed timeout and kill.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use crate::application::ports::{CommandRunner, CommandSpec};

/// Default timeout for the agent's `config.sh` invocations. Registration
/// talks to the organization and can be slow on a cold pool.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(300);

/// Production `CommandRunner`: uses tokio for async process execution
/// with guaranteed timeout and kill.
///
/// `tokio::time::timeout` around `.output().await` drops the future but does
/// not reliably terminate the child, so `tokio::select!` with an explicit
/// `child.kill()` is used instead.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

fn command(spec: &CommandSpec<'_>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(spec.program);
    cmd.args(spec.args).kill_on_drop(true);
    if let Some(dir) = spec.current_dir {
        cmd.current_dir(dir);
    }
    for key in spec.env_remove {
        cmd.env_remove(key);
    }
    for (key, value) in spec.envs {
        cmd.env(key, value);
    }
    cmd
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, spec: &CommandSpec<'_>) -> Result<Output> {
        self.run_with_timeout(spec, self.timeout).await
    }

    async fn run_with_timeout(&self, spec: &CommandSpec<'_>, timeout: Duration) -> Result<Output> {
        let program = spec.program.display();
        let mut child = command(spec)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                );
                Ok(Output {
                    status: status.with_context(|| format!("waiting for {program}"))?,
                    stdout,
                    stderr,
                })
            } => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }

    fn spawn(&self, spec: &CommandSpec<'_>) -> Result<tokio::process::Child> {
        command(spec)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to spawn {}", spec.program.display()))
    }
}
