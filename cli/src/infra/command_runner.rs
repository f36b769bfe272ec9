//! Local process execution on tokio — implements `CommandRunner`.

use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::Command;

use crate::application::ports::CommandRunner;

/// Ceiling for captured probes such as `ansible-playbook --version`.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Spawns children with `kill_on_drop`, so a probe abandoned at its timeout
/// does not outlive the run.
///
/// Only captured runs are bounded; plays run with the terminal attached for
/// as long as Ansible needs.
pub struct TokioCommandRunner {
    probe_timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(probe_timeout: Duration) -> Self {
        Self { probe_timeout }
    }

    fn command(program: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args).kill_on_drop(true);
        cmd
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let child = Self::command(program, args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        match tokio::time::timeout(self.probe_timeout, child.wait_with_output()).await {
            Ok(output) => output.with_context(|| format!("waiting for {program}")),
            Err(_) => anyhow::bail!(
                "{program} timed out after {}s",
                self.probe_timeout.as_secs()
            ),
        }
    }

    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        tracing::debug!(program, ?args, "spawning with inherited stdio");
        Self::command(program, args)
            .status()
            .await
            .with_context(|| format!("failed to spawn {program}"))
    }
}
