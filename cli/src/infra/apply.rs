//! Local shell execution — implements `CommandApplier`.

use anyhow::Result;

use crate::application::ports::{CommandApplier, CommandRunner};
use crate::domain::error::ProvisionError;

/// Runs rendered commands through `sh -c` with the terminal attached, so
/// Ansible output streams straight to the user.
pub struct ShellApplier<C> {
    runner: C,
}

impl<C: CommandRunner> ShellApplier<C> {
    pub fn new(runner: C) -> Self {
        Self { runner }
    }
}

impl<C: CommandRunner> CommandApplier for ShellApplier<C> {
    async fn apply(&self, command: &str) -> Result<()> {
        tracing::info!(%command, "running local command");
        let status = self.runner.run_status("sh", &["-c", command]).await?;
        if status.success() {
            return Ok(());
        }
        let status = status
            .code()
            .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
        Err(ProvisionError::Apply {
            command: command.to_string(),
            status,
        }
        .into())
    }
}
