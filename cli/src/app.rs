//! Application context — unified state passed to every command handler.
//!
//! Built once in `Cli::run()`; command handlers borrow the adapters they need
//! instead of constructing their own.

use std::path::PathBuf;

use crate::infra::apply::ShellApplier;
use crate::infra::clock::TokioSleeper;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::ssh::Ssh2Probe;
use crate::infra::staging::TempArea;
use crate::output::{OutputContext, TerminalReporter};

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    /// Directory for staged keys, known-hosts and inventories.
    pub temp_dir: Option<PathBuf>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Local process execution, used for preflight probes.
    pub runner: TokioCommandRunner,
    /// Runs rendered Ansible commands.
    pub applier: ShellApplier<TokioCommandRunner>,
    /// SSH host key discovery.
    pub probe: Ssh2Probe,
    pub sleeper: TokioSleeper,
    /// Temp-file staging area.
    pub staging: TempArea,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let staging = flags
            .temp_dir
            .clone()
            .map_or_else(TempArea::system, TempArea::new);
        Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            runner: TokioCommandRunner::default(),
            applier: ShellApplier::new(TokioCommandRunner::default()),
            probe: Ssh2Probe::default(),
            sleeper: TokioSleeper,
            staging,
        }
    }

    /// Returns a `TerminalReporter` borrowing this context's output.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}
