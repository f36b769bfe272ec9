//! [`ProgressReporter`] for the terminal.

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Forwards service progress to an [`OutputContext`] and mirrors it into
/// the `tracing` log, so `RUST_LOG=debug` shows it even with `--quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        tracing::debug!(message, "step");
        self.ctx.step(message);
    }

    fn success(&self, message: &str) {
        tracing::info!(message, "done");
        self.ctx.success(message);
    }

    fn warn(&self, message: &str) {
        tracing::debug!(message, "retry");
        self.ctx.warn(message);
    }
}
