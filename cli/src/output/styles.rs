//! Colors for the status markers.

use owo_colors::Style;

/// Styles applied to each status marker; all plain until [`Styles::colorize`].
#[derive(Default, Clone)]
pub struct Styles {
    /// `→` before staged files and rendered commands.
    pub step: Style,
    /// `✓` after a play or the whole run.
    pub done: Style,
    /// `!` on discovery retries.
    pub retry: Style,
    pub banner: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.step = Style::new().cyan();
        self.done = Style::new().green();
        self.retry = Style::new().yellow();
        self.banner = Style::new().bold();
    }
}
