//! Terminal status output.
//!
//! Everything here goes to stderr; stdout carries only command results
//! (`inventory`, `keyscan`, `version --json`).

pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Kind of status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Step,
    Done,
    Retry,
    Banner,
}

/// Where and how status lines are written.
pub struct OutputContext {
    pub styles: Styles,
    term: Term,
    /// Drop everything but errors.
    pub quiet: bool,
}

impl OutputContext {
    /// Colors are used only when stderr is a terminal and `no_color` is off.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let term = Term::stderr();
        let mut styles = Styles::default();
        if !no_color && term.is_term() {
            styles.colorize();
        }
        Self {
            styles,
            term,
            quiet,
        }
    }

    /// The text of one status line, without trailing newline.
    #[must_use]
    pub fn format(&self, mark: Mark, msg: &str) -> String {
        let (symbol, style) = match mark {
            Mark::Step => ("→", self.styles.step),
            Mark::Done => ("✓", self.styles.done),
            Mark::Retry => ("!", self.styles.retry),
            Mark::Banner => return format!("{}", msg.style(self.styles.banner)),
        };
        format!("  {} {msg}", symbol.style(style))
    }

    pub fn emit(&self, mark: Mark, msg: &str) {
        if self.quiet {
            return;
        }
        // A closed stderr is not worth failing a run over.
        let _ = self.term.write_line(&self.format(mark, msg));
    }

    pub fn step(&self, msg: &str) {
        self.emit(Mark::Step, msg);
    }

    pub fn success(&self, msg: &str) {
        self.emit(Mark::Done, msg);
    }

    pub fn warn(&self, msg: &str) {
        self.emit(Mark::Retry, msg);
    }

    pub fn header(&self, msg: &str) {
        self.emit(Mark::Banner, msg);
    }
}
