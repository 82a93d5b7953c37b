//! `TerminalReporter` is the presentation-layer implementation of `ProgressReporter`.
//!
//! On a TTY each `step()` starts a spinner that the next `success()` or
//! `warn()` resolves in place; elsewhere every event is one printed line.

use std::cell::RefCell;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"` or starts a spinner
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ! {message}"`
///
/// All three are suppressed when `ctx.quiet` or when the reporter is silent
/// (JSON mode keeps stdout for the final document).
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    silent: bool,
    spinner: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            silent: false,
            spinner: RefCell::new(None),
        }
    }

    /// A reporter that emits nothing.
    #[must_use]
    pub fn silent(ctx: &'a OutputContext) -> Self {
        Self {
            silent: true,
            ..Self::new(ctx)
        }
    }

    fn muted(&self) -> bool {
        self.silent || self.ctx.quiet
    }

    /// Clear a spinner left running by a step that failed.
    pub fn abandon(&self, message: &str) {
        if let Some(pb) = self.spinner.borrow_mut().take() {
            progress::finish_error(&pb, message);
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.muted() {
            return;
        }
        if self.ctx.show_progress() {
            let previous = self.spinner.replace(Some(progress::spinner(message)));
            if let Some(pb) = previous {
                pb.finish_and_clear();
            }
        } else {
            println!("  {} {message}", "→".style(self.ctx.styles.info));
        }
    }

    fn success(&self, message: &str) {
        if self.muted() {
            return;
        }
        match self.spinner.borrow_mut().take() {
            Some(pb) => progress::finish_ok(&pb, message),
            None => println!("  {} {message}", "✓".style(self.ctx.styles.success)),
        }
    }

    fn warn(&self, message: &str) {
        if self.muted() {
            return;
        }
        match self.spinner.borrow_mut().take() {
            Some(pb) => progress::finish_warn(&pb, message),
            None => println!("  {} {message}", "!".style(self.ctx.styles.warning)),
        }
    }
}
