//! Operator-facing progress notifications.
//!
//! These are distinct from tracing output: an operator watching a run sees
//! every attempted membership change even with logging turned off.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use rostersync_core::GroupRef;
use tracing::debug;

use crate::types::MembershipOp;

/// Receives progress notifications.
pub trait ProgressReporter: Send + Sync {
    /// A membership change is about to be attempted, or simulated in dry-run mode.
    fn operation(&self, group: &GroupRef, op: &MembershipOp) {
        self.message(&op.progress_line(group));
    }

    /// A free-form progress line.
    fn message(&self, line: &str);
}

/// Writes progress lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn message(&self, line: &str) {
        write_line(&mut std::io::stdout().lock(), line);
    }
}

/// Write one progress line. A broken output must not abort the run, so the
/// failure is only logged.
fn write_line(out: &mut impl Write, line: &str) {
    if let Err(error) = writeln!(out, "{line}") {
        debug!(%error, "failed to write progress line");
    }
}

/// Collects progress lines in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines recorded so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn message(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}
