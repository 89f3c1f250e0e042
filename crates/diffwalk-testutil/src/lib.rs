//! Test utilities for diffwalk.
//!
//! - `changes`: the `ADD <path> file|dir` change-stream fixture format,
//!   materialized into a temp directory or a `MemoryFs`
//! - `MemoryFs`: in-memory `WalkerFs` with injectable listing failures
//! - `RecordingSink`: renders walk output as `"<kind> <path>\n"` lines

pub mod changes;
mod memory;

pub use changes::{Change, ChangeKind, FixtureError, parse_changes, tmp_dir};
pub use memory::{MemEntry, MemoryFs};

use diffwalk::{EntryKind, SinkError, WalkSink, WalkerError};

/// Sink that records every call as one text line.
///
/// Emitted entries render as `"file foo"` / `"dir foo"`; listing failures
/// render as `"error foo"`. Failures are suppressed unless built with
/// `stop_on_error`.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Vec<String>,
    stop_on_error: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return listing failures to the walker instead of suppressing them.
    pub fn stop_on_error() -> Self {
        Self {
            lines: Vec::new(),
            stop_on_error: true,
        }
    }

    /// Recorded lines, in call order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined, each terminated by `\n`.
    pub fn output(&self) -> String {
        self.lines.iter().map(|l| format!("{l}\n")).collect()
    }
}

impl WalkSink for RecordingSink {
    fn visit(
        &mut self,
        path: &str,
        kind: EntryKind,
        err: Option<&WalkerError>,
    ) -> Result<(), SinkError> {
        match err {
            None => {
                self.lines.push(format!("{kind} {path}"));
                Ok(())
            }
            Some(err) => {
                self.lines.push(format!("error {path}"));
                if self.stop_on_error {
                    Err(Box::new(err.clone()))
                } else {
                    Ok(())
                }
            }
        }
    }
}
