//! diffwalk: deterministic, filtered directory walks.
//!
//! Provides:
//! - **PatternMatcher**: ordered exclude globs with `!` negation, last match wins
//! - **PathFilter**: whitelist or pattern filter producing emit/descend decisions
//! - **Walker**: async depth-first, pre-order walk, generic over `WalkerFs`
//! - **LocalFs**: `WalkerFs` over the real filesystem
//!
//! The walker is generic over `WalkerFs`, a minimal listing trait. Entries are
//! reported to a `WalkSink` as slash-separated paths relative to the root, in
//! sorted order, parents before children.

mod filter;
mod glob;
mod local;
mod options;
mod pattern;
mod walker;

pub use filter::{Decision, IncludeSet, PathFilter, pattern_decision, whitelist_decision};
pub use local::LocalFs;
pub use options::{ConfigError, WalkOptions};
pub use pattern::{Pattern, PatternError, PatternMatcher};
pub use walker::{WalkEntry, Walker, walk};

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors from the directory-listing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalkerError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Error type sinks return to stop a walk.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that end a walk.
#[derive(Debug, Error)]
pub enum WalkError {
    /// An exclude pattern failed to compile; nothing was listed.
    #[error(transparent)]
    Pattern(#[from] PatternError),
    /// Listing a directory failed and the sink did not suppress it.
    #[error("listing {path:?}: {source}")]
    List {
        path: String,
        #[source]
        source: WalkerError,
    },
    /// The sink asked to stop.
    #[error("sink error: {0}")]
    Sink(SinkError),
    /// The walk's cancellation token fired.
    #[error("walk cancelled")]
    Cancelled,
}

/// Kind of an emitted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "dir",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal read-only listing abstraction for the walker.
///
/// Implement this trait to adapt a filesystem layer (real FS, archive,
/// snapshot, in-memory tree) to `Walker`. Entries may come back in any
/// order; the walker sorts them.
#[async_trait]
pub trait WalkerFs: Send + Sync {
    /// The directory entry type returned by `list_dir`.
    type DirEntry: WalkerDirEntry;

    /// List the entries in a directory.
    async fn list_dir(&self, path: &Path) -> Result<Vec<Self::DirEntry>, WalkerError>;
}

/// A single entry returned by `WalkerFs::list_dir`.
pub trait WalkerDirEntry: Send {
    /// The entry name (not a path).
    fn name(&self) -> &str;

    /// True if this entry should be walked as a directory.
    fn is_dir(&self) -> bool;

    /// True if this entry is anything other than a walkable directory.
    fn is_file(&self) -> bool {
        !self.is_dir()
    }

    /// True if this entry is a symbolic link.
    fn is_symlink(&self) -> bool {
        false
    }

    /// Kind used for emission. Anything not reported as a directory,
    /// symlinks included, is a file.
    fn kind(&self) -> EntryKind {
        if self.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }
}

/// Receives walk output.
///
/// Called with `err == None` for every emitted entry, and with `Some` when a
/// directory at `path` could not be listed. Returning `Err` stops the walk.
/// Implemented for any matching `FnMut` closure.
pub trait WalkSink: Send {
    fn visit(
        &mut self,
        path: &str,
        kind: EntryKind,
        err: Option<&WalkerError>,
    ) -> Result<(), SinkError>;
}

impl<F> WalkSink for F
where
    F: FnMut(&str, EntryKind, Option<&WalkerError>) -> Result<(), SinkError> + Send,
{
    fn visit(
        &mut self,
        path: &str,
        kind: EntryKind,
        err: Option<&WalkerError>,
    ) -> Result<(), SinkError> {
        self(path, kind, err)
    }
}
