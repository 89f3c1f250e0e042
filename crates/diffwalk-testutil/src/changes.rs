//! Change-stream fixtures.
//!
//! One change per line, `<KIND> <path> <type>`:
//!
//! ```text
//! ADD bar dir
//! ADD bar/foo file
//! ADD foo2 file
//! ```
//!
//! Only `ADD` is understood. Parents must be added before their children.

use std::fs;
use std::path::Path;

use diffwalk::EntryKind;
use tempfile::TempDir;
use thiserror::Error;

/// Errors building a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("io error creating {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The kind of change on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
}

/// One parsed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    /// Slash-separated path relative to the fixture root.
    pub path: String,
    pub entry: EntryKind,
}

/// Parse a change stream. Blank lines and `#` comments are skipped.
pub fn parse_changes<S: AsRef<str>>(lines: &[S]) -> Result<Vec<Change>, FixtureError> {
    let mut changes = Vec::new();

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.as_ref().trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parse_err = |message: String| FixtureError::Parse {
            line: idx + 1,
            message,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [kind, path, entry] = fields.as_slice() else {
            return Err(parse_err(format!("expected `<KIND> <path> <type>`, got {line:?}")));
        };

        let kind = match *kind {
            "ADD" => ChangeKind::Add,
            other => return Err(parse_err(format!("unknown change kind {other:?}"))),
        };
        let entry = match *entry {
            "file" => EntryKind::File,
            "dir" => EntryKind::Directory,
            other => return Err(parse_err(format!("unknown entry type {other:?}"))),
        };

        changes.push(Change {
            kind,
            path: path.trim_matches('/').to_string(),
            entry,
        });
    }

    Ok(changes)
}

/// Create a temp directory holding the fixture. Removed when the returned
/// `TempDir` drops.
pub fn tmp_dir(changes: &[Change]) -> Result<TempDir, FixtureError> {
    let dir = tempfile::Builder::new()
        .prefix("diffwalk")
        .tempdir()
        .map_err(|source| FixtureError::Io {
            path: "<tempdir>".to_string(),
            source,
        })?;
    apply(dir.path(), changes)?;
    Ok(dir)
}

/// Apply changes under an existing directory.
pub fn apply(root: &Path, changes: &[Change]) -> Result<(), FixtureError> {
    for change in changes {
        let target = root.join(&change.path);
        let result = match (change.kind, change.entry) {
            (ChangeKind::Add, EntryKind::Directory) => fs::create_dir(&target),
            (ChangeKind::Add, EntryKind::File) => fs::File::create(&target).map(drop),
        };
        result.map_err(|source| FixtureError::Io {
            path: change.path.clone(),
            source,
        })?;
    }
    Ok(())
}
