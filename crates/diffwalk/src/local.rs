//! Local filesystem listing.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::fs;

use crate::{WalkerDirEntry, WalkerError, WalkerFs};

/// `WalkerFs` over the real filesystem.
///
/// Symlinks are never followed: a link to a directory is listed with
/// `is_dir() == false` and `is_symlink() == true`, so the walker emits it as a
/// file and does not recurse.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

/// One entry from `LocalFs::list_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

impl WalkerDirEntry for LocalEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn is_symlink(&self) -> bool {
        self.is_symlink
    }
}

fn map_io(path: &Path, err: io::Error) -> WalkerError {
    let shown = path.display().to_string();
    match err.kind() {
        io::ErrorKind::NotFound => WalkerError::NotFound(shown),
        io::ErrorKind::PermissionDenied => WalkerError::PermissionDenied(shown),
        _ => WalkerError::Io(format!("{shown}: {err}")),
    }
}

/// Build an entry from its `(is_dir, is_symlink)` file type. An entry removed
/// between readdir and stat is skipped rather than failing the listing.
fn local_entry(
    name: String,
    path: &Path,
    file_type: io::Result<(bool, bool)>,
) -> Result<Option<LocalEntry>, WalkerError> {
    match file_type {
        Ok((is_dir, is_symlink)) => Ok(Some(LocalEntry {
            name,
            is_dir,
            is_symlink,
        })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "entry vanished during listing");
            Ok(None)
        }
        Err(e) => Err(map_io(path, e)),
    }
}

#[async_trait]
impl WalkerFs for LocalFs {
    type DirEntry = LocalEntry;

    async fn list_dir(&self, path: &Path) -> Result<Vec<LocalEntry>, WalkerError> {
        let mut dir = fs::read_dir(path).await.map_err(|e| map_io(path, e))?;
        let mut entries = Vec::new();

        while let Some(entry) = dir.next_entry().await.map_err(|e| map_io(path, e))? {
            // file_type() does not follow symlinks
            let file_type = entry
                .file_type()
                .await
                .map(|ft| (ft.is_dir(), ft.is_symlink()));
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(local) = local_entry(name, &entry.path(), file_type)? {
                entries.push(local);
            }
        }

        Ok(entries)
    }
}
