//! In-memory tree for walker tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use diffwalk::{EntryKind, WalkerDirEntry, WalkerError, WalkerFs};
use tokio::sync::RwLock;

use crate::changes::{Change, ChangeKind};

/// Entry returned by `MemoryFs::list_dir`.
#[derive(Debug, Clone)]
pub struct MemEntry {
    name: String,
    is_dir: bool,
    is_symlink: bool,
}

impl WalkerDirEntry for MemEntry {
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

#[derive(Debug, Clone, Copy)]
enum Node {
    File,
    Dir,
    Symlink,
}

/// In-memory filesystem rooted at `/`.
///
/// Parents are created implicitly. Listings come back in hash order, never
/// sorted, so callers that rely on order must sort themselves.
#[derive(Debug)]
pub struct MemoryFs {
    nodes: RwLock<HashMap<PathBuf, Node>>,
    failing: RwLock<HashSet<PathBuf>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(PathBuf::from("/"), Node::Dir);
        Self {
            nodes: RwLock::new(nodes),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Build a tree from a change stream, rooted at `/`.
    pub async fn from_changes(changes: &[Change]) -> Self {
        let fs = Self::new();
        for change in changes {
            match (change.kind, change.entry) {
                (ChangeKind::Add, EntryKind::Directory) => fs.add_dir(&change.path).await,
                (ChangeKind::Add, EntryKind::File) => fs.add_file(&change.path).await,
            }
        }
        fs
    }

    pub async fn add_file(&self, path: &str) {
        self.insert(path, Node::File).await;
    }

    pub async fn add_dir(&self, path: &str) {
        self.insert(path, Node::Dir).await;
    }

    /// Add a symlink entry. It lists as a non-directory.
    pub async fn add_symlink(&self, path: &str) {
        self.insert(path, Node::Symlink).await;
    }

    /// Make `list_dir(path)` fail with `PermissionDenied`.
    pub async fn fail_listing(&self, path: &str) {
        self.failing.write().await.insert(Self::abs(path));
    }

    fn abs(path: &str) -> PathBuf {
        Path::new("/").join(path.trim_start_matches('/'))
    }

    async fn insert(&self, path: &str, node: Node) {
        let full = Self::abs(path);
        let mut nodes = self.nodes.write().await;
        let mut ancestor = full.parent();
        while let Some(dir) = ancestor {
            nodes.insert(dir.to_path_buf(), Node::Dir);
            ancestor = dir.parent();
        }
        nodes.insert(full, node);
    }
}

#[async_trait]
impl WalkerFs for MemoryFs {
    type DirEntry = MemEntry;

    async fn list_dir(&self, path: &Path) -> Result<Vec<MemEntry>, WalkerError> {
        if self.failing.read().await.contains(path) {
            return Err(WalkerError::PermissionDenied(path.display().to_string()));
        }

        let nodes = self.nodes.read().await;
        match nodes.get(path) {
            Some(Node::Dir) => {}
            Some(_) => return Err(WalkerError::Io(format!("not a directory: {}", path.display()))),
            None => return Err(WalkerError::NotFound(path.display().to_string())),
        }

        let entries = nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .filter_map(|(p, node)| {
                let name = p.file_name()?.to_string_lossy().into_owned();
                Some(MemEntry {
                    name,
                    is_dir: matches!(node, Node::Dir),
                    is_symlink: matches!(node, Node::Symlink),
                })
            })
            .collect();
        Ok(entries)
    }
}
