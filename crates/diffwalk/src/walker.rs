//! Depth-first, pre-order walker, generic over `WalkerFs`.
//!
//! Siblings are visited in ascending name order and each directory is
//! emitted before anything inside it. The walk keeps an explicit stack with
//! one frame per open directory; a frame holds that directory's sorted,
//! not-yet-visited children.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::filter::PathFilter;
use crate::options::WalkOptions;
use crate::{EntryKind, SinkError, WalkError, WalkSink, WalkerDirEntry, WalkerError, WalkerFs};

/// One emitted entry, as returned by `Walker::collect`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalkEntry {
    /// Slash-separated path relative to the walk root.
    pub path: String,
    pub kind: EntryKind,
}

/// Open directory on the walk stack.
struct Frame {
    path: String,
    children: std::vec::IntoIter<(String, EntryKind)>,
}

/// Async filtered walker.
///
/// # Examples
/// ```ignore
/// use diffwalk::{LocalFs, WalkOptions, Walker};
///
/// let entries = Walker::new(&LocalFs::new(), "/srv/context")
///     .with_options(WalkOptions::new().exclude("target").exclude("!target/keep"))
///     .collect()
///     .await?;
/// ```
pub struct Walker<'a, F: WalkerFs> {
    fs: &'a F,
    root: PathBuf,
    options: WalkOptions,
    cancel: Option<CancellationToken>,
}

impl<'a, F: WalkerFs> Walker<'a, F> {
    /// Create a walker rooted at `root`. The root itself is never emitted.
    pub fn new(fs: &'a F, root: impl AsRef<Path>) -> Self {
        Self {
            fs,
            root: root.as_ref().to_path_buf(),
            options: WalkOptions::default(),
            cancel: None,
        }
    }

    /// Set walk options.
    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop the walk with `WalkError::Cancelled` once `token` fires. Checked
    /// before every directory listing and every sink call.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Walk the tree, reporting emitted entries to `sink`.
    ///
    /// Entries already reported stay reported if the walk fails part way.
    pub async fn walk<S: WalkSink + ?Sized>(self, sink: &mut S) -> Result<(), WalkError> {
        let filter = PathFilter::new(&self.options)?;
        tracing::debug!(
            root = %self.root.display(),
            whitelist = filter.is_whitelist(),
            patterns = self.options.exclude_patterns.len(),
            "walk started"
        );

        self.check_cancelled()?;
        let children = self
            .list_sorted(&self.root)
            .await
            .map_err(|source| WalkError::List {
                path: self.root.display().to_string(),
                source,
            })?;

        let mut stack = vec![Frame {
            path: String::new(),
            children,
        }];
        let mut emitted = 0usize;

        while let Some(frame) = stack.last_mut() {
            let Some((name, kind)) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let path = if frame.path.is_empty() {
                name
            } else {
                format!("{}/{}", frame.path, name)
            };

            let decision = filter.decide(&path, kind);
            tracing::trace!(
                path = %path,
                %kind,
                emit = decision.emit,
                descend = decision.descend,
                "visit"
            );

            if decision.emit {
                self.check_cancelled()?;
                sink.visit(&path, kind, None).map_err(WalkError::Sink)?;
                emitted += 1;
            }

            if !kind.is_dir() {
                continue;
            }
            if !decision.descend {
                tracing::debug!(path = %path, "pruned");
                continue;
            }

            self.check_cancelled()?;
            match self.list_sorted(&self.root.join(&path)).await {
                Ok(children) => stack.push(Frame { path, children }),
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "failed to list directory");
                    self.check_cancelled()?;
                    if let Err(reason) = sink.visit(&path, EntryKind::Directory, Some(&err)) {
                        tracing::debug!(path = %path, %reason, "sink declined listing error");
                        return Err(WalkError::List { path, source: err });
                    }
                }
            }
        }

        tracing::debug!(root = %self.root.display(), emitted, "walk finished");
        Ok(())
    }

    /// Collect every emitted entry. Listing failures below the root are
    /// skipped.
    pub async fn collect(self) -> Result<Vec<WalkEntry>, WalkError> {
        let mut entries = Vec::new();
        let mut sink =
            |path: &str, kind: EntryKind, err: Option<&WalkerError>| -> Result<(), SinkError> {
                if err.is_none() {
                    entries.push(WalkEntry {
                        path: path.to_string(),
                        kind,
                    });
                }
                Ok(())
            };
        self.walk(&mut sink).await?;
        Ok(entries)
    }

    fn check_cancelled(&self) -> Result<(), WalkError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                tracing::debug!(root = %self.root.display(), "walk cancelled");
                Err(WalkError::Cancelled)
            }
            _ => Ok(()),
        }
    }

    /// List `dir` and sort by name. The listing is fully consumed here, so no
    /// handle stays open while children are walked.
    async fn list_sorted(
        &self,
        dir: &Path,
    ) -> Result<std::vec::IntoIter<(String, EntryKind)>, WalkerError> {
        let mut children: Vec<(String, EntryKind)> = self
            .fs
            .list_dir(dir)
            .await?
            .into_iter()
            .map(|e| (e.name().to_string(), e.kind()))
            .collect();
        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children.into_iter())
    }
}

/// Walk `root` with `options`, reporting to `sink`.
pub async fn walk<F, S>(
    fs: &F,
    root: impl AsRef<Path>,
    options: &WalkOptions,
    sink: &mut S,
) -> Result<(), WalkError>
where
    F: WalkerFs,
    S: WalkSink + ?Sized,
{
    Walker::new(fs, root)
        .with_options(options.clone())
        .walk(sink)
        .await
}
