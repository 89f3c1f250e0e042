//! Per-path emit/descend decisions.
//!
//! Three modes, chosen once from `WalkOptions`:
//!
//! - **whitelist**: only listed paths and their ancestor directories are emitted
//! - **patterns**: ordered exclude rules, with excluded directories kept open
//!   when a later negation could re-include something inside them
//! - **all**: everything is emitted

use std::collections::HashSet;

use crate::EntryKind;
use crate::options::WalkOptions;
use crate::pattern::{PatternError, PatternMatcher, components};

/// What to do with one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    /// Report the entry to the sink.
    pub emit: bool,
    /// Recurse into the entry (directories only).
    pub descend: bool,
}

impl Decision {
    const SKIP: Decision = Decision {
        emit: false,
        descend: false,
    };

    fn open(kind: EntryKind) -> Self {
        Decision {
            emit: true,
            descend: kind.is_dir(),
        }
    }
}

/// Exact-path whitelist with precomputed ancestors.
#[derive(Debug, Clone, Default)]
pub struct IncludeSet {
    listed: HashSet<String>,
    ancestors: HashSet<String>,
}

impl IncludeSet {
    /// Build from raw paths. `./` prefixes, leading or trailing `/` and
    /// repeated separators are normalized away; entries naming the root are
    /// dropped.
    pub fn new<S: AsRef<str>>(paths: &[S]) -> Self {
        let mut set = Self::default();
        for raw in paths {
            let parts = components(raw.as_ref());
            if parts.is_empty() {
                continue;
            }
            for n in 1..parts.len() {
                set.ancestors.insert(parts[..n].join("/"));
            }
            set.listed.insert(parts.join("/"));
        }
        set
    }

    /// True if `path` was listed.
    pub fn contains(&self, path: &str) -> bool {
        self.listed.contains(path)
    }

    /// True if `path` is a strict ancestor of a listed path.
    pub fn is_ancestor(&self, path: &str) -> bool {
        self.ancestors.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.listed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listed.len()
    }
}

#[derive(Debug, Clone)]
enum Mode {
    All,
    Whitelist(IncludeSet),
    Patterns(PatternMatcher),
}

/// Combined whitelist/pattern filter for one walk.
///
/// # Examples
/// ```
/// use diffwalk::{EntryKind, PathFilter, WalkOptions};
///
/// let filter = PathFilter::new(&WalkOptions::new().include("a/b/c")).unwrap();
/// let d = filter.decide("a", EntryKind::Directory);
/// assert!(d.emit && d.descend);
/// assert!(!filter.decide("x", EntryKind::File).emit);
/// ```
#[derive(Debug, Clone)]
pub struct PathFilter {
    mode: Mode,
}

impl PathFilter {
    /// Derive the filter from options. Fails if any exclude pattern is
    /// malformed, even in whitelist mode.
    pub fn new(options: &WalkOptions) -> Result<Self, PatternError> {
        let matcher = PatternMatcher::compile(&options.exclude_patterns)?;
        let includes = IncludeSet::new(&options.include_paths);

        let mode = if !includes.is_empty() {
            Mode::Whitelist(includes)
        } else if !matcher.is_empty() {
            Mode::Patterns(matcher)
        } else {
            Mode::All
        };
        Ok(Self { mode })
    }

    /// Decide whether to emit and whether to descend into `path`.
    pub fn decide(&self, path: &str, kind: EntryKind) -> Decision {
        match &self.mode {
            Mode::All => Decision::open(kind),
            Mode::Whitelist(includes) => whitelist_decision(includes, path, kind),
            Mode::Patterns(matcher) => pattern_decision(matcher, path, kind),
        }
    }

    /// True in whitelist mode.
    pub fn is_whitelist(&self) -> bool {
        matches!(self.mode, Mode::Whitelist(_))
    }

    /// True when every entry is emitted.
    pub fn is_pass_through(&self) -> bool {
        matches!(self.mode, Mode::All)
    }
}

/// Listed paths and their strict ancestor directories are emitted; those
/// ancestors and listed directories are entered. A file is never an
/// ancestor, even when its path is a prefix of a listed path.
pub fn whitelist_decision(includes: &IncludeSet, path: &str, kind: EntryKind) -> Decision {
    if includes.contains(path) || (kind.is_dir() && includes.is_ancestor(path)) {
        Decision::open(kind)
    } else {
        Decision::SKIP
    }
}

/// Excluded entries are dropped unless they are directories that must stay
/// open for a possible re-inclusion below; such directories are also
/// emitted so the re-included descendant has its parent.
pub fn pattern_decision(matcher: &PatternMatcher, path: &str, kind: EntryKind) -> Decision {
    if !matcher.excludes(path) {
        return Decision::open(kind);
    }
    let keep_open = kind.is_dir() && matcher.may_reinclude_below(path);
    if keep_open {
        tracing::trace!(path, "excluded directory kept open for re-inclusion");
    }
    Decision {
        emit: keep_open,
        descend: keep_open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EntryKind::{Directory, File};

    fn filter(opts: WalkOptions) -> PathFilter {
        PathFilter::new(&opts).unwrap()
    }

    fn d(emit: bool, descend: bool) -> Decision {
        Decision { emit, descend }
    }

    #[test]
    fn no_options_passes_everything() {
        let f = filter(WalkOptions::default());
        assert!(f.is_pass_through());
        assert_eq!(f.decide("a", File), d(true, false));
        assert_eq!(f.decide("a", Directory), d(true, true));
        assert_eq!(f.decide("a/b/c", Directory), d(true, true));
    }

    #[test]
    fn whitelist_listed_and_ancestors() {
        let f = filter(WalkOptions::new().include("bar").include("bar/foo"));
        assert!(f.is_whitelist());
        assert_eq!(f.decide("bar", Directory), d(true, true));
        assert_eq!(f.decide("bar/foo", File), d(true, false));
        assert_eq!(f.decide("foo2", File), d(false, false));
        assert_eq!(f.decide("bar/other", File), d(false, false));
    }

    #[test]
    fn whitelist_implies_unlisted_ancestors() {
        let f = filter(WalkOptions::new().include("a/b/c.txt"));
        assert_eq!(f.decide("a", Directory), d(true, true));
        assert_eq!(f.decide("a/b", Directory), d(true, true));
        assert_eq!(f.decide("a/b/c.txt", File), d(true, false));
        assert_eq!(f.decide("a/x", Directory), d(false, false));
        // A file can never be an ancestor
        assert_eq!(f.decide("a/b", File), d(false, false));
        assert_eq!(f.decide("a", File), d(false, false));
    }

    #[test]
    fn whitelist_listed_directory_is_entered() {
        let f = filter(WalkOptions::new().include("docs"));
        assert_eq!(f.decide("docs", Directory), d(true, true));
        assert_eq!(f.decide("docs/readme.md", File), d(false, false));
    }

    #[test]
    fn whitelist_ignores_patterns() {
        let f = filter(WalkOptions::new().include("foo").exclude("foo"));
        assert_eq!(f.decide("foo", File), d(true, false));
    }

    #[test]
    fn whitelist_still_validates_patterns() {
        let err = PathFilter::new(&WalkOptions::new().include("foo").exclude("[")).unwrap_err();
        assert!(matches!(err, PatternError::Malformed { .. }));
    }

    #[test]
    fn include_paths_are_normalized() {
        let set = IncludeSet::new(&["./a//b/", "/c", "", "."]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("a/b"));
        assert!(set.contains("c"));
        assert!(set.is_ancestor("a"));
        assert!(!set.is_ancestor("a/b"));
    }

    #[test]
    fn include_paths_naming_only_root_fall_back_to_all() {
        let f = filter(WalkOptions::new().include(".").include("/"));
        assert!(f.is_pass_through());
    }

    #[test]
    fn patterns_exclude_and_reinclude() {
        let f = filter(WalkOptions::new().exclude("foo*").exclude("!foo/bar2"));
        assert_eq!(f.decide("bar", File), d(true, false));
        assert_eq!(f.decide("foo", Directory), d(true, true));
        assert_eq!(f.decide("foo2", File), d(false, false));
        assert_eq!(f.decide("foo/bar2", File), d(true, false));
        assert_eq!(f.decide("foo/other", File), d(false, false));
    }

    #[test]
    fn excluded_directory_pruned_without_negation() {
        let f = filter(WalkOptions::new().exclude("target"));
        assert_eq!(f.decide("target", Directory), d(false, false));
        assert_eq!(f.decide("src", Directory), d(true, true));
    }

    #[test]
    fn excluded_file_never_emitted_even_with_negations() {
        let f = filter(WalkOptions::new().exclude("foo*").exclude("!foo/bar2"));
        // Same name as the kept-open directory, but a file has no descendants
        assert_eq!(f.decide("foo", File), d(false, false));
    }

    #[test]
    fn malformed_pattern_is_error() {
        let err = PathFilter::new(&WalkOptions::new().exclude("[abc")).unwrap_err();
        assert!(matches!(err, PatternError::Malformed { .. }));
    }
}
