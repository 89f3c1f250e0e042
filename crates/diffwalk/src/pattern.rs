//! Ordered, negatable exclude patterns with last-match-wins evaluation.
//!
//! Patterns follow ignore-file conventions:
//!
//! - `!pattern` re-includes paths an earlier pattern excluded
//! - a bare name (`target`, `*.log`) matches that name at any depth
//! - a pattern containing `/` (`src/*.rs`, `/build`) is anchored to the root
//! - `**` matches zero or more whole path components
//! - a pattern matching a directory also matches everything below it
//!
//! Rules are evaluated in order and the last matching rule decides.

use thiserror::Error;

use crate::glob::Segment;

/// Errors when compiling exclude patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern has no path segments: {0:?}")]
    Empty(String),
    #[error("malformed pattern {pattern:?}: {reason}")]
    Malformed { pattern: String, reason: String },
}

impl PatternError {
    pub(crate) fn malformed(pattern: &str, reason: &str) -> Self {
        PatternError::Malformed {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// One compiled exclude rule.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    negate: bool,
    anchored: bool,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a single rule. Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, PatternError> {
        let raw = line.trim();
        if raw.is_empty() {
            return Ok(None);
        }

        let (body, negate) = match raw.strip_prefix('!') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        let body = body.trim_end_matches('/');
        let anchored = body.contains('/');

        let mut segments = Vec::new();
        for part in body.split('/').filter(|p| !p.is_empty() && *p != ".") {
            let segment = Segment::compile(part, raw)?;
            // Consecutive globstars collapse to one
            if segment == Segment::Globstar && segments.last() == Some(&Segment::Globstar) {
                continue;
            }
            segments.push(segment);
        }

        if segments.is_empty() {
            return Err(PatternError::Empty(raw.to_string()));
        }

        Ok(Some(Pattern {
            raw: raw.to_string(),
            negate,
            anchored,
            segments,
        }))
    }

    /// The rule as written, including any `!`.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True if this rule re-includes what it matches.
    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// True if this rule is matched against the full relative path rather
    /// than against each name.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Check whether this rule matches the path or one of its ancestors.
    pub fn matches(&self, components: &[&str]) -> bool {
        if !self.anchored {
            // Bare name: any component, at any depth
            return components.iter().any(|c| self.segments[0].matches(c));
        }
        (1..=components.len()).any(|n| match_segments(&self.segments, &components[..n]))
    }

    /// Check whether this rule can match something strictly below `dir`.
    pub fn can_match_below(&self, dir: &[&str]) -> bool {
        !self.anchored || prefix_leaves_remainder(&self.segments, dir)
    }
}

/// Full match of `components` against `segments`, backtracking over globstars.
fn match_segments(segments: &[Segment], components: &[&str]) -> bool {
    match segments.split_first() {
        None => components.is_empty(),
        Some((Segment::Globstar, rest)) => {
            (0..=components.len()).any(|skip| match_segments(rest, &components[skip..]))
        }
        Some((segment, rest)) => match components.split_first() {
            Some((first, tail)) => segment.matches(first) && match_segments(rest, tail),
            None => false,
        },
    }
}

/// True if `dir` can be consumed by a prefix of `segments` with at least one
/// segment left over to match a descendant.
fn prefix_leaves_remainder(segments: &[Segment], dir: &[&str]) -> bool {
    match (segments.split_first(), dir.split_first()) {
        (None, _) => false,
        (Some(_), None) => true,
        // `**` can absorb the rest of `dir` and still match deeper
        (Some((Segment::Globstar, _)), Some(_)) => true,
        (Some((segment, rest)), Some((first, tail))) => {
            segment.matches(first) && prefix_leaves_remainder(rest, tail)
        }
    }
}

/// Split a relative path into its non-empty components.
pub(crate) fn components(path: &str) -> Vec<&str> {
    path.split('/').filter(|c| !c.is_empty() && *c != ".").collect()
}

/// Compiled, ordered list of exclude rules.
///
/// # Examples
/// ```
/// use diffwalk::PatternMatcher;
///
/// let matcher = PatternMatcher::compile(&["foo*", "!foo/bar2"]).unwrap();
/// assert!(matcher.excludes("foo"));
/// assert!(matcher.excludes("foo2"));
/// assert!(!matcher.excludes("foo/bar2"));
/// assert!(matcher.may_reinclude_below("foo"));
/// assert!(!matcher.excludes("bar"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    patterns: Vec<Pattern>,
}

impl PatternMatcher {
    /// Compile rules in order. Blank entries are skipped; any malformed rule
    /// fails the whole set.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for raw in patterns {
            if let Some(pattern) = Pattern::parse(raw.as_ref())? {
                compiled.push(pattern);
            }
        }
        Ok(Self { patterns: compiled })
    }

    /// Check whether `path` is excluded: the last rule that matches it is a
    /// plain (non-negated) rule.
    pub fn excludes(&self, path: &str) -> bool {
        self.deciding_exclude(&components(path)).is_some()
    }

    /// Check whether a negation placed after the rule excluding `dir` could
    /// re-include something strictly inside `dir`.
    ///
    /// Only meaningful for excluded directories; returns false otherwise.
    pub fn may_reinclude_below(&self, dir: &str) -> bool {
        let dir = components(dir);
        match self.deciding_exclude(&dir) {
            Some(idx) => self.patterns[idx + 1..]
                .iter()
                .any(|p| p.negate && p.can_match_below(&dir)),
            None => false,
        }
    }

    /// Index of the last matching rule, if that rule excludes.
    fn deciding_exclude(&self, components: &[&str]) -> Option<usize> {
        let mut verdict = None;
        for (idx, pattern) in self.patterns.iter().enumerate() {
            if pattern.matches(components) {
                verdict = if pattern.negate { None } else { Some(idx) };
            }
        }
        verdict
    }

    /// Compiled rules in evaluation order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// True if no rules were compiled.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if any rule is a negation.
    pub fn has_negations(&self) -> bool {
        self.patterns.iter().any(|p| p.negate)
    }
}
