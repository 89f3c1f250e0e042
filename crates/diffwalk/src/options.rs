//! Walk configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::IncludeSet;

/// Errors loading walk options from a config document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid walk options: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Filters applied to one walk.
///
/// With both lists empty every entry is emitted. An `include_paths` entry
/// naming anything below the root switches the walk into whitelist mode, in
/// which `exclude_patterns` is ignored.
///
/// ```
/// use diffwalk::WalkOptions;
///
/// let opts = WalkOptions::new().exclude("target").exclude("!target/README");
/// assert_eq!(opts.exclude_patterns, vec!["target", "!target/README"]);
///
/// let opts = WalkOptions::from_toml(r#"include_paths = ["src", "src/lib.rs"]"#).unwrap();
/// assert!(opts.is_whitelist());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkOptions {
    /// Exact relative paths to emit; their ancestors are implied.
    pub include_paths: Vec<String>,
    /// Ordered glob rules; a leading `!` re-includes.
    pub exclude_patterns: Vec<String>,
}

impl WalkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a whitelisted path.
    pub fn include(mut self, path: impl Into<String>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    /// Append an exclude rule.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Parse options from a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// True if the walk will run in whitelist mode: at least one include
    /// path names something below the root after normalization.
    pub fn is_whitelist(&self) -> bool {
        !IncludeSet::new(&self.include_paths).is_empty()
    }

    /// True if neither filter is set.
    pub fn is_empty(&self) -> bool {
        self.include_paths.is_empty() && self.exclude_patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let opts = WalkOptions::default();
        assert!(opts.is_empty());
        assert!(!opts.is_whitelist());
    }

    #[test]
    fn root_only_includes_are_not_a_whitelist() {
        assert!(!WalkOptions::new().include(".").include("/").is_whitelist());
        assert!(WalkOptions::new().include(".").include("./src").is_whitelist());
    }

    #[test]
    fn builder_preserves_order() {
        let opts = WalkOptions::new()
            .exclude("foo*")
            .exclude("!foo/bar2")
            .include("bar");
        assert_eq!(opts.exclude_patterns, vec!["foo*", "!foo/bar2"]);
        assert_eq!(opts.include_paths, vec!["bar"]);
    }

    #[test]
    fn from_toml_full() {
        let opts = WalkOptions::from_toml(
            r#"
            include_paths = ["bar", "bar/foo"]
            exclude_patterns = ["*.log", "!keep.log"]
            "#,
        )
        .unwrap();
        assert_eq!(opts.include_paths, vec!["bar", "bar/foo"]);
        assert_eq!(opts.exclude_patterns, vec!["*.log", "!keep.log"]);
    }

    #[test]
    fn from_toml_missing_fields_default() {
        let opts = WalkOptions::from_toml("").unwrap();
        assert!(opts.is_empty());

        let opts = WalkOptions::from_toml(r#"exclude_patterns = ["target"]"#).unwrap();
        assert!(opts.include_paths.is_empty());
        assert_eq!(opts.exclude_patterns, vec!["target"]);
    }

    #[test]
    fn from_toml_rejects_wrong_types() {
        let err = WalkOptions::from_toml("include_paths = 3").unwrap_err();
        assert!(err.to_string().starts_with("invalid walk options"));
    }

    #[test]
    fn json_field_names_match_toml() {
        let opts: WalkOptions =
            serde_json::from_str(r#"{"exclude_patterns": ["target", "!target/keep"]}"#).unwrap();
        assert_eq!(opts, WalkOptions::new().exclude("target").exclude("!target/keep"));

        let json = serde_json::to_value(WalkOptions::new().include("src")).unwrap();
        assert_eq!(json["include_paths"][0], "src");
        assert_eq!(json["exclude_patterns"].as_array().map(Vec::len), Some(0));
    }
}
