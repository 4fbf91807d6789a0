//! Ambient parser configuration.
//!
//! Most callers only need [`ParserOptions::default`]; this module exists for
//! the cases where a host application wants to load parsing behavior from a
//! project file (custom directive names, include strictness) the way it
//! loads any other tool configuration, via `toml` + `serde`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options threaded through a single top-level parse, including any
/// recursive parses performed for `include` resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Directive names accepted in addition to the built-in known-directive
    /// set, without raising `UnknownDirective`.
    #[serde(default)]
    pub extra_directives: Vec<String>,

    /// Accept any directive name, known or not.
    #[serde(default)]
    pub ignore_unknown_directives: bool,

    /// When an `include` pattern matches zero files, return
    /// `IncludeError::NoMatches` instead of silently resolving to nothing.
    #[serde(default)]
    pub strict_include: bool,

    /// Swallow I/O and parse errors encountered while resolving `include`
    /// directives rather than propagating them to the caller.
    #[serde(default)]
    pub skip_include_parsing_err: bool,

    /// Root directory relative include paths are joined against. Defaults to
    /// the directory containing the file being parsed.
    #[serde(default)]
    pub root_dir: Option<PathBuf>,
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a TOML file such as `nginx-config.toml`.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_and_new_agree_and_are_permissive() {
        let opts = ParserOptions::new();
        assert!(opts.extra_directives.is_empty());
        assert!(!opts.ignore_unknown_directives);
        assert!(!opts.strict_include);
        assert!(!opts.skip_include_parsing_err);
        assert!(opts.root_dir.is_none());
    }

    #[test]
    fn partial_toml_document_fills_in_defaults_for_omitted_fields() {
        let opts = ParserOptions::from_toml_str("strict_include = true\n").unwrap();
        assert!(opts.strict_include);
        assert!(!opts.ignore_unknown_directives);
        assert!(opts.extra_directives.is_empty());
        assert!(opts.root_dir.is_none());
    }

    #[test]
    fn full_toml_document_round_trips_every_field() {
        let text = r#"
            extra_directives = ["my_directive", "another"]
            ignore_unknown_directives = true
            strict_include = true
            skip_include_parsing_err = true
            root_dir = "/etc/nginx"
        "#;
        let opts = ParserOptions::from_toml_str(text).unwrap();
        assert_eq!(opts.extra_directives, vec!["my_directive".to_string(), "another".to_string()]);
        assert!(opts.ignore_unknown_directives);
        assert!(opts.strict_include);
        assert!(opts.skip_include_parsing_err);
        assert_eq!(opts.root_dir, Some(PathBuf::from("/etc/nginx")));
    }

    #[test]
    fn an_empty_toml_document_is_equivalent_to_default() {
        let opts = ParserOptions::from_toml_str("").unwrap();
        assert!(opts.extra_directives.is_empty());
        assert!(!opts.ignore_unknown_directives);
        assert!(!opts.strict_include);
        assert!(!opts.skip_include_parsing_err);
        assert!(opts.root_dir.is_none());
    }

    #[test]
    fn malformed_toml_is_a_deserialization_error() {
        assert!(ParserOptions::from_toml_str("strict_include = \"not a bool\"").is_err());
    }
}
