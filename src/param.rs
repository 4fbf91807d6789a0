//! Parameter typing (C3): classification of directive argument lexemes.
//!
//! Classification is a pure function of the value string, applied in the
//! fixed order given below; the first matching rule wins. It is advisory —
//! whether a classified value is semantically correct for its directive is a
//! question for the validator (`crate::validate`), not this module.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// The classified shape of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Number,
    Size,
    Time,
    Path,
    Url,
    Regex,
    Variable,
    Boolean,
    Quoted,
    String,
}

/// A single directive argument: its source text, classified kind, and the
/// line offset (relative to the directive's first token) it appeared on —
/// this lets multi-line directives record where each argument actually sat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub value: String,
    pub kind: ParamKind,
    pub relative_line: i64,
}

impl Parameter {
    pub fn new(value: impl Into<String>, relative_line: i64) -> Self {
        let value = value.into();
        let kind = classify(&value);
        Self {
            value,
            kind,
            relative_line,
        }
    }
}

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^-?\d+(\.\d+)?(ms|s|h|d|w|y)$").unwrap());
static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^-?\d+(\.\d+)?(k|m|g|t|kb|mb|gb|tb)$").unwrap());
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

const BOOLEAN_WORDS: &[&str] = &["on", "off", "yes", "no", "true", "false", "enable", "disable"];
const URL_SCHEMES: &[&str] = &["http://", "https://", "ftp://", "ftps://", "unix:"];
const KNOWN_EXTENSIONS: &[&str] = &[
    ".conf", ".html", ".htm", ".pem", ".crt", ".key", ".cer", ".pid", ".log", ".sock", ".lua",
    ".so", ".json", ".cache", ".txt",
];

/// Classify a raw parameter value string. See module docs for the rule order.
pub fn classify(value: &str) -> ParamKind {
    if value.is_empty() {
        return ParamKind::String;
    }
    if value.starts_with('$') {
        return ParamKind::Variable;
    }
    if is_matching_quoted(value) {
        return ParamKind::Quoted;
    }
    if BOOLEAN_WORDS.iter().any(|w| w.eq_ignore_ascii_case(value)) {
        return ParamKind::Boolean;
    }
    if TIME_RE.is_match(value) {
        return ParamKind::Time;
    }
    if SIZE_RE.is_match(value) {
        return ParamKind::Size;
    }
    if NUMBER_RE.is_match(value) {
        return ParamKind::Number;
    }
    if looks_like_regex(value) {
        return ParamKind::Regex;
    }
    if URL_SCHEMES.iter().any(|s| value.starts_with(s)) {
        return ParamKind::Url;
    }
    if looks_like_path(value) {
        return ParamKind::Path;
    }
    ParamKind::String
}

fn is_matching_quoted(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    let first = bytes[0];
    let last = bytes[bytes.len() - 1];
    (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'')
}

fn looks_like_regex(value: &str) -> bool {
    if value.starts_with('~') || value.starts_with('^') || value.ends_with('$') {
        return true;
    }
    let metachars: &[char] = &['^', '$', '*', '+', '?', '[', ']', '(', ')', '|'];
    let mut count = 0usize;
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '.' {
            // `.*`/`.+` count as a single metacharacter occurrence.
            if matches!(chars.peek(), Some('*') | Some('+')) {
                chars.next();
                count += 1;
            }
            continue;
        }
        if metachars.contains(&c) {
            count += 1;
        }
    }
    count >= 2
}

fn looks_like_path(value: &str) -> bool {
    if value.starts_with('/') {
        return true;
    }
    if value.len() >= 3 {
        let bytes = value.as_bytes();
        if bytes[1] == b':' && (bytes[2] == b'\\' || bytes[2] == b'/') && bytes[0].is_ascii_alphabetic() {
            return true; // drive-letter path
        }
    }
    if value.starts_with("./") || value.starts_with("../") {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    if KNOWN_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return true;
    }
    if value.contains('/') && !looks_like_regex(value) {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_string() {
        assert_eq!(classify(""), ParamKind::String);
    }

    #[test]
    fn variable_prefix() {
        assert_eq!(classify("$remote_addr"), ParamKind::Variable);
    }

    #[test]
    fn matching_quotes() {
        assert_eq!(classify("\"hello world\""), ParamKind::Quoted);
        assert_eq!(classify("'hello'"), ParamKind::Quoted);
    }

    #[test]
    fn boolean_words_case_insensitive() {
        for w in ["on", "OFF", "Yes", "no", "TRUE", "false", "Enable", "disable"] {
            assert_eq!(classify(w), ParamKind::Boolean, "failed for {w}");
        }
    }

    #[test]
    fn time_values() {
        for v in ["10s", "1.5h", "30d", "1w", "1y", "500ms"] {
            assert_eq!(classify(v), ParamKind::Time, "failed for {v}");
        }
        // 'm' alone collides with megabyte and must NOT classify as time.
        assert_eq!(classify("10m"), ParamKind::Size);
    }

    #[test]
    fn size_values() {
        for v in ["10m", "1k", "2G", "500kb", "1.5MB", "10t"] {
            assert_eq!(classify(v), ParamKind::Size, "failed for {v}");
        }
    }

    #[test]
    fn number_values() {
        assert_eq!(classify("1024"), ParamKind::Number);
        assert_eq!(classify("-3.14"), ParamKind::Number);
    }

    #[test]
    fn regex_values() {
        assert_eq!(classify("~^/api"), ParamKind::Regex);
        assert_eq!(classify("^/foo"), ParamKind::Regex);
        assert_eq!(classify("foo$"), ParamKind::Regex);
        assert_eq!(classify(".*\\.php"), ParamKind::Regex);
    }

    #[test]
    fn url_values() {
        assert_eq!(classify("http://backend"), ParamKind::Url);
        assert_eq!(classify("unix:/tmp/sock"), ParamKind::Url);
    }

    #[test]
    fn path_values() {
        assert_eq!(classify("/var/www/html"), ParamKind::Path);
        assert_eq!(classify("./relative/file"), ParamKind::Path);
        assert_eq!(classify("nginx.conf"), ParamKind::Path);
        assert_eq!(classify("text/plain"), ParamKind::Path);
    }

    #[test]
    fn plain_string_fallback() {
        assert_eq!(classify("example"), ParamKind::String);
        assert_eq!(classify("auto"), ParamKind::String);
    }
}
