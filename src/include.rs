//! Include resolver (C6): glob-expands `include` directives and recursively
//! parses each match, with cycle detection scoped to a single top-level
//! parse.

use crate::ast::Config;
use crate::config::ParserOptions;
use crate::error::IncludeError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The state of one include target within a single top-level parse's visited
/// map. Modeled explicitly rather than as a nilable pointer: a path is
/// either being resolved right now (and revisiting it is a cycle), or it has
/// already produced a `Config`.
#[derive(Debug, Clone)]
pub enum IncludeCacheState {
    Visiting,
    Resolved(Config),
}

/// Resolve a single `include` directive's glob pattern against `base_dir`,
/// recursively parsing every match via `parse_fn`. Matches already present
/// in `cache` as `Resolved` are reused (cloned); matches present as
/// `Visiting` are a self-include cycle and are silently skipped.
pub fn resolve<F>(
    pattern: &str,
    base_dir: &Path,
    options: &ParserOptions,
    cache: &mut HashMap<PathBuf, IncludeCacheState>,
    mut parse_fn: F,
) -> Result<Vec<Config>, IncludeError>
where
    F: FnMut(&Path, &ParserOptions, &mut HashMap<PathBuf, IncludeCacheState>) -> Result<Config, IncludeError>,
{
    let full_pattern = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        base_dir.join(pattern).to_string_lossy().into_owned()
    };

    let mut matches: Vec<PathBuf> = glob::glob(&full_pattern)
        .map_err(|e| IncludeError::Io {
            path: full_pattern.clone(),
            message: e.to_string(),
        })?
        .filter_map(|entry| entry.ok())
        .collect();
    matches.sort();

    if matches.is_empty() && options.strict_include {
        return Err(IncludeError::NoMatches {
            pattern: full_pattern,
        });
    }

    let mut configs = Vec::new();
    for path in matches {
        match cache.get(&path) {
            Some(IncludeCacheState::Resolved(config)) => {
                configs.push(config.clone());
                continue;
            }
            Some(IncludeCacheState::Visiting) => {
                // Self-include cycle: already in progress further up the
                // call stack. Skip rather than recurse forever.
                continue;
            }
            None => {}
        }

        cache.insert(path.clone(), IncludeCacheState::Visiting);

        match parse_fn(&path, options, cache) {
            Ok(config) => {
                cache.insert(path.clone(), IncludeCacheState::Resolved(config.clone()));
                configs.push(config);
            }
            Err(err) => {
                cache.remove(&path);
                if options.skip_include_parsing_err {
                    continue;
                }
                return Err(err);
            }
        }
    }

    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::token::Position;

    fn parse_str_as(text: &str) -> Config {
        crate::parser::parse_str(text, ParserOptions::new()).unwrap()
    }

    #[test]
    fn resolves_glob_matches_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("10-b.conf"), "listen 2;\n").unwrap();
        std::fs::write(dir.path().join("05-a.conf"), "listen 1;\n").unwrap();

        let options = ParserOptions::new();
        let mut cache = HashMap::new();
        let mut seen_paths = Vec::new();
        let configs = resolve("*.conf", dir.path(), &options, &mut cache, |path, _, _| {
            seen_paths.push(path.file_name().unwrap().to_string_lossy().into_owned());
            Ok(parse_str_as("listen 0;\n"))
        })
        .unwrap();

        assert_eq!(configs.len(), 2);
        assert_eq!(seen_paths, vec!["05-a.conf".to_string(), "10-b.conf".to_string()]);
    }

    #[test]
    fn reuses_a_resolved_cache_entry_without_reparsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.conf");
        std::fs::write(&path, "listen 1;\n").unwrap();

        let options = ParserOptions::new();
        let mut cache = HashMap::new();
        cache.insert(path.clone(), IncludeCacheState::Resolved(parse_str_as("listen 9;\n")));

        let mut call_count = 0;
        let configs = resolve("shared.conf", dir.path(), &options, &mut cache, |_, _, _| {
            call_count += 1;
            Ok(parse_str_as("listen 0;\n"))
        })
        .unwrap();

        assert_eq!(call_count, 0, "a resolved entry must not be reparsed");
        assert_eq!(configs.len(), 1);
        let id = configs[0].root.children[0];
        assert_eq!(configs[0].get(id).unwrap().parameters()[0].value, "9");
    }

    #[test]
    fn skips_a_path_already_marked_visiting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycle.conf");
        std::fs::write(&path, "listen 1;\n").unwrap();

        let options = ParserOptions::new();
        let mut cache = HashMap::new();
        cache.insert(path.clone(), IncludeCacheState::Visiting);

        let mut call_count = 0;
        let configs = resolve("cycle.conf", dir.path(), &options, &mut cache, |_, _, _| {
            call_count += 1;
            Ok(parse_str_as("listen 0;\n"))
        })
        .unwrap();

        assert_eq!(call_count, 0, "a path already being visited must be skipped");
        assert!(configs.is_empty());
    }

    #[test]
    fn strict_include_with_no_matches_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let options = ParserOptions {
            strict_include: true,
            ..ParserOptions::new()
        };
        let mut cache = HashMap::new();
        let err = resolve("missing-*.conf", dir.path(), &options, &mut cache, |_, _, _| {
            Ok(parse_str_as("listen 0;\n"))
        })
        .unwrap_err();
        assert!(matches!(err, IncludeError::NoMatches { .. }));
    }

    #[test]
    fn non_strict_include_with_no_matches_resolves_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let options = ParserOptions::new();
        let mut cache = HashMap::new();
        let configs = resolve("missing-*.conf", dir.path(), &options, &mut cache, |_, _, _| {
            Ok(parse_str_as("listen 0;\n"))
        })
        .unwrap();
        assert!(configs.is_empty());
    }

    #[test]
    fn a_parse_error_is_propagated_and_the_cache_entry_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.conf"), "x\n").unwrap();

        let options = ParserOptions::new();
        let mut cache = HashMap::new();
        let err = resolve("broken.conf", dir.path(), &options, &mut cache, |path, _, _| {
            Err(IncludeError::Parse {
                path: path.to_string_lossy().into_owned(),
                source: ParseError::UnexpectedEof {
                    position: Position::new(1, 1),
                },
            })
        })
        .unwrap_err();

        assert!(matches!(err, IncludeError::Parse { .. }));
        assert!(cache.is_empty(), "a failed entry must not be left as Visiting");
    }

    #[test]
    fn skip_include_parsing_err_swallows_a_failure_instead_of_propagating_it() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.conf"), "x\n").unwrap();
        std::fs::write(dir.path().join("ok.conf"), "listen 1;\n").unwrap();

        let options = ParserOptions {
            skip_include_parsing_err: true,
            ..ParserOptions::new()
        };
        let mut cache = HashMap::new();
        let configs = resolve("*.conf", dir.path(), &options, &mut cache, |path, _, _| {
            if path.ends_with("broken.conf") {
                Err(IncludeError::Parse {
                    path: path.to_string_lossy().into_owned(),
                    source: ParseError::UnexpectedEof {
                        position: Position::new(1, 1),
                    },
                })
            } else {
                Ok(parse_str_as("listen 1;\n"))
            }
        })
        .unwrap();

        assert_eq!(configs.len(), 1, "only the successfully parsed match is kept");
    }
}
