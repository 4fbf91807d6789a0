//! Include resolver properties exercised against real files on disk: glob
//! transparency for queries (P8) and self-include cycle safety (P9).

use nginx_config::ast::Node;
use nginx_config::config::ParserOptions;
use nginx_config::parser::parse_file;
use nginx_config::query::find_directives;

/// P8 — `find_directives` on a tree with includes returns the union of
/// matches in the parent and every resolved child.
#[test]
fn find_directives_sees_through_includes() {
    let dir = tempfile::tempdir().unwrap();

    std::fs::write(dir.path().join("upstream.conf"), "listen 8080;\n").unwrap();
    std::fs::write(dir.path().join("main.conf"), "listen 80;\ninclude upstream.conf;\n").unwrap();

    let config = parse_file(&dir.path().join("main.conf"), ParserOptions::new()).unwrap();
    let listens = find_directives(&config, "listen");
    assert_eq!(listens.len(), 2);
    let values: Vec<&str> = listens.iter().map(|n| n.parameters()[0].value.as_str()).collect();
    assert!(values.contains(&"80"));
    assert!(values.contains(&"8080"));
}

/// P9 — a file that includes itself parses without infinite recursion: the
/// first inclusion resolves normally, and the cycle is only cut one level
/// further down, where the same path is already `Visiting`.
#[test]
fn self_include_cycle_is_resolved_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.conf");
    std::fs::write(&path, "listen 80;\ninclude a.conf;\n").unwrap();

    let config = parse_file(&path, ParserOptions::new()).unwrap();

    fn include_node(config: &nginx_config::ast::Config) -> &nginx_config::ast::IncludeDirective {
        config
            .root
            .children
            .iter()
            .map(|&id| config.get(id).unwrap())
            .find_map(|n| match n {
                Node::Include(include) => Some(include),
                _ => None,
            })
            .expect("expected an Include node")
    }

    let outer = include_node(&config);
    assert_eq!(outer.configs.len(), 1, "the first self-inclusion resolves once");

    let inner = include_node(&outer.configs[0]);
    assert!(
        inner.configs.is_empty(),
        "the cycle is cut one level down rather than recursing forever"
    );
}

/// Glob expansion matches multiple files in deterministic, sorted order.
#[test]
fn glob_include_matches_are_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let conf_d = dir.path().join("conf.d");
    std::fs::create_dir(&conf_d).unwrap();
    std::fs::write(conf_d.join("10-b.conf"), "listen 2;\n").unwrap();
    std::fs::write(conf_d.join("05-a.conf"), "listen 1;\n").unwrap();
    std::fs::write(dir.path().join("main.conf"), "include conf.d/*.conf;\n").unwrap();

    let config = parse_file(&dir.path().join("main.conf"), ParserOptions::new()).unwrap();
    let include_node = config
        .root
        .children
        .iter()
        .map(|&id| config.get(id).unwrap())
        .find_map(|n| match n {
            Node::Include(include) => Some(include),
            _ => None,
        })
        .unwrap();

    let first_listen_values: Vec<String> = include_node
        .configs
        .iter()
        .map(|cfg| {
            let id = cfg.root.children[0];
            cfg.get(id).unwrap().parameters()[0].value.clone()
        })
        .collect();
    assert_eq!(first_listen_values, vec!["1".to_string(), "2".to_string()]);
}

/// A strict include pattern that matches nothing is an error rather than a
/// silent no-op.
#[test]
fn strict_include_with_no_matches_errors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.conf"), "include missing-*.conf;\n").unwrap();

    let options = ParserOptions {
        strict_include: true,
        ..ParserOptions::new()
    };
    let err = parse_file(&dir.path().join("main.conf"), options).unwrap_err();
    assert!(matches!(err, nginx_config::error::IncludeError::Parse { .. }));
}
