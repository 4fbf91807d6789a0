//! Cross-component scenarios and testable properties from the configuration
//! pipeline's design: basic round-trip, context-aware upstream/server
//! dispatch, specialized-directive field parsing, and validator findings.

use nginx_config::ast::Node;
use nginx_config::config::ParserOptions;
use nginx_config::emit::{Style, emit};
use nginx_config::parser::parse_str;
use nginx_config::query::{find_directives, find_servers_by_name};
use nginx_config::validate::{Category, validate};

fn parse(source: &str) -> nginx_config::ast::Config {
    parse_str(source, ParserOptions::new()).unwrap()
}

/// Scenario 1 — basic round-trip.
#[test]
fn basic_round_trip() {
    let source =
        "events { worker_connections 1024; } http { server { listen 80; server_name example.com; } }";
    let config = parse(source);

    let text = emit(&config, &Style::INDENTED);
    let reparsed = parse(&text);
    assert_eq!(reparsed.root.children.len(), config.root.children.len());

    let servers = find_servers_by_name(&config, "example.com");
    assert_eq!(servers.len(), 1);

    let listens = find_directives(&config, "listen");
    assert_eq!(listens[0].parameters()[0].value, "80");
}

/// Scenario 2 — context-aware upstream/server dispatch inside `stream`.
#[test]
fn context_aware_upstream_and_server() {
    let config = parse(
        "stream { upstream be { server 10.0.0.1:5432; } server { listen 5432; proxy_pass be; } }",
    );
    let stream_id = config.root.children[0];
    let children = &config.get(stream_id).unwrap().block().unwrap().children;

    let upstream = config.get(children[0]).unwrap();
    let server = config.get(children[1]).unwrap();
    assert!(matches!(upstream, Node::StreamUpstream(_)));
    assert!(matches!(server, Node::StreamServer(_)));

    let upstream_member = config.get(upstream.block().unwrap().children[0]).unwrap();
    assert!(matches!(upstream_member, Node::StreamUpstreamServer(_)));
}

/// Scenario 3 — limit_req_zone typed fields and derived accessors.
#[test]
fn limit_req_zone_fields() {
    let config = parse("http { limit_req_zone $binary_remote_addr zone=one:10m rate=1r/s; }");
    let http_id = config.root.children[0];
    let zone = config.get(config.get(http_id).unwrap().block().unwrap().children[0]).unwrap();
    let Node::LimitReqZone(zone) = zone else {
        panic!("expected LimitReqZone");
    };
    assert_eq!(zone.key, "$binary_remote_addr");
    assert_eq!(zone.zone_name, "one");
    assert_eq!(zone.zone_size, "10m");
    assert_eq!(zone.rate, "1r/s");
    assert!(!zone.sync);
    assert_eq!(zone.zone_size_bytes(), Some(10 * 1024 * 1024));
    assert_eq!(zone.rate_number(), Some(1.0));
    assert_eq!(zone.rate_unit(), Some('s'));
}

/// Scenario 4 — split_clients overflow fails with the verbatim error text.
#[test]
fn split_clients_overflow_error_text() {
    let err = parse_str(
        "http { split_clients $x $y { 50% a; 60% b; * c; } }",
        ParserOptions::new(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "total percentage cannot exceed 100%");
}

/// Scenario 5 — a certificate without its key is a Dependency issue.
#[test]
fn missing_ssl_certificate_key_is_flagged() {
    let config = parse("http { server { listen 443 ssl; ssl_certificate /c.pem; } }");
    let report = validate(&config);
    let found = report
        .by_category(Category::Dependency)
        .any(|issue| issue.directive == "ssl_certificate" && issue.description.contains("ssl_certificate_key"));
    assert!(found);
}

/// Scenario 6 — proxy_pass directly under http is a Context error.
#[test]
fn proxy_pass_in_http_is_wrong_context() {
    let config = parse("http { proxy_pass http://x; }");
    let report = validate(&config);
    let issue = report
        .by_category(Category::Context)
        .find(|issue| issue.directive == "proxy_pass")
        .expect("expected a Context issue for proxy_pass");
    assert!(issue.description.contains("location"));
}

/// P3 — line numbers are non-decreasing across a depth-first traversal.
#[test]
fn line_numbers_are_monotonic_in_source_order() {
    fn walk(config: &nginx_config::ast::Config, ids: &[nginx_config::ast::NodeId], last: &mut usize) {
        for &id in ids {
            let node = config.get(id).unwrap();
            assert!(node.line() >= *last, "line went backwards at {}", node.line());
            *last = node.line();
            if let Some(block) = node.block() {
                walk(config, &block.children, last);
            }
        }
    }

    let config = parse(
        "http {\n    server {\n        listen 80;\n        server_name a.com;\n    }\n    server {\n        listen 81;\n    }\n}",
    );
    let mut last = 0;
    walk(&config, &config.root.children, &mut last);
}

/// P7 — dependency ancestry: `location` satisfies an `http`-scoped
/// requirement, but `http` does not satisfy a requirement scoped to
/// `stream`.
#[test]
fn dependency_context_compatibility_is_not_symmetric_across_http_and_stream() {
    // proxy_cache_path declared in http, proxy_cache used in a nested
    // location: compatible, no Dependency issue.
    let config = parse(
        "http { proxy_cache_path /tmp keys_zone=z:10m; server { location / { proxy_cache z; } } }",
    );
    let report = validate(&config);
    assert!(!report.by_category(Category::Dependency).any(|i| i.directive == "proxy_cache"));

    // limit_req_zone declared in http does not help a limit_req that's
    // unreachable from stream's context chain (stream has no http ancestor).
    let config = parse("stream { server { limit_req zone=z; } }");
    let report = validate(&config);
    // limit_req isn't even a legal stream directive, but the point here is
    // that no amount of http-side declarations bleeds into stream's chain;
    // there is no limit_req_zone anywhere in this config, so the
    // dependency is unsatisfied regardless of context.
    assert!(report.by_category(Category::Dependency).any(|i| i.directive == "limit_req"));
}
