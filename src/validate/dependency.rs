//! Cross-directive dependency validation: directives that only make sense in
//! the presence of another directive somewhere in a compatible scope, plus a
//! handful of structural special cases that don't fit the generic rule shape.

use super::{Category, Issue, Level, Visit};
use crate::ast::Node;
use std::collections::HashMap;
use std::sync::LazyLock;

struct Rule {
    directive: &'static str,
    requires: &'static [&'static str],
    title: &'static str,
    fix_hint: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        directive: "ssl_certificate",
        requires: &["ssl_certificate_key"],
        title: "ssl_certificate without ssl_certificate_key",
        fix_hint: "add a matching ssl_certificate_key directive",
    },
    Rule {
        directive: "ssl_certificate_key",
        requires: &["ssl_certificate"],
        title: "ssl_certificate_key without ssl_certificate",
        fix_hint: "add a matching ssl_certificate directive",
    },
    Rule {
        directive: "ssl_trusted_certificate",
        requires: &["ssl_certificate", "ssl_certificate_key"],
        title: "ssl_trusted_certificate without a certificate/key pair",
        fix_hint: "add both ssl_certificate and ssl_certificate_key",
    },
    Rule {
        directive: "proxy_cache",
        requires: &["proxy_cache_path"],
        title: "proxy_cache without proxy_cache_path",
        fix_hint: "declare a proxy_cache_path in the http block",
    },
    Rule {
        directive: "proxy_cache_valid",
        requires: &["proxy_cache"],
        title: "proxy_cache_valid without proxy_cache",
        fix_hint: "add a proxy_cache directive in this scope",
    },
    Rule {
        directive: "proxy_cache_key",
        requires: &["proxy_cache"],
        title: "proxy_cache_key without proxy_cache",
        fix_hint: "add a proxy_cache directive in this scope",
    },
    Rule {
        directive: "fastcgi_cache",
        requires: &["fastcgi_cache_path"],
        title: "fastcgi_cache without fastcgi_cache_path",
        fix_hint: "declare a fastcgi_cache_path in the http block",
    },
    Rule {
        directive: "fastcgi_cache_valid",
        requires: &["fastcgi_cache"],
        title: "fastcgi_cache_valid without fastcgi_cache",
        fix_hint: "add a fastcgi_cache directive in this scope",
    },
    Rule {
        directive: "fastcgi_cache_key",
        requires: &["fastcgi_cache"],
        title: "fastcgi_cache_key without fastcgi_cache",
        fix_hint: "add a fastcgi_cache directive in this scope",
    },
    Rule {
        directive: "auth_basic",
        requires: &["auth_basic_user_file"],
        title: "auth_basic without auth_basic_user_file",
        fix_hint: "add an auth_basic_user_file directive",
    },
    Rule {
        directive: "limit_req",
        requires: &["limit_req_zone"],
        title: "limit_req without limit_req_zone",
        fix_hint: "declare a limit_req_zone in the http block",
    },
    Rule {
        directive: "limit_conn",
        requires: &["limit_conn_zone"],
        title: "limit_conn without limit_conn_zone",
        fix_hint: "declare a limit_conn_zone in the http block",
    },
    Rule {
        directive: "gzip_types",
        requires: &["gzip"],
        title: "gzip_types without gzip",
        fix_hint: "add 'gzip on;' in this scope",
    },
    Rule {
        directive: "gzip_vary",
        requires: &["gzip"],
        title: "gzip_vary without gzip",
        fix_hint: "add 'gzip on;' in this scope",
    },
    Rule {
        directive: "rewrite_log",
        requires: &["rewrite"],
        title: "rewrite_log without any rewrite",
        fix_hint: "add a rewrite directive, or drop rewrite_log",
    },
];

/// Context ancestry chains (self-inclusive, innermost first) per the
/// `location ⊆ server ⊆ http ⊆ main` style relation.
static ANCESTORS: LazyLock<HashMap<&'static str, &'static [&'static str]>> = LazyLock::new(|| {
    [
        ("main", &["main"][..]),
        ("events", &["events", "main"]),
        ("http", &["http", "main"]),
        ("stream", &["stream", "main"]),
        ("mail", &["mail", "main"]),
        ("server", &["server", "http", "main"]),
        ("location", &["location", "server", "http", "main"]),
        ("if", &["if", "location", "server", "http", "main"]),
        ("upstream", &["upstream", "http", "main"]),
        ("stream_server", &["stream_server", "stream", "main"]),
        ("stream_upstream", &["stream_upstream", "stream", "main"]),
    ]
    .into_iter()
    .collect()
});

fn context_compatible(dependency_ctx: &str, directive_ctx: &str) -> bool {
    ANCESTORS
        .get(directive_ctx)
        .is_some_and(|chain| chain.contains(&dependency_ctx))
}

pub(super) fn check(visits: &[Visit]) -> Vec<Issue> {
    let mut issues = Vec::new();

    let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, visit) in visits.iter().enumerate() {
        by_name.entry(visit.node.name()).or_default().push(i);
    }

    for rule in RULES {
        let Some(instances) = by_name.get(rule.directive) else {
            continue;
        };
        for &i in instances {
            let visit = &visits[i];
            for &dep in rule.requires {
                let satisfied = by_name.get(dep).is_some_and(|deps| {
                    deps.iter()
                        .any(|&j| context_compatible(visits[j].context, visit.context))
                });
                if !satisfied {
                    issues.push(
                        Issue::new(
                            Level::Error,
                            Category::Dependency,
                            rule.title,
                            format!(
                                "'{}' at line {} has no compatible '{dep}' in scope",
                                rule.directive,
                                visit.node.line()
                            ),
                            visit.node.line(),
                            rule.directive,
                            visit.context,
                        )
                        .with_fix_hint(rule.fix_hint),
                    );
                }
            }
        }
    }

    check_upstream_references(visits, &by_name, &mut issues);
    check_server_has_listen(visits, &mut issues);
    check_upstream_has_servers(visits, &mut issues);
    check_autoindex_vs_index(visits, &mut issues);

    issues
}

fn upstream_names(visits: &[Visit]) -> std::collections::HashSet<String> {
    visits
        .iter()
        .filter_map(|v| match v.node {
            Node::Upstream(u) => Some(u.name().to_string()),
            Node::StreamUpstream(u) => Some(u.name().to_string()),
            _ => None,
        })
        .collect()
}

fn check_upstream_references(
    visits: &[Visit],
    by_name: &HashMap<&str, Vec<usize>>,
    issues: &mut Vec<Issue>,
) {
    let Some(proxy_passes) = by_name.get("proxy_pass") else {
        return;
    };
    let upstreams = upstream_names(visits);
    for &i in proxy_passes {
        let visit = &visits[i];
        let Some(target) = visit.node.parameters().first().map(|p| p.value.as_str()) else {
            continue;
        };
        if target.contains("://") || target.contains("unix:") {
            continue;
        }
        let name = target.split('/').next().unwrap_or(target);
        if !upstreams.contains(name) {
            issues.push(
                Issue::new(
                    Level::Error,
                    Category::Dependency,
                    "proxy_pass references an undefined upstream",
                    format!("proxy_pass at line {} targets unknown upstream '{name}'", visit.node.line()),
                    visit.node.line(),
                    "proxy_pass",
                    visit.context,
                )
                .with_fix_hint(format!("declare 'upstream {name} {{ ... }}'")),
            );
        }
    }
}

fn check_server_has_listen(visits: &[Visit], issues: &mut Vec<Issue>) {
    for (i, visit) in visits.iter().enumerate() {
        if !matches!(visit.node, Node::Server(_) | Node::StreamServer(_)) {
            continue;
        }
        let has_listen = visits
            .iter()
            .any(|v| v.parent == Some(i) && v.node.name() == "listen");
        if !has_listen {
            issues.push(
                Issue::new(
                    Level::Warning,
                    Category::Dependency,
                    "server block has no listen directive",
                    format!("server block at line {} declares no listen directive", visit.node.line()),
                    visit.node.line(),
                    "server",
                    visit.context,
                )
                .with_fix_hint("add a listen directive"),
            );
        }
    }
}

fn check_upstream_has_servers(visits: &[Visit], issues: &mut Vec<Issue>) {
    for (i, visit) in visits.iter().enumerate() {
        if !matches!(visit.node, Node::Upstream(_) | Node::StreamUpstream(_)) {
            continue;
        }
        let has_server = visits.iter().any(|v| {
            v.parent == Some(i)
                && matches!(v.node, Node::UpstreamServer(_) | Node::StreamUpstreamServer(_))
        });
        if !has_server {
            issues.push(Issue::new(
                Level::Error,
                Category::Dependency,
                "upstream block has no server directive",
                format!("upstream block at line {} declares no server", visit.node.line()),
                visit.node.line(),
                "upstream",
                visit.context,
            ));
        }
    }
}

fn check_autoindex_vs_index(visits: &[Visit], issues: &mut Vec<Issue>) {
    for visit in visits {
        if visit.node.name() != "autoindex" {
            continue;
        }
        let is_on = visit
            .node
            .parameters()
            .first()
            .is_some_and(|p| p.value == "on");
        if !is_on {
            continue;
        }
        let conflicting_index = visits
            .iter()
            .find(|v| v.parent == visit.parent && v.node.name() == "index");
        if let Some(index_visit) = conflicting_index {
            issues.push(Issue::new(
                Level::Warning,
                Category::Dependency,
                "autoindex on conflicts with index",
                format!(
                    "'autoindex on' at line {} and 'index' at line {} are both set in the same context",
                    visit.node.line(),
                    index_visit.node.line()
                ),
                visit.node.line(),
                "autoindex",
                visit.context,
            ));
        }
    }
}
