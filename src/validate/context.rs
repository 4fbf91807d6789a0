//! Directive-context legality: a static table of which contexts each known
//! directive may appear in, checked against the context every directive was
//! actually found in during traversal.

use super::{Category, Issue, Level, Visit};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Contexts each listed directive is legal in. Directives absent from this
/// table are unrestricted (usually because the directive is legal
/// everywhere, or because it's third-party/unknown and the parser already
/// decided whether to accept it).
static ALLOWED_CONTEXTS: LazyLock<HashMap<&'static str, &'static [&'static str]>> =
    LazyLock::new(|| {
        [
            ("user", &["main"][..]),
            ("worker_processes", &["main"]),
            ("worker_rlimit_nofile", &["main"]),
            ("worker_cpu_affinity", &["main"]),
            ("pid", &["main"]),
            ("daemon", &["main"]),
            ("master_process", &["main"]),
            ("env", &["main"]),
            ("load_module", &["main"]),
            ("thread_pool", &["main"]),
            ("timer_resolution", &["main"]),
            ("events", &["main"]),
            ("worker_connections", &["events"]),
            ("multi_accept", &["events"]),
            ("use", &["events"]),
            ("accept_mutex", &["events"]),
            ("http", &["main"]),
            ("stream", &["main"]),
            ("mail", &["main"]),
            (
                "server",
                &["http", "stream", "mail", "upstream", "stream_upstream"],
            ),
            ("location", &["server", "location"]),
            ("listen", &["server", "stream_server", "mail"]),
            ("server_name", &["server", "mail"]),
            ("root", &["http", "server", "location"]),
            ("alias", &["location"]),
            ("index", &["http", "server", "location"]),
            ("autoindex", &["http", "server", "location"]),
            ("error_page", &["http", "server", "location"]),
            ("return", &["server", "location", "if"]),
            ("rewrite", &["server", "location", "if"]),
            ("rewrite_log", &["http", "server", "location"]),
            ("try_files", &["server", "location"]),
            ("internal", &["location"]),
            ("if", &["server", "location"]),
            ("limit_except", &["location"]),
            ("types", &["http", "server", "location"]),
            ("map", &["http", "stream"]),
            ("geo", &["http", "stream"]),
            ("split_clients", &["http", "stream"]),
            ("map_hash_bucket_size", &["http"]),
            ("upstream", &["http", "stream"]),
            ("keepalive", &["upstream"]),
            ("least_conn", &["upstream"]),
            ("ip_hash", &["upstream"]),
            ("hash", &["upstream"]),
            ("proxy_pass", &["location", "if"]),
            ("fastcgi_pass", &["location"]),
            ("proxy_cache_path", &["http"]),
            ("fastcgi_cache_path", &["http"]),
            ("limit_req_zone", &["http"]),
            ("limit_conn_zone", &["http"]),
            ("auth_basic", &["http", "server", "location"]),
            ("auth_basic_user_file", &["http", "server", "location"]),
            ("smtp_auth", &["mail", "server"]),
            ("pop3_capabilities", &["mail", "server"]),
            ("imap_capabilities", &["mail", "server"]),
            ("init_by_lua_block", &["main"]),
            ("init_worker_by_lua_block", &["main"]),
            ("balancer_by_lua_block", &["upstream"]),
            ("preread_buffer_size", &["stream", "stream_server"]),
            ("proxy_timeout", &["stream", "stream_server"]),
        ]
        .into_iter()
        .collect()
    });

pub(super) fn check(visits: &[Visit]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for visit in visits {
        let name = visit.node.name();
        let Some(&allowed) = ALLOWED_CONTEXTS.get(name) else {
            continue;
        };
        if allowed.contains(&visit.context) {
            continue;
        }
        issues.push(
            Issue::new(
                Level::Error,
                Category::Context,
                format!("'{name}' is not allowed in this context"),
                format!(
                    "'{name}' appeared in '{}' context; valid contexts are: {}",
                    visit.context,
                    allowed.join(", ")
                ),
                visit.node.line(),
                name,
                visit.context,
            )
            .with_fix_hint(format!(
                "move '{name}' into one of: {}",
                allowed.join(", ")
            )),
        );
    }
    issues
}
