//! Process-wide, read-only lookup tables for the parser.
//!
//! Per the design note about global mutable configuration tables: these are
//! immutable and initialized once, with per-parser overlays (`extra_directives`
//! in [`crate::config::ParserOptions`]) layered on top rather than mutating
//! them.

use std::collections::HashSet;
use std::sync::LazyLock;

/// nginx's standard directive names across core, http, stream, and mail
/// modules, plus the handful of third-party directives (`lua_*`,
/// `*_by_lua_block`) common enough to ship known by default.
pub static KNOWN_DIRECTIVES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // core / main
        "user", "worker_processes", "worker_rlimit_nofile", "worker_cpu_affinity", "pid",
        "error_log", "daemon", "master_process", "include", "env", "load_module",
        "thread_pool", "timer_resolution",
        // events
        "events", "worker_connections", "multi_accept", "use", "accept_mutex",
        // http / server / location
        "http", "server", "location", "listen", "server_name", "root", "alias", "index",
        "autoindex", "access_log", "log_format", "error_page", "return", "rewrite",
        "rewrite_log", "try_files", "internal", "default_type", "types", "charset",
        "gzip", "gzip_types", "gzip_vary", "gzip_min_length", "gzip_comp_level",
        "client_max_body_size", "client_body_timeout", "keepalive_timeout",
        "keepalive_requests", "sendfile", "tcp_nopush", "tcp_nodelay",
        "server_tokens", "resolver", "resolver_timeout", "merge_slashes",
        "add_header", "expires", "if", "set",
        // ssl
        "ssl_certificate", "ssl_certificate_key", "ssl_trusted_certificate",
        "ssl_protocols", "ssl_ciphers", "ssl_session_cache", "ssl_session_timeout",
        "ssl_prefer_server_ciphers", "ssl_dhparam", "ssl_verify_client",
        "ssl_client_certificate",
        // proxy / fastcgi
        "proxy_pass", "proxy_set_header", "proxy_redirect", "proxy_connect_timeout",
        "proxy_read_timeout", "proxy_send_timeout", "proxy_buffering",
        "proxy_cache", "proxy_cache_path", "proxy_cache_valid", "proxy_cache_key",
        "proxy_ssl_verify", "proxy_http_version",
        "fastcgi_pass", "fastcgi_param", "fastcgi_cache", "fastcgi_cache_path",
        "fastcgi_cache_valid", "fastcgi_cache_key", "fastcgi_index",
        // auth
        "auth_basic", "auth_basic_user_file", "auth_request",
        // limits
        "limit_req", "limit_req_zone", "limit_conn", "limit_conn_zone",
        "limit_rate", "limit_except",
        // upstream
        "upstream", "keepalive", "least_conn", "ip_hash", "hash", "zone",
        // map / geo / split_clients
        "map", "geo", "split_clients", "map_hash_bucket_size", "geo_range",
        // stream
        "stream", "proxy_timeout", "preread_buffer_size",
        // mail
        "mail", "smtp_auth", "pop3_capabilities", "imap_capabilities",
        // lua (openresty)
        "lua_shared_dict", "lua_code_cache", "lua_package_path",
        "access_by_lua_block", "content_by_lua_block", "rewrite_by_lua_block",
        "log_by_lua_block", "header_filter_by_lua_block", "body_filter_by_lua_block",
        "init_by_lua_block", "init_worker_by_lua_block", "balancer_by_lua_block",
        "ssl_certificate_by_lua_block",
    ]
    .into_iter()
    .collect()
});
