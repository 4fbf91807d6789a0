//! Query API (C9): read-only search over a parsed [`Config`], descending
//! through blocks and transparently through `Include` nodes so callers never
//! need to know which physical file a directive came from.

use crate::ast::{Config, Node, NodeId};

/// Every node reachable from `config`'s root, paired with the `Config` whose
/// arena actually owns it — an `Include`'s resolved files have their own
/// arenas, so a bare `NodeId` isn't enough to look a node's children back up.
fn collect_all(config: &Config) -> Vec<(&Config, &Node)> {
    let mut out = Vec::new();
    collect_children(config, &config.root.children, &mut out);
    out
}

fn collect_children<'a>(config: &'a Config, ids: &[NodeId], out: &mut Vec<(&'a Config, &'a Node)>) {
    for &id in ids {
        let Some(node) = config.get(id) else {
            continue;
        };
        out.push((config, node));
        match node {
            Node::Include(include) => {
                for nested in &include.configs {
                    collect_children(nested, &nested.root.children, out);
                }
            }
            _ => {
                if let Some(block) = node.block() {
                    collect_children(config, &block.children, out);
                }
            }
        }
    }
}

fn children_of<'a>(owner: &'a Config, node: &Node) -> Vec<&'a Node> {
    match node.block() {
        Some(block) => block.children.iter().filter_map(|&id| owner.get(id)).collect(),
        None => Vec::new(),
    }
}

/// Every directive instance named `name`, anywhere in the tree (including
/// resolved includes).
pub fn find_directives<'a>(config: &'a Config, name: &str) -> Vec<&'a Node> {
    collect_all(config)
        .into_iter()
        .filter(|(_, n)| n.name() == name)
        .map(|(_, n)| n)
        .collect()
}

/// Server blocks (http or stream) whose `server_name` directive lists
/// `server_name` among its parameters.
pub fn find_servers_by_name<'a>(config: &'a Config, server_name: &str) -> Vec<&'a Node> {
    collect_all(config)
        .into_iter()
        .filter(|(owner, node)| {
            matches!(node, Node::Server(_) | Node::StreamServer(_))
                && children_of(owner, node).iter().any(|child| {
                    child.name() == "server_name"
                        && child.parameters().iter().any(|p| p.value == server_name)
                })
        })
        .map(|(_, n)| n)
        .collect()
}

pub fn find_upstream_by_name<'a>(config: &'a Config, name: &str) -> Option<&'a Node> {
    collect_all(config).into_iter().map(|(_, n)| n).find(|n| match n {
        Node::Upstream(u) => u.name() == name,
        _ => false,
    })
}

pub fn find_stream_upstream_by_name<'a>(config: &'a Config, name: &str) -> Option<&'a Node> {
    collect_all(config).into_iter().map(|(_, n)| n).find(|n| match n {
        Node::StreamUpstream(u) => u.name() == name,
        _ => false,
    })
}

/// Locations whose resolved match pattern (modifier stripped) equals
/// `pattern` exactly.
pub fn find_locations_by_pattern<'a>(config: &'a Config, pattern: &str) -> Vec<&'a Node> {
    collect_all(config)
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| matches!(n, Node::Location(l) if l.pattern == pattern))
        .collect()
}

pub fn get_all_ssl_certificates(config: &Config) -> Vec<String> {
    find_directives(config, "ssl_certificate")
        .into_iter()
        .filter_map(|n| n.parameters().first().map(|p| p.value.clone()))
        .collect()
}

pub fn get_all_upstream_servers<'a>(config: &'a Config) -> Vec<&'a Node> {
    collect_all(config)
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| matches!(n, Node::UpstreamServer(_)))
        .collect()
}

pub fn get_all_stream_upstream_servers<'a>(config: &'a Config) -> Vec<&'a Node> {
    collect_all(config)
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| matches!(n, Node::StreamUpstreamServer(_)))
        .collect()
}

pub fn find_maps<'a>(config: &'a Config) -> Vec<&'a Node> {
    collect_all(config).into_iter().map(|(_, n)| n).filter(|n| matches!(n, Node::Map(_))).collect()
}

pub fn find_geos<'a>(config: &'a Config) -> Vec<&'a Node> {
    collect_all(config).into_iter().map(|(_, n)| n).filter(|n| matches!(n, Node::Geo(_))).collect()
}

pub fn find_split_clients<'a>(config: &'a Config) -> Vec<&'a Node> {
    collect_all(config)
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| matches!(n, Node::SplitClients(_)))
        .collect()
}

pub fn find_limit_req_zones<'a>(config: &'a Config) -> Vec<&'a Node> {
    collect_all(config)
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| matches!(n, Node::LimitReqZone(_)))
        .collect()
}

pub fn find_limit_req_zone_by_name<'a>(config: &'a Config, name: &str) -> Option<&'a Node> {
    collect_all(config).into_iter().map(|(_, n)| n).find(|n| match n {
        Node::LimitReqZone(d) => d.zone_name == name,
        _ => false,
    })
}

pub fn find_limit_conn_zones<'a>(config: &'a Config) -> Vec<&'a Node> {
    collect_all(config)
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| matches!(n, Node::LimitConnZone(_)))
        .collect()
}

pub fn find_limit_conn_zone_by_name<'a>(config: &'a Config, name: &str) -> Option<&'a Node> {
    collect_all(config).into_iter().map(|(_, n)| n).find(|n| match n {
        Node::LimitConnZone(d) => d.zone_name == name,
        _ => false,
    })
}

pub fn find_proxy_cache_paths<'a>(config: &'a Config) -> Vec<&'a Node> {
    collect_all(config)
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| matches!(n, Node::ProxyCachePath(_)))
        .collect()
}

pub fn find_proxy_cache_path_by_zone<'a>(config: &'a Config, zone_name: &str) -> Option<&'a Node> {
    collect_all(config).into_iter().map(|(_, n)| n).find(|n| match n {
        Node::ProxyCachePath(d) => d.keys_zone_name == zone_name,
        _ => false,
    })
}
