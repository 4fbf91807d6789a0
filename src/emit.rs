//! Emitter (C7): renders a document tree back to nginx configuration text.
//!
//! Emission is the inverse of parsing: for any configuration the parser
//! accepts, `parse(emit(parse(s)))` is structurally equivalent to `parse(s)`
//! (same directive order, parameter values, comment placement, and
//! specialized fields) — see the round-trip property in the document model.

use crate::ast::{Block, Config, Node, NodeId};
use std::fmt::Write as _;

/// Controls indentation and block-sibling ordering during emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub start_indent: usize,
    pub indent: usize,
    pub space_before_blocks: bool,
    pub sort_directives: bool,
}

impl Style {
    /// `start_indent = 0`, `indent = 0`, no space before `{`, insertion order.
    pub const NO_INDENT: Style = Style {
        start_indent: 0,
        indent: 0,
        space_before_blocks: false,
        sort_directives: false,
    };

    /// `start_indent = 0`, `indent = 4`, space before `{`, insertion order.
    pub const INDENTED: Style = Style {
        start_indent: 0,
        indent: 4,
        space_before_blocks: true,
        sort_directives: false,
    };
}

/// Render `config`'s top-level block as nginx configuration text.
pub fn emit(config: &Config, style: &Style) -> String {
    let mut out = String::new();
    emit_children(config, &config.root.children, style, style.start_indent, &mut out);
    out
}

/// Render a single node (and, recursively, its block) as text at the given
/// indent depth. Exposed so callers can emit a subtree in isolation.
pub fn emit_node(config: &Config, id: NodeId, style: &Style, indent: usize, out: &mut String) {
    let Some(node) = config.get(id) else {
        return;
    };

    for comment in node.outline_comments() {
        write_indent(out, indent);
        out.push_str(comment);
        out.push('\n');
    }

    write_indent(out, indent);
    out.push_str(node.name());
    for param in emit_parameters(node) {
        out.push(' ');
        out.push_str(&param);
    }

    match node.block() {
        Some(block) if block.is_lua_block => {
            out.push(' ');
            out.push('{');
            out.push(' ');
            out.push_str(block.literal_code.as_deref().unwrap_or_default());
            out.push_str(" }");
        }
        Some(block) => {
            if style.space_before_blocks {
                out.push(' ');
            }
            out.push('{');
            out.push('\n');
            emit_children(config, &block.children, style, indent + style.indent, out);
            write_indent(out, indent);
            out.push('}');
        }
        None => {
            out.push(';');
        }
    }

    if let Some(comment) = node.inline_comment() {
        out.push(' ');
        out.push_str(comment);
    }
    out.push('\n');
}

fn emit_children(config: &Config, ids: &[NodeId], style: &Style, indent: usize, out: &mut String) {
    let mut order: Vec<NodeId> = ids.to_vec();
    if style.sort_directives {
        order.sort_by(|a, b| {
            let na = config.get(*a).map(Node::name).unwrap_or_default();
            let nb = config.get(*b).map(Node::name).unwrap_or_default();
            na.cmp(nb)
        });
    }
    for id in order {
        emit_node(config, id, style, indent, out);
    }
}

fn write_indent(out: &mut String, indent: usize) {
    let _ = write!(out, "{:indent$}", "", indent = indent);
}

/// The canonical parameter text for a node: most variants just replay their
/// stored parameters, but a handful of specialized variants (those that
/// parsed `key=value` sub-parameters into typed fields) reconstruct the
/// canonical form from those fields instead, so mutation through the typed
/// API round-trips correctly.
fn emit_parameters(node: &Node) -> Vec<String> {
    match node {
        Node::LimitReqZone(d) => vec![
            d.key.clone(),
            format!("zone={}:{}", d.zone_name, d.zone_size),
            format!("rate={}", d.rate),
        ]
        .into_iter()
        .chain(d.sync.then(|| "sync".to_string()))
        .collect(),
        Node::LimitConnZone(d) => vec![d.key.clone(), format!("zone={}:{}", d.zone_name, d.zone_size)]
            .into_iter()
            .chain(d.sync.then(|| "sync".to_string()))
            .collect(),
        Node::ProxyCachePath(d) => {
            let mut params = vec![d.path.clone()];
            if !d.levels.is_empty() {
                let levels = d
                    .levels
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>()
                    .join(":");
                params.push(format!("levels={levels}"));
            }
            params.push(format!("keys_zone={}:{}", d.keys_zone_name, d.keys_zone_size));
            macro_rules! opt {
                ($field:ident) => {
                    if let Some(v) = &d.$field {
                        params.push(format!("{}={v}", stringify!($field)));
                    }
                };
            }
            opt!(inactive);
            opt!(max_size);
            opt!(min_free);
            opt!(use_temp_path);
            opt!(manager_files);
            opt!(manager_sleep);
            opt!(manager_threshold);
            opt!(loader_files);
            opt!(loader_sleep);
            opt!(loader_threshold);
            opt!(purger);
            opt!(purger_files);
            opt!(purger_sleep);
            opt!(purger_threshold);
            params
        }
        Node::UpstreamServer(d) => emit_address_params(&d.address, &d.params, &d.flags),
        Node::StreamUpstreamServer(d) => emit_address_params(&d.address, &d.params, &d.flags),
        _ => node.parameters().iter().map(|p| p.value.clone()).collect(),
    }
}

fn emit_address_params(address: &str, params: &[(String, String)], flags: &[String]) -> Vec<String> {
    let mut out = vec![address.to_string()];
    for (k, v) in params {
        out.push(format!("{k}={v}"));
    }
    out.extend(flags.iter().cloned());
    out
}

/// A `Block`'s child directives as standalone emitted text, for callers that
/// want a fragment rather than a whole `Config`.
pub fn emit_block(config: &Config, block: &Block, style: &Style, indent: usize) -> String {
    let mut out = String::new();
    emit_children(config, &block.children, style, indent, &mut out);
    out
}
