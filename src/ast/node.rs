//! The directive tree's tagged sum and the specialized constructors that
//! build each variant from a generically-parsed directive (name, parameters,
//! optional block).

use super::{Block, DirectiveCommon, NodeId, arena::Arena};
use crate::error::{ParseError, ParseResult};
use crate::param::{ParamKind, Parameter};
use crate::token::Position;
use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

/// The document tree's tagged sum. Every variant wraps a [`DirectiveCommon`]
/// plus whatever typed sub-structure its shape demands.
#[derive(Debug, Clone)]
pub enum Node {
    Generic(GenericDirective),
    Include(IncludeDirective),
    Http(HttpDirective),
    Server(ServerDirective),
    Location(LocationDirective),
    Upstream(UpstreamDirective),
    UpstreamServer(UpstreamServerDirective),
    Stream(StreamDirective),
    StreamUpstream(StreamUpstreamDirective),
    StreamServer(StreamServerDirective),
    StreamUpstreamServer(StreamUpstreamServerDirective),
    Map(MapDirective),
    Geo(GeoDirective),
    SplitClients(SplitClientsDirective),
    LimitReqZone(LimitReqZoneDirective),
    LimitConnZone(LimitConnZoneDirective),
    ProxyCachePath(ProxyCachePathDirective),
    LuaBlock(LuaBlockDirective),
}

/// Shared accessors available regardless of variant, implemented by
/// pattern-matching on the sum; specialized fields still require matching on
/// the concrete variant.
impl Node {
    pub fn common(&self) -> &DirectiveCommon {
        match self {
            Node::Generic(d) => &d.common,
            Node::Include(d) => &d.common,
            Node::Http(d) => &d.common,
            Node::Server(d) => &d.common,
            Node::Location(d) => &d.common,
            Node::Upstream(d) => &d.common,
            Node::UpstreamServer(d) => &d.common,
            Node::Stream(d) => &d.common,
            Node::StreamUpstream(d) => &d.common,
            Node::StreamServer(d) => &d.common,
            Node::StreamUpstreamServer(d) => &d.common,
            Node::Map(d) => &d.common,
            Node::Geo(d) => &d.common,
            Node::SplitClients(d) => &d.common,
            Node::LimitReqZone(d) => &d.common,
            Node::LimitConnZone(d) => &d.common,
            Node::ProxyCachePath(d) => &d.common,
            Node::LuaBlock(d) => &d.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut DirectiveCommon {
        match self {
            Node::Generic(d) => &mut d.common,
            Node::Include(d) => &mut d.common,
            Node::Http(d) => &mut d.common,
            Node::Server(d) => &mut d.common,
            Node::Location(d) => &mut d.common,
            Node::Upstream(d) => &mut d.common,
            Node::UpstreamServer(d) => &mut d.common,
            Node::Stream(d) => &mut d.common,
            Node::StreamUpstream(d) => &mut d.common,
            Node::StreamServer(d) => &mut d.common,
            Node::StreamUpstreamServer(d) => &mut d.common,
            Node::Map(d) => &mut d.common,
            Node::Geo(d) => &mut d.common,
            Node::SplitClients(d) => &mut d.common,
            Node::LimitReqZone(d) => &mut d.common,
            Node::LimitConnZone(d) => &mut d.common,
            Node::ProxyCachePath(d) => &mut d.common,
            Node::LuaBlock(d) => &mut d.common,
        }
    }

    pub fn name(&self) -> &str {
        &self.common().name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.common().parameters
    }

    pub fn block(&self) -> Option<&Block> {
        self.common().block.as_ref()
    }

    pub fn block_mut(&mut self) -> Option<&mut Block> {
        self.common_mut().block.as_mut()
    }

    pub fn line(&self) -> usize {
        self.common().line
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.common().parent
    }

    pub fn outline_comments(&self) -> &[String] {
        &self.common().outline_comments
    }

    pub fn inline_comment(&self) -> Option<&str> {
        self.common().inline_comment.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct GenericDirective {
    pub common: DirectiveCommon,
}

#[derive(Debug, Clone)]
pub struct IncludeDirective {
    pub common: DirectiveCommon,
    /// Resolved child roots, one per matched and successfully parsed file.
    /// Empty when the pattern matched nothing or every match was swallowed
    /// by `skip_include_parsing_err`.
    pub configs: Vec<super::Config>,
}

impl IncludeDirective {
    pub fn pattern(&self) -> &str {
        self.common
            .parameters
            .first()
            .map(|p| p.value.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct HttpDirective {
    pub common: DirectiveCommon,
}

#[derive(Debug, Clone)]
pub struct ServerDirective {
    pub common: DirectiveCommon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationModifier {
    Exact,
    CaseSensitiveRegex,
    CaseInsensitiveRegex,
    PreferentialPrefix,
}

#[derive(Debug, Clone)]
pub struct LocationDirective {
    pub common: DirectiveCommon,
    pub modifier: Option<LocationModifier>,
    pub pattern: String,
}

#[derive(Debug, Clone)]
pub struct UpstreamDirective {
    pub common: DirectiveCommon,
}

impl UpstreamDirective {
    pub fn name(&self) -> &str {
        self.common
            .parameters
            .first()
            .map(|p| p.value.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamServerDirective {
    pub common: DirectiveCommon,
    pub address: String,
    pub params: Vec<(String, String)>,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StreamDirective {
    pub common: DirectiveCommon,
}

#[derive(Debug, Clone)]
pub struct StreamUpstreamDirective {
    pub common: DirectiveCommon,
}

impl StreamUpstreamDirective {
    pub fn name(&self) -> &str {
        self.common
            .parameters
            .first()
            .map(|p| p.value.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct StreamServerDirective {
    pub common: DirectiveCommon,
}

#[derive(Debug, Clone)]
pub struct StreamUpstreamServerDirective {
    pub common: DirectiveCommon,
    pub address: String,
    pub params: Vec<(String, String)>,
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapPattern {
    Literal(String),
    Regex(String),
    Default,
}

#[derive(Debug, Clone)]
pub struct MapEntry {
    pub pattern: MapPattern,
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct MapDirective {
    pub common: DirectiveCommon,
    pub source_variable: String,
    pub target_variable: String,
    pub entries: Vec<MapEntry>,
}

#[derive(Debug, Clone)]
pub struct GeoEntry {
    pub network: String,
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct GeoDirective {
    pub common: DirectiveCommon,
    pub source_variable: String,
    pub target_variable: String,
    pub entries: Vec<GeoEntry>,
    pub ranges: bool,
    pub proxy_recursive: bool,
    pub delete: Vec<String>,
    pub proxy: Vec<String>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Percentage {
    Wildcard,
    Percent(f64),
}

#[derive(Debug, Clone)]
pub struct SplitClientsEntry {
    pub percentage: Percentage,
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct SplitClientsDirective {
    pub common: DirectiveCommon,
    pub source_variable: String,
    pub target_variable: String,
    pub entries: Vec<SplitClientsEntry>,
}

#[derive(Debug, Clone)]
pub struct LimitReqZoneDirective {
    pub common: DirectiveCommon,
    pub key: String,
    pub zone_name: String,
    pub zone_size: String,
    pub rate: String,
    pub sync: bool,
}

impl LimitReqZoneDirective {
    pub fn zone_size_bytes(&self) -> Option<u64> {
        parse_size_bytes(&self.zone_size)
    }

    pub fn rate_number(&self) -> Option<f64> {
        rate_parts(&self.rate).map(|(n, _)| n)
    }

    pub fn rate_unit(&self) -> Option<char> {
        rate_parts(&self.rate).map(|(_, u)| u)
    }
}

#[derive(Debug, Clone)]
pub struct LimitConnZoneDirective {
    pub common: DirectiveCommon,
    pub key: String,
    pub zone_name: String,
    pub zone_size: String,
    pub sync: bool,
}

impl LimitConnZoneDirective {
    pub fn zone_size_bytes(&self) -> Option<u64> {
        parse_size_bytes(&self.zone_size)
    }
}

#[derive(Debug, Clone)]
pub struct ProxyCachePathDirective {
    pub common: DirectiveCommon,
    pub path: String,
    pub levels: Vec<u8>,
    pub keys_zone_name: String,
    pub keys_zone_size: String,
    pub inactive: Option<String>,
    pub max_size: Option<String>,
    pub min_free: Option<String>,
    pub use_temp_path: Option<String>,
    pub manager_files: Option<String>,
    pub manager_sleep: Option<String>,
    pub manager_threshold: Option<String>,
    pub loader_files: Option<String>,
    pub loader_sleep: Option<String>,
    pub loader_threshold: Option<String>,
    pub purger: Option<String>,
    pub purger_files: Option<String>,
    pub purger_sleep: Option<String>,
    pub purger_threshold: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LuaBlockDirective {
    pub common: DirectiveCommon,
}

impl LuaBlockDirective {
    pub fn literal_code(&self) -> &str {
        self.common
            .block
            .as_ref()
            .and_then(|b| b.literal_code.as_deref())
            .unwrap_or_default()
    }
}

fn parse_size_bytes(raw: &str) -> Option<u64> {
    let lower = raw.to_ascii_lowercase();
    let (digits, mult): (&str, u64) = if let Some(d) = lower.strip_suffix('k') {
        (d, 1024)
    } else if let Some(d) = lower.strip_suffix('m') {
        (d, 1024 * 1024)
    } else if let Some(d) = lower.strip_suffix('g') {
        (d, 1024 * 1024 * 1024)
    } else {
        (lower.as_str(), 1)
    };
    digits.parse::<u64>().ok().map(|n| n * mult)
}

fn rate_parts(raw: &str) -> Option<(f64, char)> {
    let body = raw.strip_suffix("r/s").or_else(|| raw.strip_suffix("r/m"));
    let unit = if raw.ends_with("r/s") {
        's'
    } else if raw.ends_with("r/m") {
        'm'
    } else {
        return None;
    };
    body?.parse::<f64>().ok().map(|n| (n, unit))
}

static SIZE_ZONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\d+[kmg]?$").unwrap());
static RATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?r/[sm]$").unwrap());
static CACHE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(ms|s|m|h|d)$").unwrap());

fn kv(param: &str) -> Option<(&str, &str)> {
    param.split_once('=')
}

/// Build the variant for a directive from its generically-parsed pieces.
/// `context` is the top of the parser's context stack (the enclosing
/// `stream`/`http`/`events`/`mail`/`upstream`-family directive, or `"main"`
/// at the root). Only `upstream` and `server` actually vary by context, so
/// lookup tries the context-qualified key first and falls back to the bare
/// name for everything else. Returns `None` when nothing matches, in which
/// case the caller falls back to [`GenericDirective`].
pub(crate) fn construct(
    context: &str,
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    arena: &Arena,
    position: Position,
) -> ParseResult<Option<Node>> {
    if name.ends_with("_by_lua_block") {
        return Ok(Some(construct_lua_block(name, parameters, block)));
    }

    let qualified = match (context, name.as_str()) {
        ("stream", "upstream") => Some(construct_stream_upstream(
            name.clone(),
            parameters.clone(),
            block.clone(),
        )),
        ("stream", "server") => Some(construct_stream_server(
            name.clone(),
            parameters.clone(),
            block.clone(),
        )),
        ("stream_upstream", "server") => Some(construct_stream_upstream_server(
            name.clone(),
            parameters.clone(),
            block.clone(),
            position,
        )?),
        ("upstream", "server") => Some(construct_upstream_server(
            name.clone(),
            parameters.clone(),
            block.clone(),
            position,
        )?),
        _ => None,
    };
    if qualified.is_some() {
        return Ok(qualified);
    }

    let built = match name.as_str() {
        "http" => Some(construct_http(name, parameters, block)),
        "stream" => Some(construct_stream(name, parameters, block)),
        "server" => Some(construct_server(name, parameters, block)),
        "location" => Some(construct_location(name, parameters, block, position)?),
        "upstream" => Some(construct_upstream(name, parameters, block)),
        "map" => Some(construct_map(name, parameters, block, arena, position)?),
        "geo" => Some(construct_geo(name, parameters, block, arena, position)?),
        "split_clients" => {
            Some(construct_split_clients(name, parameters, block, arena, position)?)
        }
        "limit_req_zone" => Some(construct_limit_req_zone(name, parameters, block, position)?),
        "limit_conn_zone" => Some(construct_limit_conn_zone(name, parameters, block, position)?),
        "proxy_cache_path" => {
            Some(construct_proxy_cache_path_node(name, parameters, block, position)?)
        }
        _ => None,
    };
    Ok(built)
}

/// The context a directive's own block pushes onto the parser's context
/// stack, if any — `None` means children are looked up against the
/// currently enclosing context unchanged (e.g. `server`, `location`, `if`
/// are not pushed; only the five context-bearing directives are).
pub(crate) fn pushed_context(context: &str, name: &str) -> Option<&'static str> {
    match (context, name) {
        (_, "http") => Some("http"),
        (_, "stream") => Some("stream"),
        (_, "events") => Some("events"),
        (_, "mail") => Some("mail"),
        ("stream", "upstream") => Some("stream_upstream"),
        (_, "upstream") => Some("upstream"),
        _ => None,
    }
}

fn construct_lua_block(name: String, parameters: Vec<Parameter>, block: Option<Block>) -> Node {
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Node::LuaBlock(LuaBlockDirective { common })
}

fn construct_http(name: String, parameters: Vec<Parameter>, block: Option<Block>) -> Node {
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Node::Http(HttpDirective { common })
}

fn construct_server(name: String, parameters: Vec<Parameter>, block: Option<Block>) -> Node {
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Node::Server(ServerDirective { common })
}

fn construct_stream(name: String, parameters: Vec<Parameter>, block: Option<Block>) -> Node {
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Node::Stream(StreamDirective { common })
}

fn construct_stream_server(name: String, parameters: Vec<Parameter>, block: Option<Block>) -> Node {
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Node::StreamServer(StreamServerDirective { common })
}

fn construct_upstream(name: String, parameters: Vec<Parameter>, block: Option<Block>) -> Node {
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Node::Upstream(UpstreamDirective { common })
}

fn construct_stream_upstream(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
) -> Node {
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Node::StreamUpstream(StreamUpstreamDirective { common })
}

fn construct_location(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    position: Position,
) -> ParseResult<Node> {
    let (modifier, pattern) = match parameters.first().map(|p| p.value.as_str()) {
        Some("=") => (
            Some(LocationModifier::Exact),
            param_value(&parameters, 1, "location", position)?,
        ),
        Some("~") => (
            Some(LocationModifier::CaseSensitiveRegex),
            param_value(&parameters, 1, "location", position)?,
        ),
        Some("~*") => (
            Some(LocationModifier::CaseInsensitiveRegex),
            param_value(&parameters, 1, "location", position)?,
        ),
        Some("^~") => (
            Some(LocationModifier::PreferentialPrefix),
            param_value(&parameters, 1, "location", position)?,
        ),
        Some(_) => (None, param_value(&parameters, 0, "location", position)?),
        None => {
            return Err(ParseError::schema(
                "location requires at least 1 parameter",
                position,
            ));
        }
    };
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Ok(Node::Location(LocationDirective {
        common,
        modifier,
        pattern,
    }))
}

fn param_value(
    parameters: &[Parameter],
    index: usize,
    directive: &str,
    position: Position,
) -> ParseResult<String> {
    parameters
        .get(index)
        .map(|p| p.value.clone())
        .ok_or_else(|| {
            ParseError::schema(
                format!(
                    "{directive} requires at least {} parameters",
                    index + 1
                ),
                position,
            )
        })
}

fn construct_upstream_server(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    position: Position,
) -> ParseResult<Node> {
    let address = param_value(&parameters, 0, "server", position)?;
    let (params, flags) = split_server_params(&parameters[1..]);
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Ok(Node::UpstreamServer(UpstreamServerDirective {
        common,
        address,
        params,
        flags,
    }))
}

fn construct_stream_upstream_server(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    position: Position,
) -> ParseResult<Node> {
    let address = param_value(&parameters, 0, "server", position)?;
    let (params, flags) = split_server_params(&parameters[1..]);
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Ok(Node::StreamUpstreamServer(StreamUpstreamServerDirective {
        common,
        address,
        params,
        flags,
    }))
}

fn split_server_params(rest: &[Parameter]) -> (Vec<(String, String)>, Vec<String>) {
    let mut params = Vec::new();
    let mut flags = Vec::new();
    for p in rest {
        match kv(&p.value) {
            Some((k, v)) => params.push((k.to_string(), v.to_string())),
            None => flags.push(p.value.clone()),
        }
    }
    (params, flags)
}

fn construct_map(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    arena: &Arena,
    position: Position,
) -> ParseResult<Node> {
    if parameters.len() != 2 {
        return Err(ParseError::schema(
            "map requires exactly 2 parameters",
            position,
        ));
    }
    let source_variable = parameters[0].value.clone();
    let target_variable = parameters[1].value.clone();
    let mut entries = Vec::new();
    if let Some(block) = &block {
        for &child_id in &block.children {
            let Some(child) = arena.get(child_id) else {
                continue;
            };
            let pattern = if child.name() == "default" {
                MapPattern::Default
            } else if let Some(rest) = child.name().strip_prefix('~') {
                MapPattern::Regex(rest.to_string())
            } else {
                MapPattern::Literal(child.name().to_string())
            };
            let value = child
                .parameters()
                .first()
                .map(|p| p.value.clone())
                .unwrap_or_default();
            entries.push(MapEntry {
                pattern,
                value,
                line: child.line(),
            });
        }
    }
    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Ok(Node::Map(MapDirective {
        common,
        source_variable,
        target_variable,
        entries,
    }))
}

fn validate_geo_network(s: &str) -> bool {
    if let Some((start, end)) = s.split_once('-') {
        return start.parse::<IpAddr>().is_ok() && end.parse::<IpAddr>().is_ok();
    }
    if let Some((ip, prefix)) = s.split_once('/') {
        return ip.parse::<IpAddr>().is_ok() && prefix.parse::<u8>().is_ok();
    }
    s.parse::<IpAddr>().is_ok()
}

fn construct_geo(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    arena: &Arena,
    position: Position,
) -> ParseResult<Node> {
    let (source_variable, target_variable) = match parameters.len() {
        1 => ("$remote_addr".to_string(), parameters[0].value.clone()),
        2 => (parameters[0].value.clone(), parameters[1].value.clone()),
        _ => {
            return Err(ParseError::schema(
                "geo requires 1 or 2 parameters",
                position,
            ));
        }
    };

    let mut entries = Vec::new();
    let mut ranges = false;
    let mut proxy_recursive = false;
    let mut delete = Vec::new();
    let mut proxy = Vec::new();
    let mut default = None;

    if let Some(block) = &block {
        for &child_id in &block.children {
            let Some(child) = arena.get(child_id) else {
                continue;
            };
            match child.name() {
                "ranges" => ranges = true,
                "proxy_recursive" => proxy_recursive = true,
                "delete" => {
                    if let Some(p) = child.parameters().first() {
                        delete.push(p.value.clone());
                    }
                }
                "proxy" => {
                    if let Some(p) = child.parameters().first() {
                        proxy.push(p.value.clone());
                    }
                }
                "default" => {
                    default = child.parameters().first().map(|p| p.value.clone());
                }
                network => {
                    if !ranges && !validate_geo_network(network) {
                        return Err(ParseError::schema(
                            format!("geo entry '{network}' is not a valid network"),
                            position,
                        ));
                    }
                    let value = child
                        .parameters()
                        .first()
                        .map(|p| p.value.clone())
                        .unwrap_or_default();
                    entries.push(GeoEntry {
                        network: network.to_string(),
                        value,
                        line: child.line(),
                    });
                }
            }
        }
    }

    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Ok(Node::Geo(GeoDirective {
        common,
        source_variable,
        target_variable,
        entries,
        ranges,
        proxy_recursive,
        delete,
        proxy,
        default,
    }))
}

fn construct_split_clients(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    arena: &Arena,
    position: Position,
) -> ParseResult<Node> {
    if parameters.len() != 2
        || parameters[0].kind != ParamKind::Variable
        || parameters[1].kind != ParamKind::Variable
    {
        return Err(ParseError::schema(
            "split_clients requires exactly two variable parameters",
            position,
        ));
    }
    let source_variable = parameters[0].value.clone();
    let target_variable = parameters[1].value.clone();

    let mut entries = Vec::new();
    let mut total = 0.0f64;
    if let Some(block) = &block {
        for &child_id in &block.children {
            let Some(child) = arena.get(child_id) else {
                continue;
            };
            let percentage = if child.name() == "*" {
                Percentage::Wildcard
            } else if let Some(digits) = child.name().strip_suffix('%') {
                let n: f64 = digits.parse().map_err(|_| {
                    ParseError::schema(
                        format!("invalid split_clients percentage '{}'", child.name()),
                        position,
                    )
                })?;
                if !(0.0..=100.0).contains(&n) {
                    return Err(ParseError::schema(
                        format!("invalid split_clients percentage '{}'", child.name()),
                        position,
                    ));
                }
                total += n;
                if total > 100.0 {
                    return Err(ParseError::schema(
                        "total percentage cannot exceed 100%",
                        position,
                    ));
                }
                Percentage::Percent(n)
            } else {
                return Err(ParseError::schema(
                    format!("invalid split_clients percentage '{}'", child.name()),
                    position,
                ));
            };
            let value = child
                .parameters()
                .first()
                .map(|p| p.value.clone())
                .unwrap_or_default();
            entries.push(SplitClientsEntry {
                percentage,
                value,
                line: child.line(),
            });
        }
    }

    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Ok(Node::SplitClients(SplitClientsDirective {
        common,
        source_variable,
        target_variable,
        entries,
    }))
}

fn construct_limit_req_zone(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    position: Position,
) -> ParseResult<Node> {
    if parameters.len() < 3 {
        return Err(ParseError::schema(
            "limit_req_zone requires at least 3 parameters",
            position,
        ));
    }
    let key = parameters[0].value.clone();
    let mut zone_name = None;
    let mut zone_size = None;
    let mut rate = None;
    let mut sync = false;
    for p in &parameters[1..] {
        if p.value == "sync" {
            sync = true;
            continue;
        }
        if let Some((k, v)) = kv(&p.value) {
            match k {
                "zone" => {
                    let (n, s) = v.split_once(':').ok_or_else(|| {
                        ParseError::schema(
                            "limit_req_zone 'zone' must be of the form name:size",
                            position,
                        )
                    })?;
                    if !SIZE_ZONE_RE.is_match(s) {
                        return Err(ParseError::schema(
                            format!("limit_req_zone zone size '{s}' is invalid"),
                            position,
                        ));
                    }
                    zone_name = Some(n.to_string());
                    zone_size = Some(s.to_string());
                }
                "rate" => {
                    if !RATE_RE.is_match(v) {
                        return Err(ParseError::schema(
                            format!("limit_req_zone rate '{v}' is invalid"),
                            position,
                        ));
                    }
                    rate = Some(v.to_string());
                }
                _ => {}
            }
        }
    }
    let zone_name = zone_name.ok_or_else(|| {
        ParseError::schema("limit_req_zone requires a zone= parameter", position)
    })?;
    let zone_size = zone_size.ok_or_else(|| {
        ParseError::schema("limit_req_zone requires a zone= parameter", position)
    })?;
    let rate = rate.ok_or_else(|| {
        ParseError::schema("limit_req_zone requires a rate= parameter", position)
    })?;

    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Ok(Node::LimitReqZone(LimitReqZoneDirective {
        common,
        key,
        zone_name,
        zone_size,
        rate,
        sync,
    }))
}

fn construct_limit_conn_zone(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    position: Position,
) -> ParseResult<Node> {
    if parameters.len() < 2 {
        return Err(ParseError::schema(
            "limit_conn_zone requires at least 2 parameters",
            position,
        ));
    }
    let key = parameters[0].value.clone();
    let mut zone_name = None;
    let mut zone_size = None;
    let mut sync = false;
    for p in &parameters[1..] {
        if p.value == "sync" {
            sync = true;
            continue;
        }
        if let Some(("zone", v)) = kv(&p.value) {
            let (n, s) = v.split_once(':').ok_or_else(|| {
                ParseError::schema(
                    "limit_conn_zone 'zone' must be of the form name:size",
                    position,
                )
            })?;
            if !SIZE_ZONE_RE.is_match(s) {
                return Err(ParseError::schema(
                    format!("limit_conn_zone zone size '{s}' is invalid"),
                    position,
                ));
            }
            zone_name = Some(n.to_string());
            zone_size = Some(s.to_string());
        }
    }
    let zone_name = zone_name.ok_or_else(|| {
        ParseError::schema("limit_conn_zone requires a zone= parameter", position)
    })?;
    let zone_size = zone_size.ok_or_else(|| {
        ParseError::schema("limit_conn_zone requires a zone= parameter", position)
    })?;

    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Ok(Node::LimitConnZone(LimitConnZoneDirective {
        common,
        key,
        zone_name,
        zone_size,
        sync,
    }))
}

fn construct_proxy_cache_path_node(
    name: String,
    parameters: Vec<Parameter>,
    block: Option<Block>,
    position: Position,
) -> ParseResult<Node> {
    if parameters.is_empty() {
        return Err(ParseError::schema(
            "proxy_cache_path requires a path parameter",
            position,
        ));
    }
    let path = parameters[0].value.clone();
    let mut levels = Vec::new();
    let mut keys_zone_name = None;
    let mut keys_zone_size = None;
    macro_rules! field {
        ($v:ident) => {
            let mut $v = None;
        };
    }
    field!(inactive);
    field!(max_size);
    field!(min_free);
    field!(use_temp_path);
    field!(manager_files);
    field!(manager_sleep);
    field!(manager_threshold);
    field!(loader_files);
    field!(loader_sleep);
    field!(loader_threshold);
    field!(purger);
    field!(purger_files);
    field!(purger_sleep);
    field!(purger_threshold);

    for p in &parameters[1..] {
        let Some((k, v)) = kv(&p.value) else {
            continue;
        };
        let timeish = |v: &str, field: &str| -> ParseResult<String> {
            if !CACHE_TIME_RE.is_match(v) {
                return Err(ParseError::schema(
                    format!("proxy_cache_path {field} '{v}' is not a valid time value"),
                    position,
                ));
            }
            Ok(v.to_string())
        };
        match k {
            "levels" => {
                for part in v.split(':') {
                    let depth: u8 = part.parse().map_err(|_| {
                        ParseError::schema(
                            format!("proxy_cache_path levels entry '{part}' is invalid"),
                            position,
                        )
                    })?;
                    if depth != 1 && depth != 2 {
                        return Err(ParseError::schema(
                            format!("proxy_cache_path levels entry '{part}' must be 1 or 2"),
                            position,
                        ));
                    }
                    levels.push(depth);
                }
            }
            "keys_zone" => {
                let (n, s) = v.split_once(':').ok_or_else(|| {
                    ParseError::schema(
                        "proxy_cache_path keys_zone must be of the form name:size",
                        position,
                    )
                })?;
                if !SIZE_ZONE_RE.is_match(s) {
                    return Err(ParseError::schema(
                        format!("proxy_cache_path keys_zone size '{s}' is invalid"),
                        position,
                    ));
                }
                keys_zone_name = Some(n.to_string());
                keys_zone_size = Some(s.to_string());
            }
            "inactive" => inactive = Some(timeish(v, "inactive")?),
            "max_size" => max_size = Some(v.to_string()),
            "min_free" => min_free = Some(v.to_string()),
            "use_temp_path" => use_temp_path = Some(v.to_string()),
            "manager_files" => manager_files = Some(v.to_string()),
            "manager_sleep" => manager_sleep = Some(timeish(v, "manager_sleep")?),
            "manager_threshold" => manager_threshold = Some(timeish(v, "manager_threshold")?),
            "loader_files" => loader_files = Some(v.to_string()),
            "loader_sleep" => loader_sleep = Some(timeish(v, "loader_sleep")?),
            "loader_threshold" => loader_threshold = Some(timeish(v, "loader_threshold")?),
            "purger" => purger = Some(v.to_string()),
            "purger_files" => purger_files = Some(v.to_string()),
            "purger_sleep" => purger_sleep = Some(timeish(v, "purger_sleep")?),
            "purger_threshold" => purger_threshold = Some(timeish(v, "purger_threshold")?),
            _ => {}
        }
    }

    let keys_zone_name = keys_zone_name.ok_or_else(|| {
        ParseError::schema(
            "proxy_cache_path requires a keys_zone= parameter",
            position,
        )
    })?;
    let keys_zone_size = keys_zone_size.ok_or_else(|| {
        ParseError::schema(
            "proxy_cache_path requires a keys_zone= parameter",
            position,
        )
    })?;

    let mut common = DirectiveCommon::new(name, 0);
    common.parameters = parameters;
    common.block = block;
    Ok(Node::ProxyCachePath(ProxyCachePathDirective {
        common,
        path,
        levels,
        keys_zone_name,
        keys_zone_size,
        inactive,
        max_size,
        min_free,
        use_temp_path,
        manager_files,
        manager_sleep,
        manager_threshold,
        loader_files,
        loader_sleep,
        loader_threshold,
        purger,
        purger_files,
        purger_sleep,
        purger_threshold,
    }))
}
