//! Structural invariants (single `http`/`events` block, duplicate
//! `server_name`/`listen` across distinct server blocks) and per-directive
//! parameter constraints (arity, parameter classification).

use super::{Category, Issue, Level, Visit};
use crate::ast::Node;
use crate::param::ParamKind;
use std::collections::HashMap;

pub(super) fn check(visits: &[Visit]) -> Vec<Issue> {
    let mut issues = Vec::new();
    check_singleton_blocks(visits, &mut issues);
    check_duplicate_server_names(visits, &mut issues);
    check_duplicate_listens(visits, &mut issues);
    check_parameters(visits, &mut issues);
    issues
}

fn check_singleton_blocks(visits: &[Visit], issues: &mut Vec<Issue>) {
    for name in ["http", "events"] {
        let instances: Vec<&Visit> = visits.iter().filter(|v| v.node.name() == name).collect();
        if instances.len() > 1 {
            for extra in &instances[1..] {
                issues.push(Issue::new(
                    Level::Error,
                    Category::Structure,
                    format!("more than one '{name}' block"),
                    format!(
                        "a second '{name}' block appears at line {}; only one is allowed",
                        extra.node.line()
                    ),
                    extra.node.line(),
                    name,
                    extra.context,
                ));
            }
        }
    }
}

/// The index of the nearest `server`/`stream_server` ancestor a visit sits
/// under, used to tell "two values in the same block" from "two values in
/// distinct blocks".
fn owning_server(visits: &[Visit], mut parent: Option<usize>) -> Option<usize> {
    while let Some(idx) = parent {
        if matches!(visits[idx].node, Node::Server(_) | Node::StreamServer(_)) {
            return Some(idx);
        }
        parent = visits[idx].parent;
    }
    None
}

fn check_duplicate_server_names(visits: &[Visit], issues: &mut Vec<Issue>) {
    let mut by_value: HashMap<&str, Vec<(usize, usize)>> = HashMap::new();
    for (i, visit) in visits.iter().enumerate() {
        if visit.node.name() != "server_name" {
            continue;
        }
        let Some(server_idx) = owning_server(visits, Some(i)) else {
            continue;
        };
        for param in visit.node.parameters() {
            if param.value == "_" || param.value == "localhost" {
                continue;
            }
            by_value
                .entry(param.value.as_str())
                .or_default()
                .push((server_idx, visit.node.line()));
        }
    }
    for (value, occurrences) in by_value {
        let distinct_blocks: std::collections::HashSet<usize> =
            occurrences.iter().map(|(s, _)| *s).collect();
        if distinct_blocks.len() > 1 {
            let lines: Vec<String> = occurrences.iter().map(|(_, l)| l.to_string()).collect();
            issues.push(Issue::new(
                Level::Warning,
                Category::Structure,
                "duplicate server_name across server blocks",
                format!("'{value}' is used as server_name in multiple server blocks (lines {})", lines.join(", ")),
                occurrences[0].1,
                "server_name",
                "server",
            ));
        }
    }
}

fn check_duplicate_listens(visits: &[Visit], issues: &mut Vec<Issue>) {
    let mut by_value: HashMap<&str, Vec<(usize, usize)>> = HashMap::new();
    for (i, visit) in visits.iter().enumerate() {
        if visit.node.name() != "listen" {
            continue;
        }
        let Some(server_idx) = owning_server(visits, Some(i)) else {
            continue;
        };
        let Some(address) = visit.node.parameters().first() else {
            continue;
        };
        by_value
            .entry(address.value.as_str())
            .or_default()
            .push((server_idx, visit.node.line()));
    }
    for (value, occurrences) in by_value {
        let distinct_blocks: std::collections::HashSet<usize> =
            occurrences.iter().map(|(s, _)| *s).collect();
        if distinct_blocks.len() > 1 {
            let lines: Vec<String> = occurrences.iter().map(|(_, l)| l.to_string()).collect();
            issues.push(Issue::new(
                Level::Info,
                Category::Structure,
                "duplicate listen address across server blocks",
                format!("'{value}' is used as a listen address in multiple server blocks (lines {})", lines.join(", ")),
                occurrences[0].1,
                "listen",
                "server",
            ));
        }
    }
}

struct ParamRule {
    directive: &'static str,
    min: usize,
    exact: bool,
    classify_as: Option<&'static [ParamKind]>,
}

const PARAM_RULES: &[ParamRule] = &[
    ParamRule { directive: "listen", min: 1, exact: false, classify_as: None },
    ParamRule { directive: "ssl_certificate", min: 1, exact: false, classify_as: Some(&[ParamKind::Path, ParamKind::String]) },
    ParamRule { directive: "ssl_certificate_key", min: 1, exact: false, classify_as: Some(&[ParamKind::Path, ParamKind::String]) },
    ParamRule { directive: "ssl_trusted_certificate", min: 1, exact: false, classify_as: Some(&[ParamKind::Path, ParamKind::String]) },
    ParamRule { directive: "ssl_client_certificate", min: 1, exact: false, classify_as: Some(&[ParamKind::Path, ParamKind::String]) },
    ParamRule { directive: "proxy_pass", min: 1, exact: false, classify_as: None },
    ParamRule { directive: "root", min: 1, exact: false, classify_as: None },
    ParamRule { directive: "alias", min: 1, exact: false, classify_as: None },
    ParamRule { directive: "worker_processes", min: 1, exact: true, classify_as: None },
    ParamRule { directive: "worker_connections", min: 1, exact: true, classify_as: Some(&[ParamKind::Number]) },
];

fn check_parameters(visits: &[Visit], issues: &mut Vec<Issue>) {
    for visit in visits {
        let Some(rule) = PARAM_RULES.iter().find(|r| r.directive == visit.node.name()) else {
            continue;
        };
        let params = visit.node.parameters();
        let count_ok = if rule.exact {
            params.len() == rule.min
        } else {
            params.len() >= rule.min
        };
        if !count_ok {
            let expectation = if rule.exact { "exactly" } else { "at least" };
            issues.push(
                Issue::new(
                    Level::Error,
                    Category::Parameter,
                    format!("'{}' has the wrong number of parameters", rule.directive),
                    format!(
                        "'{}' at line {} requires {expectation} {} parameter(s), found {}",
                        rule.directive,
                        visit.node.line(),
                        rule.min,
                        params.len()
                    ),
                    visit.node.line(),
                    rule.directive,
                    visit.context,
                )
                .with_fix_hint(format!("supply {expectation} {} parameter(s)", rule.min)),
            );
            continue;
        }
        if let Some(kinds) = rule.classify_as {
            if let Some(first) = params.first() {
                if !kinds.contains(&first.kind) {
                    issues.push(Issue::new(
                        Level::Warning,
                        Category::Parameter,
                        format!("'{}' parameter has an unexpected shape", rule.directive),
                        format!(
                            "'{}' at line {} looks like {:?}, expected one of {:?}",
                            rule.directive,
                            visit.node.line(),
                            first.kind,
                            kinds
                        ),
                        visit.node.line(),
                        rule.directive,
                        visit.context,
                    ));
                }
            }
        }
    }
}
