//! Validator (C8): directive-context legality, cross-directive dependency
//! rules, structural invariants, and parameter constraints.
//!
//! A run produces a flat, depth-first-ordered [`Issue`] list plus a
//! [`Summary`] of counts by level and category. Each sub-checker
//! (`context`, `dependency`, `structure`) shares the single traversal built
//! by [`walk`], so every checker sees the same enclosing-context derivation.

mod context;
mod dependency;
mod structure;

use crate::ast::{Config, Node};
use serde::Serialize;

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// Which checker produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Context,
    Dependency,
    Structure,
    Parameter,
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub level: Level,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub line: usize,
    pub directive: String,
    pub context: String,
    pub fix_hint: Option<String>,
}

impl Issue {
    fn new(
        level: Level,
        category: Category,
        title: impl Into<String>,
        description: impl Into<String>,
        line: usize,
        directive: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            title: title.into(),
            description: description.into(),
            line,
            directive: directive.into(),
            context: context.into(),
            fix_hint: None,
        }
    }

    fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

/// Counts of issues by level, for a quick pass/fail read without scanning
/// the full issue list.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl Summary {
    fn from_issues(issues: &[Issue]) -> Self {
        let mut summary = Summary::default();
        for issue in issues {
            match issue.level {
                Level::Error => summary.errors += 1,
                Level::Warning => summary.warnings += 1,
                Level::Info => summary.infos += 1,
            }
        }
        summary
    }
}

/// The outcome of a validator run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub issues: Vec<Issue>,
    pub summary: Summary,
}

impl Report {
    pub fn by_level(&self, level: Level) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.level == level)
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.category == category)
    }

    pub fn is_clean(&self) -> bool {
        self.summary.errors == 0
    }
}

/// Run every checker against `config` and collect the combined report.
pub fn validate(config: &Config) -> Report {
    let visits = walk(config);
    let mut issues = Vec::new();
    issues.extend(context::check(&visits));
    issues.extend(dependency::check(&visits));
    issues.extend(structure::check(&visits));
    let summary = Summary::from_issues(&issues);
    Report { issues, summary }
}

/// One directive instance seen during traversal, paired with the context it
/// was found in and the index (within the same traversal) of the
/// block-owning ancestor it sits directly under.
///
/// Nodes are borrowed directly rather than looked up by `NodeId` afterward:
/// a traversal descends through `Include` nodes into configs with their own
/// arenas, so an id alone is not enough to find a node again — only the
/// `Config` it came from can resolve it, and that config varies per visit.
pub(crate) struct Visit<'a> {
    pub node: &'a Node,
    pub context: &'static str,
    pub parent: Option<usize>,
}

/// The child context a directive's own block establishes, per the
/// enclosing-directive recoding: most directives pass their context through
/// unchanged, but `http`/`stream`/`events`/`mail`/`server`/`location`/
/// `upstream`/`if` each fix a specific context for what's nested inside them.
pub(crate) fn child_context(name: &str, current: &'static str) -> &'static str {
    match name {
        "http" => "http",
        "stream" => "stream",
        "events" => "events",
        "mail" => "mail",
        "server" if current == "stream" => "stream_server",
        "server" => "server",
        "location" => "location",
        "upstream" if current == "stream" => "stream_upstream",
        "upstream" => "upstream",
        "if" => "if",
        _ => current,
    }
}

/// Depth-first traversal producing a `(node, context)` pair for every
/// directive, descending transparently through `Include` nodes at the
/// including directive's own context (an include is textual, not a new
/// scope).
pub(crate) fn walk(config: &Config) -> Vec<Visit<'_>> {
    let mut visits = Vec::new();
    walk_children(config, &config.root.children, "main", None, &mut visits);
    visits
}

fn walk_children<'a>(
    config: &'a Config,
    ids: &[crate::ast::NodeId],
    context: &'static str,
    parent: Option<usize>,
    visits: &mut Vec<Visit<'a>>,
) {
    for &id in ids {
        let Some(node) = config.get(id) else {
            continue;
        };
        let index = visits.len();
        visits.push(Visit { node, context, parent });

        match node {
            Node::Include(include) => {
                for nested in &include.configs {
                    walk_children(nested, &nested.root.children, context, parent, visits);
                }
            }
            _ => {
                if let Some(block) = node.block() {
                    let child_ctx = child_context(node.name(), context);
                    walk_children(config, &block.children, child_ctx, Some(index), visits);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserOptions;

    fn parse(source: &str) -> Config {
        crate::parser::parse_str(source, ParserOptions::new()).unwrap()
    }

    #[test]
    fn summary_counts_issues_by_level() {
        let issues = vec![
            Issue::new(Level::Error, Category::Context, "a", "a", 1, "x", "main"),
            Issue::new(Level::Error, Category::Structure, "b", "b", 2, "y", "main"),
            Issue::new(Level::Warning, Category::Dependency, "c", "c", 3, "z", "main"),
        ];
        let summary = Summary::from_issues(&issues);
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.infos, 0);
    }

    #[test]
    fn report_is_clean_only_when_there_are_no_errors() {
        let clean = Report {
            issues: vec![Issue::new(Level::Warning, Category::Parameter, "a", "a", 1, "x", "main")],
            summary: Summary { errors: 0, warnings: 1, infos: 0 },
        };
        assert!(clean.is_clean());

        let unclean = Report {
            issues: vec![Issue::new(Level::Error, Category::Parameter, "a", "a", 1, "x", "main")],
            summary: Summary { errors: 1, warnings: 0, infos: 0 },
        };
        assert!(!unclean.is_clean());
    }

    #[test]
    fn by_level_and_by_category_filter_independently() {
        let report = Report {
            issues: vec![
                Issue::new(Level::Error, Category::Context, "a", "a", 1, "x", "main"),
                Issue::new(Level::Warning, Category::Context, "b", "b", 2, "y", "main"),
                Issue::new(Level::Error, Category::Structure, "c", "c", 3, "z", "main"),
            ],
            summary: Summary { errors: 2, warnings: 1, infos: 0 },
        };
        assert_eq!(report.by_level(Level::Error).count(), 2);
        assert_eq!(report.by_category(Category::Context).count(), 2);
        assert_eq!(report.by_level(Level::Warning).filter(|i| i.category == Category::Context).count(), 1);
    }

    #[test]
    fn child_context_fixes_known_block_names_and_passes_through_otherwise() {
        assert_eq!(child_context("http", "main"), "http");
        assert_eq!(child_context("server", "stream"), "stream_server");
        assert_eq!(child_context("server", "http"), "server");
        assert_eq!(child_context("upstream", "stream"), "stream_upstream");
        assert_eq!(child_context("location", "server"), "location");
        assert_eq!(child_context("limit_except", "location"), "location");
    }

    #[test]
    fn walk_descends_through_include_nodes_at_the_including_directives_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("inner.conf"), "listen 8080;\n").unwrap();
        std::fs::write(
            dir.path().join("main.conf"),
            "http { include inner.conf; }\n",
        )
        .unwrap();

        let config = crate::parser::parse_file(&dir.path().join("main.conf"), ParserOptions::new()).unwrap();
        let visits = walk(&config);
        let listen = visits
            .iter()
            .find(|v| v.node.name() == "listen")
            .expect("listen directive should be visible through the include");
        assert_eq!(listen.context, "http");
    }
}
