//! Mutation operations on a parsed [`Config`].
//!
//! These do not re-run validation or re-classify anything beyond the single
//! parameter being replaced — callers that mutate a tree are expected to
//! invoke the validator explicitly afterward if they want a fresh report.

use super::{Block, Config, Node, NodeId};
use crate::param::Parameter;

impl Config {
    /// Append `node` as the last child of `parent` (or of the config root
    /// when `parent` is `None`). If `parent` doesn't yet have a block, one is
    /// created — callers adding children to a previously-leaf directive get
    /// this for free.
    pub fn append_child(&mut self, parent: Option<NodeId>, node: Node) -> NodeId {
        self.ensure_block(parent);
        let id = self.arena.insert(node);
        if let Some(id_mut) = self.arena.get_mut(id) {
            id_mut.common_mut().parent = parent;
        }
        self.children_mut(parent).push(id);
        id
    }

    /// Insert `node` at `index` within `parent`'s children.
    pub fn insert_child(&mut self, parent: Option<NodeId>, index: usize, node: Node) -> NodeId {
        self.ensure_block(parent);
        let id = self.arena.insert(node);
        if let Some(id_mut) = self.arena.get_mut(id) {
            id_mut.common_mut().parent = parent;
        }
        let children = self.children_mut(parent);
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    /// Remove `child` from `parent`'s children and the arena, returning the
    /// removed node. Does not recursively remove `child`'s own descendants
    /// from the arena (they become unreachable but remain allocated).
    pub fn remove_child(&mut self, parent: Option<NodeId>, child: NodeId) -> Option<Node> {
        let children = self.children_mut(parent);
        if let Some(pos) = children.iter().position(|&id| id == child) {
            children.remove(pos);
        }
        self.arena.remove(child)
    }

    fn ensure_block(&mut self, parent: Option<NodeId>) {
        if let Some(id) = parent
            && let Some(node) = self.arena.get_mut(id)
            && node.common().block.is_none()
        {
            node.common_mut().block = Some(Block::new());
        }
    }

    fn children_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent {
            None => &mut self.root.children,
            Some(id) => &mut self
                .arena
                .get_mut(id)
                .expect("parent node exists")
                .common_mut()
                .block
                .get_or_insert_with(Block::new)
                .children,
        }
    }

    /// Replace the value (and re-derived kind) of the parameter at `index`
    /// on `node`, preserving its relative line offset.
    pub fn set_parameter(&mut self, node: NodeId, index: usize, value: impl Into<String>) {
        if let Some(n) = self.arena.get_mut(node)
            && let Some(param) = n.common_mut().parameters.get_mut(index)
        {
            let relative_line = param.relative_line;
            *param = Parameter::new(value, relative_line);
        }
    }

    pub fn set_inline_comment(&mut self, node: NodeId, comment: Option<String>) {
        if let Some(n) = self.arena.get_mut(node) {
            n.common_mut().inline_comment = comment;
        }
    }

    pub fn add_outline_comment(&mut self, node: NodeId, comment: impl Into<String>) {
        if let Some(n) = self.arena.get_mut(node) {
            n.common_mut().outline_comments.push(comment.into());
        }
    }

    pub fn clear_outline_comments(&mut self, node: NodeId) {
        if let Some(n) = self.arena.get_mut(node) {
            n.common_mut().outline_comments.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ParserOptions;
    use crate::param::Parameter;

    fn parse(source: &str) -> super::Config {
        crate::parser::parse_str(source, ParserOptions::new()).unwrap()
    }

    #[test]
    fn append_child_creates_block_on_a_previously_leaf_directive() {
        let mut config = parse("http { }");
        let http_id = config.root.children[0];
        assert!(config.get(http_id).unwrap().block().unwrap().children.is_empty());

        let listen = super::Node::Generic(crate::ast::GenericDirective {
            common: {
                let mut c = crate::ast::DirectiveCommon::new("listen".to_string(), 1);
                c.parameters = vec![Parameter::new("80", 0)];
                c
            },
        });
        let id = config.append_child(Some(http_id), listen);
        let block = config.get(http_id).unwrap().block().unwrap();
        assert_eq!(block.children, vec![id]);
        assert_eq!(config.get(id).unwrap().parent(), Some(http_id));
    }

    #[test]
    fn insert_child_clamps_out_of_range_index_to_the_end() {
        let mut config = parse("http { listen 80; }");
        let http_id = config.root.children[0];
        let generic = |name: &str| {
            super::Node::Generic(crate::ast::GenericDirective {
                common: crate::ast::DirectiveCommon::new(name.to_string(), 2),
            })
        };
        let id = config.insert_child(Some(http_id), 99, generic("gzip"));
        let block = config.get(http_id).unwrap().block().unwrap();
        assert_eq!(*block.children.last().unwrap(), id);
    }

    #[test]
    fn remove_child_detaches_it_from_the_parent_block() {
        let mut config = parse("http { listen 80; listen 443; }");
        let http_id = config.root.children[0];
        let first_listen = config.get(http_id).unwrap().block().unwrap().children[0];
        let removed = config.remove_child(Some(http_id), first_listen);
        assert!(removed.is_some());
        let remaining = &config.get(http_id).unwrap().block().unwrap().children;
        assert_eq!(remaining.len(), 1);
        assert!(!remaining.contains(&first_listen));
    }

    #[test]
    fn set_parameter_replaces_value_and_keeps_relative_line() {
        let mut config = parse("http { listen 80; }");
        let http_id = config.root.children[0];
        let listen_id = config.get(http_id).unwrap().block().unwrap().children[0];
        let original_line = config.get(listen_id).unwrap().parameters()[0].relative_line;
        config.set_parameter(listen_id, 0, "8080");
        let param = &config.get(listen_id).unwrap().parameters()[0];
        assert_eq!(param.value, "8080");
        assert_eq!(param.relative_line, original_line);
    }

    #[test]
    fn outline_and_inline_comments_round_trip_through_mutation() {
        let mut config = parse("http { listen 80; }");
        let http_id = config.root.children[0];
        let listen_id = config.get(http_id).unwrap().block().unwrap().children[0];

        config.add_outline_comment(listen_id, "# primary listener");
        assert_eq!(config.get(listen_id).unwrap().outline_comments(), ["# primary listener"]);
        config.clear_outline_comments(listen_id);
        assert!(config.get(listen_id).unwrap().outline_comments().is_empty());

        config.set_inline_comment(listen_id, Some("# edge".to_string()));
        assert_eq!(config.get(listen_id).unwrap().inline_comment(), Some("# edge"));
        config.set_inline_comment(listen_id, None);
        assert_eq!(config.get(listen_id).unwrap().inline_comment(), None);
    }
}
