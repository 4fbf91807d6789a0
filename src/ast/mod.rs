//! Document model (C4): the typed directive tree produced by the parser.
//!
//! Nodes live in an [`Arena`] and refer to one another by [`NodeId`] handle
//! rather than by owning pointer, so a directive's parent link and a block's
//! child list never form an ownership cycle — the arena is the only owner.

mod arena;
mod mutate;
pub(crate) mod node;

pub use arena::{Arena, NodeId};
pub use node::*;

use crate::include::IncludeCacheState;
use std::collections::HashMap;
use std::path::PathBuf;

/// An ordered sequence of child directives attached to a block-capable
/// directive, plus the two flags the shape requires: whether the body is an
/// opaque Lua blob, and that blob's text when it is.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub children: Vec<NodeId>,
    pub is_lua_block: bool,
    pub literal_code: Option<String>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lua(code: String) -> Self {
        Self {
            children: Vec::new(),
            is_lua_block: true,
            literal_code: Some(code),
        }
    }
}

/// Fields shared by every directive variant, regardless of specialization.
#[derive(Debug, Clone)]
pub struct DirectiveCommon {
    pub name: String,
    pub parameters: Vec<crate::param::Parameter>,
    pub block: Option<Block>,
    pub outline_comments: Vec<String>,
    pub inline_comment: Option<String>,
    pub line: usize,
    pub parent: Option<NodeId>,
}

impl DirectiveCommon {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            block: None,
            outline_comments: Vec::new(),
            inline_comment: None,
            line,
            parent: None,
        }
    }
}

/// The root of a parsed configuration: an arena of nodes, the top-level
/// block those nodes belong to, the originating file path (if any), and the
/// include resolver's visited-state cache for this parse.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub arena: Arena,
    pub root: Block,
    pub path: Option<PathBuf>,
    pub include_cache: HashMap<PathBuf, IncludeCacheState>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.arena.get_mut(id)
    }

    /// Children of the given node, or the config's own root children when
    /// `parent` is `None`.
    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            None => &self.root.children,
            Some(id) => match self.arena.get(id).and_then(|n| n.block()) {
                Some(block) => &block.children,
                None => &[],
            },
        }
    }
}
