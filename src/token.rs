//! Token model for nginx configuration source text.

use serde::{Deserialize, Serialize};

/// A single point in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The kind of a lexical token, carrying its literal text where relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// A maximal run of non-whitespace, non-structural characters.
    Keyword(String),
    /// A `"…"` or `'…'` literal, quotes retained.
    QuotedString(String),
    /// A `#…` comment, including the leading `#`, running to end-of-line.
    Comment(String),
    /// `;`
    Semicolon,
    /// `{`
    BlockStart,
    /// `}`
    BlockEnd,
    /// A line boundary. Carries no semantic meaning beyond separating
    /// keywords that happen to sit on the same line from the next.
    EndOfLine,
    /// The opaque body of a `_by_lua_block` directive, brace-balanced and
    /// outer-whitespace-trimmed.
    LuaCode(String),
    /// Sentinel emitted once the input is exhausted.
    Eof,
}

impl TokenKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenKind::Keyword(_) => "keyword",
            TokenKind::QuotedString(_) => "quoted string",
            TokenKind::Comment(_) => "comment",
            TokenKind::Semicolon => "';'",
            TokenKind::BlockStart => "'{'",
            TokenKind::BlockEnd => "'}'",
            TokenKind::EndOfLine => "end of line",
            TokenKind::LuaCode(_) => "lua code",
            TokenKind::Eof => "end of file",
        }
    }
}

/// A token together with its source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}
