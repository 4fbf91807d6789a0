//! Error types for the nginx configuration pipeline.
//!
//! Errors are split by stage:
//!
//! - [`LexerError`] — the lexer never actually raises these itself (it has no
//!   failure mode), but quoted-string scanning needs somewhere to report an
//!   unterminated literal once the parser asks for one.
//! - [`ParseError`] — failures turning a token stream into a document tree,
//!   including forwarded [`LexerError`]s and specialized-constructor failures.
//! - [`IncludeError`] — failures resolving or reading an `include`d file.
//!
//! All position-bearing variants carry a [`Position`] so messages can point at
//! an exact line and column. Message text for [`ParseError::Schema`] is part
//! of the public contract: client code and tests match it verbatim.

use crate::token::Position;
use std::fmt;
use thiserror::Error;

/// An error raised while scanning a quoted string or Lua block body.
#[derive(Debug, Clone, Error)]
pub enum LexerError {
    /// A `"…"` or `'…'` literal was opened but never closed before end-of-file.
    #[error("unterminated string starting at line {}, column {}", .position.line, .position.column)]
    UnterminatedString { position: Position },

    /// A `_by_lua_block` body was opened but its closing `}` was never found.
    #[error("unterminated lua block starting at line {}, column {}", .position.line, .position.column)]
    UnterminatedLuaBlock { position: Position },
}

impl LexerError {
    pub fn position(&self) -> Position {
        match self {
            LexerError::UnterminatedString { position } => *position,
            LexerError::UnterminatedLuaBlock { position } => *position,
        }
    }
}

/// An error raised while building the document tree from a token stream.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// A tokenization error propagated from the lexer.
    #[error("{0}")]
    Lexer(#[from] LexerError),

    /// The input ended while a block or directive was still open.
    #[error("unexpected end of file at line {}, column {}", .position.line, .position.column)]
    UnexpectedEof { position: Position },

    /// The parser found a token it did not expect in the current position.
    #[error("unexpected token '{found}' at line {}, column {}", .position.line, .position.column)]
    UnexpectedToken {
        found: String,
        position: Position,
    },

    /// A directive name referenced a name that is not in the known-directive
    /// set and the parser was not configured to ignore unknown directives.
    #[error("unknown directive '{name}' at line {}, column {}", .position.line, .position.column)]
    UnknownDirective { name: String, position: Position },

    /// A specialized constructor rejected the shape of a directive it owns.
    /// The message is produced by the constructor itself and forms part of
    /// the observable contract (tests match it verbatim).
    #[error("{message}")]
    Schema {
        message: String,
        position: Position,
    },

    /// An `include` directive failed to resolve and `skip_include_parsing_err`
    /// was not set. Boxed because `IncludeError::Parse` holds a `ParseError`
    /// in the other direction.
    #[error("{0}")]
    Include(#[from] Box<IncludeError>),
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lexer(e) => e.position(),
            ParseError::UnexpectedEof { position } => *position,
            ParseError::UnexpectedToken { position, .. } => *position,
            ParseError::UnknownDirective { position, .. } => *position,
            ParseError::Schema { position, .. } => *position,
            ParseError::Include(e) => e.position(),
        }
    }

    pub(crate) fn schema(message: impl Into<String>, position: Position) -> Self {
        ParseError::Schema {
            message: message.into(),
            position,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// An error raised while resolving `include` directives.
#[derive(Debug, Clone, Error)]
pub enum IncludeError {
    /// The included file could not be opened or read.
    #[error("failed to read included file '{path}': {message}")]
    Io { path: String, message: String },

    /// Parsing the included file's contents failed.
    #[error("failed to parse included file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    /// Strict mode was requested and an include pattern matched no files.
    #[error("include pattern '{pattern}' matched no files")]
    NoMatches { pattern: String },
}

impl IncludeError {
    /// Best-effort position: only `Parse` carries one, since it is the only
    /// variant describing a failure inside a known source file.
    pub fn position(&self) -> Position {
        match self {
            IncludeError::Parse { source, .. } => source.position(),
            IncludeError::Io { .. } | IncludeError::NoMatches { .. } => Position::default(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
