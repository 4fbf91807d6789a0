//! A library for the nginx configuration language: lexing, context-aware
//! parsing into a typed document tree, text-preserving re-emission,
//! dependency/context/structural validation, a read-only query API, and a
//! recursive include resolver with glob expansion and cycle detection.
//!
//! ```
//! use nginx_config::{config::ParserOptions, parser};
//!
//! let config = parser::parse_str(
//!     "http { server { listen 80; server_name example.com; } }",
//!     ParserOptions::new(),
//! ).unwrap();
//!
//! let report = nginx_config::validate::validate(&config);
//! assert!(report.is_clean());
//! ```

pub mod ast;
pub mod config;
pub mod emit;
pub mod error;
pub mod include;
pub mod lexer;
pub mod param;
pub mod parser;
pub mod query;
pub mod token;
pub mod validate;

pub use ast::{Config, Node, NodeId};
pub use config::ParserOptions;
pub use emit::{Style, emit};
pub use error::{IncludeError, LexerError, ParseError, ParseResult};
pub use param::{ParamKind, Parameter};
pub use parser::{parse_file, parse_str};
pub use token::{Position, Token, TokenKind};
pub use validate::{Category, Issue, Level, Report, validate};
