//! Parser (C5): a two-token-lookahead window over the lexer that builds a
//! [`Config`] tree, dispatching to specialized constructors by
//! context-qualified directive name and invoking the include resolver
//! synchronously for `include` directives.

mod tables;

use crate::ast::{Arena, Block, Config, DirectiveCommon, GenericDirective, Node, NodeId, node};
use crate::config::ParserOptions;
use crate::error::{IncludeError, ParseError, ParseResult};
use crate::include;
use crate::include::IncludeCacheState;
use crate::lexer::Lexer;
use crate::param::Parameter;
use crate::token::{Position, Token, TokenKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Parse a standalone configuration string. `include` directives are
/// resolved relative to `options.root_dir` (or the current directory).
pub fn parse_str(source: &str, options: ParserOptions) -> ParseResult<Config> {
    let mut cache = HashMap::new();
    let base_dir = options
        .root_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = parse_internal(source, options, base_dir, &mut cache)?;
    config.include_cache = cache;
    Ok(config)
}

/// Parse a configuration file from disk. `include` directives are resolved
/// relative to the file's own directory unless `options.root_dir` is set.
pub fn parse_file(path: &Path, options: ParserOptions) -> Result<Config, IncludeError> {
    let mut cache = HashMap::new();
    let mut config = parse_file_cached(path, &options, &mut cache)?;
    config.include_cache = cache;
    Ok(config)
}

fn parse_file_cached(
    path: &Path,
    options: &ParserOptions,
    cache: &mut HashMap<PathBuf, IncludeCacheState>,
) -> Result<Config, IncludeError> {
    let source = std::fs::read_to_string(path).map_err(|e| IncludeError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let base_dir = options
        .root_dir
        .clone()
        .or_else(|| path.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = parse_internal(&source, options.clone(), base_dir, cache).map_err(|source| {
        IncludeError::Parse {
            path: path.display().to_string(),
            source,
        }
    })?;
    config.path = Some(path.to_path_buf());
    Ok(config)
}

fn parse_internal(
    source: &str,
    options: ParserOptions,
    base_dir: PathBuf,
    cache: &mut HashMap<PathBuf, IncludeCacheState>,
) -> ParseResult<Config> {
    let mut parser = Parser::new(source, options, base_dir, cache)?;
    let root_children = parser.parse_block_body("main", false, false)?;
    if !matches!(parser.current.kind, TokenKind::Eof) {
        return Err(ParseError::UnexpectedToken {
            found: parser.current.kind.display_name().to_string(),
            position: parser.current.position(),
        });
    }
    Ok(Config {
        arena: parser.arena,
        root: Block {
            children: root_children,
            is_lua_block: false,
            literal_code: None,
        },
        path: None,
        include_cache: HashMap::new(),
    })
}

struct Parser<'s, 'c> {
    lexer: Lexer<'s>,
    current: Token,
    peek: Token,
    options: ParserOptions,
    base_dir: PathBuf,
    arena: Arena,
    cache: &'c mut HashMap<PathBuf, IncludeCacheState>,
}

impl<'s, 'c> Parser<'s, 'c> {
    fn new(
        source: &'s str,
        options: ParserOptions,
        base_dir: PathBuf,
        cache: &'c mut HashMap<PathBuf, IncludeCacheState>,
    ) -> ParseResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        let peek = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            peek,
            options,
            base_dir,
            arena: Arena::new(),
            cache,
        })
    }

    fn bump(&mut self) -> ParseResult<Token> {
        let next = self.lexer.next_token()?;
        let previous = std::mem::replace(&mut self.current, std::mem::replace(&mut self.peek, next));
        Ok(previous)
    }

    /// Re-synchronize the lookahead window after the lexer was driven
    /// directly (via `read_lua_block_body`) rather than through `bump`.
    fn resync(&mut self) -> ParseResult<()> {
        self.current = self.lexer.next_token()?;
        self.peek = self.lexer.next_token()?;
        Ok(())
    }

    fn known(&self, name: &str) -> bool {
        self.options.ignore_unknown_directives
            || tables::KNOWN_DIRECTIVES.contains(name)
            || self.options.extra_directives.iter().any(|d| d == name)
    }

    /// Parse a sequence of directives (and interleaved comments/blank lines)
    /// until the terminator appropriate for `in_block` is reached.
    ///
    /// `literal_entries` is set for the bodies of `map`/`geo`/`split_clients`
    /// blocks: their "directives" are pattern/value entries (`default`,
    /// `10.0.0.0/8`, `~regex`, `50%`, `*`, ...), not real nginx directives, so
    /// the unknown-directive gate in [`Self::parse_directive`] does not apply
    /// to them — the specialized constructor reads them back out of the
    /// generic children it's handed.
    fn parse_block_body(&mut self, context: &str, in_block: bool, literal_entries: bool) -> ParseResult<Vec<NodeId>> {
        let mut outline: Vec<String> = Vec::new();
        let mut children = Vec::new();

        loop {
            match &self.current.kind {
                TokenKind::Eof => {
                    if in_block {
                        return Err(ParseError::UnexpectedEof {
                            position: self.current.position(),
                        });
                    }
                    break;
                }
                TokenKind::BlockEnd => {
                    if !in_block {
                        return Err(ParseError::UnexpectedToken {
                            found: self.current.kind.display_name().to_string(),
                            position: self.current.position(),
                        });
                    }
                    break;
                }
                TokenKind::EndOfLine => {
                    self.bump()?;
                }
                TokenKind::Comment(text) => {
                    outline.push(text.clone());
                    self.bump()?;
                }
                TokenKind::Keyword(_) | TokenKind::QuotedString(_) => {
                    let taken = std::mem::take(&mut outline);
                    let id = self.parse_directive(context, taken, literal_entries)?;
                    children.push(id);
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.display_name().to_string(),
                        position: self.current.position(),
                    });
                }
            }
        }

        Ok(children)
    }

    fn parse_directive(&mut self, context: &str, outline: Vec<String>, literal_entries: bool) -> ParseResult<NodeId> {
        let start = self.current.clone();
        let name = match &start.kind {
            TokenKind::Keyword(s) | TokenKind::QuotedString(s) => s.clone(),
            _ => {
                return Err(ParseError::UnexpectedToken {
                    found: start.kind.display_name().to_string(),
                    position: start.position(),
                });
            }
        };
        let directive_line = start.line;
        self.bump()?;

        let mut parameters = Vec::new();
        loop {
            match &self.current.kind {
                TokenKind::Keyword(v) | TokenKind::QuotedString(v) => {
                    let relative_line = self.current.line as i64 - directive_line as i64;
                    parameters.push(Parameter::new(v.clone(), relative_line));
                    self.bump()?;
                }
                TokenKind::Comment(_) => {
                    self.bump()?;
                }
                TokenKind::EndOfLine => {
                    self.bump()?;
                }
                TokenKind::Semicolon | TokenKind::BlockStart => break,
                TokenKind::Eof => {
                    return Err(ParseError::UnexpectedEof {
                        position: self.current.position(),
                    });
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.display_name().to_string(),
                        position: self.current.position(),
                    });
                }
            }
        }

        let terminator_line = self.current.line;
        let is_lua = name.ends_with("_by_lua_block");

        let (block, child_ids) = match &self.current.kind {
            TokenKind::Semicolon => {
                self.bump()?;
                (None, Vec::new())
            }
            TokenKind::BlockStart => {
                self.bump()?;
                if is_lua {
                    let body = self.lexer.read_lua_block_body()?;
                    self.resync()?;
                    let code = match body.kind {
                        TokenKind::LuaCode(c) => c,
                        _ => unreachable!("read_lua_block_body always yields LuaCode"),
                    };
                    (Some(Block::lua(code)), Vec::new())
                } else {
                    let child_context = node::pushed_context(context, &name).unwrap_or(context);
                    let child_literal_entries = matches!(name.as_str(), "map" | "geo" | "split_clients");
                    let ids = self.parse_block_body(child_context, true, child_literal_entries)?;
                    match &self.current.kind {
                        TokenKind::BlockEnd => {
                            self.bump()?;
                        }
                        TokenKind::Eof => {
                            return Err(ParseError::UnexpectedEof {
                                position: self.current.position(),
                            });
                        }
                        other => {
                            return Err(ParseError::UnexpectedToken {
                                found: other.display_name().to_string(),
                                position: self.current.position(),
                            });
                        }
                    }
                    let block = Block {
                        children: ids.clone(),
                        is_lua_block: false,
                        literal_code: None,
                    };
                    (Some(block), ids)
                }
            }
            _ => unreachable!("loop above only exits on Semicolon or BlockStart"),
        };

        let inline_comment = match &self.current.kind {
            TokenKind::Comment(text) if self.current.line == terminator_line => {
                let text = text.clone();
                self.bump()?;
                Some(text)
            }
            _ => None,
        };

        if name == "include" {
            return self.finish_include(name, parameters, directive_line, outline, inline_comment, start.position());
        }

        let built = node::construct(
            context,
            name.clone(),
            parameters.clone(),
            block.clone(),
            &self.arena,
            start.position(),
        )?;

        let mut final_node = match built {
            Some(n) => n,
            None => {
                if !literal_entries && !self.known(&name) {
                    return Err(ParseError::UnknownDirective {
                        name,
                        position: start.position(),
                    });
                }
                let mut common = DirectiveCommon::new(name, directive_line);
                common.parameters = parameters;
                common.block = block;
                Node::Generic(GenericDirective { common })
            }
        };

        {
            let common = final_node.common_mut();
            common.line = directive_line;
            common.outline_comments = outline;
            common.inline_comment = inline_comment;
        }

        let id = self.arena.insert(final_node);
        for &child in &child_ids {
            if let Some(c) = self.arena.get_mut(child) {
                c.common_mut().parent = Some(id);
            }
        }
        Ok(id)
    }

    fn finish_include(
        &mut self,
        name: String,
        parameters: Vec<Parameter>,
        directive_line: usize,
        outline: Vec<String>,
        inline_comment: Option<String>,
        position: Position,
    ) -> ParseResult<NodeId> {
        let pattern = parameters
            .first()
            .map(|p| p.value.clone())
            .ok_or_else(|| ParseError::schema("include requires a path parameter", position))?;

        let configs = include::resolve(
            &pattern,
            &self.base_dir,
            &self.options,
            &mut *self.cache,
            parse_file_cached,
        )
        .map_err(|e| ParseError::Include(Box::new(e)))?;

        let mut common = DirectiveCommon::new(name, directive_line);
        common.parameters = parameters;
        common.outline_comments = outline;
        common.inline_comment = inline_comment;
        let id = self
            .arena
            .insert(Node::Include(crate::ast::IncludeDirective { common, configs }));
        Ok(id)
    }
}
