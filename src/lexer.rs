//! Tokenizer for nginx configuration source text.
//!
//! The lexer never fails on a byte: any character it doesn't recognize as
//! starting a quoted string or comment simply becomes part of the current
//! keyword run. The only failure mode is an unterminated quoted string or an
//! unterminated Lua block body, both of which are reported lazily — the
//! lexer is otherwise infallible, matching the propagation policy in which
//! the parser is the first stage allowed to fail.

use crate::error::{LexerError, ParseResult};
use crate::token::{Position, Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn advance(&mut self) -> Option<char> {
        let (idx, ch) = self.chars.next()?;
        self.offset = idx + ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Produce the next token, or `Eof` once the source is exhausted.
    pub fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();

        let start = self.position();
        let Some(ch) = self.peek_char() else {
            return Ok(Token::new(TokenKind::Eof, start.line, start.column));
        };

        let kind = match ch {
            '\n' => {
                self.advance();
                TokenKind::EndOfLine
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            '{' => {
                self.advance();
                TokenKind::BlockStart
            }
            '}' => {
                self.advance();
                TokenKind::BlockEnd
            }
            '#' => {
                let mut text = String::new();
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    text.push(c);
                    self.advance();
                }
                TokenKind::Comment(text)
            }
            '"' | '\'' => self.read_quoted_string(ch, start)?,
            _ => self.read_keyword(),
        };

        Ok(Token::new(kind, start.line, start.column))
    }

    fn read_quoted_string(&mut self, quote: char, start: Position) -> ParseResult<TokenKind> {
        let mut text = String::new();
        text.push(quote);
        self.advance(); // opening quote

        loop {
            match self.advance() {
                Some(c) if c == quote => {
                    text.push(c);
                    break;
                }
                Some(c) => text.push(c),
                None => {
                    return Err(LexerError::UnterminatedString { position: start }.into());
                }
            }
        }

        Ok(TokenKind::QuotedString(text))
    }

    fn read_keyword(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(ch) = self.peek_char() {
            if is_structural(ch) || ch.is_whitespace() {
                break;
            }
            text.push(ch);
            self.advance();
        }
        TokenKind::Keyword(text)
    }

    /// Switch to raw-text mode for a `_by_lua_block` body, called by the
    /// parser immediately after it consumes the `{` that opens the block.
    /// Counts nested braces at the character level and returns the body
    /// (stripped of leading/trailing whitespace) as a single `LuaCode` token.
    pub fn read_lua_block_body(&mut self) -> ParseResult<Token> {
        let start = self.position();
        let mut depth = 1usize;
        let mut text = String::new();

        loop {
            match self.advance() {
                Some('{') => {
                    depth += 1;
                    text.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    text.push('}');
                }
                Some(c) => text.push(c),
                None => {
                    return Err(LexerError::UnterminatedLuaBlock { position: start }.into());
                }
            }
        }

        Ok(Token::new(
            TokenKind::LuaCode(text.trim().to_string()),
            start.line,
            start.column,
        ))
    }
}

fn is_structural(ch: char) -> bool {
    matches!(ch, ';' | '{' | '}' | '"' | '\'' | '#')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            let is_eof = matches!(tok.kind, TokenKind::Eof);
            out.push(tok.kind);
            if is_eof {
                break;
            }
        }
        out
    }

    #[test]
    fn simple_directive() {
        assert_eq!(
            kinds("listen 80;"),
            vec![
                TokenKind::Keyword("listen".into()),
                TokenKind::Keyword("80".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn block_tokens() {
        assert_eq!(
            kinds("http {\n}"),
            vec![
                TokenKind::Keyword("http".into()),
                TokenKind::BlockStart,
                TokenKind::EndOfLine,
                TokenKind::BlockEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn quoted_strings_retain_delimiters() {
        assert_eq!(
            kinds(r#"return 200 "hello world";"#),
            vec![
                TokenKind::Keyword("return".into()),
                TokenKind::Keyword("200".into()),
                TokenKind::QuotedString("\"hello world\"".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn single_quoted_strings_no_escape_processing() {
        // No internal escape processing: the backslash is kept literally and
        // the string still terminates at the next matching quote.
        assert_eq!(
            kinds(r"return 'a\b';"),
            vec![
                TokenKind::Keyword("return".into()),
                TokenKind::QuotedString("'a\\b'".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comment_retains_hash() {
        assert_eq!(
            kinds("# hi\nlisten 80;"),
            vec![
                TokenKind::Comment("# hi".into()),
                TokenKind::EndOfLine,
                TokenKind::Keyword("listen".into()),
                TokenKind::Keyword("80".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn variable_is_a_plain_keyword() {
        assert_eq!(
            kinds("set $x 1;"),
            vec![
                TokenKind::Keyword("set".into()),
                TokenKind::Keyword("$x".into()),
                TokenKind::Keyword("1".into()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_errors() {
        let mut lexer = Lexer::new(r#"listen "80;"#);
        lexer.next_token().unwrap();
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn lua_block_body_counts_nested_braces() {
        let mut lexer = Lexer::new("content_by_lua_block { if a { b() } }  ;");
        // consume "content_by_lua_block", then whitespace skip, then '{'
        let name = lexer.next_token().unwrap();
        assert_eq!(name.kind, TokenKind::Keyword("content_by_lua_block".into()));
        let brace = lexer.next_token().unwrap();
        assert_eq!(brace.kind, TokenKind::BlockStart);
        let body = lexer.read_lua_block_body().unwrap();
        assert_eq!(body.kind, TokenKind::LuaCode("if a { b() }".into()));
    }

    #[test]
    fn position_tracking_across_lines() {
        let mut lexer = Lexer::new("http {\n    listen 80;\n}");
        let t0 = lexer.next_token().unwrap();
        assert_eq!((t0.line, t0.column), (1, 1));
        let t1 = lexer.next_token().unwrap(); // '{'
        assert_eq!((t1.line, t1.column), (1, 6));
        let t2 = lexer.next_token().unwrap(); // end of line
        assert_eq!(t2.line, 1);
        let t3 = lexer.next_token().unwrap(); // listen
        assert_eq!((t3.line, t3.column), (2, 5));
    }
}
