//! `XPath` 1.0 expression tokenizer.
//!
//! [`Lexer`] is a pull-based tokenizer: it implements
//! `Iterator<Item = Result<Token, XPathError>>` and produces one token at a
//! time, stamped with the line it starts on. It stops after the first error.
//!
//! # Disambiguation Rules
//!
//! The lexer applies the rules from `XPath` 1.0 section 3.7 so that the parser
//! can work with a single token of lookahead:
//!
//! - After a token that can end an operand, `*` is the multiply operator and
//!   the names `and`, `or`, `div`, `mod` are operators. Otherwise `*` is the
//!   wildcard name test and those names are plain identifiers.
//! - A name followed by `::` is an axis name.
//! - `node()`, `text()`, `comment()` and `processing-instruction()` are node
//!   type tests.
//!
//! Abbreviations are expanded here as well: `@` becomes the `attribute` axis,
//! `//` becomes a slash followed by the `descendant-or-self` axis, `.` becomes
//! `self` + `node()` and `..` becomes `parent` + `node()`.

use std::collections::VecDeque;

use super::ast::Axis;
use super::token::{Token, TokenKind};
use crate::error::XPathError;

/// The set of node type names recognized as node type tests.
const NODE_TYPE_NAMES: &[&str] = &["comment", "text", "processing-instruction", "node"];

/// `XPath` 1.0 expression tokenizer.
///
/// # Examples
///
/// ```
/// use xpathoxide::xpath::lexer::Lexer;
/// use xpathoxide::xpath::token::TokenKind;
///
/// let kinds: Vec<TokenKind> = Lexer::new("child::p[1]")
///     .map(|token| token.unwrap().kind)
///     .collect();
/// assert_eq!(
///     kinds,
///     [TokenKind::Axis, TokenKind::Ident, TokenKind::LBrack, TokenKind::Int, TokenKind::RBrack]
/// );
/// ```
pub struct Lexer<'a> {
    /// The input expression as bytes for efficient indexing.
    input: &'a [u8],
    /// Current byte offset into the input.
    pos: usize,
    /// Current 1-based line.
    line: u32,
    /// Tokens already lexed but not yet handed out (abbreviations expand to two).
    pending: VecDeque<Token>,
    /// Kind of the last token handed out.
    previous: Option<TokenKind>,
    /// Set once an error has been returned.
    failed: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given `XPath` expression string.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            line: 1,
            pending: VecDeque::new(),
            previous: None,
            failed: false,
        }
    }

    /// Tokenizes the entire remaining input.
    ///
    /// # Errors
    ///
    /// Returns the first lexing error encountered.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, XPathError> {
        self.by_ref().collect()
    }

    /// Lexes the next token(s) into `pending`. The input must not be at its end.
    fn lex(&mut self) -> Result<(), XPathError> {
        let line = self.line;
        let ch = self.input[self.pos];

        match ch {
            b'(' => self.single(TokenKind::LParen, line),
            b')' => self.single(TokenKind::RParen, line),
            b'[' => self.single(TokenKind::LBrack, line),
            b']' => self.single(TokenKind::RBrack, line),
            b',' => self.single(TokenKind::Comma, line),
            b'|' => self.single(TokenKind::Pipe, line),
            b'+' => self.single(TokenKind::Add, line),
            b'=' => self.single(TokenKind::Eq, line),
            b'@' => {
                self.advance();
                self.push_axis(Axis::Attribute, line);
            }
            b'/' => {
                self.advance();
                self.push(Token::bare(TokenKind::Slash, line));
                if self.peek_byte() == Some(b'/') {
                    self.advance();
                    self.push_axis(Axis::DescendantOrSelf, line);
                }
            }
            b'*' => {
                self.advance();
                if self.after_operand() {
                    self.push(Token::bare(TokenKind::Mul, line));
                } else {
                    self.push(Token::with_value(TokenKind::Ident, "*", line));
                }
            }
            b'-' => {
                if !self.after_operand() && self.number_follows(self.pos + 1) {
                    self.read_number(line);
                } else {
                    self.single(TokenKind::Sub, line);
                }
            }
            b'.' => {
                if self.peek_byte_at(self.pos + 1).is_some_and(|b| b.is_ascii_digit()) {
                    self.read_number(line);
                } else if self.peek_byte_at(self.pos + 1) == Some(b'.') {
                    self.pos += 2;
                    self.push_axis(Axis::Parent, line);
                    self.push(Token::with_value(TokenKind::TypeTest, "node", line));
                } else {
                    self.advance();
                    self.push_axis(Axis::Self_, line);
                    self.push(Token::with_value(TokenKind::TypeTest, "node", line));
                }
            }
            b':' => {
                if self.peek_byte_at(self.pos + 1) == Some(b':') {
                    return Err(XPathError::lex("'::' must follow an axis name", line));
                }
                self.single(TokenKind::Colon, line);
            }
            b'!' => {
                if self.peek_byte_at(self.pos + 1) != Some(b'=') {
                    return Err(XPathError::lex("expected '=' after '!'", line));
                }
                self.pos += 2;
                self.push(Token::bare(TokenKind::Neq, line));
            }
            b'<' => self.one_or_two(TokenKind::Lt, TokenKind::Lte, line),
            b'>' => self.one_or_two(TokenKind::Gt, TokenKind::Gte, line),
            b'"' | b'\'' => self.read_string_literal(ch)?,
            b'$' => self.read_variable_reference()?,
            b'0'..=b'9' => self.read_number(line),
            _ if is_name_start_char(ch) => self.read_name()?,
            _ => {
                return Err(XPathError::lex(
                    format!("unexpected character '{}'", char::from(ch)),
                    line,
                ))
            }
        }

        Ok(())
    }

    /// Consumes one byte and emits a payload-free token.
    fn single(&mut self, kind: TokenKind, line: u32) {
        self.advance();
        self.push(Token::bare(kind, line));
    }

    /// Emits `two` if the current byte is followed by `=`, otherwise `one`.
    fn one_or_two(&mut self, one: TokenKind, two: TokenKind, line: u32) {
        self.advance();
        if self.peek_byte() == Some(b'=') {
            self.advance();
            self.push(Token::bare(two, line));
        } else {
            self.push(Token::bare(one, line));
        }
    }

    /// Reads a string literal (single or double quoted). No escapes.
    fn read_string_literal(&mut self, quote: u8) -> Result<(), XPathError> {
        let line = self.line;
        let content_start = self.pos + 1;
        let Some(len) = self.input[content_start..].iter().position(|&b| b == quote) else {
            return Err(XPathError::lex("unterminated string literal", line));
        };
        let content_end = content_start + len;
        let content = self.slice(content_start, content_end).to_string();
        self.advance_to(content_end + 1);
        self.push(Token::with_value(TokenKind::String, content, line));
        Ok(())
    }

    /// Reads a variable reference (`$name` or `$prefix:name`).
    fn read_variable_reference(&mut self) -> Result<(), XPathError> {
        let line = self.line;
        self.advance(); // consume '$'

        if !self.peek_byte().is_some_and(is_name_start_char) {
            return Err(XPathError::lex("expected name after '$'", line));
        }

        let name_start = self.pos;
        self.advance_while(is_name_char);

        if self.peek_byte() == Some(b':')
            && self
                .peek_byte_at(self.pos + 1)
                .is_some_and(is_name_start_char)
        {
            self.advance(); // consume ':'
            self.advance_while(is_name_char);
        }

        let name = self.slice(name_start, self.pos).to_string();
        self.push(Token::with_value(TokenKind::Var, name, line));
        Ok(())
    }

    /// Reads a numeric literal, with an optional leading `-`.
    ///
    /// `Digits` is an integer; `Digits '.' Digits?` and `'.' Digits` are floats.
    fn read_number(&mut self, line: u32) {
        let start = self.pos;
        if self.peek_byte() == Some(b'-') {
            self.advance();
        }
        self.advance_while(|b| b.is_ascii_digit());

        let kind = if self.peek_byte() == Some(b'.') {
            self.advance();
            self.advance_while(|b| b.is_ascii_digit());
            TokenKind::Float
        } else {
            TokenKind::Int
        };

        let text = self.slice(start, self.pos).to_string();
        self.push(Token::with_value(kind, text, line));
    }

    /// Reads a name and classifies it as an axis, operator, type test or
    /// identifier.
    fn read_name(&mut self) -> Result<(), XPathError> {
        let line = self.line;
        let start = self.pos;
        self.advance_while(is_name_char);
        let name = self.slice(start, self.pos);

        let next = self.skip_ahead(self.pos);
        if self.input[next..].starts_with(b"::") {
            let Some(axis) = Axis::parse(name) else {
                return Err(XPathError::lex(format!("unknown axis '{name}'"), line));
            };
            self.advance_to(next + 2);
            self.push_axis(axis, line);
            return Ok(());
        }

        if self.after_operand() {
            let operator = match name {
                "and" => Some(TokenKind::And),
                "or" => Some(TokenKind::Or),
                "div" => Some(TokenKind::Div),
                "mod" => Some(TokenKind::Mod),
                _ => None,
            };
            if let Some(kind) = operator {
                self.push(Token::bare(kind, line));
                return Ok(());
            }
        }

        if NODE_TYPE_NAMES.contains(&name) && self.peek_byte_at(next) == Some(b'(') {
            let close = self.skip_ahead(next + 1);
            if self.peek_byte_at(close) == Some(b')') {
                let name = name.to_string();
                self.advance_to(close + 1);
                self.push(Token::with_value(TokenKind::TypeTest, name, line));
                return Ok(());
            }
        }

        let name = name.to_string();
        self.push(Token::with_value(TokenKind::Ident, name, line));
        Ok(())
    }

    // --- Utility methods ---

    fn push(&mut self, token: Token) {
        self.pending.push_back(token);
    }

    fn push_axis(&mut self, axis: Axis, line: u32) {
        self.push(Token::with_value(TokenKind::Axis, axis.as_str(), line));
    }

    /// Returns `true` if the last token handed out can end an operand.
    fn after_operand(&self) -> bool {
        self.previous.is_some_and(TokenKind::ends_operand)
    }

    /// Returns `true` if a number starts at `pos` (`5`, `.5`).
    fn number_follows(&self, pos: usize) -> bool {
        match self.peek_byte_at(pos) {
            Some(b'0'..=b'9') => true,
            Some(b'.') => self
                .peek_byte_at(pos + 1)
                .is_some_and(|b| b.is_ascii_digit()),
            _ => false,
        }
    }

    /// Returns the byte at the current position, or `None` if at end.
    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Returns the byte at the given position, or `None` if out of bounds.
    fn peek_byte_at(&self, pos: usize) -> Option<u8> {
        self.input.get(pos).copied()
    }

    /// Returns the first non-whitespace offset at or after `pos`, without
    /// consuming anything.
    fn skip_ahead(&self, pos: usize) -> usize {
        let mut pos = pos;
        while self.input.get(pos).is_some_and(u8::is_ascii_whitespace) {
            pos += 1;
        }
        pos
    }

    /// Advances the position by one byte.
    fn advance(&mut self) {
        self.advance_to(self.pos + 1);
    }

    /// Moves the position to `pos`, counting newlines passed over.
    fn advance_to(&mut self, pos: usize) {
        let newlines = self.input[self.pos..pos]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.line = self
            .line
            .saturating_add(u32::try_from(newlines).unwrap_or(u32::MAX));
        self.pos = pos;
    }

    /// Advances while the predicate holds for the current byte.
    ///
    /// Only used for name and digit runs, which never contain newlines.
    fn advance_while<F: Fn(u8) -> bool>(&mut self, pred: F) {
        while self.pos < self.input.len() && pred(self.input[self.pos]) {
            self.pos += 1;
        }
    }

    /// Returns the substring between two byte offsets.
    fn slice(&self, start: usize, end: usize) -> &'a str {
        // Offsets always fall on ASCII bytes, so the slice is valid UTF-8.
        let input: &'a [u8] = self.input;
        std::str::from_utf8(&input[start..end]).unwrap_or("")
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, XPathError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending.is_empty() {
            if self.failed {
                return None;
            }
            let next = self.skip_ahead(self.pos);
            self.advance_to(next);
            if self.pos >= self.input.len() {
                return None;
            }
            if let Err(err) = self.lex() {
                self.failed = true;
                self.pending.clear();
                return Some(Err(err));
            }
        }

        let token = self.pending.pop_front()?;
        self.previous = Some(token.kind);
        Some(Ok(token))
    }
}

/// Returns `true` if the byte can start a name.
///
/// Non-ASCII bytes are accepted so that names written in any script lex as a
/// single identifier; offsets therefore only ever split on ASCII bytes.
fn is_name_start_char(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

/// Returns `true` if the byte can continue a name.
fn is_name_char(b: u8) -> bool {
    is_name_start_char(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}
