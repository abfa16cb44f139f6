//! Token types exchanged between a lexer and the parser.
//!
//! A token is a `(kind, value, line)` triple. The parser only ever sees
//! tokens through this type, so any lexer that yields
//! `Result<Token, XPathError>` items can feed it.

use std::fmt;

/// The terminal category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// An axis name (`child` in `child::foo`, or the expansion of `@`,
    /// `//`, `.` and `..`). The value is the axis name.
    Axis,
    /// `:` in a qualified name.
    Colon,
    /// `,` between call arguments.
    Comma,
    /// A floating point literal. The value is the literal text.
    Float,
    /// An integer literal. The value is the literal text.
    Int,
    /// A name or the `*` wildcard. The value is the name.
    Ident,
    /// A node type test (`node()`, `text()`, ...). The value is the type name.
    TypeTest,
    /// `[`
    LBrack,
    /// `]`
    RBrack,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `/`
    Slash,
    /// A string literal. The value excludes the quotes.
    String,
    /// `|`
    Pipe,
    /// `and`
    And,
    /// `or`
    Or,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `div`
    Div,
    /// `mod`
    Mod,
    /// `*` as multiplication.
    Mul,
    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Lte,
    /// `>=`
    Gte,
    /// A variable reference. The value is the name without `$`.
    Var,
    /// Synthetic end-of-input marker.
    End,
}

impl TokenKind {
    /// Returns a short description used in diagnostics.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Axis => "axis",
            Self::Colon => "':'",
            Self::Comma => "','",
            Self::Float => "float",
            Self::Int => "integer",
            Self::Ident => "identifier",
            Self::TypeTest => "type test",
            Self::LBrack => "'['",
            Self::RBrack => "']'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Slash => "'/'",
            Self::String => "string",
            Self::Pipe => "'|'",
            Self::And => "'and'",
            Self::Or => "'or'",
            Self::Add => "'+'",
            Self::Sub => "'-'",
            Self::Div => "'div'",
            Self::Mod => "'mod'",
            Self::Mul => "'*'",
            Self::Eq => "'='",
            Self::Neq => "'!='",
            Self::Lt => "'<'",
            Self::Gt => "'>'",
            Self::Lte => "'<='",
            Self::Gte => "'>='",
            Self::Var => "variable",
            Self::End => "end of input",
        }
    }

    /// Returns `true` if a token of this kind can end an operand.
    ///
    /// Used by the lexer to tell `*` (multiply) from `*` (wildcard) and the
    /// operator names from element names. See `XPath` 1.0 section 3.7.
    #[must_use]
    pub fn ends_operand(self) -> bool {
        matches!(
            self,
            Self::RParen
                | Self::RBrack
                | Self::Int
                | Self::Float
                | Self::String
                | Self::Var
                | Self::Ident
                | Self::TypeTest
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A single lexed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The terminal category.
    pub kind: TokenKind,
    /// The literal payload, if the kind has one.
    pub value: Option<String>,
    /// 1-based source line, when the lexer tracks lines.
    pub line: Option<u32>,
}

impl Token {
    /// Creates a token.
    #[must_use]
    pub fn new(kind: TokenKind, value: Option<String>, line: Option<u32>) -> Self {
        Self { kind, value, line }
    }

    /// Creates a payload-free token on the given line.
    #[must_use]
    pub fn bare(kind: TokenKind, line: u32) -> Self {
        Self::new(kind, None, Some(line))
    }

    /// Creates a token carrying `value` on the given line.
    #[must_use]
    pub fn with_value(kind: TokenKind, value: impl Into<String>, line: u32) -> Self {
        Self::new(kind, Some(value.into()), Some(line))
    }

    /// The sentinel end-of-input token.
    #[must_use]
    pub fn end() -> Self {
        Self::new(TokenKind::End, None, None)
    }

    /// Returns the payload, or `""` for payload-free tokens.
    #[must_use]
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, self.kind) {
            (Some(value), TokenKind::String) => write!(f, "string {value:?}"),
            (Some(value), TokenKind::Var) => write!(f, "'${value}'"),
            (Some(value), TokenKind::Axis) => write!(f, "axis '{value}'"),
            (Some(value), _) => write!(f, "'{value}'"),
            (None, kind) => f.write_str(kind.describe()),
        }
    }
}
