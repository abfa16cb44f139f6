//! Error types for `XPath` lexing and parsing.
//!
//! Parsing is all-or-nothing: the first failure aborts the whole parse and is
//! returned to the caller as an [`XPathError`]. Every variant carries the
//! 1-based source line that was current when the failure was detected.

use thiserror::Error;

/// The error type returned when an `XPath` expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    /// The lexer could not produce a token (unterminated string, stray
    /// character, unknown axis name, ...).
    #[error("lex error on line {line}: {message}")]
    Lex {
        /// Human-readable error message.
        message: String,
        /// Line on which the offending input starts.
        line: u32,
    },

    /// The token sequence does not match any grammar production.
    #[error("syntax error on line {line}: {message}")]
    Syntax {
        /// Human-readable error message.
        message: String,
        /// Line of the most recent token seen by the parser.
        line: u32,
    },

    /// The expression nests deeper than the configured limit, either in
    /// parser recursion or in the height of the tree being built.
    #[error("expression nesting exceeds maximum depth of {limit} on line {line}")]
    TooDeep {
        /// The configured maximum depth.
        limit: u32,
        /// Line of the most recent token seen by the parser.
        line: u32,
    },
}

impl XPathError {
    /// Returns the source line associated with this error.
    #[must_use]
    pub fn line(&self) -> u32 {
        match self {
            Self::Lex { line, .. } | Self::Syntax { line, .. } | Self::TooDeep { line, .. } => {
                *line
            }
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, line: u32) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
        }
    }

    pub(crate) fn lex(message: impl Into<String>, line: u32) -> Self {
        Self::Lex {
            message: message.into(),
            line,
        }
    }
}
