//! Token stream adapter between a lexer and the parser.

use super::token::Token;
use crate::error::XPathError;

/// Pulls tokens one at a time from a lexer.
///
/// Once the lexer is exhausted, [`TokenStream::next_token`] returns the
/// sentinel [`Token::end`] forever. The adapter remembers the line of the
/// most recent token that carried one, for diagnostics.
pub struct TokenStream<I> {
    tokens: I,
    exhausted: bool,
    line: u32,
}

impl<I> TokenStream<I>
where
    I: Iterator<Item = Result<Token, XPathError>>,
{
    /// Wraps a token source.
    pub fn new<T>(tokens: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            tokens: tokens.into_iter(),
            exhausted: false,
            line: 1,
        }
    }

    /// Returns the next token, or the end sentinel once the source is empty.
    ///
    /// # Errors
    ///
    /// Propagates lexer errors unchanged.
    pub fn next_token(&mut self) -> Result<Token, XPathError> {
        if self.exhausted {
            return Ok(Token::end());
        }

        match self.tokens.next() {
            Some(Ok(token)) => {
                if let Some(line) = token.line {
                    self.line = line;
                }
                Ok(token)
            }
            Some(Err(err)) => Err(err),
            None => {
                self.exhausted = true;
                Ok(Token::end())
            }
        }
    }

    /// The line of the most recent token that carried one (1 initially).
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::xpath::token::TokenKind;

    #[test]
    fn test_end_sentinel_repeats() {
        let mut stream = TokenStream::new(vec![Ok(Token::with_value(TokenKind::Ident, "a", 1))]);
        assert_eq!(stream.next_token().unwrap().kind, TokenKind::Ident);
        for _ in 0..3 {
            assert_eq!(stream.next_token().unwrap(), Token::end());
        }
    }

    #[test]
    fn test_tracks_last_known_line() {
        let mut stream = TokenStream::new(vec![
            Ok(Token::bare(TokenKind::LParen, 2)),
            Ok(Token::new(TokenKind::RParen, None, None)),
        ]);
        assert_eq!(stream.line(), 1);
        stream.next_token().unwrap();
        assert_eq!(stream.line(), 2);
        stream.next_token().unwrap();
        assert_eq!(stream.line(), 2);
        stream.next_token().unwrap();
        assert_eq!(stream.line(), 2);
    }

    #[test]
    fn test_propagates_lexer_errors() {
        let err = XPathError::lex("bad", 4);
        let mut stream = TokenStream::new(vec![Err(err.clone())]);
        assert_eq!(stream.next_token().unwrap_err(), err);
    }
}
