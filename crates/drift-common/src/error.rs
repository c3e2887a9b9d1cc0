use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// A lexer error with location information.
///
/// Lexical errors are fatal to the current token stream: the lexer stops at
/// the first one and the whole compilation aborts with it (the parser never
/// sees a partial stream).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    /// Create a new lexer error.
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The specific kind of lexer error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexErrorKind {
    /// An unexpected character was encountered.
    UnexpectedCharacter(char),
    /// A string literal was not closed before end of input.
    UnterminatedString,
    /// A raw newline appeared inside a string literal.
    NewlineInString,
    /// A string interpolation (`${...}`) was not closed on its line.
    UnterminatedInterpolation,
    /// An invalid escape sequence was encountered in a string.
    InvalidEscapeSequence(char),
    /// A number literal could not be parsed, e.g. `1.2.3` or `5x`.
    InvalidNumberLiteral(String),
    /// An identifier made only of underscores (other than `_` itself).
    InvalidIdentifier(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(c) => write!(f, "unexpected character: {c:?}"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::NewlineInString => write!(f, "newline inside string literal"),
            Self::UnterminatedInterpolation => {
                write!(f, "unterminated string interpolation")
            }
            Self::InvalidEscapeSequence(c) => write!(f, "invalid escape sequence: \\{c}"),
            Self::InvalidNumberLiteral(s) => write!(f, "invalid number literal: {s}"),
            Self::InvalidIdentifier(s) => write!(f, "invalid identifier: {s}"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display() {
        let err = LexError::new(LexErrorKind::UnexpectedCharacter('@'), Span::new(0, 1));
        assert_eq!(err.to_string(), "unexpected character: '@'");
        assert_eq!(
            LexErrorKind::InvalidNumberLiteral("1.2.3".into()).to_string(),
            "invalid number literal: 1.2.3"
        );
        assert_eq!(
            LexErrorKind::NewlineInString.to_string(),
            "newline inside string literal"
        );
    }
}
