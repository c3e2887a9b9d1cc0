use std::fmt;

use drift_common::span::Span;

/// A syntax error with location information.
///
/// Parse errors are collected rather than fatal: the parser resynchronizes
/// at the next statement boundary and continues, so one pass over a file
/// can surface several independent errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}
