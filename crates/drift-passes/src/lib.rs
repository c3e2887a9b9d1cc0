//! AST rewriting passes for the Drift compiler.
//!
//! Run order is fixed and matters:
//!
//! 1. [`match_lower`] -- before resolution; it introduces declarations that
//!    need slots.
//! 2. [`resolve`] -- before type checking; types need resolved symbols.
//! 3. [`call_lower`] -- right after resolution, so the checker sees the
//!    rewritten `Call(...)` form instead of mis-resolving a bare callee as
//!    a command.
//! 4. (type checking, in `drift-typeck`)
//! 5. [`loop_lower`] and [`lambda_lower`] -- after checking, so errors cite
//!    the user's original `for`/lambda syntax, but before code generation,
//!    which only understands the lowered primitives.

pub mod call_lower;
pub mod lambda_lower;
pub mod loop_lower;
pub mod match_lower;
pub mod resolve;
pub mod scope;

use std::fmt;

use drift_common::span::Span;

/// An error raised by the resolution pass (duplicate declarations and the
/// like). Collected, not fatal; the driver stops the pipeline after any
/// pass that reports errors.
#[derive(Debug, Clone, PartialEq)]
pub struct PassError {
    pub message: String,
    pub span: Span,
}

impl PassError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PassError {}

/// An info-level notice that does not fail compilation, e.g. a variable
/// name shadowing a data-defined object.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub span: Span,
}

impl Notice {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
