//! Drift type checker.
//!
//! Operates over the resolved, call-lowered AST: assigns a structural type
//! to every expression node (see `drift_common::ty`), validates operators
//! through total lookup tables, checks command calls against the external
//! signature table, and enforces the block-structure rules of the script
//! format. See [`check::check`] for the entry point and
//! [`diagnostics::render_diagnostic`] for ariadne rendering.

pub mod check;
pub mod diagnostics;
pub mod enums;
pub mod error;
pub mod ops;

pub use check::{check, TypeckResult};
pub use error::TypeError;
