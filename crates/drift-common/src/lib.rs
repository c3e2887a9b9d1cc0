//! Shared types for the Drift compiler.
//!
//! Everything that more than one pipeline stage needs lives here: source
//! spans, tokens, lexer errors, the structural type lattice, symbol records,
//! the command/signature table, the form-resolver contract, and the mutable
//! target `Script` record that a successful compilation fills in.

pub mod cmd;
pub mod error;
pub mod form;
pub mod script;
pub mod span;
pub mod sym;
pub mod token;
pub mod ty;

/// Case folding used everywhere a name is matched against the engine:
/// commands, enum constants, event-block types, forms, and script variables
/// are all case-insensitive.
pub fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}
