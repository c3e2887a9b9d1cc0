//! The Drift AST: plain tagged-variant statement and expression nodes.
//!
//! Every node carries a source span and, after type checking, a resolved
//! structural type. Nodes are created by the parser, mutated in place by
//! the rewriting passes (types annotated, subtrees spliced), and consumed
//! once by the code generator.

pub mod expr;
pub mod stmt;
pub mod visit;

pub use expr::{AssignOp, BinOp, Expr, ExprKind, MembershipSet, NumWidth, UnOp};
pub use stmt::{
    Block, BlockMode, ForEachBinder, MatchArm, ParamDecl, Stmt, StmtKind, VarDeclarator,
};
pub use visit::{enter_expr, VisitMut};

use drift_common::span::Span;

/// A parsed source unit: the script preamble plus the interleaved sequence
/// of `#version` directives, global declarations, event blocks, and at most
/// one function declaration (mixing is caught by the type checker).
#[derive(Debug, Clone)]
pub struct ScriptUnit {
    /// The script's declared name (`name <ident>;`).
    pub name: String,
    pub name_span: Span,
    pub directives: Vec<VersionDirective>,
    pub body: Vec<Stmt>,
}

/// A `#version(plugin, major[, minor[, beta]])` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionDirective {
    pub plugin: String,
    pub major: u32,
    pub minor: Option<u32>,
    pub beta: Option<u32>,
    pub span: Span,
}
