use drift_common::script::VarKind;
use drift_common::span::Span;
use drift_common::sym::VarRef;

use super::expr::Expr;

/// A statement node.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement variants.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `begin <blocktype>[:mode] { ... }` -- an event block.
    Begin {
        blocktype: String,
        blocktype_span: Span,
        mode: Option<BlockMode>,
        body: Block,
    },
    /// `fn [name](params) { ... }` -- the script's user-defined function.
    UdfDecl {
        name: Option<String>,
        params: Vec<ParamDecl>,
        body: Block,
    },
    /// One or more declarations sharing a declared type:
    /// `int x = 5, y;`
    VarDecl {
        kind: VarKind,
        decls: Vec<VarDeclarator>,
    },
    Expression(Expr),
    /// Classic C-style loop; lowered to `While` before code generation.
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    /// `for (<type> x in e)` or `for ([<type> a, <type> b] in e)`.
    ForEach {
        first: ForEachBinder,
        second: Option<ForEachBinder>,
        iterable: Expr,
        body: Block,
    },
    If {
        cond: Expr,
        then_block: Block,
        /// `else` body; an `else if` chain is a block holding a single `If`.
        else_block: Option<Block>,
    },
    /// Desugared to an `If` chain before resolution.
    Match {
        subject: Expr,
        arms: Vec<MatchArm>,
        default: Option<Block>,
    },
    Return {
        value: Option<Expr>,
    },
    Continue,
    Break,
    While {
        cond: Expr,
        body: Block,
    },
    Block(Block),
    /// Vanilla message statement; encoded with the default argument
    /// convention.
    ShowMessage {
        args: Vec<Expr>,
    },
}

/// An ordered statement list with its covering span.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// One declarator of a `VarDecl`. `var` is filled in by resolution.
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub name: String,
    pub name_span: Span,
    pub init: Option<Expr>,
    pub var: Option<VarRef>,
}

/// A parameter of a function or lambda. `var` is filled in by resolution.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub kind: VarKind,
    pub name: String,
    pub span: Span,
    pub var: Option<VarRef>,
}

/// One arm of a `match`: `expr -> { ... }` tests equality against the
/// subject; `ident::expr -> { ... }` binds `ident` to the subject and
/// treats `expr` as a boolean guard.
#[derive(Debug, Clone)]
pub struct MatchArm {
    pub binder: Option<(String, Span)>,
    pub expr: Expr,
    pub body: Block,
    pub span: Span,
}

/// A foreach binder; `_` discards that position.
#[derive(Debug, Clone)]
pub enum ForEachBinder {
    Discard,
    Named {
        kind: VarKind,
        name: String,
        span: Span,
        var: Option<VarRef>,
    },
}

/// Optional event-block mode: `begin menumode:1012` or an identifier mode.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockMode {
    Number(u32),
    Ident(String),
}
