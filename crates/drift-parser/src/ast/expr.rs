use std::sync::Arc;

use drift_common::cmd::CommandSig;
use drift_common::form::{FormInfo, RemoteVar};
use drift_common::span::Span;
use drift_common::sym::VarRef;
use drift_common::ty::Ty;

use super::stmt::{Block, ParamDecl};

/// An expression node. `ty` starts at [`Ty::Invalid`] and is assigned by
/// the type checker; a successful check leaves no node invalid.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: Ty,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: Ty::Invalid,
        }
    }

    /// A node created after type checking, with its type already known.
    /// Used by the late lowering passes, which splice in synthetic nodes
    /// the checker never sees.
    pub fn typed(kind: ExprKind, span: Span, ty: Ty) -> Self {
        Self { kind, span, ty }
    }

    /// Synthetic integer literal.
    pub fn int(value: i64, span: Span) -> Self {
        Self::new(
            ExprKind::Number {
                value: value as f64,
                is_int: true,
                width: None,
            },
            span,
        )
    }

    /// Synthetic string literal.
    pub fn string(text: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Str(text.into()), span)
    }

    /// Synthetic read of an already-resolved symbol.
    pub fn var_read(var: VarRef, span: Span) -> Self {
        let ty = {
            let v = var.borrow();
            if v.lambda.is_some() {
                Ty::Lambda
            } else {
                Ty::var_of(v.kind)
            }
        };
        let name = var.borrow().name.clone();
        Self::typed(
            ExprKind::Identifier {
                name,
                var: Some(var),
                form: None,
            },
            span,
            ty,
        )
    }

    /// Whether this expression may appear on the left of an assignment.
    pub fn is_assign_target(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Identifier { .. } | ExprKind::Subscript { .. } | ExprKind::Get { .. }
        )
    }
}

/// Expression variants.
#[derive(Debug, Clone)]
pub enum ExprKind {
    Assignment {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then: Box<Expr>,
        other: Box<Expr>,
    },
    /// `item in set` / `item not in set`.
    Membership {
        negated: bool,
        item: Box<Expr>,
        set: MembershipSet,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        /// `x++` / `x--` are the only postfix forms.
        postfix: bool,
    },
    Subscript {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// A command or rewritten callable invocation. `sig` is resolved by the
    /// type checker and must be present before code generation. `callee_var`
    /// is set by resolution when the callee name is a lexical symbol (the
    /// trigger for the call-lowering rewrite).
    Call {
        receiver: Option<Box<Expr>>,
        name: String,
        name_span: Span,
        args: Vec<Expr>,
        sig: Option<Arc<CommandSig>>,
        callee_var: Option<VarRef>,
    },
    /// `form.variable` -- member access into a referenced script's declared
    /// variable. `base_form` and `remote` are resolved by the type checker.
    Get {
        base: String,
        base_span: Span,
        base_form: Option<Arc<FormInfo>>,
        member: String,
        member_span: Span,
        remote: Option<RemoteVar>,
    },
    Bool(bool),
    /// Numeric literal. `width` is set when the checker resolves a named
    /// enum constant and the parameter dictates a fixed encoding width.
    Number {
        value: f64,
        is_int: bool,
        width: Option<NumWidth>,
    },
    /// String literal; `${...}` interpolation is desugared at parse time
    /// into a concatenation chain, so this is always plain text.
    Str(String),
    /// A name. Resolution annotates `var` for lexical symbols; the checker
    /// annotates `form` for engine objects and globals.
    Identifier {
        name: String,
        var: Option<VarRef>,
        form: Option<Arc<FormInfo>>,
    },
    ArrayLiteral {
        elems: Vec<Expr>,
    },
    /// `{k::v, ...}` -- every element must be a pair expression.
    MapLiteral {
        elems: Vec<Expr>,
    },
    Pair {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    Grouping(Box<Expr>),
    Lambda {
        params: Vec<ParamDecl>,
        body: Block,
    },
    Null,
}

/// Fixed encoding width for enum-valued arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumWidth {
    Byte,
    Word,
}

/// Binary operators, in source spelling order of the precedence ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    LogicalOr,
    LogicalAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BitOr,
    BitAnd,
    Shl,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::LogicalOr => "||",
            BinOp::LogicalAnd => "&&",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::BitOr => "|",
            BinOp::BitAnd => "&",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
        }
    }
}

/// Unary operators. `Inc`/`Dec` are postfix; everything else is prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
    /// `$x` -- to-string.
    ToString,
    /// `#x` -- to-number.
    ToNumber,
    /// `&x` -- box a value into a one-element array.
    Box,
    /// `*x` -- unbox / read through.
    Unbox,
    /// `~x` -- bitwise complement.
    BitNot,
    Inc,
    Dec,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Not => "!",
            UnOp::Neg => "-",
            UnOp::ToString => "$",
            UnOp::ToNumber => "#",
            UnOp::Box => "&",
            UnOp::Unbox => "*",
            UnOp::BitNot => "~",
            UnOp::Inc => "++",
            UnOp::Dec => "--",
        }
    }
}

/// Assignment operators, compound variants included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitOr,
    BitAnd,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Mod => "%=",
            AssignOp::Pow => "^=",
            AssignOp::BitOr => "|=",
            AssignOp::BitAnd => "&=",
        }
    }

    /// The binary operator a compound assignment applies, if any.
    pub fn binary(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
            AssignOp::Mod => Some(BinOp::Mod),
            AssignOp::Pow => Some(BinOp::Pow),
            AssignOp::BitOr => Some(BinOp::BitOr),
            AssignOp::BitAnd => Some(BinOp::BitAnd),
        }
    }
}

/// The membership test's right-hand side: a bracketed literal value list
/// (multi-equality) or an arbitrary array-valued expression.
#[derive(Debug, Clone)]
pub enum MembershipSet {
    List(Vec<Expr>),
    Array(Box<Expr>),
}
