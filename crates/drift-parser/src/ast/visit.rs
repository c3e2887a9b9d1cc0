//! Mutable AST traversal.
//!
//! [`VisitMut`] provides structural-recursion defaults for every node kind;
//! a pass overrides only what it cares about and calls the `walk_*` free
//! functions to recurse into the rest. The [`VisitMut::transform_expr`]
//! hook fires just before descending into every expression-bearing slot,
//! letting a pass *replace* the subtree in place (the lowering passes swap
//! identifier reads for synthetic call expressions this way) without every
//! other pass knowing about the substitution.

use super::expr::{Expr, ExprKind, MembershipSet};
use super::stmt::{Block, ForEachBinder, Stmt, StmtKind};
use super::ScriptUnit;

pub trait VisitMut {
    /// Replacement hook: overwrite `slot` to splice in a different subtree.
    /// Runs before the slot's children are visited.
    fn transform_expr(&mut self, _slot: &mut Expr) {}

    fn visit_unit(&mut self, unit: &mut ScriptUnit) {
        walk_unit(self, unit);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_block(&mut self, block: &mut Block) {
        walk_block(self, block);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }
}

/// Apply the transform hook to a slot, then descend into it.
pub fn enter_expr<V: VisitMut + ?Sized>(v: &mut V, slot: &mut Expr) {
    v.transform_expr(slot);
    v.visit_expr(slot);
}

pub fn walk_unit<V: VisitMut + ?Sized>(v: &mut V, unit: &mut ScriptUnit) {
    for stmt in &mut unit.body {
        v.visit_stmt(stmt);
    }
}

pub fn walk_block<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Begin { body, .. } => v.visit_block(body),
        StmtKind::UdfDecl { body, .. } => v.visit_block(body),
        StmtKind::VarDecl { decls, .. } => {
            for decl in decls {
                if let Some(init) = &mut decl.init {
                    enter_expr(v, init);
                }
            }
        }
        StmtKind::Expression(expr) => enter_expr(v, expr),
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                enter_expr(v, cond);
            }
            if let Some(post) = post {
                v.visit_stmt(post);
            }
            v.visit_block(body);
        }
        StmtKind::ForEach {
            iterable, body, ..
        } => {
            enter_expr(v, iterable);
            v.visit_block(body);
        }
        StmtKind::If {
            cond,
            then_block,
            else_block,
        } => {
            enter_expr(v, cond);
            v.visit_block(then_block);
            if let Some(else_block) = else_block {
                v.visit_block(else_block);
            }
        }
        StmtKind::Match {
            subject,
            arms,
            default,
        } => {
            enter_expr(v, subject);
            for arm in arms {
                enter_expr(v, &mut arm.expr);
                v.visit_block(&mut arm.body);
            }
            if let Some(default) = default {
                v.visit_block(default);
            }
        }
        StmtKind::Return { value } => {
            if let Some(value) = value {
                enter_expr(v, value);
            }
        }
        StmtKind::While { cond, body } => {
            enter_expr(v, cond);
            v.visit_block(body);
        }
        StmtKind::Block(block) => v.visit_block(block),
        StmtKind::ShowMessage { args } => {
            for arg in args {
                enter_expr(v, arg);
            }
        }
        StmtKind::Continue | StmtKind::Break => {}
    }
}

pub fn walk_expr<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Assignment { target, value, .. } => {
            enter_expr(v, target);
            enter_expr(v, value);
        }
        ExprKind::Ternary { cond, then, other } => {
            enter_expr(v, cond);
            enter_expr(v, then);
            enter_expr(v, other);
        }
        ExprKind::Membership { item, set, .. } => {
            enter_expr(v, item);
            match set {
                MembershipSet::List(elems) => {
                    for elem in elems {
                        enter_expr(v, elem);
                    }
                }
                MembershipSet::Array(array) => enter_expr(v, array),
            }
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            enter_expr(v, lhs);
            enter_expr(v, rhs);
        }
        ExprKind::Unary { operand, .. } => enter_expr(v, operand),
        ExprKind::Subscript { base, index } => {
            enter_expr(v, base);
            enter_expr(v, index);
        }
        ExprKind::Call { receiver, args, .. } => {
            if let Some(receiver) = receiver {
                enter_expr(v, receiver);
            }
            for arg in args {
                enter_expr(v, arg);
            }
        }
        ExprKind::ArrayLiteral { elems } | ExprKind::MapLiteral { elems } => {
            for elem in elems {
                enter_expr(v, elem);
            }
        }
        ExprKind::Pair { key, value } => {
            enter_expr(v, key);
            enter_expr(v, value);
        }
        ExprKind::Grouping(inner) => enter_expr(v, inner),
        ExprKind::Lambda { body, .. } => v.visit_block(body),
        ExprKind::Get { .. }
        | ExprKind::Bool(_)
        | ExprKind::Number { .. }
        | ExprKind::Str(_)
        | ExprKind::Identifier { .. }
        | ExprKind::Null => {}
    }
}

/// Whether a foreach binder names a variable (used by passes that only care
/// about named binders).
pub fn binder_name(binder: &ForEachBinder) -> Option<&str> {
    match binder {
        ForEachBinder::Discard => None,
        ForEachBinder::Named { name, .. } => Some(name),
    }
}
