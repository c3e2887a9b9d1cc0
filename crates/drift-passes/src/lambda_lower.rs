//! Lambda lowering: the bytecode format has no way to hold a callable in an
//! ordinary variable slot, so lambda-holding declarations are interned into
//! the process-wide named-slot store instead. A declaration binding a
//! lambda literal becomes `SetModLocalData(key, lambda)`, and every later
//! read of the symbol becomes `GetModLocalData(key)`, keyed by the
//! binding's slot index and original name.
//!
//! Runs after type checking, so the synthetic calls are born with resolved
//! signatures and types.

use drift_common::cmd::{intrinsics, CommandTable};
use drift_common::sym::VarRef;
use drift_common::ty::Ty;
use drift_parser::ast::{
    visit, Block, Expr, ExprKind, ScriptUnit, Stmt, StmtKind, VarDeclarator, VisitMut,
};

pub fn run(unit: &mut ScriptUnit, table: &CommandTable) {
    LambdaLower { table }.visit_unit(unit);
}

/// Store key for a lambda-holding symbol.
pub fn slot_key(var: &VarRef) -> String {
    let var = var.borrow();
    format!("__lambda_{}_{}", var.index, var.name)
}

struct LambdaLower<'a> {
    table: &'a CommandTable,
}

impl VisitMut for LambdaLower<'_> {
    fn visit_unit(&mut self, unit: &mut ScriptUnit) {
        // Script-level lambda bindings are as common as block-level ones.
        let stmts = std::mem::take(&mut unit.body);
        unit.body = self.lower_stmts(stmts);
    }

    fn visit_block(&mut self, block: &mut Block) {
        let stmts = std::mem::take(&mut block.stmts);
        block.stmts = self.lower_stmts(stmts);
    }

    /// Rewrite reads of lambda-holding symbols into store loads. The
    /// declarations themselves hold the literal directly (not through an
    /// identifier), so they are untouched here.
    fn transform_expr(&mut self, slot: &mut Expr) {
        let ExprKind::Identifier { var: Some(var), .. } = &slot.kind else {
            return;
        };
        if var.borrow().lambda.is_none() {
            return;
        }
        let key = slot_key(var);
        *slot = self.store_call(
            intrinsics::GET_MOD_LOCAL_DATA,
            vec![Expr::typed(ExprKind::Str(key), slot.span, Ty::String)],
            slot.span,
        );
    }
}

impl LambdaLower<'_> {
    fn lower_stmts(&mut self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        for mut stmt in stmts {
            visit::walk_stmt(self, &mut stmt);
            match &mut stmt.kind {
                StmtKind::VarDecl { decls, .. } => {
                    let drained: Vec<VarDeclarator> = std::mem::take(decls);
                    let mut kept = Vec::new();
                    for decl in drained {
                        if is_lambda_binding(&decl) {
                            out.push(self.store_stmt(decl));
                        } else {
                            kept.push(decl);
                        }
                    }
                    if !kept.is_empty() {
                        *decls = kept;
                        out.push(stmt);
                    }
                }
                _ => out.push(stmt),
            }
        }
        out
    }

    /// `SetModLocalData("__lambda_<slot>_<name>", <lambda>);`
    fn store_stmt(&self, decl: VarDeclarator) -> Stmt {
        let var = decl.var.as_ref().expect("lambda binding was resolved");
        let key = slot_key(var);
        let span = decl.name_span;
        let lambda = decl.init.expect("lambda binding has an initializer");
        let call = self.store_call(
            intrinsics::SET_MOD_LOCAL_DATA,
            vec![
                Expr::typed(ExprKind::Str(key), span, Ty::String),
                lambda,
            ],
            span,
        );
        Stmt::new(StmtKind::Expression(call), span)
    }

    fn store_call(&self, name: &str, args: Vec<Expr>, span: drift_common::span::Span) -> Expr {
        Expr::typed(
            ExprKind::Call {
                receiver: None,
                name: name.to_owned(),
                name_span: span,
                args,
                sig: self.table.get(name),
                callee_var: None,
            },
            span,
            Ty::Ambiguous,
        )
    }
}

fn is_lambda_binding(decl: &VarDeclarator) -> bool {
    let lambda_init = matches!(
        decl.init.as_ref().map(|e| &e.kind),
        Some(ExprKind::Lambda { .. })
    );
    lambda_init
        && decl
            .var
            .as_ref()
            .is_some_and(|v| v.borrow().lambda.is_some())
}
