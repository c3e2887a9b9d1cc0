//! Match lowering: desugars every `match` statement into an
//! `if`/`else if`/.../`else` chain before resolution runs.
//!
//! When any arm binds a name (`ident::guard`), or the subject is not a
//! trivially re-readable expression, the subject is hoisted into a
//! synthetic array-typed local holding a boxed copy, and every read of the
//! binder (or of the subject, in equality arms) goes through an unbox of
//! that holder -- the bytecode has no first-class binding primitive, so the
//! one-element array cell stands in for one. The device lives entirely in
//! this file.

use drift_common::fold;
use drift_common::script::VarKind;
use drift_common::span::Span;
use drift_parser::ast::{
    enter_expr, visit, BinOp, Block, Expr, ExprKind, MatchArm, ScriptUnit, Stmt, StmtKind, UnOp,
    VarDeclarator, VisitMut,
};

/// Lower every `match` in the unit. Runs before resolution; the synthetic
/// holder declarations it introduces get slots like any other local.
pub fn run(unit: &mut ScriptUnit) {
    MatchLower { counter: 0 }.visit_unit(unit);
}

struct MatchLower {
    /// Per-unit counter for synthetic holder names.
    counter: u32,
}

impl VisitMut for MatchLower {
    fn visit_block(&mut self, block: &mut Block) {
        let stmts = std::mem::take(&mut block.stmts);
        let mut out = Vec::with_capacity(stmts.len());
        for mut stmt in stmts {
            // Inner matches first, so nested subjects lower before the
            // enclosing chain is built.
            visit::walk_stmt(self, &mut stmt);
            if matches!(stmt.kind, StmtKind::Match { .. }) {
                self.lower_match(stmt, &mut out);
            } else {
                out.push(stmt);
            }
        }
        block.stmts = out;
    }
}

impl MatchLower {
    fn lower_match(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) {
        let span = stmt.span;
        let StmtKind::Match {
            subject,
            arms,
            default,
        } = stmt.kind
        else {
            unreachable!("lower_match called on a non-match statement");
        };

        let needs_hoist =
            arms.iter().any(|arm| arm.binder.is_some()) || !is_trivially_readable(&subject);
        let holder = if needs_hoist {
            let name = format!("__match_{}", self.counter);
            self.counter += 1;
            out.push(hoist_decl(&name, &subject));
            Some(name)
        } else {
            None
        };

        // Build the chain back to front: each arm becomes an `if` whose
        // else-branch is the chain built so far.
        let had_arms = !arms.is_empty();
        let mut else_block = default;
        for arm in arms.into_iter().rev() {
            let if_stmt = self.lower_arm(arm, &subject, holder.as_deref(), else_block.take());
            else_block = Some(Block {
                span: if_stmt.span,
                stmts: vec![if_stmt],
            });
        }

        match else_block {
            // At least one arm: unwrap the outermost chain link.
            Some(mut chain) if had_arms => out.push(
                chain
                    .stmts
                    .pop()
                    .expect("chain block holds exactly one statement"),
            ),
            // Arms were empty but a default exists: it runs unconditionally.
            Some(chain) => out.push(Stmt::new(StmtKind::Block(chain), span)),
            None => {}
        }
    }

    fn lower_arm(
        &mut self,
        mut arm: MatchArm,
        subject: &Expr,
        holder: Option<&str>,
        else_block: Option<Block>,
    ) -> Stmt {
        let cond = match arm.binder.take() {
            Some((binder, _)) => {
                // Binder arm: the expression is a boolean guard, with every
                // read of the binder redirected through the holder.
                let mut rewriter = BinderRewriter {
                    binder: fold(&binder),
                    holder: holder.expect("binder arms force a hoist").to_owned(),
                };
                let mut guard = arm.expr;
                enter_expr(&mut rewriter, &mut guard);
                rewriter.visit_block(&mut arm.body);
                guard
            }
            None => {
                // Equality arm: `subject == armExpr`.
                let read = subject_read(subject, holder, arm.expr.span);
                let span = arm.expr.span;
                Expr::new(
                    ExprKind::Binary {
                        op: BinOp::Eq,
                        lhs: Box::new(read),
                        rhs: Box::new(arm.expr),
                    },
                    span,
                )
            }
        };

        Stmt::new(
            StmtKind::If {
                cond,
                then_block: arm.body,
                else_block,
            },
            arm.span,
        )
    }
}

/// `array __match_N = &subject;`
fn hoist_decl(name: &str, subject: &Expr) -> Stmt {
    let span = subject.span;
    let boxed = Expr::new(
        ExprKind::Unary {
            op: UnOp::Box,
            operand: Box::new(subject.clone()),
            postfix: false,
        },
        span,
    );
    Stmt::new(
        StmtKind::VarDecl {
            kind: VarKind::Array,
            decls: vec![VarDeclarator {
                name: name.to_owned(),
                name_span: span,
                init: Some(boxed),
                var: None,
            }],
        },
        span,
    )
}

/// Read the match subject: through the holder when hoisted, otherwise by
/// re-reading the original expression.
fn subject_read(subject: &Expr, holder: Option<&str>, span: Span) -> Expr {
    match holder {
        Some(name) => unbox_read(name, span),
        None => subject.clone(),
    }
}

/// `*__match_N`
fn unbox_read(holder: &str, span: Span) -> Expr {
    Expr::new(
        ExprKind::Unary {
            op: UnOp::Unbox,
            operand: Box::new(Expr::new(
                ExprKind::Identifier {
                    name: holder.to_owned(),
                    var: None,
                    form: None,
                },
                span,
            )),
            postfix: false,
        },
        span,
    )
}

/// Whether re-reading the expression per arm cannot change its value or
/// cause effects, letting the lowering skip the hoist.
fn is_trivially_readable(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Identifier { .. }
            | ExprKind::Number { .. }
            | ExprKind::Str(_)
            | ExprKind::Bool(_)
            | ExprKind::Null
    )
}

/// Swaps binder reads for holder unboxes through the `transform_expr`
/// replacement hook.
struct BinderRewriter {
    binder: String,
    holder: String,
}

impl VisitMut for BinderRewriter {
    fn transform_expr(&mut self, slot: &mut Expr) {
        if let ExprKind::Identifier { name, .. } = &slot.kind {
            if fold(name) == self.binder {
                *slot = unbox_read(&self.holder, slot.span);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowered(source: &str) -> ScriptUnit {
        let parse = drift_parser::parse(source).expect("lex");
        assert!(parse.ok(), "parse errors: {:?}", parse.errors());
        let mut unit = parse.unit;
        run(&mut unit);
        unit
    }

    fn begin_body(unit: &ScriptUnit, index: usize) -> &Block {
        let StmtKind::Begin { body, .. } = &unit.body[index].kind else {
            panic!("expected begin block");
        };
        body
    }

    #[test]
    fn equality_arms_lower_to_if_chain_without_hoist() {
        let unit = lowered(
            "name t; int x; int y; begin gamemode { \
             match (x) { 1 -> { y = 1; } 2 -> { y = 2; } _ -> { y = 0; } } }",
        );
        let body = begin_body(&unit, 2);
        // No hoisted declaration: the subject is a bare identifier.
        assert_eq!(body.stmts.len(), 1);
        let StmtKind::If {
            cond, else_block, ..
        } = &body.stmts[0].kind
        else {
            panic!("expected if chain, got {:?}", body.stmts[0].kind);
        };
        let ExprKind::Binary { op, lhs, .. } = &cond.kind else {
            panic!("expected equality condition");
        };
        assert_eq!(*op, BinOp::Eq);
        assert!(matches!(&lhs.kind, ExprKind::Identifier { name, .. } if name == "x"));

        // else -> if (x == 2) -> else -> default
        let chain = else_block.as_ref().unwrap();
        let StmtKind::If { else_block, .. } = &chain.stmts[0].kind else {
            panic!("expected nested if");
        };
        assert!(else_block.is_some());
    }

    #[test]
    fn n_arms_lower_to_n_conditionals() {
        let unit = lowered(
            "name t; int x; int y; begin gamemode { \
             match (x) { 1 -> { } 2 -> { } 3 -> { } } }",
        );
        let body = begin_body(&unit, 2);
        let mut count = 0;
        let mut cursor = Some(&body.stmts[0]);
        while let Some(stmt) = cursor {
            let StmtKind::If { else_block, .. } = &stmt.kind else {
                break;
            };
            count += 1;
            cursor = else_block.as_ref().and_then(|b| b.stmts.first());
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn binder_arm_hoists_and_rewrites() {
        let unit = lowered(
            "name t; int x; int y; begin gamemode { \
             match (x) { v::v > 5 -> { y = v; } _ -> { y = 0; } } }",
        );
        let body = begin_body(&unit, 2);
        assert_eq!(body.stmts.len(), 2);

        // Hoisted holder: `array __match_0 = &x;`
        let StmtKind::VarDecl { kind, decls } = &body.stmts[0].kind else {
            panic!("expected hoisted declaration, got {:?}", body.stmts[0].kind);
        };
        assert_eq!(*kind, VarKind::Array);
        assert_eq!(decls[0].name, "__match_0");
        assert!(matches!(
            decls[0].init.as_ref().unwrap().kind,
            ExprKind::Unary { op: UnOp::Box, .. }
        ));

        // Guard reads the binder through an unbox of the holder.
        let StmtKind::If { cond, then_block, .. } = &body.stmts[1].kind else {
            panic!("expected if");
        };
        let ExprKind::Binary { lhs, .. } = &cond.kind else {
            panic!("expected guard comparison");
        };
        assert!(matches!(
            &lhs.kind,
            ExprKind::Unary { op: UnOp::Unbox, .. }
        ));

        // The arm body's `v` read was rewritten too.
        let StmtKind::Expression(expr) = &then_block.stmts[0].kind else {
            panic!();
        };
        let ExprKind::Assignment { value, .. } = &expr.kind else {
            panic!();
        };
        assert!(matches!(
            &value.kind,
            ExprKind::Unary { op: UnOp::Unbox, .. }
        ));
    }

    #[test]
    fn effectful_subject_hoists_without_binders() {
        let unit = lowered(
            "name t; int y; begin gamemode { \
             match (GetSecondsPassed()) { 1 -> { y = 1; } } }",
        );
        let body = begin_body(&unit, 1);
        assert!(matches!(body.stmts[0].kind, StmtKind::VarDecl { .. }));
    }

    #[test]
    fn default_only_match_runs_unconditionally() {
        let unit = lowered("name t; int y; begin gamemode { match (y) { _ -> { y = 0; } } }");
        let body = begin_body(&unit, 1);
        assert_eq!(body.stmts.len(), 1);
        assert!(matches!(body.stmts[0].kind, StmtKind::Block(_)));
    }

    #[test]
    fn nested_matches_lower_inside_out() {
        let unit = lowered(
            "name t; int x; int y; begin gamemode { \
             match (x) { 1 -> { match (y) { 2 -> { } } } } }",
        );
        let body = begin_body(&unit, 2);
        let StmtKind::If { then_block, .. } = &body.stmts[0].kind else {
            panic!();
        };
        assert!(matches!(then_block.stmts[0].kind, StmtKind::If { .. }));
    }
}
