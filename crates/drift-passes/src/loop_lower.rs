//! Loop lowering: rewrites every classic `for` into an equivalent `while`,
//! hoisting the init clause to immediately precede the loop and duplicating
//! the post clause before every `continue` of that loop and once at the
//! natural end of the body -- increment-before-continue semantics without a
//! separate jump target. A `continue` sitting as the literal last statement
//! of the body is elided first as a redundant no-op.
//!
//! Runs after type checking (so errors cite the original `for` syntax) and
//! before code generation (which only understands `while`).

use drift_common::ty::Ty;
use drift_parser::ast::{visit, Block, Expr, ExprKind, ScriptUnit, Stmt, StmtKind, VisitMut};

pub fn run(unit: &mut ScriptUnit) {
    LoopLower.visit_unit(unit);
}

struct LoopLower;

impl VisitMut for LoopLower {
    fn visit_block(&mut self, block: &mut Block) {
        let stmts = std::mem::take(&mut block.stmts);
        let mut out = Vec::with_capacity(stmts.len());
        for mut stmt in stmts {
            // Depth-first: inner loops are already `while` by the time an
            // outer `for` is rewritten, so its continue-injection does not
            // leak into them.
            visit::walk_stmt(self, &mut stmt);
            if matches!(stmt.kind, StmtKind::For { .. }) {
                lower_for(stmt, &mut out);
            } else {
                out.push(stmt);
            }
        }
        block.stmts = out;
    }
}

fn lower_for(stmt: Stmt, out: &mut Vec<Stmt>) {
    let span = stmt.span;
    let StmtKind::For {
        init,
        cond,
        post,
        mut body,
    } = stmt.kind
    else {
        unreachable!("lower_for called on a non-for statement");
    };

    if let Some(init) = init {
        out.push(*init);
    }

    if let Some(post) = post {
        // `continue` as the last statement would duplicate the post clause
        // back to back; drop it.
        if matches!(body.stmts.last().map(|s| &s.kind), Some(StmtKind::Continue)) {
            body.stmts.pop();
        }
        inject_post_before_continues(&mut body, &post);
        body.stmts.push((*post).clone());
    }

    // `for (;;)` has no condition; the lowered loop spins on a constant.
    let cond = cond.unwrap_or_else(|| Expr::typed(ExprKind::Bool(true), span, Ty::Boolean));
    out.push(Stmt::new(StmtKind::While { cond, body }, span));
}

/// Prepend the post clause before every `continue` belonging to this loop.
/// Nested loop bodies keep their own `continue`s untouched.
fn inject_post_before_continues(block: &mut Block, post: &Stmt) {
    let stmts = std::mem::take(&mut block.stmts);
    let mut out = Vec::with_capacity(stmts.len());
    for mut stmt in stmts {
        match &mut stmt.kind {
            StmtKind::Continue => {
                out.push(post.clone());
                out.push(stmt);
            }
            StmtKind::If {
                then_block,
                else_block,
                ..
            } => {
                inject_post_before_continues(then_block, post);
                if let Some(else_block) = else_block {
                    inject_post_before_continues(else_block, post);
                }
                out.push(stmt);
            }
            StmtKind::Block(inner) => {
                inject_post_before_continues(inner, post);
                out.push(stmt);
            }
            // While/ForEach bodies own their continues.
            _ => out.push(stmt),
        }
    }
    block.stmts = out;
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

    fn is_increment(stmt: &Stmt) -> bool {
        matches!(&stmt.kind, StmtKind::Expression(e)
            if matches!(&e.kind, ExprKind::Unary { postfix: true, .. }))
    }

    #[test]
    fn classic_for_becomes_hoisted_init_plus_while() {
        let unit = lowered("name t; begin gamemode { for (int i = 0; i < 3; i++) { } }");
        let body = begin_body(&unit, 0);
        assert_eq!(body.stmts.len(), 2);
        assert!(matches!(body.stmts[0].kind, StmtKind::VarDecl { .. }));
        let StmtKind::While { body: loop_body, .. } = &body.stmts[1].kind else {
            panic!("expected while, got {:?}", body.stmts[1].kind);
        };
        // Post clause appended once at the natural end.
        assert_eq!(loop_body.stmts.len(), 1);
        assert!(is_increment(&loop_body.stmts[0]));
    }

    #[test]
    fn continue_paths_get_the_post_clause_too() {
        let unit = lowered(
            "name t; begin gamemode { \
             for (int i = 0; i < 3; i++) { if (i == 1) { continue; } } }",
        );
        let body = begin_body(&unit, 0);
        let StmtKind::While { body: loop_body, .. } = &body.stmts[1].kind else {
            panic!("expected while");
        };
        // Body: if { i++; continue; } then trailing i++.
        assert_eq!(loop_body.stmts.len(), 2);
        let StmtKind::If { then_block, .. } = &loop_body.stmts[0].kind else {
            panic!("expected if");
        };
        assert_eq!(then_block.stmts.len(), 2);
        assert!(is_increment(&then_block.stmts[0]));
        assert!(matches!(then_block.stmts[1].kind, StmtKind::Continue));
        assert!(is_increment(&loop_body.stmts[1]));
    }

    #[test]
    fn trailing_continue_is_elided() {
        let unit = lowered(
            "name t; begin gamemode { for (int i = 0; i < 3; i++) { continue; } }",
        );
        let body = begin_body(&unit, 0);
        let StmtKind::While { body: loop_body, .. } = &body.stmts[1].kind else {
            panic!("expected while");
        };
        // Just the single trailing increment; the redundant continue is gone.
        assert_eq!(loop_body.stmts.len(), 1);
        assert!(is_increment(&loop_body.stmts[0]));
    }

    #[test]
    fn nested_loop_continues_stay_put() {
        let unit = lowered(
            "name t; int n; begin gamemode { \
             for (int i = 0; i < 3; i++) { \
                 while (n) { continue; } \
             } }",
        );
        let body = begin_body(&unit, 1);
        let StmtKind::While { body: outer, .. } = &body.stmts[1].kind else {
            panic!("expected outer while");
        };
        // Inner while keeps its bare continue; outer appends one increment.
        let StmtKind::While { body: inner, .. } = &outer.stmts[0].kind else {
            panic!("expected inner while");
        };
        assert_eq!(inner.stmts.len(), 1);
        assert!(matches!(inner.stmts[0].kind, StmtKind::Continue));
        assert!(is_increment(&outer.stmts[1]));
    }

    #[test]
    fn for_without_clauses_spins_on_true() {
        let unit = lowered("name t; begin gamemode { for (;;) { break; } }");
        let body = begin_body(&unit, 0);
        let StmtKind::While { cond, .. } = &body.stmts[0].kind else {
            panic!("expected while");
        };
        assert!(matches!(cond.kind, ExprKind::Bool(true)));
    }

    #[test]
    fn assignment_init_is_hoisted_as_expression() {
        let unit = lowered(
            "name t; int i; begin gamemode { for (i = 0; i < 2; i++) { } }",
        );
        let body = begin_body(&unit, 1);
        assert!(matches!(&body.stmts[0].kind, StmtKind::Expression(e)
            if matches!(e.kind, ExprKind::Assignment { .. })));
        assert!(matches!(body.stmts[1].kind, StmtKind::While { .. }));
    }
}
