//! Call lowering: rewrites bare `identifier(args...)` calls whose callee is
//! a lambda-holding local or another script's user-defined-function form
//! into the explicit `Call(identifier, args...)` shape -- the bytecode's
//! native opcode for arbitrary callees is the generic `Call` command, not
//! direct invocation syntax.
//!
//! Runs immediately after resolution (the callee annotations come from
//! there) and before type checking, which still assigns types to the
//! rewritten node.

use drift_common::cmd::{intrinsics, CommandTable};
use drift_common::form::{FormKind, FormResolver};
use drift_parser::ast::{visit, Expr, ExprKind, ScriptUnit, VisitMut};

pub fn run(unit: &mut ScriptUnit, table: &CommandTable, forms: &dyn FormResolver) {
    CallLower { table, forms }.visit_unit(unit);
}

struct CallLower<'a> {
    table: &'a CommandTable,
    forms: &'a dyn FormResolver,
}

impl VisitMut for CallLower<'_> {
    fn visit_expr(&mut self, expr: &mut Expr) {
        visit::walk_expr(self, expr);

        let ExprKind::Call {
            receiver: None,
            name,
            name_span,
            args,
            callee_var,
            ..
        } = &mut expr.kind
        else {
            return;
        };

        let callee = if let Some(var) = callee_var {
            // A local symbol shadows any same-named command, but only a
            // lambda holder is callable; anything else is left for the
            // checker to report.
            if var.borrow().lambda.is_none() {
                return;
            }
            Expr::new(
                ExprKind::Identifier {
                    name: name.clone(),
                    var: Some(var.clone()),
                    form: None,
                },
                *name_span,
            )
        } else {
            // Known commands win over forms of the same name.
            if self.table.get(name).is_some() {
                return;
            }
            let Some(form) = self.forms.by_name(name) else {
                return;
            };
            if form.kind != FormKind::Script {
                return;
            }
            Expr::new(
                ExprKind::Identifier {
                    name: name.clone(),
                    var: None,
                    form: Some(form),
                },
                *name_span,
            )
        };

        let name_span = *name_span;
        let mut new_args = Vec::with_capacity(args.len() + 1);
        new_args.push(callee);
        new_args.append(args);
        *expr = Expr::new(
            ExprKind::Call {
                receiver: None,
                name: intrinsics::CALL.to_owned(),
                name_span,
                args: new_args,
                sig: None,
                callee_var: None,
            },
            expr.span,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_common::form::{FormInfo, FormMap};

    fn lower(source: &str, forms: &FormMap) -> ScriptUnit {
        let parse = drift_parser::parse(source).expect("lex");
        assert!(parse.ok(), "parse errors: {:?}", parse.errors());
        let mut unit = parse.unit;
        crate::match_lower::run(&mut unit);
        let outcome = crate::resolve::run(&mut unit, &[], forms);
        assert!(outcome.ok(), "resolve errors: {:?}", outcome.errors);
        let table = CommandTable::core();
        run(&mut unit, &table, forms);
        unit
    }

    fn first_begin_expr(unit: &ScriptUnit, index: usize) -> &Expr {
        use drift_parser::ast::StmtKind;
        let StmtKind::Begin { body, .. } = &unit.body[index].kind else {
            panic!("expected begin block");
        };
        let StmtKind::Expression(expr) = &body.stmts[0].kind else {
            panic!("expected expression statement");
        };
        expr
    }

    #[test]
    fn lambda_call_becomes_generic_call() {
        let forms = FormMap::new();
        let unit = lower(
            "name t; ref myVar = fn(int a) -> a + 1; begin gamemode { myVar(5); }",
            &forms,
        );
        let expr = first_begin_expr(&unit, 1);
        let ExprKind::Call { name, args, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(name, "Call");
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[0].kind, ExprKind::Identifier { var: Some(_), .. }));
    }

    #[test]
    fn udf_form_call_becomes_generic_call() {
        let mut forms = FormMap::new();
        forms.insert(FormInfo {
            edid: "HelperScript".into(),
            form_id: 0x2000,
            kind: FormKind::Script,
            script_vars: vec![],
        });
        let unit = lower("name t; begin gamemode { HelperScript(1, 2); }", &forms);
        let expr = first_begin_expr(&unit, 0);
        let ExprKind::Call { name, args, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(name, "Call");
        assert_eq!(args.len(), 3);
        assert!(matches!(&args[0].kind, ExprKind::Identifier { form: Some(_), .. }));
    }

    #[test]
    fn commands_are_left_alone() {
        let forms = FormMap::new();
        let unit = lower("name t; begin gamemode { GetSecondsPassed(); }", &forms);
        let expr = first_begin_expr(&unit, 0);
        let ExprKind::Call { name, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(name, "GetSecondsPassed");
    }

    #[test]
    fn non_script_forms_are_left_alone() {
        let mut forms = FormMap::new();
        forms.insert(FormInfo {
            edid: "SomeDoor".into(),
            form_id: 0x2001,
            kind: FormKind::Door,
            script_vars: vec![],
        });
        let unit = lower("name t; begin gamemode { SomeDoor(); }", &forms);
        let expr = first_begin_expr(&unit, 0);
        let ExprKind::Call { name, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(name, "SomeDoor");
    }
}
