//! Variable resolution: lexical scopes, slot allocation, temp mangling.
//!
//! Annotates every identifier, call callee, and declaration with its
//! resolved symbol, and produces the two ordered slot lists the target
//! script's variable table is rebuilt from: persistent ("global")
//! variables first, then this compile's function-local temporaries.
//!
//! Carried-over symbols from a previous compile of the same script are
//! seeded into the root scope as "pre-existing"; redeclaring one re-types
//! it in place exactly once, preserving its slot across edits.

use drift_common::form::FormResolver;
use drift_common::script::{ScriptVar, VarKind};
use drift_common::span::Span;
use drift_common::sym::{LambdaSig, VarInfo, VarRef};
use drift_common::ty::Ty;
use drift_parser::ast::{
    enter_expr, visit, Block, Expr, ExprKind, ForEachBinder, ParamDecl, ScriptUnit, Stmt,
    StmtKind, VisitMut,
};

use crate::scope::ScopeTree;
use crate::{Notice, PassError};

/// Everything resolution produces besides the annotations themselves.
pub struct ResolveOutcome {
    /// Persistent variables in slot order (carried-over first, then new
    /// root-scope declarations in declaration order).
    pub globals: Vec<VarRef>,
    /// This compile's temporaries, slots continuing after the globals.
    pub temps: Vec<VarRef>,
    pub errors: Vec<PassError>,
    pub notices: Vec<Notice>,
}

impl ResolveOutcome {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The rebuilt variable table: globals then temps, in slot order.
    pub fn var_table(&self) -> Vec<ScriptVar> {
        self.globals
            .iter()
            .chain(self.temps.iter())
            .map(|v| {
                let v = v.borrow();
                ScriptVar {
                    name: v.rename.clone(),
                    kind: v.kind,
                    index: v.index,
                }
            })
            .collect()
    }
}

/// Run resolution over a parsed (and match-lowered) unit.
pub fn run(
    unit: &mut ScriptUnit,
    pre_existing: &[ScriptVar],
    forms: &dyn FormResolver,
) -> ResolveOutcome {
    let mut resolver = Resolver {
        forms,
        scopes: ScopeTree::new(),
        globals: Vec::new(),
        temps: Vec::new(),
        temp_counter: 0,
        errors: Vec::new(),
        notices: Vec::new(),
    };

    // Seed carried-over symbols in slot order so their indices survive.
    let mut seeded: Vec<&ScriptVar> = pre_existing.iter().collect();
    seeded.sort_by_key(|v| v.index);
    for carried in seeded {
        let var = VarInfo::pre_existing(&carried.name, carried.kind, carried.index).into_ref();
        resolver.scopes.declare(&carried.name, var.clone());
        resolver.globals.push(var);
    }

    resolver.visit_unit(unit);
    resolver.finalize_indices();

    ResolveOutcome {
        globals: resolver.globals,
        temps: resolver.temps,
        errors: resolver.errors,
        notices: resolver.notices,
    }
}

struct Resolver<'a> {
    forms: &'a dyn FormResolver,
    scopes: ScopeTree,
    globals: Vec<VarRef>,
    temps: Vec<VarRef>,
    /// Per-script monotonically increasing counter; mangled temp names are
    /// unique across the whole script even when sibling scopes reuse a
    /// source name.
    temp_counter: u32,
    errors: Vec<PassError>,
    notices: Vec<Notice>,
}

impl Resolver<'_> {
    fn declare(&mut self, name: &str, span: Span, kind: VarKind) -> Option<VarRef> {
        if let Some(existing) = self.scopes.get_local(name) {
            {
                let mut sym = existing.borrow_mut();
                if sym.pre_existing {
                    // Promote the carried-over symbol in place: re-typed,
                    // same slot. A second redeclaration is an error.
                    sym.kind = kind;
                    sym.ty = Ty::var_of(kind);
                    sym.lambda = None;
                    sym.pre_existing = false;
                    return Some(existing.clone());
                }
            }
            self.errors.push(PassError::new(
                format!("`{name}` already exists in this scope"),
                span,
            ));
            return None;
        }

        if self.forms.by_name(name).is_some() {
            self.notices.push(Notice::new(
                format!("`{name}` shadows a form with the same editor id"),
                span,
            ));
        }

        let var = if self.scopes.in_root() {
            let var = VarInfo::declared(name, name.to_owned(), kind).into_ref();
            self.globals.push(var.clone());
            var
        } else {
            let rename = format!("__temp_{}_{}", name, self.temp_counter);
            self.temp_counter += 1;
            let var = VarInfo::declared(name, rename, kind).into_ref();
            self.temps.push(var.clone());
            var
        };
        self.scopes.declare(name, var.clone());
        Some(var)
    }

    fn declare_params(&mut self, params: &mut [ParamDecl]) {
        for param in params {
            param.var = self.declare(&param.name, param.span, param.kind);
        }
    }

    /// Global indices are finalized first, in declaration order; temp
    /// indices continue the sequence. Temp slots are therefore only stable
    /// within one compilation.
    fn finalize_indices(&mut self) {
        let mut index = 1u32;
        for var in self.globals.iter().chain(self.temps.iter()) {
            var.borrow_mut().index = index;
            index += 1;
        }
    }
}

impl VisitMut for Resolver<'_> {
    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::VarDecl { kind, decls } => {
                let kind = *kind;
                for decl in decls {
                    // The initializer resolves before the name exists, so
                    // `int x = x;` reads the outer binding.
                    if let Some(init) = &mut decl.init {
                        enter_expr(self, init);
                    }
                    decl.var = self.declare(&decl.name, decl.name_span, kind);
                    // A lambda-literal initializer marks the symbol as a
                    // lambda holder; the checker refines the signature.
                    if let (Some(var), Some(init)) = (&decl.var, &decl.init) {
                        if let ExprKind::Lambda { params, .. } = &init.kind {
                            var.borrow_mut().lambda = Some(LambdaSig {
                                params: params
                                    .iter()
                                    .map(|p| Ty::var_of(p.kind).basic())
                                    .collect(),
                                ret: Ty::Ambiguous,
                            });
                        }
                    }
                }
            }
            StmtKind::UdfDecl { params, body, .. } => {
                // The function scope of a free-function script is the root
                // scope: its parameters and body declarations are
                // persistent, not temporaries.
                self.declare_params(params);
                for stmt in &mut body.stmts {
                    self.visit_stmt(stmt);
                }
            }
            StmtKind::ForEach {
                first,
                second,
                iterable,
                body,
            } => {
                // The iterable resolves outside the loop scope.
                enter_expr(self, iterable);
                self.scopes.push();
                for binder in [Some(first), second.as_mut()].into_iter().flatten() {
                    if let ForEachBinder::Named {
                        kind, name, span, var,
                    } = binder
                    {
                        *var = self.declare(name, *span, *kind);
                    }
                }
                self.visit_block(body);
                self.scopes.pop();
            }
            StmtKind::For { .. } => {
                // The init declaration lives in a scope that covers the
                // whole loop head and body.
                self.scopes.push();
                visit::walk_stmt(self, stmt);
                self.scopes.pop();
            }
            _ => visit::walk_stmt(self, stmt),
        }
    }

    fn visit_block(&mut self, block: &mut Block) {
        self.scopes.push();
        visit::walk_block(self, block);
        self.scopes.pop();
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Identifier { name, var, .. } => {
                // Unresolved identifiers stay unannotated; the type checker
                // decides whether they are engine objects or errors.
                if let Some(found) = self.scopes.lookup(name) {
                    found.borrow_mut().used = true;
                    *var = Some(found);
                }
            }
            ExprKind::Call {
                name, callee_var, ..
            } => {
                if let Some(found) = self.scopes.lookup(name) {
                    found.borrow_mut().used = true;
                    *callee_var = Some(found);
                }
                visit::walk_expr(self, expr);
            }
            ExprKind::Lambda { params, body } => {
                // Lambda parameters and body are their own nested scope;
                // everything inside is a temporary.
                self.scopes.push();
                self.declare_params(params);
                visit::walk_block(self, &mut *body);
                self.scopes.pop();
            }
            _ => visit::walk_expr(self, expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_common::form::FormMap;

    fn resolve_source(source: &str) -> (ScriptUnit, ResolveOutcome) {
        let parse = drift_parser::parse(source).expect("lex");
        assert!(parse.ok(), "parse errors: {:?}", parse.errors());
        let mut unit = parse.unit;
        let forms = FormMap::new();
        let outcome = run(&mut unit, &[], &forms);
        (unit, outcome)
    }

    #[test]
    fn root_declarations_become_globals_from_slot_one() {
        let (_, outcome) = resolve_source("name t; int x; string s; begin gamemode { }");
        assert!(outcome.ok());
        assert_eq!(outcome.globals.len(), 2);
        assert_eq!(outcome.globals[0].borrow().index, 1);
        assert_eq!(outcome.globals[1].borrow().index, 2);
        assert!(outcome.temps.is_empty());
    }

    #[test]
    fn block_locals_are_mangled_temps() {
        let (_, outcome) =
            resolve_source("name t; begin gamemode { int count = 0; { int count = 1; } }");
        assert!(outcome.ok());
        assert_eq!(outcome.temps.len(), 2);
        assert_eq!(outcome.temps[0].borrow().rename, "__temp_count_0");
        assert_eq!(outcome.temps[1].borrow().rename, "__temp_count_1");
        // Temp slots continue after the globals (none here).
        assert_eq!(outcome.temps[0].borrow().index, 1);
        assert_eq!(outcome.temps[1].borrow().index, 2);
    }

    #[test]
    fn sibling_scopes_may_reuse_a_name() {
        let (_, outcome) = resolve_source(
            "name t; int c; begin gamemode { if (c) { int n = 0; } if (c) { int n = 0; } }",
        );
        assert!(outcome.ok(), "errors: {:?}", outcome.errors);
        assert_eq!(outcome.temps.len(), 2);
        assert_ne!(
            outcome.temps[0].borrow().rename,
            outcome.temps[1].borrow().rename
        );
    }

    #[test]
    fn same_scope_redeclaration_is_an_error() {
        let (_, outcome) = resolve_source("name t; begin gamemode { int x; string x; }");
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("already exists"));
    }

    #[test]
    fn pre_existing_symbol_promotes_once() {
        let parse = drift_parser::parse("name t; string hp; begin gamemode { }").unwrap();
        let mut unit = parse.unit;
        let carried = vec![ScriptVar {
            name: "hp".into(),
            kind: VarKind::Double,
            index: 1,
        }];
        let forms = FormMap::new();
        let outcome = run(&mut unit, &carried, &forms);
        assert!(outcome.ok(), "errors: {:?}", outcome.errors);
        // Re-typed in place, same slot, no duplicate entry.
        assert_eq!(outcome.globals.len(), 1);
        let sym = outcome.globals[0].borrow();
        assert_eq!(sym.kind, VarKind::String);
        assert_eq!(sym.index, 1);
        assert!(!sym.pre_existing);
    }

    #[test]
    fn carried_symbols_keep_slots_ahead_of_new_ones() {
        let parse = drift_parser::parse("name t; int fresh; begin gamemode { }").unwrap();
        let mut unit = parse.unit;
        let carried = vec![
            ScriptVar {
                name: "old2".into(),
                kind: VarKind::Int,
                index: 2,
            },
            ScriptVar {
                name: "old1".into(),
                kind: VarKind::Int,
                index: 1,
            },
        ];
        let forms = FormMap::new();
        let outcome = run(&mut unit, &carried, &forms);
        let table = outcome.var_table();
        assert_eq!(table[0].name, "old1");
        assert_eq!(table[1].name, "old2");
        assert_eq!(table[2].name, "fresh");
        assert_eq!(table[2].index, 3);
    }

    #[test]
    fn udf_params_and_body_are_persistent() {
        let (_, outcome) = resolve_source("name t; fn add(int a, int b) { int sum; }");
        assert!(outcome.ok());
        assert_eq!(outcome.globals.len(), 3);
        assert!(outcome.temps.is_empty());
        assert_eq!(outcome.globals[2].borrow().name, "sum");
    }

    #[test]
    fn resolution_is_idempotent() {
        let source =
            "name t; int x; begin gamemode { int y = x; if (y) { int z = y; } } ";
        let parse = drift_parser::parse(source).unwrap();
        let mut unit = parse.unit;
        let forms = FormMap::new();
        let first = run(&mut unit, &[], &forms);
        let second = run(&mut unit, &[], &forms);
        assert!(first.ok() && second.ok());
        assert_eq!(first.var_table(), second.var_table());
    }

    #[test]
    fn shadowing_a_form_is_a_notice_not_an_error() {
        let parse = drift_parser::parse("name t; int MyQuest; begin gamemode { }").unwrap();
        let mut unit = parse.unit;
        let mut forms = FormMap::new();
        forms.insert(drift_common::form::FormInfo {
            edid: "MyQuest".into(),
            form_id: 0x1234,
            kind: drift_common::form::FormKind::Quest,
            script_vars: vec![],
        });
        let outcome = run(&mut unit, &[], &forms);
        assert!(outcome.ok());
        assert_eq!(outcome.notices.len(), 1);
        assert!(outcome.notices[0].message.contains("shadows"));
    }

    #[test]
    fn lambda_initializer_marks_the_symbol() {
        let (_, outcome) =
            resolve_source("name t; ref f = fn(int a) -> a + 1; begin gamemode { }");
        assert!(outcome.ok());
        let sym = outcome.globals[0].borrow();
        let sig = sym.lambda.as_ref().expect("lambda signature");
        assert_eq!(sig.params, vec![Ty::Number]);
    }

    #[test]
    fn unresolved_identifier_stays_unannotated() {
        let (unit, outcome) = resolve_source("name t; int x; begin gamemode { x = SomeForm; }");
        assert!(outcome.ok());
        let StmtKind::Begin { body, .. } = &unit.body[1].kind else {
            panic!();
        };
        let StmtKind::Expression(expr) = &body.stmts[0].kind else {
            panic!();
        };
        let ExprKind::Assignment { value, .. } = &expr.kind else {
            panic!();
        };
        let ExprKind::Identifier { var, .. } = &value.kind else {
            panic!();
        };
        assert!(var.is_none());
    }
}
