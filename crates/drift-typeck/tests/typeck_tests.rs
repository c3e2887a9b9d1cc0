//! Type checker integration tests: the pipeline up to and including
//! checking (match lowering, resolution, call lowering first, as the
//! driver runs them).

use drift_common::cmd::CommandTable;
use drift_common::form::{FormInfo, FormKind, FormMap, RemoteVar};
use drift_common::script::VarKind;
use drift_parser::ast::ScriptUnit;
use drift_typeck::{check, TypeError, TypeckResult};

fn forms_fixture() -> FormMap {
    let mut forms = FormMap::new();
    forms.insert(FormInfo {
        edid: "MyQuest".into(),
        form_id: 0x0001_2345,
        kind: FormKind::Quest,
        script_vars: vec![RemoteVar {
            name: "counter".into(),
            kind: VarKind::Int,
            index: 1,
        }],
    });
    forms.insert(FormInfo {
        edid: "FootLocker".into(),
        form_id: 0x0001_2346,
        kind: FormKind::Container,
        script_vars: vec![],
    });
    forms.insert(FormInfo {
        edid: "PlayerRef".into(),
        form_id: 0x0000_0014,
        kind: FormKind::Actor,
        script_vars: vec![],
    });
    forms.insert(FormInfo {
        edid: "Caps001".into(),
        form_id: 0x0001_2347,
        kind: FormKind::Item,
        script_vars: vec![],
    });
    forms
}

fn check_source(source: &str) -> (ScriptUnit, TypeckResult) {
    let parse = drift_parser::parse(source).expect("lex failure");
    assert!(parse.ok(), "parse errors: {:?}", parse.errors());
    let mut unit = parse.unit;
    let table = CommandTable::core();
    let forms = forms_fixture();
    drift_passes::match_lower::run(&mut unit);
    let resolved = drift_passes::resolve::run(&mut unit, &[], &forms);
    assert!(resolved.ok(), "resolve errors: {:?}", resolved.errors);
    drift_passes::call_lower::run(&mut unit, &table, &forms);
    let result = check(&mut unit, &table, &forms);
    (unit, result)
}

fn single_error(source: &str) -> TypeError {
    let (_, result) = check_source(source);
    assert_eq!(
        result.errors.len(),
        1,
        "expected one error, got {:?}",
        result.errors
    );
    result.errors.into_iter().next().unwrap()
}

// ── Operators ──────────────────────────────────────────────────────────

#[test]
fn valid_arithmetic_passes() {
    let (_, result) = check_source("name t; int x; begin gamemode { x = x + 1; }");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn string_plus_array_is_an_operator_error() {
    let err = single_error(
        "name t; string s; array someArrayVariable; begin gamemode { s = \"text\" + someArrayVariable; }",
    );
    let TypeError::OperatorType { op, lhs, rhs, .. } = err else {
        panic!("expected operator error, got {err:?}");
    };
    assert_eq!(op, "+");
    assert_eq!(lhs, drift_common::ty::Ty::String);
    assert_eq!(rhs, Some(drift_common::ty::Ty::Array));
}

#[test]
fn increment_requires_a_numeric_variable() {
    let err = single_error("name t; string s; begin gamemode { s++; }");
    assert!(matches!(err, TypeError::OperatorType { op: "++", .. }));
}

// ── Conditions and loops ───────────────────────────────────────────────

#[test]
fn string_condition_is_rejected() {
    let err = single_error("name t; string s; begin gamemode { if (s) { } }");
    assert!(matches!(err, TypeError::ConditionType { .. }));
}

#[test]
fn break_outside_loop_is_rejected() {
    let err = single_error("name t; begin gamemode { break; }");
    assert!(matches!(
        err,
        TypeError::OutsideLoop {
            keyword: "break",
            ..
        }
    ));
}

#[test]
fn continue_inside_for_is_fine() {
    let (_, result) = check_source(
        "name t; begin gamemode { for (int i = 0; i < 3; i++) { if (i == 1) { continue; } } }",
    );
    assert!(result.ok(), "errors: {:?}", result.errors);
}

// ── Commands ───────────────────────────────────────────────────────────

#[test]
fn unknown_command_is_reported() {
    let err = single_error("name t; begin gamemode { FrobnicateQuux(); }");
    assert!(matches!(err, TypeError::UnknownCommand { .. }));
}

#[test]
fn arity_is_checked() {
    let err = single_error("name t; begin gamemode { AddItem(Caps001); }");
    assert!(matches!(err, TypeError::ArityMismatch { .. }));
}

#[test]
fn enum_constant_arguments_resolve() {
    let (unit, result) = check_source(
        "name t; double v; begin gamemode { v = PlayerRef.GetAV(strength); }",
    );
    assert!(result.ok(), "errors: {:?}", result.errors);
    // The bare identifier was rewritten into a fixed-width literal.
    use drift_parser::ast::{ExprKind, NumWidth, StmtKind};
    let StmtKind::Begin { body, .. } = &unit.body[1].kind else {
        panic!();
    };
    let StmtKind::Expression(expr) = &body.stmts[0].kind else {
        panic!();
    };
    let ExprKind::Assignment { value, .. } = &expr.kind else {
        panic!();
    };
    let ExprKind::Call { args, .. } = &value.kind else {
        panic!();
    };
    assert!(matches!(
        args[0].kind,
        ExprKind::Number {
            width: Some(NumWidth::Word),
            ..
        }
    ));
}

#[test]
fn form_category_predicate_rejects_wrong_category() {
    let err = single_error("name t; begin gamemode { SetStage(FootLocker, 10); }");
    let TypeError::FormCategory { form, .. } = err else {
        panic!("expected form category error, got {err:?}");
    };
    assert_eq!(form, "FootLocker");
}

#[test]
fn form_category_predicate_accepts_right_category() {
    let (_, result) = check_source("name t; begin gamemode { SetStage(MyQuest, 10); }");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn actor_accepts_as_container() {
    // Actors are containers for inventory-kinded parameters.
    let (_, result) =
        check_source("name t; begin gamemode { PlayerRef.AddItem(Caps001, 5); }");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn dot_receiver_must_be_form_like() {
    let err = single_error("name t; string s; begin gamemode { s.GetDead(); }");
    assert!(matches!(err, TypeError::DotReceiver { .. }));
}

#[test]
fn requirements_accumulate_extension_origins() {
    let (_, result) = check_source(
        "name t; array a; int n; begin gamemode { n = ar_Size(a); n = PlayerRef.GetDead(); }",
    );
    assert!(result.ok(), "errors: {:?}", result.errors);
    assert!(result.requirements.contains(&"drift".to_owned()));
    assert!(result.requirements.contains(&"nvse".to_owned()));
    // The base game is not a "requirement".
    assert!(!result.requirements.contains(&"base".to_owned()));
}

// ── Member access ──────────────────────────────────────────────────────

#[test]
fn member_access_resolves_remote_variable() {
    let (_, result) =
        check_source("name t; int n; begin gamemode { n = MyQuest.counter; }");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn member_access_on_unscripted_form_is_rejected() {
    let err = single_error("name t; int n; begin gamemode { n = FootLocker.counter; }");
    assert!(matches!(err, TypeError::MemberNotScripted { .. }));
}

#[test]
fn member_access_unknown_variable_is_rejected() {
    let err = single_error("name t; int n; begin gamemode { n = MyQuest.missing; }");
    assert!(matches!(err, TypeError::NoMemberVariable { .. }));
}

// ── Lambdas ────────────────────────────────────────────────────────────

#[test]
fn lambda_call_types_from_its_signature() {
    let (_, result) = check_source(
        "name t; int n; ref f = fn(int a) -> a + 1; begin gamemode { n = f(5); }",
    );
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn lambda_arity_is_checked() {
    let err = single_error(
        "name t; ref f = fn(int a) -> a + 1; begin gamemode { f(1, 2); }",
    );
    assert!(matches!(err, TypeError::LambdaArity { .. }));
}

#[test]
fn lambda_argument_types_are_checked() {
    let err = single_error(
        "name t; ref f = fn(int a) -> a + 1; begin gamemode { f(\"no\"); }",
    );
    assert!(matches!(err, TypeError::LambdaArgType { .. }));
}

#[test]
fn lambda_bindings_are_write_once() {
    let err = single_error(
        "name t; ref f = fn(int a) -> a + 1; begin gamemode { f = null; }",
    );
    assert!(matches!(err, TypeError::AssignToLambda { .. }));
}

// ── Script structure ───────────────────────────────────────────────────

#[test]
fn mixed_function_and_event_blocks_is_rejected() {
    let (_, result) =
        check_source("name t; fn helper(int a) { } begin gamemode { }");
    assert!(result
        .errors
        .iter()
        .any(|e| matches!(e, TypeError::MixedScriptKind { .. })));
}

#[test]
fn duplicate_blocks_are_rejected() {
    let (_, result) = check_source("name t; begin gamemode { } begin gamemode { }");
    assert!(result
        .errors
        .iter()
        .any(|e| matches!(e, TypeError::DuplicateBlock { .. })));
}

#[test]
fn same_blocktype_different_modes_is_fine() {
    let (_, result) =
        check_source("name t; begin menumode:1012 { } begin menumode:1023 { }");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

#[test]
fn unknown_block_type_is_rejected() {
    let (_, result) = check_source("name t; begin sneezemode { }");
    assert!(result
        .errors
        .iter()
        .any(|e| matches!(e, TypeError::UnknownBlockType { .. })));
}

#[test]
fn return_types_must_agree_across_sites() {
    let (_, result) = check_source(
        "name t; int x; fn pick(int a) { if (a) { return 1; } return \"no\"; }",
    );
    assert!(result
        .errors
        .iter()
        .any(|e| matches!(e, TypeError::ReturnTypeMismatch { .. })));
}

#[test]
fn event_blocks_cannot_return_values() {
    let err = single_error("name t; begin gamemode { return 5; }");
    assert!(matches!(err, TypeError::ReturnValueInEventBlock { .. }));
}

#[test]
fn bare_return_in_event_block_is_fine() {
    let (_, result) = check_source("name t; begin gamemode { return; }");
    assert!(result.ok(), "errors: {:?}", result.errors);
}

// ── Error continuation ─────────────────────────────────────────────────

#[test]
fn checking_continues_past_a_bad_statement() {
    let (_, result) = check_source(
        "name t; string s; array a; begin gamemode { s = s + a; s = 5; BogusCmd(); }",
    );
    // Three independent errors from three statements.
    assert_eq!(result.errors.len(), 3, "errors: {:?}", result.errors);
}

#[test]
fn every_expression_is_typed_after_a_clean_check() {
    use drift_parser::ast::StmtKind;
    let (unit, result) =
        check_source("name t; int x; begin gamemode { x = x * 2 + 1; }");
    assert!(result.ok());
    let StmtKind::Begin { body, .. } = &unit.body[1].kind else {
        panic!();
    };
    let StmtKind::Expression(expr) = &body.stmts[0].kind else {
        panic!();
    };
    assert_ne!(expr.ty, drift_common::ty::Ty::Invalid);
}
