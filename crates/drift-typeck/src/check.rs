//! The type checker: assigns a structural type to every expression node,
//! validates operator applicability, argument compatibility against command
//! signatures, loop nesting, return-type consistency, and block-structure
//! rules, and accumulates the compiled unit's plugin requirements.
//!
//! Errors are collected with best-effort continuation: a failed statement
//! is skipped and checking resumes with the next one.

use std::collections::BTreeSet;
use std::sync::Arc;

use drift_common::cmd::{intrinsics, CommandSig, CommandTable, ParamKind, ParseConvention};
use drift_common::fold;
use drift_common::form::{FormResolver, RemoteVar};
use drift_common::script::{block_type_code, VarKind};
use drift_common::span::Span;
use drift_common::sym::LambdaSig;
use drift_common::ty::Ty;
use drift_parser::ast::{
    Block, Expr, ExprKind, MembershipSet, ScriptUnit, Stmt, StmtKind, UnOp,
};
use rustc_hash::FxHashSet;

use crate::error::TypeError;
use crate::{enums, ops};

/// Outcome of the checking pass.
pub struct TypeckResult {
    pub errors: Vec<TypeError>,
    /// Plugin identities the compiled script requires: the compiler's own,
    /// plus the owning extension of every command invoked (the base game
    /// is not a requirement).
    pub requirements: Vec<String>,
}

impl TypeckResult {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn check(
    unit: &mut ScriptUnit,
    table: &CommandTable,
    forms: &dyn FormResolver,
) -> TypeckResult {
    let mut checker = Checker {
        table,
        forms,
        errors: Vec::new(),
        loop_depth: 0,
        fn_stack: Vec::new(),
        last_lambda_ret: None,
        requirements: BTreeSet::new(),
    };
    checker
        .requirements
        .insert(drift_common::cmd::COMPILER_IDENTITY.to_owned());

    checker.check_structure(unit);
    for stmt in &mut unit.body {
        if let Err(error) = checker.check_stmt(stmt) {
            checker.errors.push(error);
        }
    }

    TypeckResult {
        errors: checker.errors,
        requirements: checker.requirements.into_iter().collect(),
    }
}

type CResult<T> = Result<T, TypeError>;

/// Per-function return-type context; one frame per UDF or lambda body.
struct FnCtx {
    is_function: bool,
    ret: Option<(Ty, Span)>,
}

struct Checker<'a> {
    table: &'a CommandTable,
    forms: &'a dyn FormResolver,
    errors: Vec<TypeError>,
    loop_depth: u32,
    fn_stack: Vec<FnCtx>,
    /// Return type inferred for the most recently checked lambda body.
    last_lambda_ret: Option<Ty>,
    requirements: BTreeSet<String>,
}

impl Checker<'_> {
    // ── Up-front structure checks ────────────────────────────────────────

    /// Duplicate-block and mixed function/event detection, performed once
    /// before statement checking.
    fn check_structure(&mut self, unit: &ScriptUnit) {
        let mut seen_blocks: FxHashSet<String> = FxHashSet::default();
        let mut function_span: Option<Span> = None;
        let mut has_blocks = false;

        for stmt in &unit.body {
            match &stmt.kind {
                StmtKind::Begin {
                    blocktype,
                    blocktype_span,
                    mode,
                    ..
                } => {
                    has_blocks = true;
                    if block_type_code(blocktype).is_none() {
                        self.errors.push(TypeError::UnknownBlockType {
                            name: blocktype.clone(),
                            span: *blocktype_span,
                        });
                    }
                    let key = format!("{}:{:?}", fold(blocktype), mode);
                    if !seen_blocks.insert(key) {
                        self.errors.push(TypeError::DuplicateBlock {
                            blocktype: blocktype.clone(),
                            span: *blocktype_span,
                        });
                    }
                }
                StmtKind::UdfDecl { .. } => {
                    if function_span.is_some() {
                        self.errors
                            .push(TypeError::MultipleFunctions { span: stmt.span });
                    }
                    function_span = Some(stmt.span);
                }
                _ => {}
            }
        }

        if has_blocks {
            if let Some(span) = function_span {
                self.errors.push(TypeError::MixedScriptKind { span });
            }
        }
    }

    // ── Statements ───────────────────────────────────────────────────────

    /// Check every statement of a block, catching errors per statement so
    /// one bad statement does not hide the rest.
    fn check_block(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            if let Err(error) = self.check_stmt(stmt) {
                self.errors.push(error);
            }
        }
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> CResult<()> {
        match &mut stmt.kind {
            StmtKind::Begin { body, .. } => {
                self.fn_stack.push(FnCtx {
                    is_function: false,
                    ret: None,
                });
                self.check_block(body);
                self.fn_stack.pop();
                Ok(())
            }
            StmtKind::UdfDecl { body, .. } => {
                self.fn_stack.push(FnCtx {
                    is_function: true,
                    ret: None,
                });
                self.check_block(body);
                self.fn_stack.pop();
                Ok(())
            }
            StmtKind::VarDecl { kind, decls } => {
                let kind = *kind;
                for decl in decls {
                    let Some(init) = &mut decl.init else { continue };
                    let ty = self.check_expr(init)?;
                    if ty == Ty::Lambda {
                        // Refine the symbol's return type from the body.
                        if let (Some(var), ExprKind::Lambda { params, .. }) =
                            (&decl.var, &init.kind)
                        {
                            let ret = self.last_lambda_ret.take().unwrap_or(Ty::Ambiguous);
                            var.borrow_mut().lambda = Some(LambdaSig {
                                params: params
                                    .iter()
                                    .map(|p| Ty::var_of(p.kind).basic())
                                    .collect(),
                                ret,
                            });
                        }
                    }
                    if !decl_accepts(kind, ty) {
                        return Err(TypeError::DeclInit {
                            name: decl.name.clone(),
                            kind: kind.keyword(),
                            found: ty,
                            span: init.span,
                        });
                    }
                }
                Ok(())
            }
            StmtKind::Expression(expr) => {
                self.check_expr(expr)?;
                Ok(())
            }
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                if let Some(init) = init {
                    self.check_stmt(init)?;
                }
                if let Some(cond) = cond {
                    self.check_condition(cond)?;
                }
                if let Some(post) = post {
                    self.check_stmt(post)?;
                }
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
                Ok(())
            }
            StmtKind::ForEach {
                second,
                iterable,
                body,
                ..
            } => {
                let ty = self.check_expr(iterable)?;
                let basic = ty.basic();
                let pair_form = second.is_some();
                let iterable_ok = match basic {
                    Ty::Array | Ty::Ambiguous => true,
                    Ty::String => !pair_form,
                    _ => false,
                };
                if !iterable_ok {
                    return Err(TypeError::IterableType {
                        found: ty,
                        span: iterable.span,
                    });
                }
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
                Ok(())
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.check_condition(cond)?;
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
                Ok(())
            }
            StmtKind::Match {
                subject,
                arms,
                default,
            } => {
                // Matches are normally lowered before checking; handle the
                // standalone shape anyway.
                self.check_expr(subject)?;
                for arm in arms {
                    self.check_expr(&mut arm.expr)?;
                    self.check_block(&mut arm.body);
                }
                if let Some(default) = default {
                    self.check_block(default);
                }
                Ok(())
            }
            StmtKind::Return { value } => {
                let span = stmt.span;
                let Some(value) = value else { return Ok(()) };
                let ty = self.check_expr(value)?;
                self.record_return(ty, span)
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(TypeError::OutsideLoop {
                        keyword: "continue",
                        span: stmt.span,
                    });
                }
                Ok(())
            }
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    return Err(TypeError::OutsideLoop {
                        keyword: "break",
                        span: stmt.span,
                    });
                }
                Ok(())
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond)?;
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
                Ok(())
            }
            StmtKind::Block(block) => {
                self.check_block(block);
                Ok(())
            }
            StmtKind::ShowMessage { args } => {
                let span = stmt.span;
                let sig = self
                    .table
                    .get(intrinsics::SHOW_MESSAGE)
                    .ok_or_else(|| TypeError::UnknownCommand {
                        name: intrinsics::SHOW_MESSAGE.to_owned(),
                        span,
                    })?;
                self.check_args(&sig, args, span)?;
                self.require(&sig);
                Ok(())
            }
        }
    }

    /// Record a valued return against the innermost function context.
    /// The first return establishes the type; later incompatible returns
    /// are errors citing the earlier site.
    fn record_return(&mut self, ty: Ty, span: Span) -> CResult<()> {
        let Some(ctx) = self.fn_stack.last_mut() else {
            return Ok(());
        };
        if !ctx.is_function {
            return Err(TypeError::ReturnValueInEventBlock { span });
        }
        let basic = ty.basic();
        match ctx.ret {
            None => {
                ctx.ret = Some((basic, span));
                Ok(())
            }
            Some((expected, earlier)) => {
                if expected == basic || expected == Ty::Ambiguous || basic == Ty::Ambiguous {
                    Ok(())
                } else {
                    Err(TypeError::ReturnTypeMismatch {
                        expected,
                        found: basic,
                        earlier,
                        span,
                    })
                }
            }
        }
    }

    fn check_condition(&mut self, cond: &mut Expr) -> CResult<()> {
        let ty = self.check_expr(cond)?;
        if !ty.is_truthy() {
            return Err(TypeError::ConditionType {
                found: ty,
                span: cond.span,
            });
        }
        Ok(())
    }

    // ── Expressions ──────────────────────────────────────────────────────

    fn check_expr(&mut self, expr: &mut Expr) -> CResult<Ty> {
        let span = expr.span;
        let ty = match &mut expr.kind {
            ExprKind::Number { .. } => Ty::Number,
            ExprKind::Str(_) => Ty::String,
            ExprKind::Bool(_) => Ty::Boolean,
            ExprKind::Null => Ty::Form,
            ExprKind::Grouping(inner) => self.check_expr(inner)?,
            ExprKind::Pair { key, value } => {
                self.check_expr(key)?;
                self.check_expr(value)?;
                Ty::Pair
            }
            ExprKind::ArrayLiteral { elems } => {
                for elem in elems {
                    self.check_expr(elem)?;
                }
                Ty::Array
            }
            ExprKind::MapLiteral { elems } => {
                for elem in elems {
                    if !matches!(elem.kind, ExprKind::Pair { .. }) {
                        return Err(TypeError::MapElement { span: elem.span });
                    }
                    self.check_expr(elem)?;
                }
                Ty::Array
            }
            ExprKind::Identifier { name, var, form } => {
                if let Some(var) = var {
                    let var = var.borrow();
                    if var.lambda.is_some() {
                        Ty::Lambda
                    } else {
                        Ty::var_of(var.kind)
                    }
                } else if let Some(form) = form {
                    form_read_ty(form.kind)
                } else if let Some(found) = self.forms.by_name(name) {
                    let ty = form_read_ty(found.kind);
                    *form = Some(found);
                    ty
                } else {
                    return Err(TypeError::UnresolvedIdentifier {
                        name: name.clone(),
                        span,
                    });
                }
            }
            ExprKind::Unary {
                op,
                operand,
                postfix: _,
            } => {
                let op = *op;
                let operand_ty = self.check_expr(operand)?;
                if matches!(op, UnOp::Inc | UnOp::Dec) {
                    // Increment needs an actual numeric variable.
                    if !matches!(operand_ty, Ty::NumberVar | Ty::Ambiguous) {
                        return Err(TypeError::OperatorType {
                            op: op.symbol(),
                            lhs: operand_ty,
                            rhs: None,
                            span,
                        });
                    }
                    Ty::Number
                } else {
                    let result = ops::unary_result(op, operand_ty);
                    if result == Ty::Invalid {
                        return Err(TypeError::OperatorType {
                            op: op.symbol(),
                            lhs: operand_ty.basic(),
                            rhs: None,
                            span,
                        });
                    }
                    result
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let op = *op;
                let lhs_ty = self.check_expr(lhs)?;
                let rhs_ty = self.check_expr(rhs)?;
                let result = ops::binary_result(op, lhs_ty, rhs_ty);
                if result == Ty::Invalid {
                    return Err(TypeError::OperatorType {
                        op: op.symbol(),
                        lhs: lhs_ty.basic(),
                        rhs: Some(rhs_ty.basic()),
                        span,
                    });
                }
                result
            }
            ExprKind::Assignment { op, target, value } => {
                let op = *op;
                let target_ty = self.check_expr(target)?;
                let value_ty = self.check_expr(value)?;
                if let ExprKind::Identifier { name, var: Some(var), .. } = &target.kind {
                    if var.borrow().lambda.is_some() {
                        return Err(TypeError::AssignToLambda {
                            name: name.clone(),
                            span: target.span,
                        });
                    }
                }
                let result = ops::assign_result(op, target_ty, value_ty);
                if result == Ty::Invalid {
                    return Err(TypeError::OperatorType {
                        op: op.symbol(),
                        lhs: target_ty,
                        rhs: Some(value_ty.basic()),
                        span,
                    });
                }
                result
            }
            ExprKind::Ternary { cond, then, other } => {
                self.check_condition(cond)?;
                let then_ty = self.check_expr(then)?.basic();
                let other_ty = self.check_expr(other)?.basic();
                if then_ty == other_ty {
                    then_ty
                } else {
                    Ty::Ambiguous
                }
            }
            ExprKind::Membership { item, set, .. } => {
                let item_ty = self.check_expr(item)?;
                match set {
                    MembershipSet::List(elems) => {
                        for elem in elems.iter_mut() {
                            let elem_ty = self.check_expr(elem)?;
                            if ops::binary_result(
                                drift_parser::ast::BinOp::Eq,
                                item_ty,
                                elem_ty,
                            ) == Ty::Invalid
                            {
                                return Err(TypeError::MembershipElement {
                                    item: item_ty.basic(),
                                    element: elem_ty.basic(),
                                    span: elem.span,
                                });
                            }
                        }
                    }
                    MembershipSet::Array(array) => {
                        let array_ty = self.check_expr(array)?;
                        if !matches!(array_ty.basic(), Ty::Array | Ty::Ambiguous) {
                            return Err(TypeError::OperatorType {
                                op: "in",
                                lhs: item_ty.basic(),
                                rhs: Some(array_ty.basic()),
                                span,
                            });
                        }
                    }
                }
                Ty::Boolean
            }
            ExprKind::Subscript { base, index } => {
                let base_ty = self.check_expr(base)?;
                let index_ty = self.check_expr(index)?;
                let result = ops::subscript_result(base_ty, index_ty);
                if result == Ty::Invalid {
                    return Err(TypeError::OperatorType {
                        op: "[]",
                        lhs: base_ty.basic(),
                        rhs: Some(index_ty.basic()),
                        span,
                    });
                }
                result
            }
            ExprKind::Lambda { body, .. } => {
                self.fn_stack.push(FnCtx {
                    is_function: true,
                    ret: None,
                });
                let saved_depth = std::mem::take(&mut self.loop_depth);
                self.check_block(body);
                self.loop_depth = saved_depth;
                let frame = self.fn_stack.pop().expect("lambda frame was pushed");
                self.last_lambda_ret = frame.ret.map(|(ty, _)| ty);
                Ty::Lambda
            }
            ExprKind::Get { .. } => self.check_get(expr)?,
            ExprKind::Call { .. } => self.check_call(expr)?,
        };
        expr.ty = ty;
        Ok(ty)
    }

    /// `form.variable`: the base must name an object form with an attached
    /// script declaring the member; the result carries the member's
    /// variable-flavored type.
    fn check_get(&mut self, expr: &mut Expr) -> CResult<Ty> {
        let ExprKind::Get {
            base,
            base_span,
            base_form,
            member,
            member_span,
            remote,
        } = &mut expr.kind
        else {
            unreachable!("check_get called on a non-get expression");
        };
        let form = self
            .forms
            .by_name(base)
            .ok_or_else(|| TypeError::UnknownForm {
                name: base.clone(),
                span: *base_span,
            })?;
        if !form.kind.supports_members() {
            return Err(TypeError::InvalidMemberBase {
                name: base.clone(),
                span: *base_span,
            });
        }
        if form.script_vars.is_empty() {
            return Err(TypeError::MemberNotScripted {
                name: base.clone(),
                span: *base_span,
            });
        }
        let found: RemoteVar = form
            .member(member)
            .cloned()
            .ok_or_else(|| TypeError::NoMemberVariable {
                form: base.clone(),
                member: member.clone(),
                span: *member_span,
            })?;
        let ty = Ty::var_of(found.kind);
        *remote = Some(found);
        *base_form = Some(form);
        Ok(ty)
    }

    /// Commands, the special call-likes, and rewritten callable calls.
    fn check_call(&mut self, expr: &mut Expr) -> CResult<Ty> {
        let span = expr.span;
        let ExprKind::Call {
            receiver,
            name,
            name_span,
            args,
            sig,
            ..
        } = &mut expr.kind
        else {
            unreachable!("check_call called on a non-call expression");
        };

        if let Some(recv) = receiver {
            if !matches!(recv.kind, ExprKind::Identifier { .. }) {
                return Err(TypeError::ReceiverNotSimple { span: recv.span });
            }
            let recv_ty = self.check_expr(recv)?;
            if !matches!(recv_ty.basic(), Ty::Form | Ty::Ambiguous) {
                return Err(TypeError::DotReceiver {
                    ty: recv_ty,
                    span: recv.span,
                });
            }
        }

        // The call-like commands validate lambda callees structurally.
        let folded = fold(name);
        let callee_index = match folded.as_str() {
            "call" => Some(0),
            "callafterseconds" | "callafterframes" | "callforseconds" => Some(1),
            _ => None,
        };

        let resolved = self
            .table
            .get(name)
            .ok_or_else(|| TypeError::UnknownCommand {
                name: name.clone(),
                span: *name_span,
            })?;

        let ty = if let Some(callee_index) = callee_index {
            self.check_call_like(&resolved, callee_index, args, span)?
        } else {
            self.check_args(&resolved, args, span)?;
            resolved.ret.ty()
        };

        // `SetFunctionValue` is a return site: fold its argument type into
        // the innermost function's return consistency check.
        if folded == fold(intrinsics::SET_FUNCTION_VALUE) {
            if let Some(arg) = args.first() {
                let arg_ty = arg.ty;
                self.require(&resolved);
                *sig = Some(resolved);
                self.record_return(arg_ty, span)?;
                return Ok(ty);
            }
        }

        self.require(&resolved);
        *sig = Some(resolved);
        Ok(ty)
    }

    /// `Call`/`CallAfterSeconds`/... : if the callee is a lambda-typed
    /// symbol, the trailing arguments are validated against the lambda's
    /// captured signature and the call takes its return type; otherwise the
    /// result is the wildcard type.
    fn check_call_like(
        &mut self,
        sig: &Arc<CommandSig>,
        callee_index: usize,
        args: &mut [Expr],
        span: Span,
    ) -> CResult<Ty> {
        if args.len() <= callee_index {
            return Err(TypeError::ArityMismatch {
                name: sig.name.clone(),
                required: callee_index + 1,
                max: sig.params.len(),
                found: args.len(),
                span,
            });
        }

        // Leading numeric arguments (delay seconds/frames).
        for arg in args[..callee_index].iter_mut() {
            let ty = self.check_expr(arg)?;
            if !ParamKind::Number.accepts(ty) {
                return Err(TypeError::ArgType {
                    name: sig.name.clone(),
                    index: 0,
                    expected: ParamKind::Number,
                    found: ty,
                    span: arg.span,
                });
            }
        }

        let (callee, trailing) = args[callee_index..]
            .split_first_mut()
            .expect("bounds checked above");
        let callee_ty = self.check_expr(callee)?;

        let lambda_sig = match &callee.kind {
            ExprKind::Identifier { var: Some(var), .. } => var.borrow().lambda.clone(),
            _ => None,
        };

        if let Some(lambda) = lambda_sig {
            if trailing.len() != lambda.params.len() {
                return Err(TypeError::LambdaArity {
                    expected: lambda.params.len(),
                    found: trailing.len(),
                    span,
                });
            }
            for (index, (arg, &expected)) in
                trailing.iter_mut().zip(lambda.params.iter()).enumerate()
            {
                let found = self.check_expr(arg)?.basic();
                if found != expected && found != Ty::Ambiguous && expected != Ty::Ambiguous {
                    return Err(TypeError::LambdaArgType {
                        index,
                        expected,
                        found,
                        span: arg.span,
                    });
                }
            }
            return Ok(lambda.ret);
        }

        if !ParamKind::Callable.accepts(callee_ty) {
            return Err(TypeError::ArgType {
                name: sig.name.clone(),
                index: callee_index,
                expected: ParamKind::Callable,
                found: callee_ty,
                span: callee.span,
            });
        }
        for arg in trailing {
            self.check_expr(arg)?;
        }
        Ok(Ty::Ambiguous)
    }

    /// Positional argument checking against a command signature, including
    /// the two default-parse conventions: bare identifiers in enum
    /// positions resolve as named constants first, and form-valued
    /// arguments must pass the parameter's form-category predicate
    /// (tolerated on optional parameters).
    fn check_args(&mut self, sig: &Arc<CommandSig>, args: &mut [Expr], span: Span) -> CResult<()> {
        let required = sig.required_count();
        if args.len() < required || args.len() > sig.params.len() {
            return Err(TypeError::ArityMismatch {
                name: sig.name.clone(),
                required,
                max: sig.params.len(),
                found: args.len(),
                span,
            });
        }

        for (index, (arg, param)) in args.iter_mut().zip(sig.params.iter()).enumerate() {
            // Named enum constants come first, before ordinary resolution.
            if param.kind.is_enum() && sig.convention == ParseConvention::Default {
                if let ExprKind::Identifier {
                    name, var: None, ..
                } = &arg.kind
                {
                    if let Some((value, width)) = enums::resolve(param.kind, name) {
                        *arg = Expr::typed(
                            ExprKind::Number {
                                value: value as f64,
                                is_int: true,
                                width: Some(width),
                            },
                            arg.span,
                            Ty::Number,
                        );
                        continue;
                    }
                }
            }

            let ty = self.check_expr(arg)?;
            if !param.kind.accepts(ty) {
                return Err(TypeError::ArgType {
                    name: sig.name.clone(),
                    index,
                    expected: param.kind,
                    found: ty,
                    span: arg.span,
                });
            }

            // Form-category narrowing against the resolved form itself.
            if param.kind.is_form() {
                if let ExprKind::Identifier {
                    form: Some(form), ..
                } = &arg.kind
                {
                    if !form.kind.matches_param(param.kind) && !param.optional {
                        return Err(TypeError::FormCategory {
                            name: sig.name.clone(),
                            index,
                            expected: param.kind,
                            form: form.edid.clone(),
                            span: arg.span,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn require(&mut self, sig: &CommandSig) {
        if sig.origin != "base" {
            self.requirements.insert(sig.origin.clone());
        }
    }
}

/// Read type of a bare form reference: globals read as numbers, everything
/// else as a form value.
fn form_read_ty(kind: drift_common::form::FormKind) -> Ty {
    if kind == drift_common::form::FormKind::Global {
        Ty::Number
    } else {
        Ty::Form
    }
}

/// Whether an initializer type fits a declared variable kind.
fn decl_accepts(kind: VarKind, ty: Ty) -> bool {
    let ty = ty.basic();
    if ty == Ty::Ambiguous {
        return true;
    }
    match kind {
        VarKind::Int | VarKind::Double => matches!(ty, Ty::Number | Ty::Boolean),
        VarKind::String => ty == Ty::String,
        VarKind::Array => matches!(ty, Ty::Array | Ty::Pair),
        VarKind::Ref => matches!(ty, Ty::Form | Ty::Lambda),
    }
}

