//! Indented AST dump, used by `driftc ast` and by tests that pin tree
//! shapes without reaching into node internals.

use crate::ast::{
    Block, BlockMode, Expr, ExprKind, ForEachBinder, MembershipSet, ScriptUnit, Stmt, StmtKind,
};

/// Render a parsed unit as an indented tree, one node per line.
pub fn print_unit(unit: &ScriptUnit) -> String {
    let mut printer = TreePrinter::default();
    printer.line(&format!("Script {}", unit.name));
    printer.depth += 1;
    for directive in &unit.directives {
        let mut version = format!("{}", directive.major);
        if let Some(minor) = directive.minor {
            version.push_str(&format!(".{minor}"));
        }
        if let Some(beta) = directive.beta {
            version.push_str(&format!(".{beta}"));
        }
        printer.line(&format!("Version {} {}", directive.plugin, version));
    }
    for stmt in &unit.body {
        printer.stmt(stmt);
    }
    printer.out
}

/// Render a single expression subtree.
pub fn print_expr(expr: &Expr) -> String {
    let mut printer = TreePrinter::default();
    printer.expr(expr);
    printer.out
}

#[derive(Default)]
struct TreePrinter {
    out: String,
    depth: usize,
}

impl TreePrinter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn nested(&mut self, header: &str, f: impl FnOnce(&mut Self)) {
        self.line(header);
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Begin {
                blocktype,
                mode,
                body,
                ..
            } => {
                let header = match mode {
                    Some(BlockMode::Number(n)) => format!("Begin {blocktype}:{n}"),
                    Some(BlockMode::Ident(m)) => format!("Begin {blocktype}:{m}"),
                    None => format!("Begin {blocktype}"),
                };
                self.nested(&header, |p| p.block(body));
            }
            StmtKind::UdfDecl { name, params, body } => {
                let params: Vec<String> = params
                    .iter()
                    .map(|p| format!("{} {}", p.kind.keyword(), p.name))
                    .collect();
                let header = format!(
                    "Fn {}({})",
                    name.as_deref().unwrap_or("<anonymous>"),
                    params.join(", ")
                );
                self.nested(&header, |p| p.block(body));
            }
            StmtKind::VarDecl { kind, decls } => {
                self.nested(&format!("VarDecl {}", kind.keyword()), |p| {
                    for decl in decls {
                        match &decl.init {
                            Some(init) => {
                                p.nested(&format!("Declarator {}", decl.name), |p| p.expr(init))
                            }
                            None => p.line(&format!("Declarator {}", decl.name)),
                        }
                    }
                });
            }
            StmtKind::Expression(expr) => self.nested("Expression", |p| p.expr(expr)),
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                self.nested("For", |p| {
                    if let Some(init) = init {
                        p.nested("Init", |p| p.stmt(init));
                    }
                    if let Some(cond) = cond {
                        p.nested("Cond", |p| p.expr(cond));
                    }
                    if let Some(post) = post {
                        p.nested("Post", |p| p.stmt(post));
                    }
                    p.nested("Body", |p| p.block(body));
                });
            }
            StmtKind::ForEach {
                first,
                second,
                iterable,
                body,
            } => {
                let mut binders = binder_text(first);
                if let Some(second) = second {
                    binders.push_str(", ");
                    binders.push_str(&binder_text(second));
                }
                self.nested(&format!("ForEach [{binders}]"), |p| {
                    p.nested("In", |p| p.expr(iterable));
                    p.nested("Body", |p| p.block(body));
                });
            }
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.nested("If", |p| {
                    p.nested("Cond", |p| p.expr(cond));
                    p.nested("Then", |p| p.block(then_block));
                    if let Some(else_block) = else_block {
                        p.nested("Else", |p| p.block(else_block));
                    }
                });
            }
            StmtKind::Match {
                subject,
                arms,
                default,
            } => {
                self.nested("Match", |p| {
                    p.nested("Subject", |p| p.expr(subject));
                    for arm in arms {
                        let header = match &arm.binder {
                            Some((name, _)) => format!("Arm {name}::"),
                            None => "Arm".to_owned(),
                        };
                        p.nested(&header, |p| {
                            p.expr(&arm.expr);
                            p.nested("Body", |p| p.block(&arm.body));
                        });
                    }
                    if let Some(default) = default {
                        p.nested("Default", |p| p.block(default));
                    }
                });
            }
            StmtKind::Return { value } => match value {
                Some(value) => self.nested("Return", |p| p.expr(value)),
                None => self.line("Return"),
            },
            StmtKind::Continue => self.line("Continue"),
            StmtKind::Break => self.line("Break"),
            StmtKind::While { cond, body } => {
                self.nested("While", |p| {
                    p.nested("Cond", |p| p.expr(cond));
                    p.nested("Body", |p| p.block(body));
                });
            }
            StmtKind::Block(block) => self.nested("Block", |p| p.block(block)),
            StmtKind::ShowMessage { args } => {
                self.nested("ShowMessage", |p| {
                    for arg in args {
                        p.expr(arg);
                    }
                });
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Assignment { op, target, value } => {
                self.nested(&format!("Assign {}", op.symbol()), |p| {
                    p.expr(target);
                    p.expr(value);
                });
            }
            ExprKind::Ternary { cond, then, other } => {
                self.nested("Ternary", |p| {
                    p.expr(cond);
                    p.expr(then);
                    p.expr(other);
                });
            }
            ExprKind::Membership { negated, item, set } => {
                let header = if *negated { "NotIn" } else { "In" };
                self.nested(header, |p| {
                    p.expr(item);
                    match set {
                        MembershipSet::List(elems) => {
                            p.nested("List", |p| {
                                for elem in elems {
                                    p.expr(elem);
                                }
                            });
                        }
                        MembershipSet::Array(array) => p.nested("Array", |p| p.expr(array)),
                    }
                });
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.nested(&format!("Binary {}", op.symbol()), |p| {
                    p.expr(lhs);
                    p.expr(rhs);
                });
            }
            ExprKind::Unary {
                op,
                operand,
                postfix,
            } => {
                let header = if *postfix {
                    format!("Postfix {}", op.symbol())
                } else {
                    format!("Unary {}", op.symbol())
                };
                self.nested(&header, |p| p.expr(operand));
            }
            ExprKind::Subscript { base, index } => {
                self.nested("Subscript", |p| {
                    p.expr(base);
                    p.expr(index);
                });
            }
            ExprKind::Call { receiver, name, args, .. } => {
                self.nested(&format!("Call {name}"), |p| {
                    if let Some(receiver) = receiver {
                        p.nested("Receiver", |p| p.expr(receiver));
                    }
                    for arg in args {
                        p.expr(arg);
                    }
                });
            }
            ExprKind::Get { base, member, .. } => self.line(&format!("Get {base}.{member}")),
            ExprKind::Bool(value) => self.line(&format!("Bool {value}")),
            ExprKind::Number { value, is_int, .. } => {
                if *is_int {
                    self.line(&format!("Number {}", *value as i64));
                } else {
                    self.line(&format!("Number {value}"));
                }
            }
            ExprKind::Str(text) => self.line(&format!("String {text:?}")),
            ExprKind::Identifier { name, .. } => self.line(&format!("Identifier {name}")),
            ExprKind::ArrayLiteral { elems } => {
                self.nested("ArrayLiteral", |p| {
                    for elem in elems {
                        p.expr(elem);
                    }
                });
            }
            ExprKind::MapLiteral { elems } => {
                self.nested("MapLiteral", |p| {
                    for elem in elems {
                        p.expr(elem);
                    }
                });
            }
            ExprKind::Pair { key, value } => {
                self.nested("Pair", |p| {
                    p.expr(key);
                    p.expr(value);
                });
            }
            ExprKind::Grouping(inner) => self.nested("Grouping", |p| p.expr(inner)),
            ExprKind::Lambda { params, body } => {
                let params: Vec<String> = params
                    .iter()
                    .map(|p| format!("{} {}", p.kind.keyword(), p.name))
                    .collect();
                self.nested(&format!("Lambda ({})", params.join(", ")), |p| {
                    p.block(body)
                });
            }
            ExprKind::Null => self.line("Null"),
        }
    }
}

fn binder_text(binder: &ForEachBinder) -> String {
    match binder {
        ForEachBinder::Discard => "_".to_owned(),
        ForEachBinder::Named { kind, name, .. } => format!("{} {}", kind.keyword(), name),
    }
}
