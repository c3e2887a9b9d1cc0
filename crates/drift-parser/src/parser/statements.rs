//! Statement-level grammar: blocks, declarations, control flow, `match`.

use drift_common::fold;
use drift_common::script::VarKind;
use drift_common::token::TokenKind;

use crate::ast::{
    Block, BlockMode, Expr, ExprKind, ForEachBinder, MatchArm, ParamDecl, Stmt, StmtKind,
    VarDeclarator,
};
use crate::error::ParseError;

use super::{Parser, PResult};

impl Parser {
    // ── Blocks ───────────────────────────────────────────────────────────

    /// `{ stmt* }` with statement-granular error recovery.
    pub(crate) fn parse_block(&mut self) -> PResult<Block> {
        let open = self.expect(TokenKind::LBrace, "to open a block")?.span;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            let before = self.position();
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    if self.position() == before {
                        self.advance();
                    }
                    self.synchronize();
                }
            }
        }
        let close = self.expect(TokenKind::RBrace, "to close the block")?.span;
        Ok(Block {
            stmts,
            span: open.merge(close),
        })
    }

    pub(crate) fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.kind() {
            kind if kind.is_type_keyword() => self.parse_var_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Match => self.parse_match(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Continue => {
                let start = self.advance().span;
                let end = self.expect(TokenKind::Semicolon, "after `continue`")?.span;
                Ok(Stmt::new(StmtKind::Continue, start.merge(end)))
            }
            TokenKind::Break => {
                let start = self.advance().span;
                let end = self.expect(TokenKind::Semicolon, "after `break`")?.span;
                Ok(Stmt::new(StmtKind::Break, start.merge(end)))
            }
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Stmt::new(StmtKind::Block(block), span))
            }
            _ => self.parse_expression_stmt(),
        }
    }

    fn parse_expression_stmt(&mut self) -> PResult<Stmt> {
        let expr = self.parse_expression()?;
        let end = self
            .expect(TokenKind::Semicolon, "after the expression")?
            .span;
        let span = expr.span.merge(end);

        // The vanilla message statement gets its own node so the encoder
        // can apply the default argument convention.
        if let ExprKind::Call {
            receiver: None,
            name,
            args,
            ..
        } = &expr.kind
        {
            if fold(name) == "showmessage" {
                let args = args.clone();
                return Ok(Stmt::new(StmtKind::ShowMessage { args }, span));
            }
        }
        Ok(Stmt::new(StmtKind::Expression(expr), span))
    }

    // ── Declarations ─────────────────────────────────────────────────────

    /// `int x = 5, y;` -- one or more declarators sharing a declared type.
    pub(crate) fn parse_var_decl(&mut self) -> PResult<Stmt> {
        let type_token = self.advance();
        let kind = var_kind(type_token.kind)
            .ok_or_else(|| ParseError::new("expected a type keyword", type_token.span))?;
        let mut decls = Vec::new();
        loop {
            let (name, name_span) = self.expect_ident("in the declaration")?;
            let init = if self.eat(TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            decls.push(VarDeclarator {
                name,
                name_span,
                init,
                var: None,
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let end = self
            .expect(TokenKind::Semicolon, "after the declaration")?
            .span;
        Ok(Stmt::new(
            StmtKind::VarDecl { kind, decls },
            type_token.span.merge(end),
        ))
    }

    /// `begin <blocktype>[:mode] { ... }`
    pub(crate) fn parse_begin(&mut self) -> PResult<Stmt> {
        let start = self.advance().span;
        let (blocktype, blocktype_span) = self.expect_ident("after `begin`")?;
        let mode = if self.eat(TokenKind::Colon) {
            Some(self.parse_block_mode()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(Stmt::new(
            StmtKind::Begin {
                blocktype,
                blocktype_span,
                mode,
                body,
            },
            span,
        ))
    }

    fn parse_block_mode(&mut self) -> PResult<BlockMode> {
        match self.kind() {
            TokenKind::IntLiteral => {
                let token = self.advance();
                match token.value {
                    drift_common::token::TokenValue::Int(v) if v >= 0 => {
                        Ok(BlockMode::Number(v as u32))
                    }
                    _ => Err(ParseError::new("invalid block mode", token.span)),
                }
            }
            TokenKind::Ident => {
                let (name, _) = self.expect_ident("as the block mode")?;
                Ok(BlockMode::Ident(name))
            }
            _ => Err(self.error_here(format!(
                "expected a number or identifier block mode, found {}",
                self.kind().describe()
            ))),
        }
    }

    /// `fn [name](params) { ... }` or `fn [name](params) -> expr;`
    pub(crate) fn parse_udf(&mut self) -> PResult<Stmt> {
        let start = self.advance().span;
        let name = if self.check(TokenKind::Ident) {
            Some(self.expect_ident("as the function name")?.0)
        } else {
            None
        };
        let params = self.parse_fn_params()?;
        let (body, arrow) = self.parse_fn_body()?;
        let end = if arrow {
            self.expect(TokenKind::Semicolon, "after the function body")?
                .span
        } else {
            body.span
        };
        Ok(Stmt::new(
            StmtKind::UdfDecl { name, params, body },
            start.merge(end),
        ))
    }

    /// `(type ident, ...)` parameter list for functions and lambdas.
    pub(crate) fn parse_fn_params(&mut self) -> PResult<Vec<ParamDecl>> {
        self.expect(TokenKind::LParen, "to open the parameter list")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let type_token = self.advance();
                let kind = var_kind(type_token.kind).ok_or_else(|| {
                    ParseError::new("expected a parameter type keyword", type_token.span)
                })?;
                let (name, span) = self.expect_ident("as the parameter name")?;
                params.push(ParamDecl {
                    kind,
                    name,
                    span,
                    var: None,
                });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "to close the parameter list")?;
        Ok(params)
    }

    /// A braced function body, or the `-> expr` shorthand whose one
    /// statement is `SetFunctionValue(expr);`. Returns whether the
    /// shorthand was used (the caller owns the trailing `;` if so).
    pub(crate) fn parse_fn_body(&mut self) -> PResult<(Block, bool)> {
        if self.eat(TokenKind::Arrow) {
            let value = self.parse_expression()?;
            let span = value.span;
            let call = Expr::new(
                ExprKind::Call {
                    receiver: None,
                    name: drift_common::cmd::intrinsics::SET_FUNCTION_VALUE.to_owned(),
                    name_span: span,
                    args: vec![value],
                    sig: None,
                    callee_var: None,
                },
                span,
            );
            let body = Block {
                stmts: vec![Stmt::new(StmtKind::Expression(call), span)],
                span,
            };
            return Ok((body, true));
        }
        let body = self.parse_block()?;
        Ok((body, false))
    }

    // ── Control flow ─────────────────────────────────────────────────────

    fn parse_if(&mut self) -> PResult<Stmt> {
        let start = self.advance().span;
        self.expect(TokenKind::LParen, "after `if`")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen, "after the condition")?;
        let then_block = self.parse_block()?;
        let mut span = start.merge(then_block.span);

        let else_block = if self.eat(TokenKind::Else) {
            if self.check(TokenKind::If) {
                // `else if` chains nest as a block holding a single `If`.
                let nested = self.parse_if()?;
                span = span.merge(nested.span);
                Some(Block {
                    span: nested.span,
                    stmts: vec![nested],
                })
            } else {
                let block = self.parse_block()?;
                span = span.merge(block.span);
                Some(block)
            }
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If {
                cond,
                then_block,
                else_block,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let start = self.advance().span;
        self.expect(TokenKind::LParen, "after `while`")?;
        let cond = self.parse_expression()?;
        self.expect(TokenKind::RParen, "after the condition")?;
        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(Stmt::new(StmtKind::While { cond, body }, span))
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let start = self.advance().span;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let end = self.expect(TokenKind::Semicolon, "after `return`")?.span;
        Ok(Stmt::new(StmtKind::Return { value }, start.merge(end)))
    }

    /// The four `for` head forms: classic init/cond/post, single-binder
    /// foreach, pair-decomposing foreach, and classic with a bare
    /// assignment-expression initializer.
    fn parse_for(&mut self) -> PResult<Stmt> {
        let start = self.advance().span;
        self.expect(TokenKind::LParen, "after `for`")?;

        // `for ([<type> a, <type> b] in expr)`
        if self.check(TokenKind::LBracket) {
            self.advance();
            let first = self.parse_foreach_binder()?;
            self.expect(TokenKind::Comma, "between the binders")?;
            let second = self.parse_foreach_binder()?;
            self.expect(TokenKind::RBracket, "to close the binder list")?;
            self.expect(TokenKind::In, "after the binders")?;
            let iterable = self.parse_expression()?;
            self.expect(TokenKind::RParen, "after the iterable")?;
            let body = self.parse_block()?;
            let span = start.merge(body.span);
            return Ok(Stmt::new(
                StmtKind::ForEach {
                    first,
                    second: Some(second),
                    iterable,
                    body,
                },
                span,
            ));
        }

        // `for (<type> x in expr)` -- implicit single-variable foreach.
        if self.kind().is_type_keyword()
            && self.nth_kind(1) == TokenKind::Ident
            && self.nth_kind(2) == TokenKind::In
        {
            let first = self.parse_foreach_binder()?;
            self.expect(TokenKind::In, "after the binder")?;
            let iterable = self.parse_expression()?;
            self.expect(TokenKind::RParen, "after the iterable")?;
            let body = self.parse_block()?;
            let span = start.merge(body.span);
            return Ok(Stmt::new(
                StmtKind::ForEach {
                    first,
                    second: None,
                    iterable,
                    body,
                },
                span,
            ));
        }

        // Classic head. The init clause is a declaration, an assignment
        // expression, or empty.
        let init = if self.check(TokenKind::Semicolon) {
            self.advance();
            None
        } else if self.kind().is_type_keyword() {
            // parse_var_decl consumes the terminating `;`.
            Some(Box::new(self.parse_var_decl()?))
        } else {
            let expr = self.parse_expression()?;
            if !matches!(expr.kind, ExprKind::Assignment { .. }) {
                return Err(ParseError::new(
                    "`for` initializer must be a declaration or an assignment",
                    expr.span,
                ));
            }
            let span = expr.span;
            self.expect(TokenKind::Semicolon, "after the `for` initializer")?;
            Some(Box::new(Stmt::new(StmtKind::Expression(expr), span)))
        };

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon, "after the `for` condition")?;

        let post = if self.check(TokenKind::RParen) {
            None
        } else {
            let expr = self.parse_expression()?;
            let span = expr.span;
            Some(Box::new(Stmt::new(StmtKind::Expression(expr), span)))
        };
        self.expect(TokenKind::RParen, "to close the `for` head")?;

        let body = self.parse_block()?;
        let span = start.merge(body.span);
        Ok(Stmt::new(
            StmtKind::For {
                init,
                cond,
                post,
                body,
            },
            span,
        ))
    }

    fn parse_foreach_binder(&mut self) -> PResult<ForEachBinder> {
        if self.eat(TokenKind::Underscore) {
            return Ok(ForEachBinder::Discard);
        }
        let type_token = self.advance();
        let kind = var_kind(type_token.kind)
            .ok_or_else(|| ParseError::new("expected a binder type or `_`", type_token.span))?;
        let (name, span) = self.expect_ident("as the binder name")?;
        Ok(ForEachBinder::Named {
            kind,
            name,
            span,
            var: None,
        })
    }

    /// `match (expr) { [ident::]expr -> { ... } ... [_ -> { ... }] }`
    fn parse_match(&mut self) -> PResult<Stmt> {
        let start = self.advance().span;
        self.expect(TokenKind::LParen, "after `match`")?;
        let subject = self.parse_expression()?;
        self.expect(TokenKind::RParen, "after the match subject")?;
        self.expect(TokenKind::LBrace, "to open the match body")?;

        let mut arms = Vec::new();
        let mut default = None;
        while !self.check(TokenKind::RBrace) && !self.at_eof() {
            if self.check(TokenKind::Underscore) {
                let underscore = self.advance().span;
                if default.is_some() {
                    return Err(ParseError::new(
                        "a `match` may have at most one `_` arm",
                        underscore,
                    ));
                }
                self.expect(TokenKind::Arrow, "after `_`")?;
                default = Some(self.parse_block()?);
                continue;
            }

            let binder = if self.check(TokenKind::Ident)
                && self.nth_kind(1) == TokenKind::ColonColon
            {
                let (name, span) = self.expect_ident("as the arm binder")?;
                self.advance(); // `::`
                Some((name, span))
            } else {
                None
            };
            let expr = self.parse_expression()?;
            self.expect(TokenKind::Arrow, "after the arm pattern")?;
            let body = self.parse_block()?;
            let arm_span = expr.span.merge(body.span);
            arms.push(MatchArm {
                binder,
                expr,
                body,
                span: arm_span,
            });
        }
        let end = self
            .expect(TokenKind::RBrace, "to close the match body")?
            .span;
        Ok(Stmt::new(
            StmtKind::Match {
                subject,
                arms,
                default,
            },
            start.merge(end),
        ))
    }
}

/// Map a type keyword token to the declared variable kind.
pub(crate) fn var_kind(kind: TokenKind) -> Option<VarKind> {
    match kind {
        TokenKind::IntType => Some(VarKind::Int),
        TokenKind::DoubleType => Some(VarKind::Double),
        TokenKind::RefType => Some(VarKind::Ref),
        TokenKind::StringType => Some(VarKind::String),
        TokenKind::ArrayType => Some(VarKind::Array),
        _ => None,
    }
}
