//! Expression grammar: precedence-climbing recursive descent.
//!
//! The ladder, loosest to tightest:
//!
//! ```text
//! Assignment -> Slice(::) -> Ternary(?:) -> LogicalOr -> LogicalAnd
//!  -> Equality(==,!=) -> Comparison(<,<=,>,>=) -> In/NotIn -> BitwiseOr
//!  -> BitwiseAnd -> Shift(<<,>>) -> Term(+,-) -> Factor(*,/,%,^)
//!  -> Pair(::) -> Unary(!,-,$,#,&,*,~) -> Postfix([],++,--) -> Call(.,())
//!  -> Primary
//! ```

use drift_common::token::{TokenKind, TokenValue};

use crate::ast::{AssignOp, BinOp, Expr, ExprKind, MembershipSet, UnOp};
use crate::error::ParseError;

use super::{ident_text, Parser, PResult};

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> PResult<Expr> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> PResult<Expr> {
        let target = self.parse_slice()?;
        let Some(op) = assign_op(self.kind()) else {
            return Ok(target);
        };
        self.advance();
        let value = self.parse_assignment()?; // right-associative
        if !target.is_assign_target() {
            return Err(ParseError::new(
                format!("invalid target for `{}`", op.symbol()),
                target.span,
            ));
        }
        let span = target.span.merge(value.span);
        Ok(Expr::new(
            ExprKind::Assignment {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    /// Low-precedence `::`: slices in subscripts and map keys built from
    /// full comparison-level operands.
    fn parse_slice(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_ternary()?;
        while self.eat(TokenKind::ColonColon) {
            let rhs = self.parse_ternary()?;
            let span = expr.span.merge(rhs.span);
            expr = Expr::new(
                ExprKind::Pair {
                    key: Box::new(expr),
                    value: Box::new(rhs),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_ternary(&mut self) -> PResult<Expr> {
        let cond = self.parse_logical_or()?;
        if self.eat(TokenKind::Question) {
            let then = self.parse_expression()?;
            self.expect(TokenKind::Colon, "in the ternary")?;
            let other = self.parse_ternary()?;
            let span = cond.span.merge(other.span);
            return Ok(Expr::new(
                ExprKind::Ternary {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    other: Box::new(other),
                },
                span,
            ));
        }
        if self.eat(TokenKind::Elvis) {
            // `a ?: b` is sugar for `a ? a : b`.
            let other = self.parse_ternary()?;
            let span = cond.span.merge(other.span);
            let then = cond.clone();
            return Ok(Expr::new(
                ExprKind::Ternary {
                    cond: Box::new(cond),
                    then: Box::new(then),
                    other: Box::new(other),
                },
                span,
            ));
        }
        Ok(cond)
    }

    fn parse_logical_or(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_logical_and()?;
        while self.eat(TokenKind::PipePipe) {
            let rhs = self.parse_logical_and()?;
            expr = binary(BinOp::LogicalOr, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_equality()?;
        while self.eat(TokenKind::AmpAmp) {
            let rhs = self.parse_equality()?;
            expr = binary(BinOp::LogicalAnd, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_comparison()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_comparison()?;
            expr = binary(op, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_membership()?;
        loop {
            let op = match self.kind() {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::LtEq => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::GtEq => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_membership()?;
            expr = binary(op, expr, rhs);
        }
        Ok(expr)
    }

    /// `item in [...]` / `item in arrayExpr` / `item not in ...`.
    ///
    /// The bracketed literal-value-list form and the array-expression form
    /// are mutually exclusive, distinguished by peeking for `[`.
    fn parse_membership(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_bit_or()?;
        loop {
            let negated = if self.eat(TokenKind::In) {
                false
            } else if self.check(TokenKind::Not) && self.next_kind() == TokenKind::In {
                self.advance();
                self.advance();
                true
            } else {
                break;
            };

            let (set, end_span) = if self.check(TokenKind::LBracket) {
                self.advance();
                let mut elems = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        elems.push(self.parse_expression()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self
                    .expect(TokenKind::RBracket, "to close the value list")?
                    .span;
                (MembershipSet::List(elems), end)
            } else {
                let array = self.parse_bit_or()?;
                let span = array.span;
                (MembershipSet::Array(Box::new(array)), span)
            };

            let span = expr.span.merge(end_span);
            expr = Expr::new(
                ExprKind::Membership {
                    negated,
                    item: Box::new(expr),
                    set,
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_bit_or(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_bit_and()?;
        while self.eat(TokenKind::Pipe) {
            let rhs = self.parse_bit_and()?;
            expr = binary(BinOp::BitOr, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_bit_and(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_shift()?;
        while self.eat(TokenKind::Amp) {
            let rhs = self.parse_shift()?;
            expr = binary(BinOp::BitAnd, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_shift(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_term()?;
        loop {
            let op = match self.kind() {
                TokenKind::Shl => BinOp::Shl,
                TokenKind::Shr => BinOp::Shr,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            expr = binary(op, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_factor()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_factor()?;
            expr = binary(op, expr, rhs);
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_pair()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                TokenKind::Caret => BinOp::Pow,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_pair()?;
            expr = binary(op, expr, rhs);
        }
        Ok(expr)
    }

    /// High-precedence `::`: `key::value` pairs in map literals.
    fn parse_pair(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_unary()?;
        while self.eat(TokenKind::ColonColon) {
            let rhs = self.parse_unary()?;
            let span = expr.span.merge(rhs.span);
            expr = Expr::new(
                ExprKind::Pair {
                    key: Box::new(expr),
                    value: Box::new(rhs),
                },
                span,
            );
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let op = match self.kind() {
            TokenKind::Bang => Some(UnOp::Not),
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Dollar => Some(UnOp::ToString),
            TokenKind::Hash => Some(UnOp::ToNumber),
            TokenKind::Amp => Some(UnOp::Box),
            TokenKind::Star => Some(UnOp::Unbox),
            TokenKind::Tilde => Some(UnOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                    postfix: false,
                },
                span,
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_call()?;
        loop {
            match self.kind() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end = self
                        .expect(TokenKind::RBracket, "to close the subscript")?
                        .span;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Subscript {
                            base: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.kind() == TokenKind::PlusPlus {
                        UnOp::Inc
                    } else {
                        UnOp::Dec
                    };
                    let end = self.advance().span;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::Unary {
                            op,
                            operand: Box::new(expr),
                            postfix: true,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Dot calls, member access, and direct calls.
    fn parse_call(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.eat(TokenKind::Dot) {
            let (name, name_span) = self.expect_ident("after `.`")?;
            if self.check(TokenKind::LParen) {
                let args = self.parse_args()?;
                let span = expr.span.merge(self.previous().span);
                expr = Expr::new(
                    ExprKind::Call {
                        receiver: Some(Box::new(expr)),
                        name,
                        name_span,
                        args,
                        sig: None,
                        callee_var: None,
                    },
                    span,
                );
            } else {
                // Without parentheses this is member access into another
                // script's variable; the base must be a bare form name.
                let ExprKind::Identifier { name: base, .. } = &expr.kind else {
                    return Err(ParseError::new(
                        "member access requires a form name on the left of `.`",
                        expr.span,
                    ));
                };
                let span = expr.span.merge(name_span);
                expr = Expr::new(
                    ExprKind::Get {
                        base: base.clone(),
                        base_span: expr.span,
                        base_form: None,
                        member: name,
                        member_span: name_span,
                        remote: None,
                    },
                    span,
                );
            }
        }
        Ok(expr)
    }

    /// `( expr, expr, ... )` with balanced-delimiter recovery: a bad
    /// argument is skipped up to the next `,` or `)` so the rest of the
    /// list still parses.
    fn parse_args(&mut self) -> PResult<Vec<Expr>> {
        self.expect(TokenKind::LParen, "to open the argument list")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                match self.parse_expression() {
                    Ok(arg) => args.push(arg),
                    Err(err) => {
                        self.errors.push(err);
                        self.skip_balanced_until(TokenKind::RParen);
                    }
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "to close the argument list")?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        match self.kind() {
            TokenKind::IntLiteral => {
                let token = self.advance();
                let TokenValue::Int(value) = token.value else {
                    return Err(ParseError::new("malformed integer literal", token.span));
                };
                Ok(Expr::new(
                    ExprKind::Number {
                        value: value as f64,
                        is_int: true,
                        width: None,
                    },
                    token.span,
                ))
            }
            TokenKind::FloatLiteral => {
                let token = self.advance();
                let TokenValue::Float(value) = token.value else {
                    return Err(ParseError::new("malformed float literal", token.span));
                };
                Ok(Expr::new(
                    ExprKind::Number {
                        value,
                        is_int: false,
                        width: None,
                    },
                    token.span,
                ))
            }
            TokenKind::StringLiteral => self.parse_string(),
            TokenKind::True => {
                let span = self.advance().span;
                Ok(Expr::new(ExprKind::Bool(true), span))
            }
            TokenKind::False => {
                let span = self.advance().span;
                Ok(Expr::new(ExprKind::Bool(false), span))
            }
            TokenKind::Null => {
                let span = self.advance().span;
                Ok(Expr::new(ExprKind::Null, span))
            }
            TokenKind::LParen => {
                let start = self.advance().span;
                let inner = self.parse_expression()?;
                let end = self
                    .expect(TokenKind::RParen, "to close the grouping")?
                    .span;
                Ok(Expr::new(
                    ExprKind::Grouping(Box::new(inner)),
                    start.merge(end),
                ))
            }
            TokenKind::LBracket => {
                let start = self.advance().span;
                let mut elems = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        elems.push(self.parse_expression()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self
                    .expect(TokenKind::RBracket, "to close the array literal")?
                    .span;
                Ok(Expr::new(
                    ExprKind::ArrayLiteral { elems },
                    start.merge(end),
                ))
            }
            TokenKind::LBrace => {
                let start = self.advance().span;
                let mut elems = Vec::new();
                if !self.check(TokenKind::RBrace) {
                    loop {
                        elems.push(self.parse_expression()?);
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self
                    .expect(TokenKind::RBrace, "to close the map literal")?
                    .span;
                Ok(Expr::new(ExprKind::MapLiteral { elems }, start.merge(end)))
            }
            TokenKind::Fn => {
                let start = self.advance().span;
                let params = self.parse_fn_params()?;
                let (body, _arrow) = self.parse_fn_body()?;
                let span = start.merge(body.span);
                Ok(Expr::new(ExprKind::Lambda { params, body }, span))
            }
            TokenKind::Ident => {
                let token = self.advance();
                let name = ident_text(&token);
                if self.check(TokenKind::LParen) {
                    let args = self.parse_args()?;
                    let span = token.span.merge(self.previous().span);
                    return Ok(Expr::new(
                        ExprKind::Call {
                            receiver: None,
                            name,
                            name_span: token.span,
                            args,
                            sig: None,
                            callee_var: None,
                        },
                        span,
                    ));
                }
                Ok(Expr::new(
                    ExprKind::Identifier {
                        name,
                        var: None,
                        form: None,
                    },
                    token.span,
                ))
            }
            TokenKind::Underscore => Err(self.error_here(
                "`_` is only valid as a match default or a discarded binder".to_owned(),
            )),
            other => Err(self.error_here(format!(
                "expected an expression, found {}",
                other.describe()
            ))),
        }
    }

    /// Reassemble a (possibly interpolated) string literal into a
    /// left-associated concatenation chain. Each `${x}` segment becomes a
    /// to-string unary wrapped around the parsed inner expression.
    fn parse_string(&mut self) -> PResult<Expr> {
        let token = self.advance();
        let TokenValue::Str(first) = token.value else {
            return Err(ParseError::new("malformed string literal", token.span));
        };
        let mut parts: Vec<Expr> = Vec::new();
        if !first.is_empty() {
            parts.push(Expr::new(ExprKind::Str(first), token.span));
        }

        while self.check(TokenKind::Interp) {
            let interp_span = self.advance().span;
            let inner = self.parse_expression()?;
            self.expect(TokenKind::EndInterp, "to close the interpolation")?;
            let span = interp_span.merge(inner.span);
            parts.push(Expr::new(
                ExprKind::Unary {
                    op: UnOp::ToString,
                    operand: Box::new(inner),
                    postfix: false,
                },
                span,
            ));
            let segment = self.expect(TokenKind::StringLiteral, "after the interpolation")?;
            if let TokenValue::Str(text) = segment.value {
                if !text.is_empty() {
                    parts.push(Expr::new(ExprKind::Str(text), segment.span));
                }
            }
        }

        let mut iter = parts.into_iter();
        let Some(first) = iter.next() else {
            return Ok(Expr::new(ExprKind::Str(String::new()), token.span));
        };
        Ok(iter.fold(first, |acc, part| binary(BinOp::Add, acc, part)))
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span.merge(rhs.span);
    Expr::new(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        span,
    )
}

fn assign_op(kind: TokenKind) -> Option<AssignOp> {
    match kind {
        TokenKind::Eq => Some(AssignOp::Assign),
        TokenKind::PlusEq => Some(AssignOp::Add),
        TokenKind::MinusEq => Some(AssignOp::Sub),
        TokenKind::StarEq => Some(AssignOp::Mul),
        TokenKind::SlashEq => Some(AssignOp::Div),
        TokenKind::PercentEq => Some(AssignOp::Mod),
        TokenKind::CaretEq => Some(AssignOp::Pow),
        TokenKind::PipeEq => Some(AssignOp::BitOr),
        TokenKind::AmpEq => Some(AssignOp::BitAnd),
        _ => None,
    }
}
