//! Recursive-descent parser for Drift scripts.
//!
//! One token of lookahead (`current`), one of lookback (`previous`), and a
//! classic precedence ladder for expressions (see `expressions.rs`). Parse
//! errors are recovered at statement granularity: on an error inside a
//! block the parser records it, advances to the next statement boundary,
//! and resumes, so a single pass reports multiple independent errors.

mod expressions;
mod statements;

use drift_common::span::Span;
use drift_common::token::{Token, TokenKind, TokenValue};

use crate::ast::{ScriptUnit, Stmt, VersionDirective};
use crate::error::ParseError;

type PResult<T> = Result<T, ParseError>;

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub(crate) errors: Vec<ParseError>,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof),
            "token stream must end with Eof"
        );
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    // ── Token access ─────────────────────────────────────────────────────

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1).min(self.tokens.len() - 1)]
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Kind of the token after the current one.
    pub(crate) fn next_kind(&self) -> TokenKind {
        self.nth_kind(1)
    }

    /// Saturating lookahead; past-the-end reads are `Eof`.
    pub(crate) fn nth_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.kind() == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it matches.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the given kind or fail with a contextual message.
    pub(crate) fn expect(&mut self, kind: TokenKind, context: &str) -> PResult<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(self.error_here(format!(
            "expected {} {}, found {}",
            kind.describe(),
            context,
            self.kind().describe()
        )))
    }

    /// Consume an identifier, returning its text and span.
    pub(crate) fn expect_ident(&mut self, context: &str) -> PResult<(String, Span)> {
        let token = self.expect(TokenKind::Ident, context)?;
        Ok((ident_text(&token), token.span))
    }

    pub(crate) fn error_here(&self, message: String) -> ParseError {
        ParseError::new(message, self.current().span)
    }

    // ── Error recovery ───────────────────────────────────────────────────

    /// Advance to the next statement boundary: past a `;`, or up to a
    /// statement-introducing keyword, `}`, or EOF.
    pub(crate) fn synchronize(&mut self) {
        use TokenKind::*;
        while !self.at_eof() {
            match self.kind() {
                Semicolon => {
                    self.advance();
                    return;
                }
                RBrace | If | Else | While | For | Match | Return | Continue | Break | Begin
                | Fn | Hash | IntType | DoubleType | RefType | StringType | ArrayType => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip tokens until, at balanced delimiter depth, either a `,` or the
    /// given closing delimiter appears (left unconsumed). Keeps one bad
    /// sub-expression inside `(...)`, `[...]`, or `{...}` from cascading
    /// into spurious errors for everything after it.
    pub(crate) fn skip_balanced_until(&mut self, close: TokenKind) {
        use TokenKind::*;
        let mut depth: u32 = 0;
        while !self.at_eof() {
            let kind = self.kind();
            if depth == 0 && (kind == close || kind == Comma) {
                return;
            }
            match kind {
                LParen | LBracket | LBrace => depth += 1,
                RParen | RBracket | RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    // ── Top level ────────────────────────────────────────────────────────

    pub(crate) fn parse_unit(&mut self) -> ScriptUnit {
        let (name, name_span) = match self.parse_preamble() {
            Ok(pair) => pair,
            Err(err) => {
                let span = err.span;
                self.errors.push(err);
                self.synchronize();
                (String::new(), span)
            }
        };

        let mut unit = ScriptUnit {
            name,
            name_span,
            directives: Vec::new(),
            body: Vec::new(),
        };

        while !self.at_eof() {
            let before = self.pos;
            match self.parse_top_level() {
                Ok(TopLevel::Directive(directive)) => unit.directives.push(directive),
                Ok(TopLevel::Stmt(stmt)) => unit.body.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    if self.pos == before {
                        self.advance();
                    }
                    self.synchronize();
                }
            }
        }
        unit
    }

    /// `name <identifier> ;` -- required first statement of every script.
    fn parse_preamble(&mut self) -> PResult<(String, Span)> {
        self.expect(TokenKind::Name, "to open the script")?;
        let (name, span) = self.expect_ident("after `name`")?;
        self.expect(TokenKind::Semicolon, "after the script name")?;
        Ok((name, span))
    }

    fn parse_top_level(&mut self) -> PResult<TopLevel> {
        match self.kind() {
            TokenKind::Hash => self.parse_version_directive().map(TopLevel::Directive),
            kind if kind.is_type_keyword() => self.parse_var_decl().map(TopLevel::Stmt),
            TokenKind::Begin => self.parse_begin().map(TopLevel::Stmt),
            TokenKind::Fn => self.parse_udf().map(TopLevel::Stmt),
            _ => Err(self.error_here(format!(
                "expected a declaration, event block, or function at top level, found {}",
                self.kind().describe()
            ))),
        }
    }

    /// `#version(plugin, major[, minor[, beta]])`
    fn parse_version_directive(&mut self) -> PResult<VersionDirective> {
        let start = self.expect(TokenKind::Hash, "to open a directive")?.span;
        let (word, word_span) = self.expect_ident("after `#`")?;
        if !word.eq_ignore_ascii_case("version") {
            return Err(ParseError::new(
                format!("unknown directive `#{word}`"),
                word_span,
            ));
        }
        self.expect(TokenKind::LParen, "after `#version`")?;
        let (plugin, _) = self.expect_ident("naming the plugin")?;
        self.expect(TokenKind::Comma, "after the plugin name")?;
        let major = self.expect_version_number()?;
        let mut minor = None;
        let mut beta = None;
        if self.eat(TokenKind::Comma) {
            minor = Some(self.expect_version_number()?);
            if self.eat(TokenKind::Comma) {
                beta = Some(self.expect_version_number()?);
            }
        }
        let end = self.expect(TokenKind::RParen, "to close `#version`")?.span;
        Ok(VersionDirective {
            plugin,
            major,
            minor,
            beta,
            span: start.merge(end),
        })
    }

    fn expect_version_number(&mut self) -> PResult<u32> {
        let token = self.expect(TokenKind::IntLiteral, "in `#version`")?;
        match token.value {
            TokenValue::Int(v) if (0..=u32::MAX as i64).contains(&v) => Ok(v as u32),
            _ => Err(ParseError::new(
                "version component out of range".to_owned(),
                token.span,
            )),
        }
    }
}

enum TopLevel {
    Directive(VersionDirective),
    Stmt(Stmt),
}

/// Extract the text payload of an identifier token.
pub(crate) fn ident_text(token: &Token) -> String {
    match &token.value {
        TokenValue::Str(text) => text.clone(),
        _ => String::new(),
    }
}
