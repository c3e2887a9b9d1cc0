//! Drift parser: recursive descent over the lexer's token stream,
//! producing the mutable tagged-variant AST the rewriting passes operate
//! on.
//!
//! Lexical errors abort parsing entirely; syntax errors are collected with
//! statement-granular recovery so one pass reports as many independent
//! problems as it can.

pub mod ast;
pub mod error;
mod parser;
pub mod printer;

use drift_common::error::LexError;
use drift_lexer::Lexer;

pub use ast::ScriptUnit;
pub use error::ParseError;

/// Result of parsing a Drift source unit.
pub struct Parse {
    pub unit: ScriptUnit,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Syntax errors encountered, in source order.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a Drift source unit.
///
/// `Err` is a lexical error (fatal to the stream); syntax errors are
/// collected on the returned [`Parse`].
pub fn parse(source: &str) -> Result<Parse, LexError> {
    let tokens = Lexer::tokenize(source)?;
    let mut parser = parser::Parser::new(tokens);
    let unit = parser.parse_unit();
    Ok(Parse {
        unit,
        errors: parser.errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::{ExprKind, StmtKind};

    #[test]
    fn parse_minimal_script() {
        let parse = parse("name test; int x = 5; begin gamemode { x = x + 1; }").unwrap();
        assert!(parse.ok(), "errors: {:?}", parse.errors());
        assert_eq!(parse.unit.name, "test");
        assert_eq!(parse.unit.body.len(), 2);
        assert!(matches!(parse.unit.body[0].kind, StmtKind::VarDecl { .. }));
        assert!(matches!(parse.unit.body[1].kind, StmtKind::Begin { .. }));
    }

    #[test]
    fn elvis_duplicates_the_condition() {
        let parse = parse("name t; begin gamemode { int x; int y; y = x ?: 3; }").unwrap();
        assert!(parse.ok(), "errors: {:?}", parse.errors());
        let StmtKind::Begin { body, .. } = &parse.unit.body[0].kind else {
            panic!("expected begin block");
        };
        let StmtKind::Expression(expr) = &body.stmts[2].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Assignment { value, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        let ExprKind::Ternary { cond, then, .. } = &value.kind else {
            panic!("expected ternary, got {:?}", value.kind);
        };
        // Both slots read the same identifier.
        assert!(matches!(&cond.kind, ExprKind::Identifier { name, .. } if name == "x"));
        assert!(matches!(&then.kind, ExprKind::Identifier { name, .. } if name == "x"));
    }

    #[test]
    fn syntax_errors_recover_per_statement() {
        let parse = parse(
            "name t; begin gamemode { int x = ; x = 1; int y = + ; y = 2; }",
        )
        .unwrap();
        assert!(parse.errors().len() >= 2, "errors: {:?}", parse.errors());
        // The recoverable statements still parsed.
        let StmtKind::Begin { body, .. } = &parse.unit.body[0].kind else {
            panic!("expected begin block");
        };
        let good = body
            .stmts
            .iter()
            .filter(|s| matches!(s.kind, StmtKind::Expression(_)))
            .count();
        assert_eq!(good, 2);
    }

    #[test]
    fn missing_preamble_is_an_error() {
        let parse = parse("int x;").unwrap();
        assert!(!parse.ok());
    }
}
