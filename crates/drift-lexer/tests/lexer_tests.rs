//! Integration tests for the Drift lexer: full-script token streams,
//! interpolation ordering, and the lexical error taxonomy.

use drift_common::error::LexErrorKind;
use drift_common::token::{TokenKind, TokenValue};
use drift_lexer::Lexer;

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize(source)
        .expect("lex failure")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn full_script_preamble_and_block() {
    let source = "name test; int x = 5; begin gamemode { x = x + 1; }";
    assert_eq!(
        kinds(source),
        vec![
            TokenKind::Name,
            TokenKind::Ident,
            TokenKind::Semicolon,
            TokenKind::IntType,
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::IntLiteral,
            TokenKind::Semicolon,
            TokenKind::Begin,
            TokenKind::Ident,
            TokenKind::LBrace,
            TokenKind::Ident,
            TokenKind::Eq,
            TokenKind::Ident,
            TokenKind::Plus,
            TokenKind::IntLiteral,
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keywords_are_case_insensitive() {
    assert_eq!(kinds("WHILE While while")[..3], [TokenKind::While; 3]);
}

#[test]
fn unary_operator_characters() {
    assert_eq!(
        kinds("! - $ # & * ~"),
        vec![
            TokenKind::Bang,
            TokenKind::Minus,
            TokenKind::Dollar,
            TokenKind::Hash,
            TokenKind::Amp,
            TokenKind::Star,
            TokenKind::Tilde,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn compound_assignment_operators() {
    assert_eq!(
        kinds("+= -= *= /= %= ^= |= &="),
        vec![
            TokenKind::PlusEq,
            TokenKind::MinusEq,
            TokenKind::StarEq,
            TokenKind::SlashEq,
            TokenKind::PercentEq,
            TokenKind::CaretEq,
            TokenKind::PipeEq,
            TokenKind::AmpEq,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn spans_are_byte_accurate() {
    let tokens = Lexer::tokenize("int x = 42;").unwrap();
    assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 3)); // int
    assert_eq!((tokens[1].span.start, tokens[1].span.end), (4, 5)); // x
    assert_eq!((tokens[2].span.start, tokens[2].span.end), (6, 7)); // =
    assert_eq!((tokens[3].span.start, tokens[3].span.end), (8, 10)); // 42
}

#[test]
fn multi_segment_interpolation() {
    let tokens = Lexer::tokenize(r#""a${x + 1}b${y}c""#).unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::StringLiteral,
            TokenKind::Interp,
            TokenKind::Ident,
            TokenKind::Plus,
            TokenKind::IntLiteral,
            TokenKind::EndInterp,
            TokenKind::StringLiteral,
            TokenKind::Interp,
            TokenKind::Ident,
            TokenKind::EndInterp,
            TokenKind::StringLiteral,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn nested_string_inside_interpolation_preserves_order() {
    let tokens = Lexer::tokenize(r#""v=${foo("x")}""#).unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::StringLiteral,
            TokenKind::Interp,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::StringLiteral,
            TokenKind::RParen,
            TokenKind::EndInterp,
            TokenKind::StringLiteral,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn escaped_dollar_does_not_interpolate() {
    let tokens = Lexer::tokenize(r#""cost: \${x}""#).unwrap();
    assert_eq!(tokens.len(), 2); // string + eof
    assert_eq!(tokens[0].value, TokenValue::Str("cost: ${x}".into()));
}

#[test]
fn interpolation_cannot_span_lines() {
    let err = Lexer::tokenize("\"a${x\n}\"").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnterminatedInterpolation);
}

#[test]
fn hex_is_case_insensitive_and_bounded() {
    let tokens = Lexer::tokenize("0Xff 0B11").unwrap();
    assert_eq!(tokens[0].value, TokenValue::Int(255));
    assert_eq!(tokens[1].value, TokenValue::Int(3));
    assert!(Lexer::tokenize("0x").is_err());
    assert!(Lexer::tokenize("0b2").is_err());
}

#[test]
fn error_spans_point_at_the_offender() {
    let err = Lexer::tokenize("int x = 5q;").unwrap_err();
    assert_eq!(err.span.start, 8);
    assert!(matches!(err.kind, LexErrorKind::InvalidNumberLiteral(ref s) if s == "5q"));
}
