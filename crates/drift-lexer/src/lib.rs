//! Drift lexer -- tokenizer for the Drift scripting language.
//!
//! A stateful single-pass cursor over the full source text. String
//! interpolation (`${...}`) re-enters the tokenizer recursively; tokens
//! produced inside an interpolation scan are buffered in a small queue and
//! delivered one at a time so the parser sees them in source order.
//!
//! Lexical errors are fatal to the token stream and surface as `Err` from
//! [`Lexer::next_token`] / [`Lexer::tokenize`].

mod cursor;

use std::collections::VecDeque;

use cursor::Cursor;
use drift_common::error::{LexError, LexErrorKind};
use drift_common::span::Span;
use drift_common::token::{keyword_from_str, Token, TokenKind, TokenValue};

/// The Drift lexer. Converts source text into a stream of tokens.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Whether we have already emitted the `Eof` token.
    emitted_eof: bool,
    /// Tokens produced ahead of time during an interpolation scan.
    queue: VecDeque<Token>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
            queue: VecDeque::new(),
        }
    }

    /// Convenience: tokenize the entire source into a `Vec<Token>`.
    ///
    /// The returned vector includes the final `Eof` token. Stops at the
    /// first lexical error.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Produce the next token, draining the interpolation queue first.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(token) = self.queue.pop_front() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Whether the `Eof` token has been emitted.
    pub fn at_eof(&self) -> bool {
        self.emitted_eof
    }

    // ── Scanning ─────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();

        let start = self.cursor.pos();
        let Some(c) = self.cursor.peek() else {
            self.emitted_eof = true;
            return Ok(Token::new(TokenKind::Eof, start, start));
        };

        use TokenKind::*;
        let token = match c {
            '(' => self.single(LParen, start),
            ')' => self.single(RParen, start),
            '[' => self.single(LBracket, start),
            ']' => self.single(RBracket, start),
            '{' => self.single(LBrace, start),
            '}' => self.single(RBrace, start),
            ',' => self.single(Comma, start),
            ';' => self.single(Semicolon, start),
            '.' => self.single(Dot, start),
            '$' => self.single(Dollar, start),
            '#' => self.single(Hash, start),
            '~' => self.single(Tilde, start),

            // Greedy longest-match operators: `+=` before `+`, `::` before
            // `:`, and so on.
            '+' => self.op(start, &[('=', PlusEq), ('+', PlusPlus)], Plus),
            '-' => self.op(start, &[('=', MinusEq), ('-', MinusMinus), ('>', Arrow)], Minus),
            '*' => self.op(start, &[('=', StarEq)], Star),
            '/' => self.op(start, &[('=', SlashEq)], Slash),
            '%' => self.op(start, &[('=', PercentEq)], Percent),
            '^' => self.op(start, &[('=', CaretEq)], Caret),
            '=' => self.op(start, &[('=', EqEq)], Eq),
            '!' => self.op(start, &[('=', NotEq)], Bang),
            '<' => self.op(start, &[('=', LtEq), ('<', Shl)], Lt),
            '>' => self.op(start, &[('=', GtEq), ('>', Shr)], Gt),
            '&' => self.op(start, &[('&', AmpAmp), ('=', AmpEq)], Amp),
            '|' => self.op(start, &[('|', PipePipe), ('=', PipeEq)], Pipe),
            ':' => self.op(start, &[(':', ColonColon)], Colon),
            '?' => self.op(start, &[(':', Elvis)], Question),

            '0'..='9' => return self.scan_number(start),
            '"' => return self.scan_string(start),
            c if c.is_ascii_alphabetic() || c == '_' => return self.scan_ident(start),

            other => {
                self.cursor.advance();
                return Err(LexError::new(
                    LexErrorKind::UnexpectedCharacter(other),
                    Span::new(start, self.cursor.pos()),
                ));
            }
        };
        Ok(token)
    }

    /// Skip whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            self.cursor
                .eat_while(|c| c == ' ' || c == '\t' || c == '\r' || c == '\n');
            if self.cursor.peek() == Some('/') && self.cursor.peek_next() == Some('/') {
                self.cursor.eat_while(|c| c != '\n');
            } else {
                return;
            }
        }
    }

    /// Consume one character and return a token of the given kind.
    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.advance();
        Token::new(kind, start, self.cursor.pos())
    }

    /// Consume the first character, then try each follow character in order
    /// for a two-character operator; fall back to the one-character kind.
    fn op(&mut self, start: u32, follow: &[(char, TokenKind)], fallback: TokenKind) -> Token {
        self.cursor.advance();
        for &(c, kind) in follow {
            if self.cursor.peek() == Some(c) {
                self.cursor.advance();
                return Token::new(kind, start, self.cursor.pos());
            }
        }
        Token::new(fallback, start, self.cursor.pos())
    }

    // ── Number literals ──────────────────────────────────────────────────

    /// Lex a decimal, `0x` hex, or `0b` binary literal.
    ///
    /// A numeral must end at a delimiter, operator, whitespace, or EOF:
    /// an alphabetic character (or `_`) running straight on from the digits
    /// is a lexical error, never a silent token split. A second decimal
    /// point is likewise rejected.
    fn scan_number(&mut self, start: u32) -> Result<Token, LexError> {
        let first = self.cursor.advance().expect("scan_number called at a digit");

        if first == '0' && matches!(self.cursor.peek(), Some('x' | 'X')) {
            self.cursor.advance();
            let digits_start = self.cursor.pos();
            self.cursor.eat_while(|c| c.is_ascii_hexdigit());
            if self.cursor.pos() == digits_start {
                return self.number_error(start);
            }
            self.check_number_boundary(start)?;
            let digits = self.cursor.slice(digits_start, self.cursor.pos());
            let value = i64::from_str_radix(digits, 16)
                .map_err(|_| self.number_error_now(start))?;
            return Ok(Token::with_value(
                TokenKind::IntLiteral,
                TokenValue::Int(value),
                start,
                self.cursor.pos(),
            ));
        }

        if first == '0' && matches!(self.cursor.peek(), Some('b' | 'B')) {
            self.cursor.advance();
            let digits_start = self.cursor.pos();
            self.cursor.eat_while(|c| c == '0' || c == '1');
            if self.cursor.pos() == digits_start {
                return self.number_error(start);
            }
            self.check_number_boundary(start)?;
            let digits = self.cursor.slice(digits_start, self.cursor.pos());
            let value = i64::from_str_radix(digits, 2)
                .map_err(|_| self.number_error_now(start))?;
            return Ok(Token::with_value(
                TokenKind::IntLiteral,
                TokenValue::Int(value),
                start,
                self.cursor.pos(),
            ));
        }

        // Decimal, possibly with a single fractional part.
        self.cursor.eat_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            is_float = true;
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
            // A second fractional part rejects the whole literal.
            if self.cursor.peek() == Some('.')
                && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
            {
                return self.number_error(start);
            }
        }
        self.check_number_boundary(start)?;

        let text = self.cursor.slice(start, self.cursor.pos());
        if is_float {
            let value: f64 = text.parse().map_err(|_| self.number_error_now(start))?;
            Ok(Token::with_value(
                TokenKind::FloatLiteral,
                TokenValue::Float(value),
                start,
                self.cursor.pos(),
            ))
        } else {
            let value: i64 = text.parse().map_err(|_| self.number_error_now(start))?;
            Ok(Token::with_value(
                TokenKind::IntLiteral,
                TokenValue::Int(value),
                start,
                self.cursor.pos(),
            ))
        }
    }

    /// Reject a numeral that runs straight into identifier characters.
    fn check_number_boundary(&mut self, start: u32) -> Result<(), LexError> {
        if self
            .cursor
            .peek()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            return self.number_error(start).map(|_| ());
        }
        Ok(())
    }

    /// Consume the rest of the malformed literal and build the error.
    fn number_error(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor
            .eat_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        Err(self.number_error_now(start))
    }

    fn number_error_now(&self, start: u32) -> LexError {
        let text = self.cursor.slice(start, self.cursor.pos());
        LexError::new(
            LexErrorKind::InvalidNumberLiteral(text.to_owned()),
            Span::new(start, self.cursor.pos()),
        )
    }

    // ── Identifiers and keywords ─────────────────────────────────────────

    /// Lex an identifier or keyword.
    ///
    /// A lone `_` is the discard marker. A run of underscores with no
    /// letter anywhere in the token is rejected.
    fn scan_ident(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.advance();
        self.cursor
            .eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let text = self.cursor.slice(start, self.cursor.pos());

        if !text.bytes().any(|b| b.is_ascii_alphabetic()) {
            if text == "_" {
                return Ok(Token::new(TokenKind::Underscore, start, self.cursor.pos()));
            }
            return Err(LexError::new(
                LexErrorKind::InvalidIdentifier(text.to_owned()),
                Span::new(start, self.cursor.pos()),
            ));
        }

        if let Some(kind) = keyword_from_str(text) {
            return Ok(Token::new(kind, start, self.cursor.pos()));
        }
        Ok(Token::with_value(
            TokenKind::Ident,
            TokenValue::Str(text.to_owned()),
            start,
            self.cursor.pos(),
        ))
    }

    // ── String literals ──────────────────────────────────────────────────

    /// Lex a string literal, including `${...}` interpolation.
    ///
    /// Token order for `"a${x}b"`: `StringLiteral("a")`, `Interp`, the
    /// tokens of `x`, `EndInterp`, `StringLiteral("b")`. The first token is
    /// returned; the rest go through the queue.
    fn scan_string(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.advance(); // consume opening '"'

        let mut tokens: Vec<Token> = Vec::new();
        let mut buf = String::new();
        let mut seg_start = start;

        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::new(start, self.cursor.pos()),
                    ));
                }
                Some('\n') => {
                    return Err(LexError::new(
                        LexErrorKind::NewlineInString,
                        Span::new(start, self.cursor.pos()),
                    ));
                }
                Some('\\') => {
                    self.cursor.advance();
                    match self.cursor.advance() {
                        Some('n') => buf.push('\n'),
                        Some('"') => buf.push('"'),
                        Some('\\') => buf.push('\\'),
                        Some('$') => buf.push('$'),
                        Some(other) => {
                            return Err(LexError::new(
                                LexErrorKind::InvalidEscapeSequence(other),
                                Span::new(self.cursor.pos() - 2, self.cursor.pos()),
                            ));
                        }
                        None => {
                            return Err(LexError::new(
                                LexErrorKind::UnterminatedString,
                                Span::new(start, self.cursor.pos()),
                            ));
                        }
                    }
                }
                Some('"') => {
                    self.cursor.advance();
                    tokens.push(Token::with_value(
                        TokenKind::StringLiteral,
                        TokenValue::Str(std::mem::take(&mut buf)),
                        seg_start,
                        self.cursor.pos(),
                    ));
                    break;
                }
                Some('$') if self.cursor.peek_next() == Some('{') => {
                    tokens.push(Token::with_value(
                        TokenKind::StringLiteral,
                        TokenValue::Str(std::mem::take(&mut buf)),
                        seg_start,
                        self.cursor.pos(),
                    ));
                    let interp_start = self.cursor.pos();
                    self.cursor.advance(); // '$'
                    self.cursor.advance(); // '{'
                    tokens.push(Token::new(
                        TokenKind::Interp,
                        interp_start,
                        self.cursor.pos(),
                    ));
                    self.scan_interpolation(&mut tokens)?;
                    seg_start = self.cursor.pos();
                }
                Some(_) => {
                    buf.push(self.cursor.advance().expect("peeked character"));
                }
            }
        }

        let first = tokens.remove(0);
        self.queue.extend(tokens);
        Ok(first)
    }

    /// Re-enter the tokenizer inside a `${...}` interpolation until the
    /// matching `}`. Interpolated expressions cannot span lines.
    fn scan_interpolation(&mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        let interp_start = self.cursor.pos();
        let mut brace_depth = 0u32;
        loop {
            self.cursor.eat_while(|c| c == ' ' || c == '\t');
            match self.cursor.peek() {
                None | Some('\n') => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedInterpolation,
                        Span::new(interp_start, self.cursor.pos()),
                    ));
                }
                Some('}') if brace_depth == 0 => {
                    let pos = self.cursor.pos();
                    self.cursor.advance();
                    tokens.push(Token::new(TokenKind::EndInterp, pos, self.cursor.pos()));
                    return Ok(());
                }
                Some(_) => {
                    let token = self.scan_token()?;
                    match token.kind {
                        TokenKind::LBrace => brace_depth += 1,
                        TokenKind::RBrace => brace_depth = brace_depth.saturating_sub(1),
                        _ => {}
                    }
                    tokens.push(token);
                    // Nested strings buffer their own tokens; keep order.
                    while let Some(queued) = self.queue.pop_front() {
                        tokens.push(queued);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .expect("lex failure")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_preamble() {
        assert_eq!(
            kinds("name test;"),
            vec![
                TokenKind::Name,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn greedy_operator_match() {
        assert_eq!(
            kinds("+= + :: : ?: ? << <="),
            vec![
                TokenKind::PlusEq,
                TokenKind::Plus,
                TokenKind::ColonColon,
                TokenKind::Colon,
                TokenKind::Elvis,
                TokenKind::Question,
                TokenKind::Shl,
                TokenKind::LtEq,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn line_comments_are_trivia() {
        assert_eq!(
            kinds("x // comment\ny"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn hex_and_binary_literals() {
        let tokens = Lexer::tokenize("0xFF 0b1010 42").unwrap();
        assert_eq!(tokens[0].value, TokenValue::Int(255));
        assert_eq!(tokens[1].value, TokenValue::Int(10));
        assert_eq!(tokens[2].value, TokenValue::Int(42));
    }

    #[test]
    fn float_literal_value() {
        let tokens = Lexer::tokenize("3.25").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[0].value, TokenValue::Float(3.25));
    }

    #[test]
    fn numeral_running_into_letters_is_rejected() {
        let err = Lexer::tokenize("5x").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::InvalidNumberLiteral(_)));
        let err = Lexer::tokenize("0xFFg").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::InvalidNumberLiteral(_)));
    }

    #[test]
    fn double_decimal_point_is_rejected() {
        let err = Lexer::tokenize("1.2.3").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::InvalidNumberLiteral(_)));
    }

    #[test]
    fn underscore_rules() {
        assert_eq!(kinds("_")[0], TokenKind::Underscore);
        assert_eq!(kinds("_foo")[0], TokenKind::Ident);
        let err = Lexer::tokenize("___").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::InvalidIdentifier(_)));
    }

    #[test]
    fn string_escapes() {
        let tokens = Lexer::tokenize(r#""a\n\"b\\""#).unwrap();
        assert_eq!(tokens[0].value, TokenValue::Str("a\n\"b\\".into()));
    }

    #[test]
    fn interpolation_token_order() {
        let tokens = Lexer::tokenize(r#""a${x}b""#).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::StringLiteral,
                TokenKind::Interp,
                TokenKind::Ident,
                TokenKind::EndInterp,
                TokenKind::StringLiteral,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[0].value, TokenValue::Str("a".into()));
        assert_eq!(tokens[4].value, TokenValue::Str("b".into()));
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = Lexer::tokenize("\"abc").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn newline_in_string_is_fatal() {
        let err = Lexer::tokenize("\"ab\ncd\"").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::NewlineInString);
    }

    #[test]
    fn unterminated_interpolation_is_fatal() {
        let err = Lexer::tokenize("\"a${x\"").unwrap_err();
        // The inner scan hits the closing quote of a nested (unterminated)
        // string, or the line end; either way the stream dies here.
        assert!(matches!(
            err.kind,
            LexErrorKind::UnterminatedInterpolation | LexErrorKind::UnterminatedString
        ));
    }

    #[test]
    fn unexpected_character() {
        let err = Lexer::tokenize("@").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
    }
}
