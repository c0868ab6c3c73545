//! Single-pass lexer: source text in, a token sequence out.
//!
//! Follows spec.md §4.1 exactly: one character of lookahead at most, never
//! backtracks, and never aborts — unrecognized bytes become `Error` tokens
//! rather than stopping the scan. ASCII source is assumed throughout, so
//! byte offsets and column numbers coincide.

use crate::token::{Token, TokenKind};

/// Scans an input buffer into a token stream.
///
/// `Lexer` is also a plain [`Iterator`] over [`Token`]s (handy for the
/// parser or for ad-hoc inspection); [`Lexer::tokenize`] is the usual entry
/// point and collects the whole stream including the trailing `Eof`.
pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            done: false,
        }
    }

    /// Scan the whole input, returning every token including the final `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.is_eof();
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.advance();
                    self.advance();
                    // Not nested: the first `*/` we see ends the comment,
                    // even if an inner `/*` was scanned as plain content.
                    loop {
                        match self.peek() {
                            None => break,
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token. Always succeeds; unrecognized input becomes
    /// an `Error` token rather than a failure.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let (line, column) = (self.line, self.column);

        let Some(b) = self.peek() else {
            self.done = true;
            return Token::new(TokenKind::Eof, "", line, column);
        };

        if b.is_ascii_digit() {
            return self.scan_number(line, column);
        }
        if b.is_ascii_alphabetic() || b == b'_' {
            return self.scan_identifier(line, column);
        }
        if b == b'"' {
            return self.scan_string(line, column);
        }
        if b == b'\'' {
            return self.scan_char(line, column);
        }

        self.scan_operator(line, column)
    }

    fn scan_operator(&mut self, line: usize, column: usize) -> Token {
        use TokenKind::*;

        let two = |lexer: &mut Self, kind: TokenKind, lexeme: &str| -> Token {
            lexer.advance();
            lexer.advance();
            Token::new(kind, lexeme, line, column)
        };
        let one = |lexer: &mut Self, kind: TokenKind, lexeme: &str| -> Token {
            lexer.advance();
            Token::new(kind, lexeme, line, column)
        };

        let c0 = self.peek().unwrap();
        let c1 = self.peek_at(1);

        match (c0, c1) {
            (b'=', Some(b'=')) => two(self, EqualEqual, "=="),
            (b'!', Some(b'=')) => two(self, BangEqual, "!="),
            (b'<', Some(b'=')) => two(self, LessEqual, "<="),
            (b'>', Some(b'=')) => two(self, GreaterEqual, ">="),
            (b'<', Some(b'<')) => two(self, LessLess, "<<"),
            (b'>', Some(b'>')) => two(self, GreaterGreater, ">>"),
            (b'&', Some(b'&')) => two(self, AmpAmp, "&&"),
            (b'|', Some(b'|')) => two(self, PipePipe, "||"),
            (b'+', Some(b'+')) => two(self, PlusPlus, "++"),
            (b'-', Some(b'-')) => two(self, MinusMinus, "--"),
            (b'+', Some(b'=')) => two(self, PlusEqual, "+="),
            (b'-', Some(b'=')) => two(self, MinusEqual, "-="),
            (b'*', Some(b'=')) => two(self, StarEqual, "*="),
            (b'/', Some(b'=')) => two(self, SlashEqual, "/="),
            (b'%', Some(b'=')) => two(self, PercentEqual, "%="),
            (b'-', Some(b'>')) => two(self, Arrow, "->"),

            (b'+', _) => one(self, Plus, "+"),
            (b'-', _) => one(self, Minus, "-"),
            (b'*', _) => one(self, Star, "*"),
            (b'/', _) => one(self, Slash, "/"),
            (b'%', _) => one(self, Percent, "%"),
            (b'=', _) => one(self, Equal, "="),
            (b'!', _) => one(self, Bang, "!"),
            (b'<', _) => one(self, Less, "<"),
            (b'>', _) => one(self, Greater, ">"),
            (b'&', _) => one(self, Amp, "&"),
            (b'|', _) => one(self, Pipe, "|"),
            (b'^', _) => one(self, Caret, "^"),
            (b'~', _) => one(self, Tilde, "~"),
            (b'(', _) => one(self, LParen, "("),
            (b')', _) => one(self, RParen, ")"),
            (b'{', _) => one(self, LBrace, "{"),
            (b'}', _) => one(self, RBrace, "}"),
            (b'[', _) => one(self, LBracket, "["),
            (b']', _) => one(self, RBracket, "]"),
            (b',', _) => one(self, Comma, ","),
            (b';', _) => one(self, Semicolon, ";"),
            (b':', _) => one(self, Colon, ":"),
            (b'?', _) => one(self, Question, "?"),
            (b'.', _) => one(self, Dot, "."),

            (other, _) => {
                self.advance();
                Token::new(TokenKind::Error, (other as char).to_string(), line, column)
            }
        }
    }

    fn scan_number(&mut self, line: usize, column: usize) -> Token {
        let start = self.pos;

        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x') | Some(b'X')) {
            self.advance();
            self.advance();
            while matches!(self.peek(), Some(b) if b.is_ascii_hexdigit()) {
                self.advance();
            }
            let lexeme = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
            return Token::new(TokenKind::Number, lexeme, line, column);
        }

        let mut is_float = false;

        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some(b'.') && matches!(self.peek_at(1), Some(b) if b.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.advance();
            }
        }

        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(lookahead), Some(b'+') | Some(b'-')) {
                lookahead += 1;
            }
            if matches!(self.peek_at(lookahead), Some(b) if b.is_ascii_digit()) {
                is_float = true;
                for _ in 0..=lookahead {
                    self.advance();
                }
                while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let lexeme = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Number
        };
        Token::new(kind, lexeme, line, column)
    }

    fn scan_identifier(&mut self, line: usize, column: usize) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.advance();
        }
        let lexeme = std::str::from_utf8(&self.source[start..self.pos]).unwrap();
        let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, line, column)
    }

    fn decode_escape(&mut self, extra: u8) -> char {
        match self.advance() {
            Some(b'n') => '\n',
            Some(b't') => '\t',
            Some(b'r') => '\r',
            Some(b'\\') => '\\',
            Some(b'"') => '"',
            Some(b'0') => '\0',
            Some(b) if b == extra => extra as char,
            Some(b) => b as char,
            None => extra as char,
        }
    }

    fn scan_string(&mut self, line: usize, column: usize) -> Token {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None => break,
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    value.push(self.decode_escape(b'"'));
                }
                Some(_) => {
                    value.push(self.advance().unwrap() as char);
                }
            }
        }
        Token::new(TokenKind::String, value, line, column)
    }

    fn scan_char(&mut self, line: usize, column: usize) -> Token {
        self.advance(); // opening quote
        let mut value = String::new();
        match self.peek() {
            Some(b'\\') => {
                self.advance();
                value.push(self.decode_escape(b'\''));
            }
            Some(_) => {
                value.push(self.advance().unwrap() as char);
            }
            None => {}
        }
        if self.peek() == Some(b'\'') {
            self.advance();
        }
        Token::new(TokenKind::Char, value, line, column)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let tok = self.next_token();
        if tok.is_eof() {
            self.done = true;
        }
        Some(tok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn skips_whitespace_and_line_comments() {
        let toks = kinds("1 + 2 // three\n+ 4");
        assert_eq!(
            toks,
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn block_comments_are_not_nested() {
        // The inner `/*` is content; the first `*/` closes the comment.
        let toks = kinds("/* outer /* inner */ 1");
        assert_eq!(toks, vec![TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn two_char_operators_win_over_prefixes() {
        let toks = kinds("<= < == = != !");
        assert_eq!(
            toks,
            vec![
                TokenKind::LessEqual,
                TokenKind::Less,
                TokenKind::EqualEqual,
                TokenKind::Equal,
                TokenKind::BangEqual,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn hex_literal() {
        let toks = Lexer::new("0xFF").tokenize();
        assert_eq!(toks[0].kind, TokenKind::Number);
        assert_eq!(toks[0].lexeme, "0xFF");
    }

    #[test]
    fn degenerate_hex_prefix_alone() {
        // "0x" with no following hex digits still lexes as NUMBER "0x".
        let toks = Lexer::new("0x").tokenize();
        assert_eq!(toks[0].kind, TokenKind::Number);
        assert_eq!(toks[0].lexeme, "0x");
    }

    #[test]
    fn float_promotion_requires_a_following_digit() {
        let toks = kinds("0.5");
        assert_eq!(toks, vec![TokenKind::Float, TokenKind::Eof]);

        // "0." followed by a non-digit stays NUMBER 0 then DOT.
        let toks = kinds("0.x");
        assert_eq!(
            toks,
            vec![TokenKind::Number, TokenKind::Dot, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn scientific_notation() {
        let toks = Lexer::new("1e10").tokenize();
        assert_eq!(toks[0].kind, TokenKind::Float);
        assert_eq!(toks[0].lexeme, "1e10");

        let toks = Lexer::new("1e").tokenize();
        assert_eq!(toks[0].kind, TokenKind::Number);
        assert_eq!(toks[0].lexeme, "1");
    }

    #[test]
    fn unterminated_string_is_accepted_at_eof() {
        let toks = Lexer::new("\"ab\\ncd").tokenize();
        assert_eq!(toks[0].kind, TokenKind::String);
        assert_eq!(toks[0].lexeme, "ab\ncd");
        assert_eq!(toks[1].kind, TokenKind::Eof);
    }

    #[test]
    fn string_escapes() {
        let toks = Lexer::new(r#""a\nb\tc\\d\"e\0f""#).tokenize();
        assert_eq!(toks[0].lexeme, "a\nb\tc\\d\"e\0f");
    }

    #[test]
    fn char_literal_with_optional_closing_quote() {
        let toks = Lexer::new("'a'").tokenize();
        assert_eq!(toks[0].kind, TokenKind::Char);
        assert_eq!(toks[0].lexeme, "a");

        let toks = Lexer::new("'x").tokenize();
        assert_eq!(toks[0].kind, TokenKind::Char);
        assert_eq!(toks[0].lexeme, "x");
    }

    #[test]
    fn keywords_are_reassigned_from_identifiers() {
        let toks = kinds("if else for while return function var const");
        assert_eq!(
            toks,
            vec![
                TokenKind::If,
                TokenKind::Else,
                TokenKind::For,
                TokenKind::While,
                TokenKind::Return,
                TokenKind::Function,
                TokenKind::Var,
                TokenKind::Const,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn let_is_not_a_keyword() {
        let toks = kinds("let");
        assert_eq!(toks, vec![TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn unknown_byte_becomes_error_token_and_scan_continues() {
        let toks = kinds("1 @ 2");
        assert_eq!(
            toks,
            vec![
                TokenKind::Number,
                TokenKind::Error,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_and_column_tracking() {
        let toks = Lexer::new("ab\ncd").tokenize();
        assert_eq!((toks[0].line, toks[0].column), (1, 1));
        assert_eq!((toks[1].line, toks[1].column), (2, 1));
    }
}
