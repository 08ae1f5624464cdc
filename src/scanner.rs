//! Turns raw source text into a flat token stream.
//!
//! Mirrors the reference scanner's structure: a cursor over the source
//! bytes, single-character dispatch with lookahead for two-character
//! operators, and dedicated loops for strings, numbers, and identifiers.
//! Lexical errors are reported through the shared `Reporter` and do not
//! stop scanning.

use crate::error::Reporter;
use crate::token::{keyword_lookup, Token, TokenType};
use crate::value::Value;

pub struct Scanner<'a> {
    source: &'a [u8],
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source: source.as_bytes(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self, reporter: &Reporter) -> Vec<Token> {
        log::trace!("scanning {} bytes of source", self.source.len());
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(reporter);
        }
        self.tokens.push(Token::eof(self.line));
        log::debug!("scanner produced {} tokens", self.tokens.len());
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    fn matches(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned()
    }

    fn add_token(&mut self, kind: TokenType) {
        self.add_token_literal(kind, Value::Nil);
    }

    fn add_token_literal(&mut self, kind: TokenType, literal: Value) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }

    fn scan_token(&mut self, reporter: &Reporter) {
        use TokenType::*;
        let c = self.advance();
        match c {
            b'(' => self.add_token(LeftParen),
            b')' => self.add_token(RightParen),
            b'{' => self.add_token(LeftBrace),
            b'}' => self.add_token(RightBrace),
            b',' => self.add_token(Comma),
            b'.' => self.add_token(Dot),
            b'-' => self.add_token(Minus),
            b'+' => self.add_token(Plus),
            b';' => self.add_token(Semicolon),
            b'*' => self.add_token(Star),
            b'!' => {
                let kind = if self.matches(b'=') { BangEqual } else { Bang };
                self.add_token(kind);
            }
            b'=' => {
                let kind = if self.matches(b'=') { EqualEqual } else { Equal };
                self.add_token(kind);
            }
            b'<' => {
                let kind = if self.matches(b'=') { LessEqual } else { Less };
                self.add_token(kind);
            }
            b'>' => {
                let kind = if self.matches(b'=') {
                    GreaterEqual
                } else {
                    Greater
                };
                self.add_token(kind);
            }
            b'/' => {
                if self.matches(b'/') {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(Slash);
                }
            }
            b' ' | b'\r' | b'\t' => {}
            b'\n' => self.line += 1,
            b'"' => self.scan_string(reporter),
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_ascii_alphabetic() || c == b'_' => self.scan_identifier(),
            _ => reporter.error(self.line, "Unexpected character."),
        }
    }

    fn scan_string(&mut self, reporter: &Reporter) {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.advance();
        }
        if self.is_at_end() {
            reporter.error(self.line, "Unterminated string.");
            return;
        }
        self.advance(); // closing quote
        let value = String::from_utf8_lossy(&self.source[self.start + 1..self.current - 1])
            .into_owned();
        self.add_token_literal(TokenType::String, Value::string(value));
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let n: f64 = self.lexeme().parse().expect("scanner grammar guarantees a valid number");
        self.add_token_literal(TokenType::Number, Value::Number(n));
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }
        let text = self.lexeme();
        let kind = keyword_lookup(&text).unwrap_or(TokenType::Identifier);
        self.add_token(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> Vec<Token> {
        let reporter = Reporter::new();
        let tokens = Scanner::new(src).scan_tokens(&reporter);
        assert!(!reporter.had_error(), "unexpected scan error for {:?}", src);
        tokens
    }

    #[test]
    fn single_and_double_char_operators() {
        let tokens = scan("!= == <= >= < >");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        use TokenType::*;
        assert_eq!(
            kinds,
            vec![BangEqual, EqualEqual, LessEqual, GreaterEqual, Less, Greater, Eof]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = scan("1 // a comment\n2");
        assert_eq!(tokens.len(), 3); // NUMBER, NUMBER, EOF
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn string_literal() {
        let tokens = scan("\"hi\"");
        assert_eq!(tokens[0].kind, TokenType::String);
        assert_eq!(tokens[0].literal, Value::string("hi"));
    }

    #[test]
    fn unterminated_string_reports_error() {
        let reporter = Reporter::new();
        Scanner::new("\"hi").scan_tokens(&reporter);
        assert!(reporter.had_error());
    }

    #[test]
    fn number_literal() {
        let tokens = scan("3.14");
        assert_eq!(tokens[0].literal, Value::Number(3.14));
    }

    #[test]
    fn keyword_vs_identifier() {
        let tokens = scan("var x fun notakeyword");
        use TokenType::*;
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Var, Identifier, Fun, Identifier, Eof]);
    }
}
