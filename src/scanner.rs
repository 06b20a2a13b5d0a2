use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::{Diagnostics, SourceError};
use crate::value::Value;

static KEYWORDS: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    HashMap::from([
        ("and", TokenType::And),
        ("class", TokenType::Class),
        ("else", TokenType::Else),
        ("false", TokenType::False),
        ("for", TokenType::For),
        ("fun", TokenType::Fun),
        ("if", TokenType::If),
        ("nil", TokenType::Nil),
        ("or", TokenType::Or),
        ("print", TokenType::Print),
        ("return", TokenType::Return),
        ("super", TokenType::Super),
        ("this", TokenType::This),
        ("true", TokenType::True),
        ("var", TokenType::Var),
        ("while", TokenType::While),
    ])
});

/// Scan the whole source into tokens. The result always ends with an `EOF` token,
/// even when lexical errors were reported along the way.
pub fn scan_tokens(code: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let mut scanner = Scanner {
        chars: code.chars().collect(),
        cursor_begin: 0,
        cursor_end: 0,
        line: 1,
        tokens: Vec::new(),
        diagnostics,
    };

    while !scanner.at_end() {
        scanner.cursor_begin = scanner.cursor_end;
        scanner.scan_token();
    }

    let line = scanner.line;
    let mut tokens = scanner.tokens;
    tokens.push(Token {
        token_type: TokenType::EOF,
        lexeme: String::new(),
        literal: None,
        line,
    });

    tracing::debug!(count = tokens.len(), "scanned tokens");
    tokens
}

struct Scanner<'a> {
    chars: Vec<char>,
    cursor_begin: usize,
    cursor_end: usize,
    line: u32,
    tokens: Vec<Token>,
    diagnostics: &'a mut Diagnostics,
}

impl Scanner<'_> {
    fn scan_token(&mut self) {
        let current = self.advance();

        match current {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),
            '?' => self.add_token(TokenType::Question),
            ':' => self.add_token(TokenType::Colon),
            '!' => self.add_one_or_two('=', TokenType::BangEqual, TokenType::Bang),
            '=' => self.add_one_or_two('=', TokenType::EqualEqual, TokenType::Equal),
            '>' => self.add_one_or_two('=', TokenType::GreaterEqual, TokenType::Greater),
            '<' => self.add_one_or_two('=', TokenType::LessEqual, TokenType::Less),
            '/' => {
                if self.advance_if_match('/') {
                    while self.peek() != Some('\n') && !self.at_end() {
                        self.advance();
                    }
                } else if self.advance_if_match('*') {
                    self.block_comment();
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if is_alpha(c) => self.identifier(),
            _ => self
                .diagnostics
                .report(SourceError::lexical(self.line, "Unexpected character.")),
        }
    }

    // Block comments do not nest and end at the first '/' found.
    fn block_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '/' {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }
        if !self.at_end() {
            self.advance();
        }
    }

    fn string(&mut self) {
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.at_end() {
            self.diagnostics
                .report(SourceError::lexical(self.line, "Unterminated string."));
            return;
        }

        // closing quote
        self.advance();

        let value: String = self.chars[self.cursor_begin + 1..self.cursor_end - 1]
            .iter()
            .collect();
        self.add_literal_token(TokenType::String, Value::String(value));
    }

    fn number(&mut self) {
        self.consume_digits();

        let has_fraction = self.peek() == Some('.')
            && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if has_fraction {
            self.advance();
            self.consume_digits();
        }

        let text = self.current_lexeme();
        match text.parse::<f64>() {
            Ok(value) => self.add_literal_token(TokenType::Number, Value::Number(value)),
            Err(_) => self
                .diagnostics
                .report(SourceError::lexical(self.line, "Invalid number literal.")),
        }
    }

    fn consume_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(is_alphanumeric) {
            self.advance();
        }

        let text = self.current_lexeme();
        let token_type = KEYWORDS
            .get(text.as_str())
            .copied()
            .unwrap_or(TokenType::Identifier);
        self.add_token(token_type);
    }

    fn add_one_or_two(&mut self, second: char, matched: TokenType, single: TokenType) {
        let token_type = if self.advance_if_match(second) { matched } else { single };
        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.push_token(token_type, None);
    }

    fn add_literal_token(&mut self, token_type: TokenType, literal: Value) {
        self.push_token(token_type, Some(literal));
    }

    fn push_token(&mut self, token_type: TokenType, literal: Option<Value>) {
        let lexeme = self.current_lexeme();
        self.tokens.push(Token {
            token_type,
            lexeme,
            literal,
            line: self.line,
        });
    }

    fn current_lexeme(&self) -> String {
        self.chars[self.cursor_begin..self.cursor_end].iter().collect()
    }

    fn advance(&mut self) -> char {
        let current = self.chars[self.cursor_end];
        self.cursor_end += 1;
        current
    }

    fn advance_if_match(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.cursor_end += 1;
            true
        } else {
            false
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor_end).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.cursor_end + 1).copied()
    }

    fn at_end(&self) -> bool {
        self.cursor_end >= self.chars.len()
    }
}

fn is_alpha(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_alphanumeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub literal: Option<Value>,
    pub line: u32,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(literal) => write!(f, "{:?} {} {}", self.token_type, self.lexeme, literal),
            None => write!(f, "{:?} {}", self.token_type, self.lexeme),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Question,
    Colon,

    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals.
    Identifier,
    String,
    Number,

    // Keywords.
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    EOF,
}
