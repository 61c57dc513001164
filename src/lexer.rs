use self::Token::*;
use crate::Type;
use anyhow::{bail, Result};
use std::{fmt, str::Chars};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    And,
    Assign,
    Asterisk,
    Bang,
    Comma,
    Decl,
    Dot,
    Else,
    EndOfFile,
    Equal,
    False,
    Float(f64),
    GreaterThan,
    Identifier(String),
    If,
    Illegal(String),
    Integer(i64),
    LeftBrace,
    LeftParentheses,
    LessThan,
    Minus,
    Not,
    NotEqual,
    Or,
    Percent,
    Plus,
    Read,
    RightBrace,
    RightParentheses,
    Semicolon,
    Slash,
    Str(String),
    Then,
    True,
    TypeName(Type),
    While,
    Write,
}

/// Line is 1-based, column is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub position: Position,
}

pub const EOF_CHAR: char = '\0';

pub struct Lexer<'a> {
    chars: Chars<'a>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Self {
            chars: input.chars(),
            line: 1,
            column: 0,
        }
    }

    pub fn next_token(&mut self) -> Result<Lexeme> {
        self.skip_trivia();
        let position = Position::new(self.line, self.column);
        let first_char = self.read_char();
        let token = match first_char {
            '=' => self.next_char_or(Assign, '=', Equal),
            ';' => Semicolon,
            '(' => LeftParentheses,
            ')' => RightParentheses,
            ',' => Comma,
            '+' => Plus,
            '{' => LeftBrace,
            '}' => RightBrace,
            '!' => self.next_char_or(Bang, '=', NotEqual),
            '<' => LessThan,
            '>' => GreaterThan,
            '-' => Minus,
            '*' => Asterisk,
            '/' => Slash,
            '%' => Percent,
            '.' => Dot,
            '&' => self.next_char_or(Illegal("&".to_string()), '&', And),
            '|' => self.next_char_or(Illegal("|".to_string()), '|', Or),
            '"' => {
                let contents = self.take_while(|c| c != '"' && c != '\n');
                if self.read_char() != '"' {
                    bail!("Unterminated string literal at {}", position);
                }
                Str(contents)
            }
            EOF_CHAR if self.is_eof() => EndOfFile,
            c if Self::is_letter(c) => {
                let mut identifier = c.to_string();
                identifier.push_str(&self.take_while(Self::is_identifier_char));
                Self::lookup_identifier(&identifier)
            }
            c if Self::is_digit(c) => {
                let mut number = c.to_string();
                number.push_str(&self.take_while(Self::is_digit));
                if self.peek_nth(0) == '.' && Self::is_digit(self.peek_nth(1)) {
                    number.push(self.read_char());
                    number.push_str(&self.take_while(Self::is_digit));
                    Float(number.parse::<f64>()?)
                } else {
                    Integer(number.parse::<i64>()?)
                }
            }
            illegal => Illegal(illegal.to_string()),
        };
        Ok(Lexeme { token, position })
    }

    /// Lexes the whole input. The last lexeme is always `EndOfFile`.
    pub fn tokenize(&mut self) -> Result<Vec<Lexeme>> {
        let mut lexemes = Vec::new();
        loop {
            let lexeme = self.next_token()?;
            let done = lexeme.token == EndOfFile;
            lexemes.push(lexeme);
            if done {
                break;
            }
        }
        Ok(lexemes)
    }

    fn read_char(&mut self) -> char {
        match self.chars.next() {
            Some('\n') => {
                self.line += 1;
                self.column = 0;
                '\n'
            }
            Some(c) => {
                self.column += 1;
                c
            }
            None => EOF_CHAR,
        }
    }

    fn peek_nth(&self, n: usize) -> char {
        self.chars.clone().nth(n).unwrap_or(EOF_CHAR)
    }

    fn is_eof(&self) -> bool {
        self.chars.as_str().is_empty()
    }

    fn take_while(&mut self, mut predicate: impl FnMut(char) -> bool) -> String {
        let mut chars = String::new();
        while predicate(self.peek_nth(0)) && !self.is_eof() {
            chars.push(self.read_char());
        }
        chars
    }

    fn skip_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
        while predicate(self.peek_nth(0)) && !self.is_eof() {
            self.read_char();
        }
    }

    // Whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            self.skip_while(Self::is_whitespace);
            if self.peek_nth(0) == '/' && self.peek_nth(1) == '/' {
                self.skip_while(|c| c != '\n');
            } else {
                break;
            }
        }
    }

    fn is_letter(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_identifier_char(c: char) -> bool {
        Self::is_letter(c) || Self::is_digit(c)
    }

    fn is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

    fn is_whitespace(c: char) -> bool {
        c == ' ' || c == '\t' || c == '\n' || c == '\r'
    }

    fn lookup_identifier(identifier: &str) -> Token {
        if let Some(typ) = Type::from_keyword(identifier) {
            return TypeName(typ);
        }
        match identifier {
            "decl" => Decl,
            "true" => True,
            "false" => False,
            "if" => If,
            "then" => Then,
            "else" => Else,
            "while" => While,
            "write" => Write,
            "read" => Read,
            "and" => And,
            "or" => Or,
            "not" => Not,
            _ => Identifier(identifier.to_string()),
        }
    }

    fn next_char_or(&mut self, default: Token, next_char: char, token: Token) -> Token {
        match self.peek_nth(0) {
            c if c == next_char => {
                self.read_char();
                token
            }
            _ => default,
        }
    }
}
