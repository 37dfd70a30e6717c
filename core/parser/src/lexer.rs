//! FILENAME: core/parser/src/lexer.rs
//! PURPOSE: Scans a raw formula string and produces a stream of Tokens.
//! CONTEXT: This is the first stage of the parsing pipeline. It handles
//! whitespace skipping, number scanning, names, and the two-character `||`
//! operator. It performs no grammar validation: `~ x1` lexes fine and is
//! rejected later by the parser.
//!
//! SUPPORTED OPERATORS:
//! - Single char: ~ + - * : | ^ = ( ) ,
//! - Multi char: ||
//! - Names: letters, digits, '_' and '.'; a name directly followed by '('
//!   is a function Identifier, otherwise a ColumnName.

use crate::error::{LexError, LexResult};
use crate::token::{Token, TokenKind};
use std::iter::Peekable;
use std::str::CharIndices;

pub struct Lexer<'a> {
    source: &'a str,
    input: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            input: source.char_indices().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    /// Returns a token of kind `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace();

        let (start, ch) = match self.input.next() {
            Some(pair) => pair,
            None => return Ok(Token::new(TokenKind::Eof, "", self.source.len())),
        };

        let kind = match ch {
            '~' => TokenKind::Tilde,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::InteractionAndEffect,
            ':' => TokenKind::InteractionOnly,
            '^' => TokenKind::Caret,
            '=' => TokenKind::Equals,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,

            // Handle | and potentially ||
            '|' => self.read_pipe(),

            c if c.is_ascii_digit() => return Ok(self.read_number(start)),

            c if is_name_start(c) => return Ok(self.read_name(start)),

            character => {
                return Err(LexError {
                    character,
                    position: start,
                })
            }
        };

        let source = self.source;
        let end = self.offset();
        Ok(Token::new(kind, &source[start..end], start))
    }

    /// Scans the whole input. The trailing `Eof` token is not included.
    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token.is(TokenKind::Eof) {
                break;
            }
            tokens.push(token);
        }
        log::trace!(target: "LEX", "scanned {} tokens", tokens.len());
        Ok(tokens)
    }

    /// Byte offset of the next unread character.
    fn offset(&mut self) -> usize {
        self.input
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.source.len())
    }

    fn skip_whitespace(&mut self) {
        while let Some(&(_, ch)) = self.input.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.input.next();
        }
    }

    /// Handles operators starting with '|': |, ||
    fn read_pipe(&mut self) -> TokenKind {
        match self.input.peek() {
            Some(&(_, '|')) => {
                self.input.next();
                TokenKind::DoublePipe
            }
            _ => TokenKind::Pipe,
        }
    }

    fn read_number(&mut self, start: usize) -> Token {
        let mut has_dot = false;

        while let Some(&(_, ch)) = self.input.peek() {
            if ch.is_ascii_digit() {
                self.input.next();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.input.next();
            } else {
                break;
            }
        }

        let source = self.source;
        let end = self.offset();
        Token::new(TokenKind::Number, &source[start..end], start)
    }

    fn read_name(&mut self, start: usize) -> Token {
        while let Some(&(_, ch)) = self.input.peek() {
            // '.' is allowed after the first character for R-style names
            // like "Sepal.Length".
            if is_name_start(ch) || ch.is_ascii_digit() || ch == '.' {
                self.input.next();
            } else {
                break;
            }
        }

        let source = self.source;
        let end = self.offset();
        let lexeme = &source[start..end];

        let kind = match lexeme {
            "TRUE" => TokenKind::True,
            "FALSE" => TokenKind::False,
            _ if matches!(self.input.peek(), Some(&(_, '('))) => TokenKind::Identifier,
            _ => TokenKind::ColumnName,
        };

        Token::new(kind, lexeme, start)
    }
}

/// Returns true if `ch` can start a name: ASCII letters and underscore.
fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

/// Convenience function to scan a formula string directly.
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    Lexer::new(input).tokenize()
}
