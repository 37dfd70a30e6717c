//! FILENAME: core/parser/src/token.rs
//! PURPOSE: Token definitions for the formula lexer.
//! CONTEXT: Tokens are the atomic units produced by the lexer and consumed by the parser.
//! Each token keeps the exact source text it was scanned from and its byte
//! offset, so that `lex` can echo lexemes and errors can point at a column.

use serde::Serialize;

/// The kind of a token recognized by the formula lexer.
/// Serialized by variant name ("ColumnName", "Tilde", ...).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub enum TokenKind {
    // Names and literals
    ColumnName,
    /// A name immediately followed by '(' such as `s`, `mvbind`, `log`.
    Identifier,
    Number,
    True,
    False,

    // Operators
    Tilde,
    Plus,
    Minus,
    /// `*`: main effects plus every interaction among the operands
    InteractionAndEffect,
    /// `:`: exactly one interaction, no implied main effects
    InteractionOnly,
    Pipe,
    /// `||`: uncorrelated random effects
    DoublePipe,
    Caret,
    Equals,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,

    // Special
    Eof,
}

/// A single scanned token.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    /// Byte offset of the first character in the source formula.
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            position,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::ColumnName => write!(f, "column name"),
            TokenKind::Identifier => write!(f, "function name"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::True => write!(f, "TRUE"),
            TokenKind::False => write!(f, "FALSE"),
            TokenKind::Tilde => write!(f, "'~'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::InteractionAndEffect => write!(f, "'*'"),
            TokenKind::InteractionOnly => write!(f, "':'"),
            TokenKind::Pipe => write!(f, "'|'"),
            TokenKind::DoublePipe => write!(f, "'||'"),
            TokenKind::Caret => write!(f, "'^'"),
            TokenKind::Equals => write!(f, "'='"),
            TokenKind::LeftParen => write!(f, "'('"),
            TokenKind::RightParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            _ => write!(f, "'{}' at position {}", self.lexeme, self.position),
        }
    }
}
