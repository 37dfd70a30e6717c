//! FILENAME: core/parser/src/error.rs
//! PURPOSE: Error types for the lexing and parsing stages.

use thiserror::Error;

/// Raised when no lexer rule matches the character at `position`.
#[derive(Error, Debug, PartialEq, Clone)]
#[error("Unrecognized character '{character}' at position {position}")]
pub struct LexError {
    pub character: char,
    pub position: usize,
}

/// Grammar violations. The parser stops at the first one.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Formula is missing the '~' response operator")]
    MissingTilde,

    #[error("Formula has no response variable before '~'")]
    MissingResponse,

    #[error("Unexpected {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: String },

    #[error("Unexpected end of formula, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("Unbalanced parentheses: {0}")]
    UnbalancedParentheses(String),

    #[error("Random effect group at position {position} {reason}")]
    MalformedRandomEffect { position: usize, reason: String },

    #[error("Parentheses at position {position} are nested more than {limit} levels deep")]
    NestingTooDeep { position: usize, limit: usize },

    #[error("Function call '{name}' takes exactly one variable argument, found {found}")]
    MalformedCall { name: String, found: String },
}

pub type LexResult<T> = Result<T, LexError>;
pub type ParseResult<T> = Result<T, ParseError>;
