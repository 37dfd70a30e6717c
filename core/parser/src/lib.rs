//! FILENAME: core/parser/src/lib.rs
//! PURPOSE: Library root for the model formula parser.
//! CONTEXT: This module exposes the lexer, parser, and AST components
//! needed to convert Wilkinson-style formula strings into formula trees.
//!
//! PIPELINE: Formula String --> Lexer --> Tokens --> Parser --> AST --> Expander
//!
//! SUPPORTED FEATURES:
//! - Response operator: y ~ ...
//! - Main effects and intercept control: x1 + x2, -1
//! - Interactions: x1*x2 (effects and interactions), x1:x2 (interaction only)
//! - Transformations: s(z)
//! - Random effects: (1 + x | group), (1 | group), (x || group)
//! - Multivariate responses: mvbind(y1, y2) ~ x
//! - Nonlinear clauses and options: y ~ a1 - a2^x, a1 ~ 1, a2 ~ x, nl = TRUE

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

// Register the separate tests module
#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use ast::{
    Formula, FormulaOption, InteractionOperator, NonlinearFormula, OptionValue, Predictor,
    Response, Sign, SignedTerm, Term,
};
pub use error::{LexError, LexResult, ParseError, ParseResult};
pub use lexer::{tokenize, Lexer};
pub use parser::{parse, Parser, MAX_NESTING_DEPTH};
pub use token::{Token, TokenKind};
