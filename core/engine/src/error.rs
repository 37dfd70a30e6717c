//! FILENAME: core/engine/src/error.rs
//! PURPOSE: Semantic errors and the single error type returned by the public API.

use formula_parser::{LexError, ParseError};
use thiserror::Error;

/// Problems found while expanding a syntactically valid formula.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum SemanticError {
    #[error("Unsupported transformation function '{0}'")]
    UnsupportedTransformation(String),

    #[error("Unsupported constant term '{0}'; use '- 1' to remove the intercept")]
    UnsupportedConstant(String),

    #[error("Constant '{0}' cannot be part of an interaction")]
    ConstantInInteraction(String),

    #[error("Random effect group for '{0}' cannot appear inside an interaction or another group")]
    NestedRandomEffect(String),

    #[error("Random effect group for '{0}' cannot be removed")]
    RandomEffectRemoval(String),

    #[error("Exponent '{0}' must be a positive whole number outside nonlinear formulas")]
    InvalidExponent(String),

    #[error("Variable '{0}' is used both as a response and as a predictor")]
    ResponseAsPredictor(String),

    #[error("Nonlinear parameter '{0}' is defined more than once")]
    DuplicateParameter(String),

    #[error("Nonlinear parameter '{0}' clashes with a response variable")]
    ParameterConflict(String),

    #[error("Parameter '{0}' is used in a linear predictor; add 'nl = TRUE' for nonlinear formulas")]
    ParameterInLinearPredictor(String),

    #[error("Unknown formula option '{0}'")]
    UnknownOption(String),

    #[error("Formula option '{0}' is given more than once")]
    DuplicateOption(String),

    #[error("Invalid value '{value}' for option '{option}'")]
    InvalidOption { option: String, value: String },

    #[error("Variable '{0}' cannot interact with a transformation of itself")]
    SelfInteraction(String),

    #[error("Generated column '{0}' has the same name as a variable in the formula")]
    ColumnNameCollision(String),

    #[error("Interaction group has {operands} operands, more than the limit of {limit}")]
    InteractionTooLarge { operands: usize, limit: usize },
}

/// The error surfaced by `lex` and `parse`. Its message is the whole contract.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum FormulaError {
    #[error("Formula lexing error: {0}")]
    Lex(#[from] LexError),

    #[error("Formula parsing error: {0}")]
    Parse(ParseError),

    #[error("Formula parsing error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("Failed to serialize result: {0}")]
    Serialization(String),
}

impl From<ParseError> for FormulaError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Lex(lex) => FormulaError::Lex(lex),
            other => FormulaError::Parse(other),
        }
    }
}

pub type SemanticResult<T> = Result<T, SemanticError>;
pub type FormulaResult<T> = Result<T, FormulaError>;
