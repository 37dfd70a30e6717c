//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the formula engine.
//! CONTEXT: Ties the parser crate to the semantic expander and exposes the
//! two public operations:
//! - `lex`: formula text --> ordered tokens
//! - `parse`: formula text --> ModelDescription (columns, generated columns, metadata)
//!
//! Both are pure and reentrant. Every call owns its tokens, tree and result;
//! the first error aborts the call and no partial result is returned.

pub mod column;
pub mod combinations;
pub mod config;
pub mod error;
pub mod expander;
pub mod result;


// Re-export commonly used types at the crate root
pub use column::{
    Column, EffectContext, Interaction, RandomEffect, RandomEffectKind, Role, Transformation,
};
pub use config::ExpansionConfig;
pub use error::{FormulaError, FormulaResult, SemanticError, SemanticResult};
pub use expander::{Expander, ResolvedModel};
pub use formula_parser::TokenKind;
pub use result::{LexedToken, Metadata, ModelDescription, RandomEffectGroup, INTERCEPT_COLUMN};

/// Tokenizes a formula. Whitespace is dropped; nothing is validated beyond
/// the character level.
pub fn lex(formula: &str) -> FormulaResult<Vec<LexedToken>> {
    let tokens = formula_parser::tokenize(formula)?;
    Ok(tokens.into_iter().map(LexedToken::from).collect())
}

/// Parses and expands a formula with the default configuration.
pub fn parse(formula: &str) -> FormulaResult<ModelDescription> {
    parse_with_config(formula, &ExpansionConfig::default())
}

/// Parses and expands a formula with an explicit configuration.
pub fn parse_with_config(
    formula: &str,
    config: &ExpansionConfig,
) -> FormulaResult<ModelDescription> {
    let ast = formula_parser::parse(formula)?;
    let model = Expander::new(config).expand(&ast)?;
    Ok(ModelDescription::from_resolved(formula, model))
}

/// `lex` rendered as a JSON array of `{lexeme, token}` objects.
pub fn lex_formula(formula: &str) -> FormulaResult<serde_json::Value> {
    let tokens = lex(formula)?;
    serde_json::to_value(tokens).map_err(|e| FormulaError::Serialization(e.to_string()))
}

/// `parse` rendered as a JSON object.
pub fn parse_formula(formula: &str) -> FormulaResult<serde_json::Value> {
    let description = parse(formula)?;
    serde_json::to_value(description).map_err(|e| FormulaError::Serialization(e.to_string()))
}
