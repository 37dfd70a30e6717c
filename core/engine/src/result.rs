//! FILENAME: core/engine/src/result.rs
//! PURPOSE: The public, serializable description of a parsed formula.
//! CONTEXT: Pure rendering step. Builds the result from a ResolvedModel and
//! orders `all_generated_columns`; no further validation happens here.

use crate::column::Column;
use crate::expander::ResolvedModel;
use formula_parser::{Token, TokenKind};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Name of the implicit constant column.
pub const INTERCEPT_COLUMN: &str = "intercept";

/// Model level facts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub has_intercept: bool,
    pub is_random_effects_model: bool,
    pub has_uncorrelated_slopes_and_intercepts: bool,
    /// Only set when the formula carries `family = ...`. Serialized as null otherwise.
    pub family: Option<String>,
    pub is_nonlinear: bool,
    /// Parameters introduced by `param ~ expr` clauses, in clause order.
    pub nonlinear_parameters: Vec<String>,
    pub response_variable_count: usize,
}

/// Summary of one `(terms | grouping)` group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RandomEffectGroup {
    pub grouping_variable: String,
    /// The group-level intercept `1`, present unless removed with `0` or `- 1`.
    pub has_intercept: bool,
    /// false for `||`
    pub correlated: bool,
    /// Design terms varying by group: "x1", "z_s", "x1_x2".
    pub variables: Vec<String>,
}

/// The structured description of a formula returned by `parse`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescription {
    /// The input, echoed unchanged.
    pub formula: String,
    pub metadata: Metadata,
    pub columns: BTreeMap<String, Column>,
    /// Responses, intercept, main effects, transformations, then
    /// interactions by increasing order. Each name appears once.
    pub all_generated_columns: Vec<String>,
    pub random_effects: Vec<RandomEffectGroup>,
}

impl ModelDescription {
    pub fn from_resolved(formula: &str, model: ResolvedModel) -> Self {
        let mut generated = model.generated;
        // Stable: first appearance order is kept within an order.
        generated.sort_by_key(|g| g.order);

        let intercept = model
            .metadata
            .has_intercept
            .then(|| INTERCEPT_COLUMN.to_string());

        let mut seen = HashSet::new();
        let all_generated_columns = model
            .responses
            .into_iter()
            .chain(intercept)
            .chain(model.main_effects)
            .chain(generated.into_iter().map(|g| g.name))
            .filter(|name| seen.insert(name.clone()))
            .collect();

        ModelDescription {
            formula: formula.to_string(),
            metadata: model.metadata,
            columns: model.columns,
            all_generated_columns,
            random_effects: model.random_effects,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One entry of the `lex` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexedToken {
    pub lexeme: String,
    pub token: TokenKind,
}

impl From<Token> for LexedToken {
    fn from(token: Token) -> Self {
        LexedToken {
            lexeme: token.lexeme,
            token: token.kind,
        }
    }
}
