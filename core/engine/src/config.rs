//! FILENAME: core/engine/src/config.rs
//! PURPOSE: Tunable limits and vocabularies for formula expansion.

use serde::{Deserialize, Serialize};

/// Transformation functions accepted when no configuration is given.
pub const DEFAULT_TRANSFORMATIONS: &[&str] = &[
    "s", "log", "exp", "sqrt", "scale", "center", "factor", "poly", "offset", "te", "ti", "t2",
    "gp", "mo", "me", "mi",
];

/// Default bound on the operand count of a single `*` group.
/// Expansion cost grows as 2^n in the operand count.
pub const DEFAULT_MAX_INTERACTION_OPERANDS: usize = 16;

/// Settings consulted by the expander.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Function names allowed in calls like `s(z)`.
    pub transformations: Vec<String>,
    /// Largest allowed operand count for `*` and `(...)^k` groups; None disables the check.
    pub max_interaction_operands: Option<usize>,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        ExpansionConfig {
            transformations: DEFAULT_TRANSFORMATIONS.iter().map(|s| s.to_string()).collect(),
            max_interaction_operands: Some(DEFAULT_MAX_INTERACTION_OPERANDS),
        }
    }
}

impl ExpansionConfig {
    pub fn supports_transformation(&self, function: &str) -> bool {
        self.transformations.iter().any(|f| f == function)
    }

    /// Reads a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
