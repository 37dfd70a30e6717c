//! FILENAME: core/engine/src/column.rs
//! PURPOSE: The resolved per-column model produced by the expander.
//! CONTEXT: One `Column` exists for every data column the formula references.
//! Interactions, transformations and random effects hang off the columns
//! that take part in them.

use serde::Serialize;
use std::collections::BTreeSet;

/// Semantic role of a column. A column can hold several roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Role {
    Response,
    Predictor,
    GroupingVariable,
}

/// Where an interaction was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectContext {
    FixedEffects,
    RandomEffects,
}

/// One interaction this column takes part in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    /// Number of distinct members, always >= 2.
    pub order: usize,
    /// The other members, in formula appearance order.
    pub with: Vec<String>,
    pub context: EffectContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouping_variable: Option<String>,
    /// Generated column name, e.g. "x1_x2".
    pub column: String,
}

/// A function applied to this column, like s(z).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transformation {
    pub function: String,
    pub generates_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomEffectKind {
    /// The column (or a transformation of it) varies by group.
    Slope,
    /// The column only varies by group through an interaction.
    Interaction,
}

/// Marks this column as varying by the levels of `grouping_variable`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RandomEffect {
    pub grouping_variable: String,
    pub kind: RandomEffectKind,
    pub correlated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub roles: BTreeSet<Role>,
    pub interactions: Vec<Interaction>,
    pub transformations: Vec<Transformation>,
    pub random_effects: Vec<RandomEffect>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            roles: BTreeSet::new(),
            interactions: Vec::new(),
            transformations: Vec::new(),
            random_effects: Vec::new(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Adds the interaction unless an identical record is already attached.
    pub fn add_interaction(&mut self, interaction: Interaction) {
        if !self.interactions.contains(&interaction) {
            self.interactions.push(interaction);
        }
    }

    pub fn add_transformation(&mut self, function: &str, generated: &str) {
        if self.transformations.iter().any(|t| t.function == function) {
            return;
        }
        self.transformations.push(Transformation {
            function: function.to_string(),
            generates_columns: vec![generated.to_string()],
        });
    }

    /// Records a random effect. A slope replaces an interaction-only record
    /// for the same group.
    pub fn add_random_effect(&mut self, effect: RandomEffect) {
        let existing = self
            .random_effects
            .iter_mut()
            .find(|e| e.grouping_variable == effect.grouping_variable);

        match existing {
            Some(current) => {
                if effect.kind == RandomEffectKind::Slope {
                    current.kind = RandomEffectKind::Slope;
                }
            }
            None => self.random_effects.push(effect),
        }
    }
}
