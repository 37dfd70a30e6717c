//! FILENAME: core/engine/src/expander.rs
//! PURPOSE: Walks a parsed Formula and resolves it into columns and metadata.
//! CONTEXT: This is the semantic stage of the pipeline. Every term is first
//! flattened into design terms (products of distinct factors), then each
//! design term is applied to the columns it touches:
//! - order 1 without a function: a main effect
//! - order 1 with a function: a transformation, e.g. s(z) -> z_s
//! - order >= 2: an interaction record on every participating column
//!
//! `*` groups are crossed over every non-empty subset of their operands,
//! so n single-variable operands yield 2^n - n - 1 interactions.

use crate::column::{Column, EffectContext, Interaction, RandomEffect, RandomEffectKind, Role};
use crate::combinations::subsets_by_size;
use crate::config::ExpansionConfig;
use crate::error::{SemanticError, SemanticResult};
use crate::result::{Metadata, RandomEffectGroup, INTERCEPT_COLUMN};
use formula_parser::{
    Formula, FormulaOption, InteractionOperator, OptionValue, Predictor, Sign, Term,
};
use std::collections::{BTreeMap, HashMap, HashSet};

// ============================================================================
// DESIGN TERMS
// ============================================================================

/// One factor of a design term: a raw column or a transformed one.
#[derive(Debug, Clone, PartialEq)]
struct Factor {
    /// The data column this factor reads.
    column: String,
    /// Name used in generated columns: "x" or "z_s".
    name: String,
    function: Option<String>,
}

impl Factor {
    fn variable(name: &str) -> Self {
        Factor {
            column: name.to_string(),
            name: name.to_string(),
            function: None,
        }
    }

    fn transformed(column: &str, function: &str) -> Self {
        Factor {
            column: column.to_string(),
            name: format!("{}_{}", column, function),
            function: Some(function.to_string()),
        }
    }
}

/// A product of distinct factors, kept in formula appearance order.
#[derive(Debug, Clone, Default, PartialEq)]
struct DesignTerm {
    factors: Vec<Factor>,
}

impl DesignTerm {
    fn single(factor: Factor) -> Self {
        DesignTerm {
            factors: vec![factor],
        }
    }

    fn order(&self) -> usize {
        self.factors.len()
    }

    /// Generated column name: "x1_x2_x3".
    fn name(&self) -> String {
        self.factors
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Order-independent identity, so x1:x2 and x2:x1 are the same term.
    fn key(&self) -> Vec<String> {
        let mut key: Vec<String> = self.factors.iter().map(|f| f.name.clone()).collect();
        key.sort();
        key
    }

    fn merge(&self, other: &DesignTerm) -> DesignTerm {
        let mut factors = self.factors.clone();
        for factor in &other.factors {
            if !factors.iter().any(|f| f.name == factor.name) {
                factors.push(factor.clone());
            }
        }
        DesignTerm { factors }
    }
}

fn cross(left: &[DesignTerm], right: &[DesignTerm]) -> Vec<DesignTerm> {
    let mut product = Vec::with_capacity(left.len() * right.len());
    for l in left {
        for r in right {
            product.push(l.merge(r));
        }
    }
    product
}

/// Crosses every non-empty subset of `operands`, dropping terms above
/// `max_order` and repeated terms.
fn cross_subsets(operands: &[Vec<DesignTerm>], max_order: Option<usize>) -> Vec<DesignTerm> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();

    for subset in subsets_by_size(operands.len()) {
        let mut product = vec![DesignTerm::default()];
        for &index in &subset {
            product = cross(&product, &operands[index]);
        }
        for term in product {
            if max_order.map_or(true, |max| term.order() <= max) && seen.insert(term.key()) {
                result.push(term);
            }
        }
    }

    result
}

fn dedupe(terms: Vec<DesignTerm>) -> Vec<DesignTerm> {
    let mut seen = HashSet::new();
    terms.into_iter().filter(|t| seen.insert(t.key())).collect()
}

fn constant_text(value: f64) -> String {
    format!("{}", value)
}

/// Where a design term is applied.
#[derive(Debug, Clone)]
enum Scope {
    Fixed,
    Random { grouping: String, correlated: bool },
}

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Default)]
struct FormulaOptions {
    nonlinear: bool,
    family: Option<String>,
}

impl FormulaOptions {
    fn from_options(options: &[FormulaOption]) -> SemanticResult<Self> {
        let mut resolved = FormulaOptions::default();
        let mut seen = HashSet::new();

        for option in options {
            if !seen.insert(option.name.as_str()) {
                return Err(SemanticError::DuplicateOption(option.name.clone()));
            }
            match (option.name.as_str(), &option.value) {
                ("nl", OptionValue::Boolean(flag)) => resolved.nonlinear = *flag,
                ("family", OptionValue::Name(name)) => resolved.family = Some(name.clone()),
                ("nl", value) | ("family", value) => {
                    return Err(SemanticError::InvalidOption {
                        option: option.name.clone(),
                        value: value.to_string(),
                    })
                }
                (other, _) => return Err(SemanticError::UnknownOption(other.to_string())),
            }
        }

        Ok(resolved)
    }
}

// ============================================================================
// EXPANDER
// ============================================================================

/// A generated (non-raw) design column and its interaction order.
/// Transformations have order 1.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedColumn {
    pub name: String,
    pub order: usize,
}

/// The fully resolved model, ready for serialization.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub responses: Vec<String>,
    pub columns: BTreeMap<String, Column>,
    /// Main effect columns in first appearance order.
    pub main_effects: Vec<String>,
    /// Transformation and interaction columns in first appearance order.
    pub generated: Vec<GeneratedColumn>,
    pub random_effects: Vec<RandomEffectGroup>,
    pub metadata: Metadata,
}

pub struct Expander<'c> {
    config: &'c ExpansionConfig,
    columns: BTreeMap<String, Column>,
    responses: Vec<String>,
    parameters: Vec<String>,
    main_effects: Vec<String>,
    generated: Vec<GeneratedColumn>,
    random_effects: Vec<RandomEffectGroup>,
    /// First spelling of every applied design term, keyed by its sorted names.
    canonical: HashMap<Vec<String>, DesignTerm>,
}

impl<'c> Expander<'c> {
    pub fn new(config: &'c ExpansionConfig) -> Self {
        Expander {
            config,
            columns: BTreeMap::new(),
            responses: Vec::new(),
            parameters: Vec::new(),
            main_effects: Vec::new(),
            generated: Vec::new(),
            random_effects: Vec::new(),
            canonical: HashMap::new(),
        }
    }

    /// Resolves the whole formula. Consumes the expander.
    pub fn expand(mut self, formula: &Formula) -> SemanticResult<ResolvedModel> {
        let options = FormulaOptions::from_options(&formula.options)?;

        for name in formula.response.names() {
            self.column(name).roles.insert(Role::Response);
            if !self.responses.iter().any(|r| r == name) {
                self.responses.push(name.to_string());
            }
        }

        for clause in &formula.nonlinear {
            let parameter = &clause.parameter;
            if self.parameters.contains(parameter) {
                return Err(SemanticError::DuplicateParameter(parameter.clone()));
            }
            if self.responses.contains(parameter) {
                return Err(SemanticError::ParameterConflict(parameter.clone()));
            }
            self.parameters.push(parameter.clone());
        }

        let has_intercept = if options.nonlinear {
            self.expand_nonlinear(&formula.predictor)?
        } else {
            self.expand_predictor(&formula.predictor)?
        };

        for clause in &formula.nonlinear {
            log::trace!(target: "EXPAND", "expanding clause for parameter {}", clause.parameter);
            self.expand_predictor(&clause.predictor)?;
        }

        // all_generated_columns must name each column once.
        if let Some(clash) = self
            .generated
            .iter()
            .find(|g| self.columns.contains_key(&g.name))
        {
            return Err(SemanticError::ColumnNameCollision(clash.name.clone()));
        }
        if has_intercept && self.columns.contains_key(INTERCEPT_COLUMN) {
            return Err(SemanticError::ColumnNameCollision(INTERCEPT_COLUMN.to_string()));
        }

        for name in &self.responses {
            if let Some(column) = self.columns.get(name) {
                if column.has_role(Role::Predictor) || column.has_role(Role::GroupingVariable) {
                    return Err(SemanticError::ResponseAsPredictor(name.clone()));
                }
            }
        }

        let metadata = Metadata {
            has_intercept,
            is_random_effects_model: !self.random_effects.is_empty(),
            has_uncorrelated_slopes_and_intercepts: self.random_effects.iter().any(|g| !g.correlated),
            family: options.family,
            is_nonlinear: options.nonlinear,
            nonlinear_parameters: self.parameters,
            response_variable_count: self.responses.len(),
        };

        log::debug!(
            target: "EXPAND",
            "resolved {} columns, {} main effects, {} generated columns, {} random effect groups",
            self.columns.len(),
            self.main_effects.len(),
            self.generated.len(),
            self.random_effects.len()
        );

        Ok(ResolvedModel {
            responses: self.responses,
            columns: self.columns,
            main_effects: self.main_effects,
            generated: self.generated,
            random_effects: self.random_effects,
            metadata,
        })
    }

    fn column(&mut self, name: &str) -> &mut Column {
        self.columns
            .entry(name.to_string())
            .or_insert_with(|| Column::new(name))
    }

    fn check_operand_limit(&self, operands: usize) -> SemanticResult<()> {
        match self.config.max_interaction_operands {
            Some(limit) if operands > limit => {
                Err(SemanticError::InteractionTooLarge { operands, limit })
            }
            _ => Ok(()),
        }
    }

    /// Expands a linear predictor. Returns false when `- 1` removes the intercept.
    fn expand_predictor(&mut self, predictor: &Predictor) -> SemanticResult<bool> {
        let mut has_intercept = true;
        let mut removed = HashSet::new();

        // Removals apply wherever they appear: x1*x2 - x1:x2
        for signed in predictor.terms.iter().filter(|s| s.sign == Sign::Minus) {
            match &signed.term {
                Term::Constant(value) if *value == 1.0 => has_intercept = false,
                Term::Constant(value) => {
                    return Err(SemanticError::UnsupportedConstant(constant_text(*value)))
                }
                Term::RandomEffectGroup { grouping, .. } => {
                    return Err(SemanticError::RandomEffectRemoval(grouping.clone()))
                }
                term => {
                    for design in self.design_terms(term)? {
                        removed.insert(design.key());
                    }
                }
            }
        }

        for signed in predictor.terms.iter().filter(|s| s.sign == Sign::Plus) {
            match &signed.term {
                // An explicit intercept changes nothing.
                Term::Constant(value) if *value == 1.0 => {}
                Term::Constant(value) => {
                    return Err(SemanticError::UnsupportedConstant(constant_text(*value)))
                }
                Term::RandomEffectGroup {
                    terms,
                    grouping,
                    correlated,
                } => self.expand_random_group(terms, grouping, *correlated)?,
                term => {
                    for design in self.design_terms(term)? {
                        if !removed.contains(&design.key()) {
                            self.apply(&design, &Scope::Fixed)?;
                        }
                    }
                }
            }
        }

        Ok(has_intercept)
    }

    /// Expands `(terms | grouping)`.
    fn expand_random_group(
        &mut self,
        terms: &Predictor,
        grouping: &str,
        correlated: bool,
    ) -> SemanticResult<()> {
        self.column(grouping).roles.insert(Role::GroupingVariable);

        let scope = Scope::Random {
            grouping: grouping.to_string(),
            correlated,
        };
        let mut has_intercept = true;
        let mut removed = HashSet::new();
        let mut variables: Vec<String> = Vec::new();

        for signed in terms.terms.iter().filter(|s| s.sign == Sign::Minus) {
            match &signed.term {
                Term::Constant(value) if *value == 1.0 => has_intercept = false,
                Term::Constant(value) => {
                    return Err(SemanticError::UnsupportedConstant(constant_text(*value)))
                }
                Term::RandomEffectGroup { grouping, .. } => {
                    return Err(SemanticError::NestedRandomEffect(grouping.clone()))
                }
                term => {
                    for design in self.design_terms(term)? {
                        removed.insert(design.key());
                    }
                }
            }
        }

        for signed in terms.terms.iter().filter(|s| s.sign == Sign::Plus) {
            match &signed.term {
                Term::Constant(value) if *value == 1.0 => {}
                // (0 + x | g): slopes without a group-level intercept
                Term::Constant(value) if *value == 0.0 => has_intercept = false,
                Term::Constant(value) => {
                    return Err(SemanticError::UnsupportedConstant(constant_text(*value)))
                }
                Term::RandomEffectGroup { grouping, .. } => {
                    return Err(SemanticError::NestedRandomEffect(grouping.clone()))
                }
                term => {
                    for design in self.design_terms(term)? {
                        if removed.contains(&design.key()) {
                            continue;
                        }
                        let name = self.apply(&design, &scope)?;
                        if !variables.contains(&name) {
                            variables.push(name);
                        }
                    }
                }
            }
        }

        log::trace!(
            target: "EXPAND",
            "random effect group {} intercept={} correlated={} terms={:?}",
            grouping,
            has_intercept,
            correlated,
            variables
        );

        self.random_effects.push(RandomEffectGroup {
            grouping_variable: grouping.to_string(),
            has_intercept,
            correlated,
            variables,
        });
        Ok(())
    }

    /// Expands the primary expression of a nonlinear formula. Operators are
    /// arithmetic here, so no interactions are generated. Names of clause
    /// parameters are skipped; every other name is a covariate.
    fn expand_nonlinear(&mut self, predictor: &Predictor) -> SemanticResult<bool> {
        let mut has_intercept = true;

        for signed in &predictor.terms {
            match (&signed.sign, &signed.term) {
                (Sign::Minus, Term::Constant(value)) if *value == 1.0 => has_intercept = false,
                (_, term) => self.walk_nonlinear(term)?,
            }
        }

        Ok(has_intercept)
    }

    fn walk_nonlinear(&mut self, term: &Term) -> SemanticResult<()> {
        match term {
            Term::Variable(name) => {
                if !self.parameters.contains(name) {
                    self.apply(&DesignTerm::single(Factor::variable(name)), &Scope::Fixed)?;
                }
            }
            Term::Constant(_) => {}
            Term::Transformation { argument, .. } => {
                if !self.parameters.contains(argument) {
                    for design in self.design_terms(term)? {
                        self.apply(&design, &Scope::Fixed)?;
                    }
                }
            }
            Term::InteractionGroup { operands, .. } => {
                for operand in operands {
                    self.walk_nonlinear(operand)?;
                }
            }
            Term::Power { base, exponent } => {
                self.walk_nonlinear(base)?;
                self.walk_nonlinear(exponent)?;
            }
            Term::Group(inner) => {
                for signed in &inner.terms {
                    self.walk_nonlinear(&signed.term)?;
                }
            }
            Term::RandomEffectGroup {
                terms,
                grouping,
                correlated,
            } => self.expand_random_group(terms, grouping, *correlated)?,
        }
        Ok(())
    }

    /// Flattens a term into its design terms without touching any column.
    fn design_terms(&self, term: &Term) -> SemanticResult<Vec<DesignTerm>> {
        match term {
            Term::Variable(name) => Ok(vec![DesignTerm::single(Factor::variable(name))]),

            Term::Transformation { function, argument } => {
                if !self.config.supports_transformation(function) {
                    return Err(SemanticError::UnsupportedTransformation(function.clone()));
                }
                Ok(vec![DesignTerm::single(Factor::transformed(argument, function))])
            }

            // Top-level constants are handled by the predictor loops.
            Term::Constant(value) => Err(SemanticError::ConstantInInteraction(constant_text(*value))),

            Term::RandomEffectGroup { grouping, .. } => {
                Err(SemanticError::NestedRandomEffect(grouping.clone()))
            }

            Term::InteractionGroup {
                operator: InteractionOperator::Only,
                operands,
            } => {
                let mut product = vec![DesignTerm::default()];
                for operand in operands {
                    product = cross(&product, &self.design_terms(operand)?);
                }
                Ok(dedupe(product))
            }

            Term::InteractionGroup {
                operator: InteractionOperator::AllInteractions,
                operands,
            } => {
                self.check_operand_limit(operands.len())?;
                let expanded = operands
                    .iter()
                    .map(|operand| self.design_terms(operand))
                    .collect::<SemanticResult<Vec<_>>>()?;
                Ok(cross_subsets(&expanded, None))
            }

            Term::Power { base, exponent } => {
                let degree = match exponent.as_ref() {
                    Term::Constant(k) if *k >= 1.0 && k.fract() == 0.0 => *k as usize,
                    other => return Err(SemanticError::InvalidExponent(other.to_string())),
                };
                match base.as_ref() {
                    // (a + b + c)^2: all terms up to order 2
                    Term::Group(inner) => {
                        let (operands, removed) = self.group_operands(inner)?;
                        self.check_operand_limit(operands.len())?;
                        Ok(cross_subsets(&operands, Some(degree))
                            .into_iter()
                            .filter(|t| !removed.contains(&t.key()))
                            .collect())
                    }
                    // x^2 is just x
                    other => self.design_terms(other),
                }
            }

            Term::Group(inner) => {
                let (operands, removed) = self.group_operands(inner)?;
                Ok(dedupe(operands.into_iter().flatten().collect())
                    .into_iter()
                    .filter(|t| !removed.contains(&t.key()))
                    .collect())
            }
        }
    }

    /// Splits a parenthesized group into added operands and removed keys.
    fn group_operands(
        &self,
        inner: &Predictor,
    ) -> SemanticResult<(Vec<Vec<DesignTerm>>, HashSet<Vec<String>>)> {
        let mut operands = Vec::new();
        let mut removed = HashSet::new();

        for signed in &inner.terms {
            let designs = self.design_terms(&signed.term)?;
            match signed.sign {
                Sign::Plus => operands.push(designs),
                Sign::Minus => removed.extend(designs.iter().map(DesignTerm::key)),
            }
        }

        Ok((operands, removed))
    }

    /// Records one design term on the columns it touches and returns the
    /// generated name it is known by.
    fn apply(&mut self, design: &DesignTerm, scope: &Scope) -> SemanticResult<String> {
        // x2:x1 after x1:x2 reuses the x1_x2 spelling.
        let design = &self
            .canonical
            .entry(design.key())
            .or_insert_with(|| design.clone())
            .clone();

        let mut variables = HashSet::new();
        for factor in &design.factors {
            if self.parameters.contains(&factor.column) {
                return Err(SemanticError::ParameterInLinearPredictor(factor.column.clone()));
            }
            // x*s(x): an interaction needs distinct variables.
            if !variables.insert(factor.column.as_str()) {
                return Err(SemanticError::SelfInteraction(factor.column.clone()));
            }
        }
        for factor in &design.factors {
            self.column(&factor.column).roles.insert(Role::Predictor);
            if let Some(function) = &factor.function {
                self.column(&factor.column)
                    .add_transformation(function, &factor.name);
                self.push_generated(&factor.name, 1);
            }
        }

        let (context, grouping, correlated) = match scope {
            Scope::Fixed => (EffectContext::FixedEffects, None, true),
            Scope::Random {
                grouping,
                correlated,
            } => (EffectContext::RandomEffects, Some(grouping.clone()), *correlated),
        };

        if design.order() == 1 {
            let factor = &design.factors[0];
            if factor.function.is_none() && !self.main_effects.contains(&factor.column) {
                self.main_effects.push(factor.column.clone());
            }
            if let Some(grouping) = grouping {
                self.column(&factor.column).add_random_effect(RandomEffect {
                    grouping_variable: grouping,
                    kind: RandomEffectKind::Slope,
                    correlated,
                });
            }
            return Ok(design.name());
        }

        let name = design.name();
        let order = design.order();

        for (i, factor) in design.factors.iter().enumerate() {
            let with = design
                .factors
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| other.name.clone())
                .collect();

            let column = self.column(&factor.column);
            column.add_interaction(Interaction {
                order,
                with,
                context,
                grouping_variable: grouping.clone(),
                column: name.clone(),
            });
            if let Some(grouping) = &grouping {
                column.add_random_effect(RandomEffect {
                    grouping_variable: grouping.clone(),
                    kind: RandomEffectKind::Interaction,
                    correlated,
                });
            }
        }

        self.push_generated(&name, order);
        Ok(name)
    }

    fn push_generated(&mut self, name: &str, order: usize) {
        if !self.generated.iter().any(|g| g.name == name) {
            self.generated.push(GeneratedColumn {
                name: name.to_string(),
                order,
            });
        }
    }
}
