//! FILENAME: core/parser/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for model formulas.
//! CONTEXT: After the Lexer tokenizes a formula string, the Parser converts
//! those tokens into this tree structure. The engine's expander then walks
//! this tree to resolve columns, interactions and random effects.
//!
//! SUPPORTED TERMS:
//! - Variables: x1, Sepal.Length
//! - Constants: 1 (intercept), -1 (intercept removal)
//! - Interactions: x1*x2 (all effects), x1:x2 (interaction only)
//! - Transformations: s(z), log(x)
//! - Random effects: (1 + x | group), (1 + x || group)
//! - Powers: (a + b + c)^2, and arithmetic a2^x in nonlinear formulas

/// A single term of a predictor expression.
#[derive(Debug, PartialEq, Clone)]
pub enum Term {
    /// A reference to a data column.
    Variable(String),

    /// A numeric literal. Only `1` is meaningful in a linear predictor.
    Constant(f64),

    /// Operands joined by a single interaction operator.
    /// `a*b:c` parses as `InteractionGroup(*, [a, InteractionGroup(:, [b, c])])`.
    InteractionGroup {
        operator: InteractionOperator,
        operands: Vec<Term>,
    },

    /// A function applied to one variable, like s(z).
    Transformation { function: String, argument: String },

    /// A random effect group: (terms | grouping) or (terms || grouping).
    RandomEffectGroup {
        terms: Predictor,
        grouping: String,
        /// false for the `||` form
        correlated: bool,
    },

    /// base ^ exponent.
    Power {
        base: Box<Term>,
        exponent: Box<Term>,
    },

    /// A parenthesized predictor without a grouping variable.
    /// The parser only produces it as the base of a Power.
    Group(Predictor),
}

/// Interaction operators. `:` binds tighter than `*`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InteractionOperator {
    /// `*`: main effects of all operands and every interaction among them
    AllInteractions,
    /// `:`: exactly one interaction, no implied main effects
    Only,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Sign {
    Plus,
    Minus,
}

/// A term together with the operator that introduced it.
#[derive(Debug, PartialEq, Clone)]
pub struct SignedTerm {
    pub sign: Sign,
    pub term: Term,
}

/// An ordered list of signed terms: `x1 + x2 - 1`.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Predictor {
    pub terms: Vec<SignedTerm>,
}

impl Predictor {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Left hand side of the primary formula.
#[derive(Debug, PartialEq, Clone)]
pub enum Response {
    Single(String),
    /// mvbind(y1, y2, ...)
    Multivariate(Vec<String>),
}

impl Response {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Response::Single(name) => vec![name.as_str()],
            Response::Multivariate(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// A trailing `parameter ~ expression` clause.
#[derive(Debug, PartialEq, Clone)]
pub struct NonlinearFormula {
    pub parameter: String,
    pub predictor: Predictor,
}

/// A trailing `name = value` clause such as `nl = TRUE` or `family = gaussian()`.
#[derive(Debug, PartialEq, Clone)]
pub struct FormulaOption {
    pub name: String,
    pub value: OptionValue,
    pub position: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub enum OptionValue {
    Boolean(bool),
    Name(String),
}

/// The complete parsed formula.
#[derive(Debug, PartialEq, Clone)]
pub struct Formula {
    pub response: Response,
    pub predictor: Predictor,
    pub nonlinear: Vec<NonlinearFormula>,
    pub options: Vec<FormulaOption>,
}

impl std::fmt::Display for InteractionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InteractionOperator::AllInteractions => write!(f, "*"),
            InteractionOperator::Only => write!(f, ":"),
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Variable(name) => write!(f, "{}", name),
            Term::Constant(n) => write!(f, "{}", n),
            Term::InteractionGroup { operator, operands } => {
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", operator)?;
                    }
                    write!(f, "{}", operand)?;
                }
                Ok(())
            }
            Term::Transformation { function, argument } => write!(f, "{}({})", function, argument),
            Term::RandomEffectGroup {
                terms,
                grouping,
                correlated,
            } => {
                let bar = if *correlated { "|" } else { "||" };
                write!(f, "({} {} {})", terms, bar, grouping)
            }
            Term::Power { base, exponent } => write!(f, "{}^{}", base, exponent),
            Term::Group(inner) => write!(f, "({})", inner),
        }
    }
}

impl std::fmt::Display for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, signed) in self.terms.iter().enumerate() {
            match (i, signed.sign) {
                (0, Sign::Plus) => {}
                (0, Sign::Minus) => write!(f, "-")?,
                (_, Sign::Plus) => write!(f, " + ")?,
                (_, Sign::Minus) => write!(f, " - ")?,
            }
            write!(f, "{}", signed.term)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            OptionValue::Name(name) => write!(f, "{}", name),
        }
    }
}
