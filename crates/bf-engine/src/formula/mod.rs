//! Score formulas.
//!
//! A formula is a small arithmetic expression over input keys, e.g.
//! `gewicht / (groesse * groesse)` or `alter > 65 ? 2 : 0`. Formulas are
//! tokenized against a fixed character allow-list and parsed into an
//! expression tree that is evaluated directly. There is no way for a
//! formula to reach anything but the numeric values of its variables.
//!
//! Evaluation never fails at the boundary: a formula that does not parse
//! yields [`Evaluation::Error`], rendered as `Error`.

mod lexer;
mod parser;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::binding::Lookup;

use self::parser::Expr;

/// Identifiers reserved as literals; never treated as variables.
///
/// These are accepted in formulas and evaluate to numbers: `true` is 1,
/// `false` and `null` are 0, `undefined` is `NaN`. They are not rejected
/// as disallowed characters, so `x || undefined` parses and yields `NaN`
/// when `x` is 0.
pub const RESERVED_WORDS: [&str; 4] = ["true", "false", "null", "undefined"];

static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Alphabetic}_$][\p{Alphabetic}\p{N}_$]*").expect("invalid identifier regex")
});

/// Why a formula could not be parsed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum FormulaError {
    /// Character outside the formula alphabet.
    #[error("disallowed character `{character}` at offset {offset}")]
    DisallowedCharacter { character: char, offset: usize },

    /// Single `&`, `|` or `=`.
    #[error("unsupported operator `{operator}` at offset {offset}")]
    UnsupportedOperator { operator: char, offset: usize },

    /// Number literal that cannot be read.
    #[error("invalid number `{literal}` at offset {offset}")]
    InvalidNumber { literal: String, offset: usize },

    /// Token that does not fit the grammar.
    #[error("unexpected `{found}` at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    /// Formula ends in the middle of an expression.
    #[error("unexpected end of formula at offset {offset}")]
    UnexpectedEnd { offset: usize },

    /// Formula without any tokens.
    #[error("empty formula")]
    Empty,

    /// Nesting deeper than the parser accepts.
    #[error("formula nested deeper than {limit} levels")]
    TooDeep { limit: usize },

    /// More operators than the parser accepts.
    #[error("formula has more than {limit} operators")]
    TooLong { limit: usize },
}

/// Result of evaluating a formula.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Evaluation {
    /// IEEE-754 result, including `NaN` and infinities.
    Number(f64),
    /// The formula could not be evaluated.
    Error,
}

impl Evaluation {
    /// Numeric result, if any.
    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::Error => None,
        }
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Error => f.write_str("Error"),
        }
    }
}

/// A parsed formula.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use bf_engine::{BindingValue, Formula};
///
/// let formula = Formula::parse("a + b * 2")?;
/// assert_eq!(formula.variables(), vec!["a", "b"]);
///
/// let bindings = HashMap::from([
///     ("a".to_owned(), BindingValue::Number(1.0)),
///     ("b".to_owned(), BindingValue::Number(3.0)),
/// ]);
/// assert_eq!(formula.evaluate(&bindings), 7.0);
/// # Ok::<(), bf_engine::FormulaError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse formula text.
    ///
    /// # Errors
    ///
    /// Returns a [`FormulaError`] for characters outside the allow-list or
    /// text that does not form an expression.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = lexer::tokenize(source)?;
        let expr = parser::parse(tokens, source.len())?;
        Ok(Self {
            source: source.to_owned(),
            expr,
        })
    }

    /// Formula text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Variables referenced by the formula, in first-appearance order.
    pub fn variables(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        self.expr.variables(&mut vars);
        vars
    }

    /// Evaluate against bindings.
    pub fn evaluate(&self, bindings: &dyn Lookup) -> f64 {
        self.expr.eval(bindings)
    }
}

/// Extract the free variable names of a formula.
///
/// Works on raw text, so it also reports identifiers in formulas that do not
/// parse. Names keep their first-appearance order and appear once; the
/// literals `true`, `false`, `null` and `undefined` are excluded.
pub fn extract_variables(formula: &str) -> Vec<String> {
    let mut vars: Vec<String> = Vec::new();
    for m in IDENT_RE.find_iter(formula) {
        let name = m.as_str();
        if !RESERVED_WORDS.contains(&name) && !vars.iter().any(|v| v == name) {
            vars.push(name.to_owned());
        }
    }
    vars
}

/// Parse and evaluate formula text in one step.
///
/// Parse failures are logged at debug level and collapse to
/// [`Evaluation::Error`].
pub fn evaluate(formula: &str, bindings: &dyn Lookup) -> Evaluation {
    match Formula::parse(formula) {
        Ok(parsed) => Evaluation::Number(parsed.evaluate(bindings)),
        Err(e) => {
            tracing::debug!(formula, error = %e, "Formula rejected");
            Evaluation::Error
        }
    }
}

/// Format a number for display.
///
/// Integers print without a fractional part, non-finite values as `NaN`,
/// `Infinity` and `-Infinity`, and negative zero as `0`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if n == 0.0 {
        "0".to_owned()
    } else {
        n.to_string()
    }
}
