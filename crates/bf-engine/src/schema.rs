//! Input schema extraction.
//!
//! One pre-order walk over the directive tree produces the ordered list of
//! inputs a template needs. Keys are unique across the whole schema: the
//! first directive with a key wins and later ones are dropped together with
//! everything below them. Case labels are not keys.
//!
//! Directives with missing or invalid attributes are skipped with a warning
//! instead of failing the whole template.

use std::collections::HashSet;

use crate::ast::{Directive, Node, ValueType};
use crate::error::AttributeError;
use crate::formula::extract_variables;

/// What kind of input a descriptor describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InputKind {
    Value,
    Selector,
    Case,
    Score,
}

/// One entry of the input schema.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct InputDescriptor {
    /// Binding key. For cases, the case label matched against the
    /// selector's bound value.
    pub key: String,
    pub kind: InputKind,
    /// Declared type of a value input; `None` for other kinds.
    #[cfg_attr(
        feature = "serde",
        serde(default, rename = "type", skip_serializing_if = "Option::is_none")
    )]
    pub value_type: Option<ValueType>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub unit: Option<String>,
    /// Bracket label `[...]` of the directive.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub label: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub formula: Option<String>,
    /// Cases of a selector, inputs of a case body, or the synthesized
    /// variables of a score.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<InputDescriptor>,
}

impl InputDescriptor {
    fn new(key: &str, kind: InputKind, directive: &Directive) -> Self {
        Self {
            key: key.to_owned(),
            kind,
            value_type: None,
            unit: directive.attrs.unit.clone(),
            label: directive.label.clone(),
            formula: None,
            children: Vec::new(),
        }
    }

    /// Numeric value input inferred from a score formula.
    fn synthesized(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            kind: InputKind::Value,
            value_type: Some(ValueType::Number),
            unit: None,
            label: None,
            formula: None,
            children: Vec::new(),
        }
    }
}

/// Extraction result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    /// Inputs in document order.
    pub inputs: Vec<InputDescriptor>,
    /// Directives skipped because of attribute problems.
    pub warnings: Vec<AttributeError>,
}

impl Schema {
    /// Find an input by key anywhere in the schema.
    ///
    /// Only value and selector descriptors match. Cases and scores are
    /// descended into, so a synthesized formula variable is found.
    pub fn find(&self, key: &str) -> Option<&InputDescriptor> {
        fn search<'a>(inputs: &'a [InputDescriptor], key: &str) -> Option<&'a InputDescriptor> {
            inputs.iter().find_map(|input| {
                let is_input = matches!(input.kind, InputKind::Value | InputKind::Selector);
                if is_input && input.key == key {
                    Some(input)
                } else {
                    search(&input.children, key)
                }
            })
        }
        search(&self.inputs, key)
    }
}

/// Extract the input schema from a directive tree.
///
/// # Example
///
/// ```
/// use bf_engine::{InputKind, extract, parse};
///
/// let tree = parse(r#":score{formula="a+b*2" unit="Punkte"}"#)?;
/// let schema = extract(&tree);
///
/// let score = &schema.inputs[0];
/// assert_eq!(score.kind, InputKind::Score);
/// let vars: Vec<_> = score.children.iter().map(|c| c.key.as_str()).collect();
/// assert_eq!(vars, ["a", "b"]);
/// # Ok::<(), bf_engine::SyntaxError>(())
/// ```
pub fn extract(tree: &Node) -> Schema {
    let mut extractor = Extractor::default();
    let mut inputs = Vec::new();
    extractor.walk(tree, &mut inputs);
    Schema {
        inputs,
        warnings: extractor.warnings,
    }
}

#[derive(Default)]
struct Extractor {
    /// Keys of value and selector inputs, including synthesized variables.
    seen: HashSet<String>,
    /// Score keys. Scores are computed, never asked for, so they do not
    /// occupy the input key space.
    scores: HashSet<String>,
    warnings: Vec<AttributeError>,
}

impl Extractor {
    fn warn(&mut self, error: AttributeError) {
        tracing::warn!(%error, "Skipping directive");
        self.warnings.push(error);
    }

    /// Primary key of a value or selector, warning when it is missing.
    fn primary<'d>(&mut self, directive: &'d Directive, name: &'static str) -> Option<&'d str> {
        let key = directive
            .attrs
            .primary
            .as_deref()
            .filter(|key| !key.trim().is_empty());
        if key.is_none() {
            self.warn(AttributeError::MissingPrimary {
                directive: name,
                line: directive.line,
            });
        }
        key
    }

    fn walk(&mut self, node: &Node, out: &mut Vec<InputDescriptor>) {
        match node {
            Node::Structural(element) => {
                for child in &element.children {
                    self.walk(child, out);
                }
            }
            Node::Value(directive) => {
                if let Some(input) = self.value(directive) {
                    out.push(input);
                }
            }
            Node::Selector(directive) => {
                if let Some(input) = self.selector(directive) {
                    out.push(input);
                }
            }
            Node::Score(directive) => {
                if let Some(input) = self.score(directive) {
                    out.push(input);
                }
            }
            // Cases only occur below selectors after parsing.
            Node::Case(directive) => {
                for child in &directive.children {
                    self.walk(child, out);
                }
            }
        }
    }

    fn value(&mut self, directive: &Directive) -> Option<InputDescriptor> {
        let key = self.primary(directive, "value")?;
        if self.seen.contains(key) {
            return None;
        }

        let value_type = match directive.attrs.value_type.as_deref() {
            None => ValueType::default(),
            Some(raw) => {
                if let Ok(value_type) = raw.parse() {
                    value_type
                } else {
                    self.warn(AttributeError::InvalidValueType {
                        key: key.to_owned(),
                        value_type: raw.to_owned(),
                        line: directive.line,
                    });
                    return None;
                }
            }
        };

        self.seen.insert(key.to_owned());
        Some(InputDescriptor {
            value_type: Some(value_type),
            ..InputDescriptor::new(key, InputKind::Value, directive)
        })
    }

    fn selector(&mut self, directive: &Directive) -> Option<InputDescriptor> {
        let key = self.primary(directive, "selector")?;
        if !self.seen.insert(key.to_owned()) {
            return None;
        }

        let mut input = InputDescriptor::new(key, InputKind::Selector, directive);
        for child in &directive.children {
            let Node::Case(case) = child else {
                continue;
            };
            if let Some(case_input) = self.case(case) {
                input.children.push(case_input);
            }
        }
        Some(input)
    }

    fn case(&mut self, directive: &Directive) -> Option<InputDescriptor> {
        let label = self.primary(directive, "case")?;

        let mut input = InputDescriptor::new(label, InputKind::Case, directive);
        for child in &directive.children {
            self.walk(child, &mut input.children);
        }
        Some(input)
    }

    fn score(&mut self, directive: &Directive) -> Option<InputDescriptor> {
        let formula = directive
            .attrs
            .formula
            .as_deref()
            .filter(|formula| !formula.trim().is_empty());
        let (Some(formula), Some(key)) = (formula, directive.attrs.score_key()) else {
            self.warn(AttributeError::EmptyFormula {
                line: directive.line,
            });
            return None;
        };
        if !self.scores.insert(key.to_owned()) {
            return None;
        }

        let mut input = InputDescriptor {
            formula: Some(formula.to_owned()),
            ..InputDescriptor::new(key, InputKind::Score, directive)
        };
        for var in extract_variables(formula) {
            if self.seen.insert(var.clone()) {
                input.children.push(InputDescriptor::synthesized(&var));
            }
        }
        Some(input)
    }
}
