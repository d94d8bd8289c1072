//! Directive tree types.
//!
//! A parsed template is a tree of [`Node`]s rooted at a
//! [`ElementKind::Document`] element. Directive kinds form a closed enum so
//! every consumer (extractor, skeleton builder) matches exhaustively.

use std::fmt;
use std::str::FromStr;

/// A node of the directive tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Value placeholder: `:value{primary="key"}`.
    Value(Directive),
    /// Branch selector: `:::selector{primary="key"}`. After parsing, its
    /// children are exactly its [`Node::Case`] directives.
    Selector(Directive),
    /// Branch case: `:::case{primary="label"}`.
    Case(Directive),
    /// Computed score: `:score{formula="a+b"}`.
    Score(Directive),
    /// Markup that carries no directive semantics.
    Structural(Element),
}

impl Node {
    /// Child nodes in document order.
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Value(d) | Self::Selector(d) | Self::Case(d) | Self::Score(d) => &d.children,
            Self::Structural(e) => &e.children,
        }
    }

    /// The directive payload, if this is a directive node.
    pub fn directive(&self) -> Option<&Directive> {
        match self {
            Self::Value(d) | Self::Selector(d) | Self::Case(d) | Self::Score(d) => Some(d),
            Self::Structural(_) => None,
        }
    }

    pub(crate) fn document(children: Vec<Node>) -> Self {
        Self::Structural(Element {
            kind: ElementKind::Document,
            children,
        })
    }
}

/// Attributes and children of a directive node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Directive {
    /// Parsed `{...}` attributes.
    pub attrs: Attributes,
    /// Bracket content `[label]`, if any.
    pub label: Option<String>,
    /// Source line of the directive (1-indexed).
    pub line: usize,
    /// Child nodes. Empty for value and score directives.
    pub children: Vec<Node>,
}

/// Directive attributes as written in the template.
///
/// Values are kept raw; validation happens during schema extraction so a
/// single broken directive does not make the whole template unusable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    /// `primary`: the input key, or the label of a case.
    pub primary: Option<String>,
    /// `type`: raw value type (`string`, `number`, `date`).
    pub value_type: Option<String>,
    /// `unit`: display unit appended after the value.
    pub unit: Option<String>,
    /// `formula`: score expression.
    pub formula: Option<String>,
}

impl Attributes {
    /// Key of a score directive: explicit `primary`, else the formula text.
    pub fn score_key(&self) -> Option<&str> {
        let non_blank = |key: &&str| !key.trim().is_empty();
        self.primary
            .as_deref()
            .filter(non_blank)
            .or_else(|| self.formula.as_deref().filter(non_blank))
    }
}

/// Structural element produced by the markdown parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Element kind.
    pub kind: ElementKind,
    /// Child nodes.
    pub children: Vec<Node>,
}

/// Kinds of structural elements.
///
/// Leaf kinds (`Text`, `Code`, `Html`, breaks, `Rule`, `TaskMarker`) never
/// have children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Document,
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock(Option<String>),
    List(Option<u64>),
    Item,
    Emphasis,
    Strong,
    Strikethrough,
    Link { dest: String, title: String },
    Image { dest: String, title: String },
    Table,
    TableHead,
    TableRow,
    TableCell,
    /// Unknown container directive `:::name`, kept as a plain wrapper.
    Container(String),
    /// Any other markdown container (footnotes, definition lists, ...).
    Group,
    Text(String),
    Code(String),
    Html(String),
    SoftBreak,
    HardBreak,
    Rule,
    TaskMarker(bool),
}

/// Declared type of a value input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValueType {
    #[default]
    String,
    Number,
    Date,
}

impl ValueType {
    /// Attribute spelling of the type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a `type` attribute is not a known value type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownValueType;

impl FromStr for ValueType {
    type Err = UnknownValueType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            _ => Err(UnknownValueType),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::transform::parse;

    assert_impl_all!(Node: Eq, Clone, Send, Sync);
    assert_impl_all!(Directive: Eq);

    #[test]
    fn test_tree_equality() {
        let source = ":::selector{primary=\"g\"}\n:::case{primary=\"w\"}\n**weiblich** :value{primary=\"x\"}\n:::\n:::\n";
        let tree = parse(source).unwrap();
        assert_eq!(tree.clone(), tree);
        assert_ne!(tree, parse("weiblich").unwrap());
    }

    #[test]
    fn test_score_key_prefers_primary() {
        let attrs = Attributes {
            primary: Some("bmi".to_owned()),
            formula: Some("w/(h*h)".to_owned()),
            ..Attributes::default()
        };
        assert_eq!(attrs.score_key(), Some("bmi"));
    }

    #[test]
    fn test_score_key_falls_back_to_formula() {
        let attrs = Attributes {
            formula: Some("a+b".to_owned()),
            ..Attributes::default()
        };
        assert_eq!(attrs.score_key(), Some("a+b"));
    }

    #[test]
    fn test_score_key_blank() {
        let attrs = Attributes {
            formula: Some("  ".to_owned()),
            ..Attributes::default()
        };
        assert_eq!(attrs.score_key(), None);
    }

    #[test]
    fn test_value_type_parse() {
        assert_eq!("number".parse::<ValueType>(), Ok(ValueType::Number));
        assert_eq!(" date ".parse::<ValueType>(), Ok(ValueType::Date));
        assert_eq!("string".parse::<ValueType>(), Ok(ValueType::String));
        assert!("integer".parse::<ValueType>().is_err());
    }
}
