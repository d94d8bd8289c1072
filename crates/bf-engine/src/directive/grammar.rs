//! The directive grammar: which directives exist, how they may be written,
//! and which attributes they accept.

use crate::ast::{Attributes, Directive, Node};
use crate::error::SyntaxError;

use super::args::DirectiveArgs;
use super::parser::Delimited;

/// The four directive kinds understood by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `:value` / `::value`
    Value,
    /// `:::selector`
    Selector,
    /// `:::case`
    Case,
    /// `:score` / `::score`
    Score,
}

impl DirectiveKind {
    /// Look up a directive kind by its name in the markup.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "value" => Some(Self::Value),
            "selector" => Some(Self::Selector),
            "case" => Some(Self::Case),
            "score" => Some(Self::Score),
            _ => None,
        }
    }

    /// Name used in the markup.
    pub fn name(self) -> &'static str {
        match self {
            Self::Value => "value",
            Self::Selector => "selector",
            Self::Case => "case",
            Self::Score => "score",
        }
    }

    /// Attributes the directive accepts.
    pub fn attributes(self) -> &'static [&'static str] {
        match self {
            Self::Value => &["primary", "type", "unit"],
            Self::Selector | Self::Case => &["primary"],
            Self::Score => &["formula", "unit", "primary"],
        }
    }

    /// Whether the directive is written as a `:::` container.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Selector | Self::Case)
    }

    fn expected_form(self) -> &'static str {
        match self {
            Self::Value => ":value{...} or ::value{...}",
            Self::Score => ":score{...} or ::score{...}",
            Self::Selector => ":::selector{...} ... :::",
            Self::Case => ":::case{...} ... :::",
        }
    }

    /// Reject a directive written with the wrong number of colons.
    pub(crate) fn check_form(self, as_container: bool, line: usize) -> Result<(), SyntaxError> {
        if self.is_container() == as_container {
            Ok(())
        } else {
            Err(SyntaxError::WrongForm {
                directive: self.name(),
                expected: self.expected_form(),
                line,
            })
        }
    }

    /// Parse label and attribute groups into a childless [`Directive`].
    pub(crate) fn directive(
        self,
        label: Delimited<'_>,
        attrs: Delimited<'_>,
        line: usize,
    ) -> Result<Directive, SyntaxError> {
        let malformed = |message: String| SyntaxError::MalformedAttributes {
            directive: self.name(),
            message,
            line,
        };

        if label == Delimited::Unclosed {
            return Err(malformed("unterminated label (missing `]`)".to_owned()));
        }
        if attrs == Delimited::Unclosed {
            return Err(malformed("unterminated attributes (missing `}`)".to_owned()));
        }

        let args = DirectiveArgs::parse(label.inner(), attrs.inner().unwrap_or_default())
            .map_err(malformed)?;

        Ok(Directive {
            attrs: self.attributes_from(args.attrs, line)?,
            label: args.label,
            line,
            children: Vec::new(),
        })
    }

    fn attributes_from(
        self,
        pairs: Vec<(String, String)>,
        line: usize,
    ) -> Result<Attributes, SyntaxError> {
        let mut attrs = Attributes::default();

        for (key, value) in pairs {
            let slot = match key.as_str() {
                "primary" if self.attributes().contains(&"primary") => &mut attrs.primary,
                "type" if self.attributes().contains(&"type") => &mut attrs.value_type,
                "unit" if self.attributes().contains(&"unit") => &mut attrs.unit,
                "formula" if self.attributes().contains(&"formula") => &mut attrs.formula,
                _ => {
                    return Err(SyntaxError::UnknownAttribute {
                        directive: self.name(),
                        attribute: key,
                        line,
                    });
                }
            };
            if slot.is_some() {
                return Err(SyntaxError::DuplicateAttribute {
                    directive: self.name(),
                    attribute: key,
                    line,
                });
            }
            *slot = Some(value);
        }

        Ok(attrs)
    }

    /// Wrap a directive payload into the matching [`Node`] variant.
    pub(crate) fn node(self, directive: Directive) -> Node {
        match self {
            Self::Value => Node::Value(directive),
            Self::Selector => Node::Selector(directive),
            Self::Case => Node::Case(directive),
            Self::Score => Node::Score(directive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed(s: &str) -> Delimited<'_> {
        Delimited::Closed(s)
    }

    #[test]
    fn test_from_name_round_trip() {
        for kind in [
            DirectiveKind::Value,
            DirectiveKind::Selector,
            DirectiveKind::Case,
            DirectiveKind::Score,
        ] {
            assert_eq!(DirectiveKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(DirectiveKind::from_name("note"), None);
    }

    #[test]
    fn test_value_attributes() {
        let directive = DirectiveKind::Value
            .directive(
                closed("Gewicht"),
                closed(r#"primary="w" type="number" unit="kg""#),
                3,
            )
            .unwrap();

        assert_eq!(directive.attrs.primary.as_deref(), Some("w"));
        assert_eq!(directive.attrs.value_type.as_deref(), Some("number"));
        assert_eq!(directive.attrs.unit.as_deref(), Some("kg"));
        assert_eq!(directive.label.as_deref(), Some("Gewicht"));
        assert_eq!(directive.line, 3);
    }

    #[test]
    fn test_unknown_attribute() {
        let err = DirectiveKind::Selector
            .directive(Delimited::Absent, closed(r#"primary="g" unit="kg""#), 7)
            .unwrap_err();

        assert_eq!(
            err,
            SyntaxError::UnknownAttribute {
                directive: "selector",
                attribute: "unit".to_owned(),
                line: 7,
            }
        );
    }

    #[test]
    fn test_shorthand_class_is_unknown_attribute() {
        let err = DirectiveKind::Value
            .directive(Delimited::Absent, closed(r#".big primary="x""#), 1)
            .unwrap_err();
        assert!(matches!(err, SyntaxError::UnknownAttribute { attribute, .. } if attribute == "class"));
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = DirectiveKind::Score
            .directive(Delimited::Absent, closed(r#"formula="a" formula="b""#), 2)
            .unwrap_err();
        assert!(matches!(err, SyntaxError::DuplicateAttribute { .. }));
    }

    #[test]
    fn test_unclosed_groups() {
        let err = DirectiveKind::Value
            .directive(Delimited::Absent, Delimited::Unclosed, 4)
            .unwrap_err();
        assert!(err.to_string().contains("missing `}`"));

        let err = DirectiveKind::Value
            .directive(Delimited::Unclosed, Delimited::Absent, 4)
            .unwrap_err();
        assert!(err.to_string().contains("missing `]`"));
    }

    #[test]
    fn test_check_form() {
        assert!(DirectiveKind::Value.check_form(false, 1).is_ok());
        assert!(DirectiveKind::Case.check_form(true, 1).is_ok());
        assert!(matches!(
            DirectiveKind::Selector.check_form(false, 9),
            Err(SyntaxError::WrongForm { line: 9, .. })
        ));
        assert!(DirectiveKind::Score.check_form(true, 1).is_err());
    }
}
