//! Directive argument parsing.
//!
//! Parses the `[label]{key="value" ...}` part of a directive.

/// Parsed arguments from directive syntax: `:name[label]{key="value"}`.
///
/// Attributes keep their source order so duplicates can be reported. The
/// shorthand forms `#id` and `.class` are parsed as `id` and `class`
/// attributes; the grammar decides whether they are allowed.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DirectiveArgs {
    /// Content from brackets `[label]`.
    pub label: Option<String>,
    /// Key-value attributes in source order.
    pub attrs: Vec<(String, String)>,
}

impl DirectiveArgs {
    /// Parse an optional label and the attribute string (without braces).
    ///
    /// Returns a message describing the first malformed attribute.
    pub(crate) fn parse(label: Option<&str>, attrs_str: &str) -> Result<Self, String> {
        let mut args = Self {
            label: label.map(|l| l.trim().to_owned()).filter(|l| !l.is_empty()),
            attrs: Vec::new(),
        };

        let mut remaining = attrs_str.trim();

        while !remaining.is_empty() {
            if let Some(rest) = remaining.strip_prefix('#') {
                let end = rest.find(is_shorthand_end).unwrap_or(rest.len());
                args.attrs.push(("id".to_owned(), rest[..end].to_owned()));
                remaining = &rest[end..];
            } else if let Some(rest) = remaining.strip_prefix('.') {
                let end = rest.find(is_shorthand_end).unwrap_or(rest.len());
                args.attrs.push(("class".to_owned(), rest[..end].to_owned()));
                remaining = &rest[end..];
            } else {
                let (key, value, rest) = parse_key_value(remaining)?;
                args.attrs.push((key.to_owned(), value.to_owned()));
                remaining = rest;
            }
            remaining = remaining.trim_start();
        }

        Ok(args)
    }

    /// Get an attribute value by key (first occurrence).
    #[cfg(test)]
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn is_shorthand_end(c: char) -> bool {
    c.is_whitespace() || c == '.' || c == '#'
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || c == ':'
}

/// Parse a key-value pair from the attributes string.
///
/// Supports `key="value"`, `key='value'`, `key=value` and a bare `key`
/// (empty value).
fn parse_key_value(s: &str) -> Result<(&str, &str, &str), String> {
    let key_end = s.find(|c: char| !is_key_char(c)).unwrap_or(s.len());
    let key = &s[..key_end];
    if key.is_empty() {
        let unexpected = s.chars().next().unwrap_or(' ');
        return Err(format!("unexpected character `{unexpected}` in attributes"));
    }

    let after_key = s[key_end..].trim_start();
    let Some(after_eq) = after_key.strip_prefix('=') else {
        return Ok((key, "", after_key));
    };
    let after_eq = after_eq.trim_start();

    for quote in ['"', '\''] {
        if let Some(stripped) = after_eq.strip_prefix(quote) {
            let end_quote = stripped
                .find(quote)
                .ok_or_else(|| format!("unterminated quoted value for `{key}`"))?;
            return Ok((key, &stripped[..end_quote], &stripped[end_quote + 1..]));
        }
    }

    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
    if end == 0 {
        return Err(format!("missing value for `{key}`"));
    }
    Ok((key, &after_eq[..end], &after_eq[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_args() {
        let args = DirectiveArgs::parse(None, "").unwrap();
        assert_eq!(args.label, None);
        assert!(args.attrs.is_empty());
    }

    #[test]
    fn test_label_only() {
        let args = DirectiveArgs::parse(Some(" Body weight "), "").unwrap();
        assert_eq!(args.label.as_deref(), Some("Body weight"));
    }

    #[test]
    fn test_blank_label_is_none() {
        let args = DirectiveArgs::parse(Some("  "), "").unwrap();
        assert_eq!(args.label, None);
    }

    #[test]
    fn test_double_quoted_value() {
        let args = DirectiveArgs::parse(None, r#"primary="Name""#).unwrap();
        assert_eq!(args.get("primary"), Some("Name"));
    }

    #[test]
    fn test_single_quoted_value() {
        let args = DirectiveArgs::parse(None, "unit='kg / m²'").unwrap();
        assert_eq!(args.get("unit"), Some("kg / m²"));
    }

    #[test]
    fn test_unquoted_value() {
        let args = DirectiveArgs::parse(None, "type=number").unwrap();
        assert_eq!(args.get("type"), Some("number"));
    }

    #[test]
    fn test_formula_with_operators() {
        let args = DirectiveArgs::parse(None, r#"formula="age>65?2:0" unit="Punkte""#).unwrap();
        assert_eq!(args.get("formula"), Some("age>65?2:0"));
        assert_eq!(args.get("unit"), Some("Punkte"));
    }

    #[test]
    fn test_spaces_around_equals() {
        let args = DirectiveArgs::parse(None, r#"primary = "Alter""#).unwrap();
        assert_eq!(args.get("primary"), Some("Alter"));
    }

    #[test]
    fn test_attribute_order_preserved() {
        let args = DirectiveArgs::parse(None, r#"unit="kg" primary="w" unit="g""#).unwrap();
        let keys: Vec<_> = args.attrs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["unit", "primary", "unit"]);
    }

    #[test]
    fn test_shorthand_id_and_class() {
        let args = DirectiveArgs::parse(None, "#vitals.compact").unwrap();
        assert_eq!(args.get("id"), Some("vitals"));
        assert_eq!(args.get("class"), Some("compact"));
    }

    #[test]
    fn test_bare_key() {
        let args = DirectiveArgs::parse(None, "required").unwrap();
        assert_eq!(args.get("required"), Some(""));
    }

    #[test]
    fn test_empty_quoted_value() {
        let args = DirectiveArgs::parse(None, r#"unit="""#).unwrap();
        assert_eq!(args.get("unit"), Some(""));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = DirectiveArgs::parse(None, r#"primary="Name"#).unwrap_err();
        assert!(err.contains("unterminated"));
    }

    #[test]
    fn test_missing_value() {
        let err = DirectiveArgs::parse(None, "primary=").unwrap_err();
        assert!(err.contains("missing value"));
    }

    #[test]
    fn test_stray_character() {
        let err = DirectiveArgs::parse(None, r#"primary="a" ; x"#).unwrap_err();
        assert!(err.contains('`'));
    }
}
