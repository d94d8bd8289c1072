//! Directive syntax recognition.
//!
//! Recognizes `CommonMark` directive syntax: `:name`, `::name` anywhere in a
//! line, and `:::name` / `:::` container fences on their own line.

/// A bracket or brace group following a directive name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Delimited<'a> {
    /// No group present.
    Absent,
    /// Group with its inner text (delimiters stripped).
    Closed(&'a str),
    /// Opening delimiter without a matching close.
    Unclosed,
}

impl<'a> Delimited<'a> {
    fn consumed(self) -> usize {
        match self {
            Self::Closed(inner) => inner.len() + 2,
            Self::Absent | Self::Unclosed => 0,
        }
    }

    pub(crate) fn inner(self) -> Option<&'a str> {
        match self {
            Self::Closed(inner) => Some(inner),
            Self::Absent | Self::Unclosed => None,
        }
    }
}

/// An inline (`:name`) or leaf (`::name`) directive found within a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InlineMatch<'a> {
    pub name: &'a str,
    /// Number of leading colons (1 or 2).
    pub colons: usize,
    pub label: Delimited<'a>,
    pub attrs: Delimited<'a>,
    /// Byte offset of the first colon.
    pub start: usize,
    /// Byte offset just past the directive.
    pub end: usize,
}

/// A container fence line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContainerLine<'a> {
    /// Container opening: `:::name[label]{attrs}`
    Start {
        name: &'a str,
        label: Delimited<'a>,
        attrs: Delimited<'a>,
    },
    /// Container closing: `:::`
    End { colon_count: usize },
}

/// Find the first inline or leaf directive in `line` at or after byte
/// offset `from`.
///
/// A colon only opens a directive when it is not preceded by an
/// alphanumeric character or a backslash, so times (`10:30`), URLs and
/// escaped colons stay literal. Returns `None` if the rest of the line holds
/// no directive.
pub(crate) fn find_inline(line: &str, from: usize) -> Option<InlineMatch<'_>> {
    let mut search_from = from;

    while let Some(offset) = line[search_from..].find(':') {
        let start = search_from + offset;
        let colons = line[start..].chars().take_while(|&c| c == ':').count();
        let name_start = start + colons;
        search_from = name_start;

        let preceded_by_word = line[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '\\');
        if preceded_by_word || colons > 2 {
            continue;
        }

        let after_colons = &line[name_start..];
        let name_len = after_colons
            .find(|c: char| !is_name_char(c))
            .unwrap_or(after_colons.len());
        let name = &after_colons[..name_len];
        if !is_valid_directive_name(name) {
            continue;
        }

        let mut pos = name_start + name_len;
        let label = parse_group(&line[pos..], '[', ']');
        pos += label.consumed();
        let attrs = parse_group(&line[pos..], '{', '}');
        pos += attrs.consumed();

        return Some(InlineMatch {
            name,
            colons,
            label,
            attrs,
            start,
            end: pos,
        });
    }

    None
}

/// Parse a whole line as a container fence.
///
/// Returns `None` if the line is not a container line.
pub(crate) fn parse_container_line(line: &str) -> Option<ContainerLine<'_>> {
    let trimmed = line.trim();

    if !trimmed.starts_with(":::") {
        return None;
    }

    let colon_count = trimmed.chars().take_while(|&c| c == ':').count();
    let after_colons = trimmed[colon_count..].trim_start();

    if after_colons.is_empty() {
        return Some(ContainerLine::End { colon_count });
    }

    let name_end = after_colons
        .find(|c: char| !is_name_char(c))
        .unwrap_or(after_colons.len());
    let name = &after_colons[..name_end];
    if !is_valid_directive_name(name) {
        return None;
    }

    let after_name = &after_colons[name_end..];
    let label = parse_group(after_name, '[', ']');
    let attrs = parse_group(&after_name[label.consumed()..], '{', '}');

    Some(ContainerLine::Start { name, label, attrs })
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Valid names start with a letter and contain only alphanumerics, hyphens
/// and underscores.
fn is_valid_directive_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_alphabetic) && name.chars().all(is_name_char)
}

/// Parse a delimited group at the start of `s`, handling nesting and quoted
/// strings inside braces.
fn parse_group(s: &str, open: char, close: char) -> Delimited<'_> {
    if !s.starts_with(open) {
        return Delimited::Absent;
    }

    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if open == '{' => quote = Some(c),
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Delimited::Closed(&s[1..i]);
                }
            }
            _ => {}
        }
    }

    Delimited::Unclosed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_directive() {
        let m = find_inline(r#"Name: :value{primary="Name"} ist"#, 0).unwrap();

        assert_eq!(m.name, "value");
        assert_eq!(m.colons, 1);
        assert_eq!(m.start, 6);
        assert_eq!(m.attrs, Delimited::Closed(r#"primary="Name""#));
        assert_eq!(m.label, Delimited::Absent);
    }

    #[test]
    fn test_inline_with_label_and_attrs() {
        let m = find_inline(r#":value[Gewicht]{primary="w" unit="kg"}"#, 0).unwrap();

        assert_eq!(m.label, Delimited::Closed("Gewicht"));
        assert_eq!(m.attrs.inner(), Some(r#"primary="w" unit="kg""#));
        assert_eq!(m.end, 38);
    }

    #[test]
    fn test_leaf_directive() {
        let m = find_inline(r#"::score{formula="a+b"}"#, 0).unwrap();

        assert_eq!(m.name, "score");
        assert_eq!(m.colons, 2);
        assert_eq!(m.start, 0);
    }

    #[test]
    fn test_colon_after_word_is_not_directive() {
        assert!(find_inline("Uhrzeit 10:30", 0).is_none());
        assert!(find_inline("see https://example.org", 0).is_none());
        assert!(find_inline("Befund:value", 0).is_none());
    }

    #[test]
    fn test_escaped_colon() {
        assert!(find_inline(r"literal \:value here", 0).is_none());
    }

    #[test]
    fn test_skips_non_directive_colons() {
        let m = find_inline(r#"Note: see :value{primary="x"}"#, 0).unwrap();
        assert_eq!(m.name, "value");
        assert_eq!(m.start, 10);
    }

    #[test]
    fn test_search_offset_sees_preceding_text() {
        let line = "Befund:value";
        assert!(find_inline(line, 6).is_none());

        let m = find_inline(r#":note :value{primary="x"}"#, 5).unwrap();
        assert_eq!(m.start, 6);
    }

    #[test]
    fn test_triple_colon_inline_ignored() {
        assert!(find_inline("text :::note more", 0).is_none());
    }

    #[test]
    fn test_braces_respect_quotes() {
        let m = find_inline(r#":value{primary="a}b"}"#, 0).unwrap();
        assert_eq!(m.attrs, Delimited::Closed(r#"primary="a}b""#));
    }

    #[test]
    fn test_unclosed_attrs() {
        let m = find_inline(r#":value{primary="Name""#, 0).unwrap();
        assert_eq!(m.attrs, Delimited::Unclosed);
        assert_eq!(m.end, 6);
    }

    #[test]
    fn test_nested_brackets_in_label() {
        let m = find_inline(":value[a [b] c]", 0).unwrap();
        assert_eq!(m.label, Delimited::Closed("a [b] c"));
    }

    #[test]
    fn test_container_start() {
        let line = parse_container_line(r#":::selector{primary="Geschlecht"}"#).unwrap();

        match line {
            ContainerLine::Start { name, attrs, .. } => {
                assert_eq!(name, "selector");
                assert_eq!(attrs.inner(), Some(r#"primary="Geschlecht""#));
            }
            ContainerLine::End { .. } => panic!("expected container start"),
        }
    }

    #[test]
    fn test_container_start_indented_with_space() {
        let line = parse_container_line(r#"  ::: case[männlich]{primary="m"}"#).unwrap();

        match line {
            ContainerLine::Start { name, label, .. } => {
                assert_eq!(name, "case");
                assert_eq!(label.inner(), Some("männlich"));
            }
            ContainerLine::End { .. } => panic!("expected container start"),
        }
    }

    #[test]
    fn test_container_end() {
        assert_eq!(
            parse_container_line(":::"),
            Some(ContainerLine::End { colon_count: 3 })
        );
        assert_eq!(
            parse_container_line("::::  "),
            Some(ContainerLine::End { colon_count: 4 })
        );
    }

    #[test]
    fn test_not_container() {
        assert!(parse_container_line("regular text").is_none());
        assert!(parse_container_line("::value").is_none());
        assert!(parse_container_line(":::@bad").is_none());
    }

    #[test]
    fn test_is_valid_directive_name() {
        assert!(is_valid_directive_name("value"));
        assert!(is_valid_directive_name("my-directive"));
        assert!(is_valid_directive_name("case_2"));
        assert!(!is_valid_directive_name(""));
        assert!(!is_valid_directive_name("30"));
        assert!(!is_valid_directive_name("foo@bar"));
    }
}
