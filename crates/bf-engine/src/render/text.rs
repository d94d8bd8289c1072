//! Plain-text backend.
//!
//! Drops all markup. Leaf blocks end with a newline, list items get a
//! `- ` prefix and table cells are separated by tabs. Containers (lists,
//! quotes, tables) add nothing of their own, so no blank lines appear between
//! their children. Raw HTML is omitted.

use crate::ast::ElementKind;

use super::backend::RenderBackend;

/// Plain-text render backend.
#[derive(Debug)]
pub struct TextBackend;

impl RenderBackend for TextBackend {
    fn element_start(kind: &ElementKind, out: &mut String) {
        match kind {
            ElementKind::Item => out.push_str("- "),
            ElementKind::Text(text) | ElementKind::Code(text) => out.push_str(text),
            ElementKind::SoftBreak | ElementKind::HardBreak => out.push('\n'),
            ElementKind::Rule => out.push_str("---\n"),
            ElementKind::TaskMarker(true) => out.push_str("[x] "),
            ElementKind::TaskMarker(false) => out.push_str("[ ] "),
            _ => {}
        }
    }

    fn element_end(kind: &ElementKind, out: &mut String) {
        match kind {
            ElementKind::Paragraph
            | ElementKind::Heading(_)
            | ElementKind::Item
            | ElementKind::TableHead
            | ElementKind::TableRow => out.push('\n'),
            ElementKind::CodeBlock(_) if !out.ends_with('\n') => out.push('\n'),
            ElementKind::TableCell => out.push('\t'),
            _ => {}
        }
    }

    fn text(text: &str, out: &mut String) {
        out.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_ends_with_newline() {
        let mut out = String::new();
        TextBackend::element_start(&ElementKind::Paragraph, &mut out);
        TextBackend::text("a < b", &mut out);
        TextBackend::element_end(&ElementKind::Paragraph, &mut out);
        assert_eq!(out, "a < b\n");
    }

    #[test]
    fn test_list_item_prefix() {
        let mut out = String::new();
        TextBackend::element_start(&ElementKind::Item, &mut out);
        TextBackend::element_start(&ElementKind::TaskMarker(true), &mut out);
        TextBackend::text("erledigt", &mut out);
        TextBackend::element_end(&ElementKind::Item, &mut out);
        assert_eq!(out, "- [x] erledigt\n");
    }

    #[test]
    fn test_containers_add_no_separator() {
        for kind in [ElementKind::List(None), ElementKind::BlockQuote, ElementKind::Table] {
            let mut out = String::new();
            TextBackend::element_start(&kind, &mut out);
            TextBackend::element_start(&ElementKind::Paragraph, &mut out);
            TextBackend::text("a", &mut out);
            TextBackend::element_end(&ElementKind::Paragraph, &mut out);
            TextBackend::element_end(&kind, &mut out);
            assert_eq!(out, "a\n", "{kind:?}");
        }
    }

    #[test]
    fn test_raw_html_dropped() {
        let mut out = String::new();
        TextBackend::element_start(&ElementKind::Html("<b>".to_owned()), &mut out);
        assert!(out.is_empty());
    }
}
