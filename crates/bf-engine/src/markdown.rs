//! Markdown chunks to structural nodes.
//!
//! Text between container lines is handed to pulldown-cmark. Before that,
//! every inline or leaf directive is replaced by a single private-use
//! character (a *marker*) so the markdown parser treats it as an opaque
//! word. When the events are converted back into [`Node`]s, markers in text
//! become the directive nodes again, while markers inside code, raw HTML
//! and link targets are restored to the literal directive source.

use std::mem;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd, TextMergeStream};

use crate::ast::{Element, ElementKind, Node};
use crate::error::SyntaxError;

const MARKER_BASE: u32 = 0xF_0000;

/// Number of addressable markers (`U+F0000` to `U+FFFFD`).
pub(crate) const MARKER_LIMIT: usize = 0xFFFE;

/// Whether `c` lies in the plane 15 private-use range reserved for markers.
pub(crate) fn is_reserved(c: char) -> bool {
    ('\u{F0000}'..='\u{FFFFF}').contains(&c)
}

/// Get `pulldown-cmark` options for the given GFM setting.
pub(crate) fn parser_options(gfm: bool) -> Options {
    if gfm {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
    } else {
        Options::empty()
    }
}

#[derive(Debug)]
struct Marker {
    node: Node,
    literal: String,
}

/// Directive nodes standing in for marker characters.
#[derive(Debug, Default)]
pub(crate) struct MarkerTable {
    entries: Vec<Marker>,
}

impl MarkerTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a directive node with its source text and return its marker.
    pub(crate) fn insert(&mut self, node: Node, literal: &str) -> Result<char, SyntaxError> {
        let too_many = SyntaxError::TooManyDirectives {
            limit: MARKER_LIMIT,
        };
        if self.entries.len() >= MARKER_LIMIT {
            return Err(too_many);
        }
        let marker = u32::try_from(self.entries.len())
            .ok()
            .and_then(|index| char::from_u32(MARKER_BASE + index))
            .ok_or(too_many)?;

        self.entries.push(Marker {
            node,
            literal: literal.to_owned(),
        });
        Ok(marker)
    }

    fn get(&self, c: char) -> Option<&Marker> {
        let index = u32::from(c).checked_sub(MARKER_BASE)?;
        self.entries.get(usize::try_from(index).ok()?)
    }

    /// Replace every marker in `text` with its literal directive source.
    pub(crate) fn restore(&self, text: &str) -> String {
        if !text.chars().any(is_reserved) {
            return text.to_owned();
        }
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match self.get(c) {
                Some(marker) => out.push_str(&marker.literal),
                None => out.push(c),
            }
        }
        out
    }
}

/// Parse a markdown chunk into structural nodes with directives reinserted.
pub(crate) fn parse_chunk(markdown: &str, options: Options, markers: &MarkerTable) -> Vec<Node> {
    let mut builder = ChunkBuilder::new(markers);
    for event in TextMergeStream::new(Parser::new_ext(markdown, options)) {
        builder.event(event);
    }
    builder.finish()
}

struct ChunkBuilder<'m> {
    markers: &'m MarkerTable,
    stack: Vec<Element>,
}

impl<'m> ChunkBuilder<'m> {
    fn new(markers: &'m MarkerTable) -> Self {
        Self {
            markers,
            stack: vec![Element {
                kind: ElementKind::Group,
                children: Vec::new(),
            }],
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while self.stack.len() > 1 {
            self.close();
        }
        self.stack
            .pop()
            .map(|root| root.children)
            .unwrap_or_default()
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            // Raw HTML blocks hold `Html` events only; keep them flat.
            Event::Start(Tag::HtmlBlock) | Event::End(TagEnd::HtmlBlock) => {}
            Event::Start(tag) => {
                let kind = self.element_kind(tag);
                self.stack.push(Element {
                    kind,
                    children: Vec::new(),
                });
            }
            Event::End(_) => self.close(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) | Event::InlineMath(code) | Event::DisplayMath(code) => {
                let code = self.markers.restore(&code);
                self.leaf(ElementKind::Code(code));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let html = self.markers.restore(&html);
                self.leaf(ElementKind::Html(html));
            }
            Event::FootnoteReference(label) => {
                self.leaf(ElementKind::Text(format!("[^{label}]")));
            }
            Event::SoftBreak => self.leaf(ElementKind::SoftBreak),
            Event::HardBreak => self.leaf(ElementKind::HardBreak),
            Event::Rule => self.leaf(ElementKind::Rule),
            Event::TaskListMarker(checked) => self.leaf(ElementKind::TaskMarker(checked)),
        }
    }

    fn element_kind(&self, tag: Tag<'_>) -> ElementKind {
        match tag {
            Tag::Paragraph => ElementKind::Paragraph,
            Tag::Heading { level, .. } => ElementKind::Heading(heading_level_to_num(level)),
            Tag::BlockQuote(_) => ElementKind::BlockQuote,
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => ElementKind::CodeBlock(
                info.split_whitespace()
                    .next()
                    .map(|lang| self.markers.restore(lang)),
            ),
            Tag::CodeBlock(CodeBlockKind::Indented) => ElementKind::CodeBlock(None),
            Tag::List(start) => ElementKind::List(start),
            Tag::Item => ElementKind::Item,
            Tag::Emphasis => ElementKind::Emphasis,
            Tag::Strong => ElementKind::Strong,
            Tag::Strikethrough => ElementKind::Strikethrough,
            Tag::Link {
                dest_url, title, ..
            } => ElementKind::Link {
                dest: self.markers.restore(&dest_url),
                title: self.markers.restore(&title),
            },
            Tag::Image {
                dest_url, title, ..
            } => ElementKind::Image {
                dest: self.markers.restore(&dest_url),
                title: self.markers.restore(&title),
            },
            Tag::Table(_) => ElementKind::Table,
            Tag::TableHead => ElementKind::TableHead,
            Tag::TableRow => ElementKind::TableRow,
            Tag::TableCell => ElementKind::TableCell,
            Tag::HtmlBlock
            | Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript
            | Tag::MetadataBlock(_) => ElementKind::Group,
        }
    }

    fn close(&mut self) {
        if self.stack.len() < 2 {
            return;
        }
        if let Some(element) = self.stack.pop() {
            self.push(Node::Structural(element));
        }
    }

    fn push(&mut self, node: Node) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        }
    }

    fn leaf(&mut self, kind: ElementKind) {
        self.push(Node::Structural(Element {
            kind,
            children: Vec::new(),
        }));
    }

    fn text(&mut self, text: &str) {
        let literal_only = self.stack.last().is_some_and(|parent| {
            matches!(
                parent.kind,
                ElementKind::CodeBlock(_) | ElementKind::Image { .. }
            )
        });
        if literal_only {
            let text = self.markers.restore(text);
            self.leaf(ElementKind::Text(text));
            return;
        }

        let mut plain = String::new();
        for c in text.chars() {
            match self.markers.get(c) {
                Some(marker) => {
                    if !plain.is_empty() {
                        self.leaf(ElementKind::Text(mem::take(&mut plain)));
                    }
                    let node = marker.node.clone();
                    self.push(node);
                }
                None => plain.push(c),
            }
        }
        if !plain.is_empty() {
            self.leaf(ElementKind::Text(plain));
        }
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::{Attributes, Directive};

    fn value(key: &str) -> Node {
        Node::Value(Directive {
            attrs: Attributes {
                primary: Some(key.to_owned()),
                ..Attributes::default()
            },
            line: 1,
            ..Directive::default()
        })
    }

    fn text(s: &str) -> Node {
        Node::Structural(Element {
            kind: ElementKind::Text(s.to_owned()),
            children: Vec::new(),
        })
    }

    fn element(kind: ElementKind, children: Vec<Node>) -> Node {
        Node::Structural(Element { kind, children })
    }

    #[test]
    fn test_is_reserved() {
        assert!(is_reserved('\u{F0000}'));
        assert!(is_reserved('\u{FFFFD}'));
        assert!(!is_reserved('a'));
        assert!(!is_reserved('\u{E000}'));
    }

    #[test]
    fn test_marker_reinserted_in_paragraph() {
        let mut markers = MarkerTable::new();
        let m = markers
            .insert(value("Name"), r#":value{primary="Name"}"#)
            .unwrap();

        let nodes = parse_chunk(&format!("Hallo {m} da"), parser_options(true), &markers);

        assert_eq!(
            nodes,
            vec![element(
                ElementKind::Paragraph,
                vec![text("Hallo "), value("Name"), text(" da")]
            )]
        );
    }

    #[test]
    fn test_marker_inside_emphasis() {
        let mut markers = MarkerTable::new();
        let m = markers.insert(value("x"), ":value{primary=x}").unwrap();

        let nodes = parse_chunk(&format!("*{m}*"), Options::empty(), &markers);

        assert_eq!(
            nodes,
            vec![element(
                ElementKind::Paragraph,
                vec![element(ElementKind::Emphasis, vec![value("x")])]
            )]
        );
    }

    #[test]
    fn test_marker_in_code_span_restored() {
        let mut markers = MarkerTable::new();
        let m = markers.insert(value("x"), ":value{primary=x}").unwrap();

        let nodes = parse_chunk(&format!("`{m}`"), Options::empty(), &markers);

        assert_eq!(
            nodes,
            vec![element(
                ElementKind::Paragraph,
                vec![element(
                    ElementKind::Code(":value{primary=x}".to_owned()),
                    Vec::new()
                )]
            )]
        );
    }

    #[test]
    fn test_marker_in_indented_code_restored() {
        let mut markers = MarkerTable::new();
        let m = markers.insert(value("x"), ":value{primary=x}").unwrap();

        let nodes = parse_chunk(&format!("    {m}\n"), Options::empty(), &markers);

        assert_eq!(
            nodes,
            vec![element(
                ElementKind::CodeBlock(None),
                vec![text(":value{primary=x}\n")]
            )]
        );
    }

    #[test]
    fn test_marker_in_inline_html_restored() {
        let mut markers = MarkerTable::new();
        let m = markers.insert(value("x"), ":value{primary=x}").unwrap();

        let restored = markers.restore(&format!("<span title=\"{m}\">"));
        assert_eq!(restored, "<span title=\":value{primary=x}\">");
    }

    #[test]
    fn test_heading_and_list_structure() {
        let markers = MarkerTable::new();
        let nodes = parse_chunk("## Befund\n\n- eins\n- zwei\n", Options::empty(), &markers);

        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[0],
            element(ElementKind::Heading(2), vec![text("Befund")])
        );
        match &nodes[1] {
            Node::Structural(Element {
                kind: ElementKind::List(None),
                children,
            }) => assert_eq!(children.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_gfm_table() {
        let markers = MarkerTable::new();
        let nodes = parse_chunk("| a |\n|---|\n| 1 |\n", parser_options(true), &markers);

        assert!(matches!(
            &nodes[0],
            Node::Structural(Element {
                kind: ElementKind::Table,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_chunk() {
        let markers = MarkerTable::new();
        assert!(parse_chunk("", Options::empty(), &markers).is_empty());
        assert!(parse_chunk("\n\n", Options::empty(), &markers).is_empty());
    }
}
