//! Template source to directive tree.
//!
//! Parsing happens in two passes:
//!
//! 1. A line scanner splits the source at container lines (`:::name` and
//!    `:::`), keeping a stack of open frames. Inline and leaf directives are
//!    replaced by marker characters and the text between container lines is
//!    parsed as markdown ([`crate::markdown`]).
//! 2. The branch-selector rewrite gathers every case of a selector into its
//!    direct children and drops everything else.

use std::collections::HashSet;

use pulldown_cmark::Options;

use crate::ast::{Directive, Element, ElementKind, Node};
use crate::directive::DirectiveKind;
use crate::directive::fence::FenceTracker;
use crate::directive::parser::{ContainerLine, Delimited, find_inline, parse_container_line};
use crate::error::SyntaxError;
use crate::markdown::{self, MarkerTable};

/// Options controlling how template markup is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseOptions {
    /// Enable GitHub Flavored Markdown (tables, strikethrough, task lists).
    pub gfm: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { gfm: true }
    }
}

/// Parse a template into its directive tree with default options.
///
/// # Errors
///
/// Returns a [`SyntaxError`] for malformed directive markup.
///
/// # Example
///
/// ```
/// use bf_engine::{Node, parse};
///
/// let tree = parse(":::selector{primary=\"g\"}\n:::case{primary=\"w\"}\nweiblich\n:::\n:::\n")?;
/// let selector = &tree.children()[0];
/// assert!(matches!(selector, Node::Selector(_)));
/// assert!(matches!(selector.children()[0], Node::Case(_)));
/// # Ok::<(), bf_engine::SyntaxError>(())
/// ```
pub fn parse(source: &str) -> Result<Node, SyntaxError> {
    parse_with(source, &ParseOptions::default())
}

/// Parse a template into its directive tree.
///
/// # Errors
///
/// Returns a [`SyntaxError`] for malformed directive markup.
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Node, SyntaxError> {
    let tree = TreeBuilder::new(markdown::parser_options(options.gfm)).build(source)?;
    Ok(rewrite(tree))
}

/// Kind of an open container frame.
#[derive(Debug)]
enum FrameKind {
    Document,
    Directive(DirectiveKind, Directive),
    /// `:::name` with a name the grammar does not know.
    Container(String),
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    line: usize,
    /// Markdown collected since the last container line.
    pending: String,
    children: Vec<Node>,
}

impl Frame {
    fn new(kind: FrameKind, line: usize) -> Self {
        Self {
            kind,
            line,
            pending: String::new(),
            children: Vec::new(),
        }
    }

    fn name(&self) -> String {
        match &self.kind {
            FrameKind::Document => String::new(),
            FrameKind::Directive(kind, _) => kind.name().to_owned(),
            FrameKind::Container(name) => name.clone(),
        }
    }

    fn into_node(self) -> Node {
        match self.kind {
            FrameKind::Document => Node::document(self.children),
            FrameKind::Directive(kind, mut directive) => {
                directive.children = self.children;
                kind.node(directive)
            }
            FrameKind::Container(name) => Node::Structural(Element {
                kind: ElementKind::Container(name),
                children: self.children,
            }),
        }
    }
}

struct TreeBuilder {
    options: Options,
    markers: MarkerTable,
    fence: FenceTracker,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new(options: Options) -> Self {
        Self {
            options,
            markers: MarkerTable::new(),
            fence: FenceTracker::new(),
            stack: vec![Frame::new(FrameKind::Document, 0)],
        }
    }

    fn build(mut self, source: &str) -> Result<Node, SyntaxError> {
        for (index, line) in source.lines().enumerate() {
            let line_num = index + 1;
            if let Some(c) = line.chars().find(|&c| markdown::is_reserved(c)) {
                return Err(SyntaxError::ReservedCharacter {
                    code: u32::from(c),
                    line: line_num,
                });
            }

            if self.fence.is_code(line) {
                self.push_line(line);
                continue;
            }

            match parse_container_line(line) {
                Some(ContainerLine::Start { name, label, attrs }) => {
                    self.flush();
                    self.open(name, label, attrs, line_num)?;
                }
                Some(ContainerLine::End { .. }) => {
                    self.flush();
                    self.close(line_num)?;
                }
                None => {
                    let replaced = self.replace_inline(line, line_num)?;
                    self.push_line(&replaced);
                }
            }
        }

        self.flush();
        if self.stack.len() > 1
            && let Some(frame) = self.stack.pop()
        {
            return Err(SyntaxError::Unterminated {
                name: frame.name(),
                line: frame.line,
            });
        }

        Ok(self
            .stack
            .pop()
            .map_or_else(|| Node::document(Vec::new()), Frame::into_node))
    }

    fn current(&mut self) -> Option<&mut Frame> {
        self.stack.last_mut()
    }

    fn push_line(&mut self, line: &str) {
        if let Some(frame) = self.current() {
            frame.pending.push_str(line);
            frame.pending.push('\n');
        }
    }

    /// Parse the markdown collected in the current frame.
    fn flush(&mut self) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        if frame.pending.trim().is_empty() {
            frame.pending.clear();
            return;
        }
        let nodes = markdown::parse_chunk(&frame.pending, self.options, &self.markers);
        frame.pending.clear();
        frame.children.extend(nodes);
    }

    fn open(
        &mut self,
        name: &str,
        label: Delimited<'_>,
        attrs: Delimited<'_>,
        line: usize,
    ) -> Result<(), SyntaxError> {
        let Some(kind) = DirectiveKind::from_name(name) else {
            self.stack
                .push(Frame::new(FrameKind::Container(name.to_owned()), line));
            return Ok(());
        };

        kind.check_form(true, line)?;
        let directive = kind.directive(label, attrs, line)?;
        if kind == DirectiveKind::Case && !self.inside_selector() {
            return Err(SyntaxError::CaseOutsideSelector { line });
        }

        self.stack
            .push(Frame::new(FrameKind::Directive(kind, directive), line));
        Ok(())
    }

    /// Whether the nearest enclosing directive frame is a selector.
    fn inside_selector(&self) -> bool {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| match &frame.kind {
                FrameKind::Container(_) => None,
                FrameKind::Document => Some(false),
                FrameKind::Directive(kind, _) => Some(*kind == DirectiveKind::Selector),
            })
            .unwrap_or(false)
    }

    fn close(&mut self, line: usize) -> Result<(), SyntaxError> {
        if self.stack.len() < 2 {
            return Err(SyntaxError::UnexpectedClose { line });
        }
        let Some(frame) = self.stack.pop() else {
            return Err(SyntaxError::UnexpectedClose { line });
        };
        let node = frame.into_node();
        if let Some(parent) = self.current() {
            parent.children.push(node);
        }
        Ok(())
    }

    /// Replace known inline and leaf directives in `line` with markers.
    fn replace_inline(&mut self, line: &str, line_num: usize) -> Result<String, SyntaxError> {
        let mut out = String::with_capacity(line.len());
        let mut copied = 0;
        let mut from = 0;

        while let Some(found) = find_inline(line, from) {
            let Some(kind) = DirectiveKind::from_name(found.name) else {
                // Unknown names stay literal; directives in their label are
                // still picked up.
                from = found.start + found.colons + found.name.len();
                continue;
            };

            kind.check_form(false, line_num)?;
            let directive = kind.directive(found.label, found.attrs, line_num)?;
            let marker = self
                .markers
                .insert(kind.node(directive), &line[found.start..found.end])?;

            out.push_str(&line[copied..found.start]);
            out.push(marker);
            copied = found.end;
            from = found.end;
        }

        out.push_str(&line[copied..]);
        Ok(out)
    }
}

/// Apply the branch-selector rewrite to a whole tree.
///
/// Every selector ends up with exactly its cases as direct children, in
/// document order. Cases reached through structural wrappers are lifted;
/// all other selector content is discarded.
pub(crate) fn rewrite(node: Node) -> Node {
    match node {
        Node::Selector(mut selector) => {
            let mut cases = Vec::new();
            for child in std::mem::take(&mut selector.children) {
                collect_cases(child, selector.line, &mut cases);
            }
            selector.children = dedupe_cases(cases);
            Node::Selector(selector)
        }
        Node::Case(mut case) => {
            case.children = case.children.into_iter().map(rewrite).collect();
            Node::Case(case)
        }
        Node::Structural(mut element) => {
            element.children = element.children.into_iter().map(rewrite).collect();
            Node::Structural(element)
        }
        Node::Value(_) | Node::Score(_) => node,
    }
}

fn collect_cases(node: Node, selector_line: usize, cases: &mut Vec<Node>) {
    match node {
        Node::Case(_) => cases.push(rewrite(node)),
        Node::Structural(element) => {
            for child in element.children {
                collect_cases(child, selector_line, cases);
            }
        }
        Node::Selector(nested) => {
            tracing::warn!(
                line = nested.line,
                selector_line,
                "Selector nested directly in a selector is discarded; wrap it in a case"
            );
        }
        Node::Value(_) | Node::Score(_) => {}
    }
}

/// Keep the first case for each label.
fn dedupe_cases(cases: Vec<Node>) -> Vec<Node> {
    let mut seen = HashSet::new();
    cases
        .into_iter()
        .filter(|case| {
            let Some(label) = case.directive().and_then(|d| d.attrs.primary.clone()) else {
                return true;
            };
            let first = seen.insert(label.clone());
            if !first {
                tracing::warn!(
                    label = %label,
                    line = case.directive().map_or(0, |d| d.line),
                    "Duplicate case label, keeping the first"
                );
            }
            first
        })
        .collect()
}
