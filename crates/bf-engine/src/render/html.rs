//! HTML backend.
//!
//! Produces semantic HTML5. Raw HTML from the template passes through
//! unchanged; everything else is escaped.

use crate::ast::ElementKind;

use super::backend::{RenderBackend, push_escaped};

/// HTML render backend.
#[derive(Debug)]
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn element_start(kind: &ElementKind, out: &mut String) {
        match kind {
            ElementKind::Document | ElementKind::Group => {}
            ElementKind::Paragraph => out.push_str("<p>"),
            ElementKind::Heading(level) => {
                out.push_str("<h");
                out.push_str(&level.to_string());
                out.push('>');
            }
            ElementKind::BlockQuote => out.push_str("<blockquote>"),
            ElementKind::CodeBlock(Some(lang)) => {
                out.push_str(r#"<pre><code class="language-"#);
                push_escaped(lang, out);
                out.push_str(r#"">"#);
            }
            ElementKind::CodeBlock(None) => out.push_str("<pre><code>"),
            ElementKind::List(Some(1)) => out.push_str("<ol>"),
            ElementKind::List(Some(start)) => {
                out.push_str(r#"<ol start=""#);
                out.push_str(&start.to_string());
                out.push_str(r#"">"#);
            }
            ElementKind::List(None) => out.push_str("<ul>"),
            ElementKind::Item => out.push_str("<li>"),
            ElementKind::Emphasis => out.push_str("<em>"),
            ElementKind::Strong => out.push_str("<strong>"),
            ElementKind::Strikethrough => out.push_str("<s>"),
            ElementKind::Link { dest, title } => {
                out.push_str(r#"<a href=""#);
                push_escaped(dest, out);
                if !title.is_empty() {
                    out.push_str(r#"" title=""#);
                    push_escaped(title, out);
                }
                out.push_str(r#"">"#);
            }
            // Alt text comes from the children, closed in `element_end`.
            ElementKind::Image { dest, title } => {
                out.push_str(r#"<img src=""#);
                push_escaped(dest, out);
                if !title.is_empty() {
                    out.push_str(r#"" title=""#);
                    push_escaped(title, out);
                }
                out.push_str(r#"" alt=""#);
            }
            ElementKind::Table => out.push_str("<table>"),
            ElementKind::TableHead => out.push_str("<thead><tr>"),
            ElementKind::TableRow => out.push_str("<tr>"),
            ElementKind::TableCell => out.push_str("<td>"),
            ElementKind::Container(name) => {
                out.push_str(r#"<div class=""#);
                push_escaped(name, out);
                out.push_str(r#"">"#);
            }
            ElementKind::Text(text) => push_escaped(text, out),
            ElementKind::Code(code) => {
                out.push_str("<code>");
                push_escaped(code, out);
                out.push_str("</code>");
            }
            ElementKind::Html(html) => out.push_str(html),
            ElementKind::SoftBreak => out.push('\n'),
            ElementKind::HardBreak => out.push_str("<br>"),
            ElementKind::Rule => out.push_str("<hr>"),
            ElementKind::TaskMarker(true) => {
                out.push_str(r#"<input type="checkbox" checked disabled> "#);
            }
            ElementKind::TaskMarker(false) => {
                out.push_str(r#"<input type="checkbox" disabled> "#);
            }
        }
    }

    fn element_end(kind: &ElementKind, out: &mut String) {
        match kind {
            ElementKind::Paragraph => out.push_str("</p>"),
            ElementKind::Heading(level) => {
                out.push_str("</h");
                out.push_str(&level.to_string());
                out.push('>');
            }
            ElementKind::BlockQuote => out.push_str("</blockquote>"),
            ElementKind::CodeBlock(_) => out.push_str("</code></pre>"),
            ElementKind::List(Some(_)) => out.push_str("</ol>"),
            ElementKind::List(None) => out.push_str("</ul>"),
            ElementKind::Item => out.push_str("</li>"),
            ElementKind::Emphasis => out.push_str("</em>"),
            ElementKind::Strong => out.push_str("</strong>"),
            ElementKind::Strikethrough => out.push_str("</s>"),
            ElementKind::Link { .. } => out.push_str("</a>"),
            ElementKind::Image { .. } => out.push_str(r#"">"#),
            ElementKind::Table => out.push_str("</table>"),
            ElementKind::TableHead => out.push_str("</tr></thead>"),
            ElementKind::TableRow => out.push_str("</tr>"),
            ElementKind::TableCell => out.push_str("</td>"),
            ElementKind::Container(_) => out.push_str("</div>"),
            ElementKind::Document
            | ElementKind::Group
            | ElementKind::Text(_)
            | ElementKind::Code(_)
            | ElementKind::Html(_)
            | ElementKind::SoftBreak
            | ElementKind::HardBreak
            | ElementKind::Rule
            | ElementKind::TaskMarker(_) => {}
        }
    }

    fn text(text: &str, out: &mut String) {
        push_escaped(text, out);
    }
}
