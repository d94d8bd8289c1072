//! Render backend trait for format-specific output.
//!
//! The renderer walks structural elements and asks the backend for the
//! markup around them. Backends are zero-sized types used as a generic
//! parameter, so the choice of format costs nothing at runtime.

use crate::ast::ElementKind;

/// Backend trait for format-specific rendering operations.
pub trait RenderBackend {
    /// Write the opening markup of an element.
    ///
    /// Leaf kinds (`Text`, `Code`, `Html`, breaks, rules, task markers) are
    /// written completely here.
    fn element_start(kind: &ElementKind, out: &mut String);

    /// Write the closing markup of an element.
    fn element_end(kind: &ElementKind, out: &mut String);

    /// Write plain text, escaped for the output format.
    fn text(text: &str, out: &mut String);

    /// Write a rendered directive value with its optional unit.
    fn directive_value(value: &str, unit: Option<&str>, out: &mut String) {
        Self::text(value, out);
        if let Some(unit) = unit.filter(|unit| !unit.is_empty()) {
            Self::text(" ", out);
            Self::text(unit, out);
        }
    }
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    push_escaped(s, &mut result);
    result
}

pub(crate) fn push_escaped(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}
