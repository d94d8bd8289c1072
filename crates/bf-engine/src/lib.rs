//! Directive template engine for clinical note templates.
//!
//! Templates are Markdown with three kinds of directives:
//!
//! - `:value{primary="key" type="number" unit="kg"}` inserts a bound value.
//! - `:::selector{primary="key"}` with nested `:::case{primary="label"}`
//!   blocks renders the case whose label equals the bound value.
//! - `:score{formula="a+b*2" unit="Punkte"}` evaluates an arithmetic formula
//!   over bound values.
//!
//! The engine turns a source into a directive tree ([`parse`]), extracts the
//! inputs the template needs ([`extract`]) and renders the tree against a
//! binding map ([`Renderer`], [`render`]).
//!
//! # Example
//!
//! ```
//! use bf_engine::{BindingValue, Bindings, Template, TextBackend};
//!
//! let template = Template::parse(
//!     "Summe: :score{formula=\"a+b\" unit=\"Punkte\"}\n",
//! )?;
//! assert_eq!(template.inputs()[0].children.len(), 2);
//!
//! let mut bindings = Bindings::new();
//! bindings.insert("a".to_owned(), BindingValue::Number(3.0));
//! bindings.insert("b".to_owned(), BindingValue::Number(4.0));
//! assert_eq!(template.renderer::<TextBackend>().render(&bindings), "Summe: 7 Punkte\n");
//! # Ok::<(), bf_engine::SyntaxError>(())
//! ```

mod ast;
mod binding;
pub mod directive;
mod error;
mod formula;
mod markdown;
mod render;
mod schema;
mod template;
mod transform;

pub use ast::{Attributes, Directive, Element, ElementKind, Node, UnknownValueType, ValueType};
pub use binding::{BindingContext, BindingValue, Bindings, Lookup, Read};
pub use error::{AttributeError, SyntaxError};
pub use formula::{Evaluation, Formula, FormulaError, evaluate, extract_variables, format_number};
pub use render::{
    HtmlBackend, RenderBackend, RenderSession, RenderStats, Renderer, Skeleton, TextBackend,
    escape_html, render,
};
pub use schema::{InputDescriptor, InputKind, Schema, extract};
pub use template::Template;
pub use transform::{ParseOptions, parse, parse_with};
