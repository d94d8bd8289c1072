//! Parsed template handle.

use std::sync::OnceLock;

use crate::ast::Node;
use crate::error::SyntaxError;
use crate::render::{RenderBackend, Renderer, Skeleton};
use crate::schema::{InputDescriptor, Schema, extract};
use crate::transform::{ParseOptions, parse_with};

/// An immutable parsed template.
///
/// The schema is extracted on first access and cached. Editing the source
/// means parsing a new `Template`.
///
/// # Example
///
/// ```
/// use bf_engine::{InputKind, Template};
///
/// let template = Template::parse(
///     ":value{primary=\"Name\"} ist\n\n:::selector{primary=\"g\"}\n:::case{primary=\"w\"}\nweiblich\n:::\n:::\n",
/// )?;
/// let kinds: Vec<_> = template.inputs().iter().map(|i| i.kind).collect();
/// assert_eq!(kinds, [InputKind::Value, InputKind::Selector]);
/// # Ok::<(), bf_engine::SyntaxError>(())
/// ```
#[derive(Debug)]
pub struct Template {
    tree: Node,
    schema: OnceLock<Schema>,
}

impl Template {
    /// Parse with default options.
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        Self::parse_with(source, &ParseOptions::default())
    }

    /// Parse with explicit options.
    pub fn parse_with(source: &str, options: &ParseOptions) -> Result<Self, SyntaxError> {
        Ok(Self::from_tree(parse_with(source, options)?))
    }

    /// Wrap an already parsed directive tree.
    pub fn from_tree(tree: Node) -> Self {
        Self {
            tree,
            schema: OnceLock::new(),
        }
    }

    /// The directive tree.
    pub fn tree(&self) -> &Node {
        &self.tree
    }

    /// The input schema, extracted on first call.
    pub fn schema(&self) -> &Schema {
        self.schema.get_or_init(|| extract(&self.tree))
    }

    /// Input descriptors in document order.
    pub fn inputs(&self) -> &[InputDescriptor] {
        &self.schema().inputs
    }

    /// Compile the structural render stage for backend `B`.
    pub fn skeleton<B: RenderBackend>(&self) -> Skeleton<B> {
        Skeleton::build(&self.tree)
    }

    /// A renderer for backend `B` with an empty memo.
    pub fn renderer<B: RenderBackend>(&self) -> Renderer<B> {
        Renderer::new(self.skeleton())
    }
}
