//! Two-stage rendering with pluggable backends.
//!
//! - Structural stage: [`Skeleton::build`] pre-renders all static markup with
//!   a [`RenderBackend`] and turns directives into numbered slots.
//! - Data stage: [`Renderer::render`] fills the slots from a binding map,
//!   reusing the output of slots whose bindings did not change.
//!
//! [`RenderSession`] keeps both stages attached to an editable source.

mod backend;
mod html;
mod renderer;
mod session;
mod skeleton;
mod text;

pub use backend::{RenderBackend, escape_html};
pub use html::HtmlBackend;
pub use renderer::{RenderStats, Renderer, render};
pub use session::RenderSession;
pub use skeleton::Skeleton;
pub use text::TextBackend;
