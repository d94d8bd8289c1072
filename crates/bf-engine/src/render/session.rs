//! Source-tracking render session.

use crate::binding::Lookup;
use crate::error::SyntaxError;
use crate::template::Template;
use crate::transform::ParseOptions;

use super::backend::RenderBackend;
use super::renderer::{RenderStats, Renderer};

/// Ties the two render stages to an editable source text.
///
/// [`load`](Self::load) runs the structural stage only when the source
/// changed; [`render`](Self::render) runs only the data stage, reusing slots
/// whose bindings did not change.
///
/// # Example
///
/// ```
/// use bf_engine::{Bindings, BindingValue, RenderSession, TextBackend};
///
/// let mut session = RenderSession::<TextBackend>::default();
/// assert!(session.load(r#":score{formula="a*2" unit="Punkte"}"#)?);
/// assert!(!session.load(r#":score{formula="a*2" unit="Punkte"}"#)?);
///
/// let mut bindings = Bindings::new();
/// bindings.insert("a".to_owned(), BindingValue::Number(4.0));
/// assert_eq!(session.render(&bindings), "8 Punkte\n");
/// # Ok::<(), bf_engine::SyntaxError>(())
/// ```
#[derive(Debug)]
pub struct RenderSession<B> {
    options: ParseOptions,
    current: Option<Loaded<B>>,
}

#[derive(Debug)]
struct Loaded<B> {
    source: String,
    template: Template,
    renderer: Renderer<B>,
}

impl<B> Default for RenderSession<B> {
    fn default() -> Self {
        Self {
            options: ParseOptions::default(),
            current: None,
        }
    }
}

impl<B: RenderBackend> RenderSession<B> {
    /// Create an empty session.
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            current: None,
        }
    }

    /// Load a source text.
    ///
    /// Returns `Ok(false)` without doing any work when `source` equals the
    /// loaded text. On a syntax error the previously loaded template stays
    /// active.
    pub fn load(&mut self, source: &str) -> Result<bool, SyntaxError> {
        if self
            .current
            .as_ref()
            .is_some_and(|loaded| loaded.source == source)
        {
            return Ok(false);
        }

        let template = Template::parse_with(source, &self.options)?;
        let renderer = template.renderer::<B>();
        tracing::debug!(slots = renderer.skeleton().slot_count(), "Template loaded");
        self.current = Some(Loaded {
            source: source.to_owned(),
            template,
            renderer,
        });
        Ok(true)
    }

    /// Render the loaded template. Empty when nothing is loaded.
    pub fn render(&mut self, bindings: &dyn Lookup) -> String {
        self.current
            .as_mut()
            .map(|loaded| loaded.renderer.render(bindings))
            .unwrap_or_default()
    }

    /// The loaded template, if any.
    pub fn template(&self) -> Option<&Template> {
        self.current.as_ref().map(|loaded| &loaded.template)
    }

    /// Slot counts of the last render.
    pub fn stats(&self) -> RenderStats {
        self.current
            .as_ref()
            .map(|loaded| loaded.renderer.stats())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::binding::{BindingValue, Bindings};
    use crate::render::{HtmlBackend, TextBackend};

    #[test]
    fn test_render_before_load_is_empty() {
        let mut session = RenderSession::<HtmlBackend>::default();
        assert_eq!(session.render(&Bindings::new()), "");
        assert!(session.template().is_none());
    }

    #[test]
    fn test_load_detects_unchanged_source() {
        let mut session = RenderSession::<TextBackend>::default();
        assert!(session.load("a").unwrap());
        assert!(!session.load("a").unwrap());
        assert!(session.load("b").unwrap());
    }

    #[test]
    fn test_reload_keeps_memo_when_unchanged() {
        let source = r#":value{primary="x"}"#;
        let mut session = RenderSession::<TextBackend>::default();
        let mut bindings = Bindings::new();
        bindings.insert("x".to_owned(), BindingValue::from("1"));

        session.load(source).unwrap();
        session.render(&bindings);
        session.load(source).unwrap();
        session.render(&bindings);
        assert_eq!(session.stats(), RenderStats { recomputed: 0, reused: 1 });
    }

    #[test]
    fn test_syntax_error_keeps_previous_template() {
        let mut session = RenderSession::<TextBackend>::default();
        session.load("Befund").unwrap();

        assert!(session.load(":::selector{primary=\"g\"}\n").is_err());
        assert_eq!(session.render(&Bindings::new()), "Befund\n");
    }

    #[test]
    fn test_template_exposes_schema() {
        let mut session = RenderSession::<TextBackend>::default();
        session.load(r#":value{primary="Alter" type="number"}"#).unwrap();

        let template = session.template().unwrap();
        assert_eq!(template.inputs().len(), 1);
        assert_eq!(template.inputs()[0].key, "Alter");
    }
}
