//! Schema cache for Befund templates.
//!
//! Extracting a schema requires parsing the whole template. Callers that load
//! the same template repeatedly keep the extracted input descriptors here,
//! keyed on a template id and a [`TemplateDigest`] of the source text.
//!
//! # Implementations
//!
//! - [`NullSchemaCache`]: no-op implementation (always misses)
//! - [`FileSchemaCache`]: one file per template with version validation
//!
//! # Example
//!
//! ```
//! use bf_cache::{NullSchemaCache, SchemaCache, TemplateDigest};
//! use bf_engine::Template;
//!
//! let source = r#":value{primary="Alter"}"#;
//! let digest = TemplateDigest::of(source);
//! let cache = NullSchemaCache;
//!
//! let template = Template::parse(source)?;
//! cache.set("anamnese", &digest, template.inputs());
//! assert_eq!(cache.get("anamnese", &digest), None); // NullSchemaCache always misses
//! # Ok::<(), bf_engine::SyntaxError>(())
//! ```

mod digest;
mod file;

pub use digest::TemplateDigest;
pub use file::FileSchemaCache;

use bf_engine::InputDescriptor;

/// Storage for extracted input descriptors.
///
/// An entry is valid only for the digest it was stored with; a changed
/// source text misses. Implementations never fail: storage problems are
/// logged and reported as a miss.
pub trait SchemaCache: Send + Sync {
    /// Cached descriptors for `template_id`, if stored with `digest`.
    fn get(&self, template_id: &str, digest: &TemplateDigest) -> Option<Vec<InputDescriptor>>;

    /// Store descriptors, replacing any entry for `template_id`.
    fn set(&self, template_id: &str, digest: &TemplateDigest, inputs: &[InputDescriptor]);

    /// Remove the entry for `template_id`.
    fn invalidate(&self, template_id: &str);
}

/// No-op [`SchemaCache`] used when caching is disabled.
#[derive(Debug)]
pub struct NullSchemaCache;

impl SchemaCache for NullSchemaCache {
    fn get(&self, _template_id: &str, _digest: &TemplateDigest) -> Option<Vec<InputDescriptor>> {
        None
    }

    fn set(&self, _template_id: &str, _digest: &TemplateDigest, _inputs: &[InputDescriptor]) {}

    fn invalidate(&self, _template_id: &str) {}
}
