//! File-based schema cache.
//!
//! [`FileSchemaCache`] stores one file per template. Each file has a binary
//! header followed by the descriptors as JSON:
//!
//! ```text
//! [digest_len: u32 LE][digest bytes][JSON bytes]
//! ```
//!
//! On read, only the header is read first to validate the digest. The JSON
//! is read only on a hit.
//!
//! On construction, the `VERSION` file in the cache root is validated. If it
//! is missing or differs, the whole cache directory is wiped and recreated.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bf_engine::InputDescriptor;

use crate::{SchemaCache, TemplateDigest};

/// File-based [`SchemaCache`] rooted at a directory on disk.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- VERSION              # cache version string
/// +-- {sha256(id)}.schema  # one entry per template id
/// ```
#[derive(Debug)]
pub struct FileSchemaCache {
    root: PathBuf,
}

impl FileSchemaCache {
    /// Open the cache at `root`, wiping it if `VERSION` differs from `version`.
    ///
    /// Errors are logged, never fatal; an unusable directory behaves like an
    /// always-missing cache.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, template_id: &str) -> PathBuf {
        self.root
            .join(format!("{}.schema", TemplateDigest::of(template_id)))
    }
}

impl SchemaCache for FileSchemaCache {
    fn get(&self, template_id: &str, digest: &TemplateDigest) -> Option<Vec<InputDescriptor>> {
        let path = self.entry_path(template_id);
        let mut file = File::open(&path).ok()?;

        let mut len_buf = [0u8; 4];
        file.read_exact(&mut len_buf).ok()?;
        let digest_len = u32::from_le_bytes(len_buf) as usize;

        let mut stored = vec![0u8; digest_len];
        file.read_exact(&mut stored).ok()?;
        if stored != digest.as_str().as_bytes() {
            tracing::debug!(template_id, "Schema cache stale");
            return None;
        }

        let mut json = Vec::new();
        file.read_to_end(&mut json).ok()?;
        match serde_json::from_slice(&json) {
            Ok(inputs) => {
                tracing::debug!(template_id, "Schema cache hit");
                Some(inputs)
            }
            Err(e) => {
                tracing::warn!(template_id, error = %e, "Corrupt schema cache entry");
                None
            }
        }
    }

    fn set(&self, template_id: &str, digest: &TemplateDigest, inputs: &[InputDescriptor]) {
        let json = match serde_json::to_vec(inputs) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(template_id, error = %e, "Failed to serialize schema");
                return;
            }
        };

        let digest_bytes = digest.as_str().as_bytes();
        let Ok(digest_len) = u32::try_from(digest_bytes.len()) else {
            return;
        };
        let mut buf = Vec::with_capacity(4 + digest_bytes.len() + json.len());
        buf.extend_from_slice(&digest_len.to_le_bytes());
        buf.extend_from_slice(digest_bytes);
        buf.extend_from_slice(&json);

        let result = fs::create_dir_all(&self.root)
            .and_then(|()| fs::write(self.entry_path(template_id), &buf));
        if let Err(e) = result {
            tracing::warn!(template_id, error = %e, "Failed to write schema cache entry");
        }
    }

    fn invalidate(&self, template_id: &str) {
        match fs::remove_file(self.entry_path(template_id)) {
            Ok(()) => tracing::debug!(template_id, "Schema cache entry removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(template_id, error = %e, "Failed to remove schema cache entry");
            }
        }
    }
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!(version, "Schema cache version matches");
            return;
        }
        Ok(stored) => {
            tracing::info!(%stored, current = version, "Schema cache version mismatch, wiping cache");
        }
        Err(_) => {
            tracing::info!("No schema cache VERSION file found, initializing cache");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!(error = %e, "Failed to remove schema cache directory");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!(error = %e, "Failed to create schema cache directory");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!(error = %e, "Failed to write schema cache VERSION file");
    }
}

#[cfg(test)]
mod tests {
    use bf_engine::Template;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    const SOURCE: &str = r#"Alter :value{primary="Alter" type="number"} :score{formula="a+b"}"#;

    fn inputs(source: &str) -> Vec<InputDescriptor> {
        Template::parse(source).unwrap().inputs().to_vec()
    }

    #[test]
    fn test_set_and_get() {
        let tmp = TempDir::new().unwrap();
        let cache = FileSchemaCache::new(tmp.path().join("cache"), "v1");
        let digest = TemplateDigest::of(SOURCE);

        cache.set("anamnese", &digest, &inputs(SOURCE));
        assert_eq!(cache.get("anamnese", &digest), Some(inputs(SOURCE)));
    }

    #[test]
    fn test_changed_source_misses() {
        let tmp = TempDir::new().unwrap();
        let cache = FileSchemaCache::new(tmp.path().join("cache"), "v1");

        cache.set("anamnese", &TemplateDigest::of(SOURCE), &inputs(SOURCE));
        assert_eq!(cache.get("anamnese", &TemplateDigest::of("geändert")), None);
    }

    #[test]
    fn test_templates_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let cache = FileSchemaCache::new(tmp.path().join("cache"), "v1");
        let other = r#":value{primary="Name"}"#;

        cache.set("a", &TemplateDigest::of(SOURCE), &inputs(SOURCE));
        cache.set("b/c", &TemplateDigest::of(other), &inputs(other));

        assert_eq!(cache.get("a", &TemplateDigest::of(SOURCE)), Some(inputs(SOURCE)));
        assert_eq!(cache.get("b/c", &TemplateDigest::of(other)), Some(inputs(other)));
    }

    #[test]
    fn test_invalidate() {
        let tmp = TempDir::new().unwrap();
        let cache = FileSchemaCache::new(tmp.path().join("cache"), "v1");
        let digest = TemplateDigest::of(SOURCE);

        cache.set("anamnese", &digest, &inputs(SOURCE));
        cache.invalidate("anamnese");
        assert_eq!(cache.get("anamnese", &digest), None);

        // Missing entries are not an error
        cache.invalidate("anamnese");
    }

    #[test]
    fn test_corrupt_entry_misses() {
        let tmp = TempDir::new().unwrap();
        let cache = FileSchemaCache::new(tmp.path().join("cache"), "v1");
        let digest = TemplateDigest::of(SOURCE);

        let mut buf = Vec::new();
        buf.extend_from_slice(&64u32.to_le_bytes());
        buf.extend_from_slice(digest.as_str().as_bytes());
        buf.extend_from_slice(b"{not json");
        fs::write(cache.entry_path("anamnese"), buf).unwrap();

        assert_eq!(cache.get("anamnese", &digest), None);
    }

    #[test]
    fn test_version_match_keeps_cache() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        let digest = TemplateDigest::of(SOURCE);

        FileSchemaCache::new(root.clone(), "v1").set("anamnese", &digest, &inputs(SOURCE));

        let cache = FileSchemaCache::new(root, "v1");
        assert_eq!(cache.get("anamnese", &digest), Some(inputs(SOURCE)));
    }

    #[test]
    fn test_version_mismatch_wipes_cache() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        let digest = TemplateDigest::of(SOURCE);

        FileSchemaCache::new(root.clone(), "v1").set("anamnese", &digest, &inputs(SOURCE));

        let cache = FileSchemaCache::new(root.clone(), "v2");
        assert_eq!(cache.get("anamnese", &digest), None);
        assert_eq!(fs::read_to_string(root.join("VERSION")).unwrap(), "v2");
    }

    #[test]
    fn test_missing_version_file_wipes_cache() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("orphan.schema"), b"stale").unwrap();

        let cache = FileSchemaCache::new(root.clone(), "v1");
        assert!(!cache.root().join("orphan.schema").exists());
        assert_eq!(fs::read_to_string(root.join("VERSION")).unwrap(), "v1");
    }
}
