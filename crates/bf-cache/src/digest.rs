//! Content digest of a template source.

use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 digest of a template source, hex encoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TemplateDigest(String);

impl TemplateDigest {
    /// Digest of `source`.
    #[must_use]
    pub fn of(source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_depends_on_content() {
        let a = TemplateDigest::of(r#":value{primary="a"}"#);
        let b = TemplateDigest::of(r#":value{primary="a"}"#);
        let c = TemplateDigest::of(r#":value{primary="b"}"#);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_digest_of_empty_source() {
        assert_eq!(
            TemplateDigest::of("").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
