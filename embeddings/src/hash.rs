//! Content identity for cached text.

use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 digest of raw input text, hex encoded.
///
/// The text is hashed exactly as given: no trimming, normalization, or case
/// folding. Two inputs that differ by a single byte get different hashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    /// Length of the hex rendering.
    pub const HEX_LEN: usize = 64;

    /// Hash the given text.
    pub fn of(text: &str) -> Self {
        Self(hex::encode(Sha256::digest(text.as_bytes())))
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_known_digest() {
        // Fixed vector so a dependency bump cannot silently change keys.
        assert_eq!(
            ContentHash::of("hello").as_str(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(
            ContentHash::of("").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(ContentHash::of("some text"), ContentHash::of("some text"));
        assert_eq!(ContentHash::of("x").as_str().len(), ContentHash::HEX_LEN);
    }

    #[test]
    fn test_no_normalization() {
        let base = ContentHash::of("hello");
        assert_ne!(base, ContentHash::of("hello "));
        assert_ne!(base, ContentHash::of("Hello"));
        assert_ne!(base, ContentHash::of(" hello"));
    }
}
