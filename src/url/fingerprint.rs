use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 digest of a raw URL
///
/// Fingerprints are the canonical identity of a URL everywhere in the
/// shared store: dedup membership, processing/failed bookkeeping, and
/// frontier keys. Hashing bounds the key size and avoids storing raw URL
/// strings twice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a raw URL string
    ///
    /// # Examples
    ///
    /// ```
    /// use driftnet::url::Fingerprint;
    ///
    /// let fp = Fingerprint::of("https://example.com/");
    /// assert_eq!(fp.as_str().len(), 64);
    /// ```
    pub fn of(raw_url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(raw_url.as_bytes());
        Fingerprint(hex::encode(hasher.finalize()))
    }

    /// Wraps a digest that was already hex-encoded (e.g. read back from the store)
    pub fn from_hex(digest: String) -> Self {
        Fingerprint(digest)
    }

    /// Returns the hex digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
