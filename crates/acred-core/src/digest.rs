//! # Binding Digests
//!
//! Defines [`ContentDigest`], the 32-byte SHA-256 value used to bind
//! protocol objects to each other (claim digests, issuer key fingerprints),
//! and [`Sha256Accumulator`] for composite, domain-separated hashing.
//!
//! ## Security Invariant
//!
//! [`sha256_digest()`] only accepts [`CanonicalBytes`], so a digest of a
//! structured value is always computed over its canonical encoding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::hex;

/// A SHA-256 digest, serialized as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex digest.
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let raw = hex::decode(s)?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|v: Vec<u8>| format!("expected 32 bytes, got {}", v.len()))?;
        Ok(Self(bytes))
    }

    /// The raw 32 digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Compute a SHA-256 digest over canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest(bytes)
}

/// Incremental SHA-256 over a sequence of length-prefixed fields.
///
/// Each field is written as its little-endian `u64` length followed by the
/// bytes, so `("ab", "c")` and `("a", "bc")` never collide. Construct with a
/// domain tag to separate digests computed for different purposes.
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Start a new accumulator under a domain separation tag.
    pub fn new(domain: &str) -> Self {
        let mut acc = Self {
            hasher: Sha256::new(),
        };
        acc.update(domain.as_bytes());
        acc
    }

    /// Append one length-prefixed field.
    pub fn update(&mut self, field: &[u8]) -> &mut Self {
        self.hasher.update((field.len() as u64).to_le_bytes());
        self.hasher.update(field);
        self
    }

    /// Append the canonical encoding of a structured value.
    pub fn update_canonical(&mut self, data: &CanonicalBytes) -> &mut Self {
        self.update(data.as_bytes())
    }

    /// Finish hashing.
    pub fn finalize(self) -> ContentDigest {
        let hash = self.hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        ContentDigest(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sha256_digest_is_deterministic() {
        let cb = CanonicalBytes::new(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(sha256_digest(&cb), sha256_digest(&cb));
    }

    #[test]
    fn known_sha256_vector() {
        let cb = CanonicalBytes::new(&json!({})).unwrap();
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn display_has_algorithm_prefix() {
        let cb = CanonicalBytes::new(&json!({"a": 1})).unwrap();
        let s = sha256_digest(&cb).to_string();
        assert!(s.starts_with("sha256:"));
        assert_eq!(s.len(), 7 + 64);
    }

    #[test]
    fn hex_roundtrip_through_serde() {
        let cb = CanonicalBytes::new(&json!({"k": "v"})).unwrap();
        let d = sha256_digest(&cb);
        let text = serde_json::to_string(&d).unwrap();
        assert_eq!(text, format!("\"{}\"", d.to_hex()));
        let back: ContentDigest = serde_json::from_str(&text).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = ContentDigest::from_hex("abcd").unwrap_err();
        assert!(err.contains("expected 32 bytes"));
    }

    #[test]
    fn accumulator_fields_are_length_prefixed() {
        let mut a = Sha256Accumulator::new("test");
        a.update(b"ab").update(b"c");
        let mut b = Sha256Accumulator::new("test");
        b.update(b"a").update(b"bc");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn accumulator_domains_are_separated() {
        let mut a = Sha256Accumulator::new("commit");
        a.update(b"payload");
        let mut b = Sha256Accumulator::new("sign");
        b.update(b"payload");
        assert_ne!(a.finalize(), b.finalize());
    }
}
