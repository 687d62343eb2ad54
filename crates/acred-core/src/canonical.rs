//! # Canonical Serialization
//!
//! [`CanonicalBytes`] is the sole construction path for bytes that feed a
//! binding digest: claim digests, issuer key fingerprints, and every input
//! the mock engine hashes. Two logically equal values always produce the
//! same bytes.
//!
//! ## Rules
//!
//! 1. Reject floats. Attribute values must be strings, integers, booleans
//!    or null so that the same claim never has two encodings.
//! 2. Sort object keys lexicographically.
//! 3. Use compact separators (no whitespace).

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by canonical JSON serialization.
///
/// The inner `Vec<u8>` is private. Downstream code cannot construct
/// `CanonicalBytes` except through [`CanonicalBytes::new()`] or
/// [`CanonicalBytes::from_value()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-built JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let checked = reject_floats(value)?;
        // serde_json::Map is ordered by key unless `preserve_order` is
        // enabled, which this workspace never does.
        Ok(Self(serde_json::to_vec(&checked)?))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Number(n) => {
            if n.is_f64() {
                return Err(CanonicalizationError::FloatRejected(
                    n.as_f64().unwrap_or(f64::NAN),
                ));
            }
            Ok(Value::Number(n))
        }
        Value::Object(map) => {
            let mut checked = serde_json::Map::new();
            for (k, v) in map {
                checked.insert(k, reject_floats(v)?);
            }
            Ok(Value::Object(checked))
        }
        Value::Array(arr) => {
            let checked: Result<Vec<_>, _> = arr.into_iter().map(reject_floats).collect();
            Ok(Value::Array(checked?))
        }
        other => Ok(other),
    }
}
