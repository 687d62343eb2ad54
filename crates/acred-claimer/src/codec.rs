//! # Message Codec
//!
//! Structural decoding of protocol messages from JSON text. Every message
//! passes two gates before protocol logic sees it: it must deserialize, and
//! it must satisfy [`Validate`]. Either failure surfaces as
//! [`ClaimerError::MalformedMessage`] naming the message kind.
//!
//! Also home to [`require_inputs`], the per-operation input-count contract.

use acred_core::{CanonicalizationError, ClaimerError, MessageKind};
use acred_engine::{
    HandshakeMessage, IssueSignatureMessage, IssuerPublicKey, RevocationUpdate, Witness,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Structural checks applied after deserialization.
pub trait Validate {
    /// Describe the first structural defect, if any.
    fn validate(&self) -> Result<(), String>;
}

/// Decode and validate one message.
pub fn decode<T>(kind: MessageKind, text: &str) -> Result<T, ClaimerError>
where
    T: DeserializeOwned + Validate,
{
    let value: T =
        serde_json::from_str(text).map_err(|e| ClaimerError::malformed(kind, e.to_string()))?;
    value
        .validate()
        .map_err(|reason| ClaimerError::malformed(kind, reason))?;
    Ok(value)
}

/// Encode a message as compact JSON text.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, ClaimerError> {
    serde_json::to_string(value)
        .map_err(|e| ClaimerError::Canonicalization(CanonicalizationError::SerializationFailed(e)))
}

/// Check that every named input of `operation` was supplied.
///
/// `names` lists the required inputs in positional order; the first one
/// past the end of `inputs` is reported. Presence is positional, so an empty
/// string counts as supplied (an empty mnemonic password is legitimate).
pub fn require_inputs(
    operation: &'static str,
    inputs: &[&str],
    names: &[&'static str],
) -> Result<(), ClaimerError> {
    match names.get(inputs.len()) {
        Some(&missing) => Err(ClaimerError::MissingInput { operation, missing }),
        None => Ok(()),
    }
}

fn non_empty(field: &str, value: &[u8]) -> Result<(), String> {
    if value.is_empty() {
        Err(format!("{field} must be non-empty"))
    } else {
        Ok(())
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        for (i, item) in self.iter().enumerate() {
            item.validate().map_err(|reason| format!("item {i}: {reason}"))?;
        }
        Ok(())
    }
}

impl Validate for HandshakeMessage {
    fn validate(&self) -> Result<(), String> {
        if self.context.trim().is_empty() {
            return Err("context must be non-empty".into());
        }
        non_empty("nonce", &self.nonce)
    }
}

impl Validate for IssuerPublicKey {
    fn validate(&self) -> Result<(), String> {
        non_empty("material", &self.material)
    }
}

impl Validate for Witness {
    fn validate(&self) -> Result<(), String> {
        non_empty("witness material", &self.material)
    }
}

impl Validate for IssueSignatureMessage {
    fn validate(&self) -> Result<(), String> {
        non_empty("signature", &self.signature)?;
        match &self.witness {
            Some(w) => w.validate(),
            None => Ok(()),
        }
    }
}

impl Validate for RevocationUpdate {
    fn validate(&self) -> Result<(), String> {
        if self.accumulator_index == 0 {
            return Err("accumulator_index must be at least 1".into());
        }
        non_empty("signature", &self.signature)
    }
}
