//! The [`Claimer`]: key material paired with a credential engine.
//!
//! Issuance methods live in [`crate::issuance`], presentation methods in
//! [`crate::presentation`].

use acred_core::{ClaimerError, MessageKind};
use acred_engine::{CredentialEngine, EngineError};

use crate::keys::KeyMaterial;

/// A claimer identity able to request, assemble and present credentials.
pub struct Claimer<E> {
    keys: KeyMaterial,
    engine: E,
}

impl<E: CredentialEngine> Claimer<E> {
    /// Pair key material with an engine.
    pub fn new(keys: KeyMaterial, engine: E) -> Self {
        Self { keys, engine }
    }

    /// The claimer's key material.
    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    /// The engine cryptographic work is delegated to.
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E> std::fmt::Debug for Claimer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Claimer")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// Map an engine failure on a message of `kind`. Verification failures
/// become [`ClaimerError::SignatureMismatch`].
pub(crate) fn engine_error(kind: MessageKind, err: EngineError) -> ClaimerError {
    match err {
        EngineError::Malformed(reason) => ClaimerError::malformed(kind, reason),
        EngineError::VerificationFailed(reason) => ClaimerError::SignatureMismatch(reason),
        EngineError::Entropy(reason) => ClaimerError::Entropy(reason),
    }
}

/// Map an engine failure during witness maintenance. Everything except an
/// entropy failure rejects the update.
pub(crate) fn revocation_error(err: EngineError) -> ClaimerError {
    match err {
        EngineError::Entropy(reason) => ClaimerError::Entropy(reason),
        other => ClaimerError::RevocationValidation(other.to_string()),
    }
}
