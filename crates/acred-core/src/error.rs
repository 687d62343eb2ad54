//! # Error Hierarchy
//!
//! Structured error types for the claimer workspace, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! Every failure is reported synchronously to the immediate caller. The
//! [`ErrorClass`] of a [`ClaimerError`] tells the caller whether to fix its
//! input or whether issuer/verifier data failed cryptographic verification.

use thiserror::Error;

use crate::temporal::Timestamp;

/// The protocol message a decode or structural check was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Exported claimer key material.
    ClaimerKey,
    /// Attribute claim submitted for attestation.
    Claim,
    /// Issuer handshake starting an issuance session.
    Handshake,
    /// Issuer public key.
    IssuerPublicKey,
    /// List of issuer public keys for a combined presentation.
    IssuerPublicKeyList,
    /// Outgoing attestation request.
    AttestationRequest,
    /// Claimer-side issuance session state.
    Session,
    /// Issuer blind signature response.
    IssueSignature,
    /// Attested credential.
    Credential,
    /// List of attested credentials.
    CredentialList,
    /// Published revocation update.
    RevocationUpdate,
    /// List of published revocation updates.
    RevocationUpdateList,
    /// Verifier presentation request.
    PresentationRequest,
    /// Verifier combined presentation request.
    CombinedPresentationRequest,
}

impl MessageKind {
    /// Human-readable message name used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClaimerKey => "claimer key",
            Self::Claim => "claim",
            Self::Handshake => "handshake",
            Self::IssuerPublicKey => "issuer public key",
            Self::IssuerPublicKeyList => "issuer public key list",
            Self::AttestationRequest => "attestation request",
            Self::Session => "issuance session",
            Self::IssueSignature => "issue signature",
            Self::Credential => "credential",
            Self::CredentialList => "credential list",
            Self::RevocationUpdate => "revocation update",
            Self::RevocationUpdateList => "revocation update list",
            Self::PresentationRequest => "presentation request",
            Self::CombinedPresentationRequest => "combined presentation request",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`ClaimerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The caller supplied missing, malformed, or inconsistent input.
    Input,
    /// Issuer or verifier data did not verify cryptographically.
    Verification,
    /// The runtime environment could not serve the request (entropy).
    Environment,
}

/// Top-level error type for every claimer operation.
#[derive(Error, Debug)]
pub enum ClaimerError {
    /// The caller supplied fewer inputs than the operation requires.
    #[error("missing input for {operation}: {missing} is required")]
    MissingInput {
        /// The operation that was invoked.
        operation: &'static str,
        /// The first required input that was absent.
        missing: &'static str,
    },

    /// A protocol message failed to decode or is structurally invalid.
    #[error("malformed {kind} message: {reason}")]
    MalformedMessage {
        /// Which message failed.
        kind: MessageKind,
        /// What was wrong with it.
        reason: String,
    },

    /// The cryptographically secure random source is unavailable.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// The mnemonic failed word-list or checksum validation.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// The claim is empty or not representable as attributes.
    #[error("invalid claim: {0}")]
    InvalidClaim(#[source] ValidationError),

    /// The issuer's signature does not verify against the session binding.
    #[error("issuer signature does not match the session binding: {0}")]
    SignatureMismatch(String),

    /// The issuance session already produced a credential.
    #[error("issuance session has already produced a credential")]
    SessionAlreadyConsumed,

    /// A revocation update did not validate; the witness is unchanged.
    #[error("revocation update rejected: {0}")]
    RevocationValidation(String),

    /// A requested attribute is not part of the credential's claim.
    #[error("attribute \"{0}\" is not part of the credential's claim")]
    UnknownAttribute(String),

    /// Credentials, issuer keys and requests are not aligned.
    #[error("arity mismatch: {0}")]
    ArityMismatch(String),

    /// The verifier requires a non-revocation proof but the credential
    /// carries no witness.
    #[error("a non-revocation proof was requested but the credential has no witness")]
    MissingWitness,

    /// The witness is older than the verifier accepts.
    #[error("witness reflects the accumulator published at {published_at}, request requires one published after {required_after}")]
    StaleWitness {
        /// Publication time of the witness's accumulator state.
        published_at: Timestamp,
        /// The verifier's freshness bound.
        required_after: Timestamp,
    },

    /// A value could not be canonicalized for binding or digest computation.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Configuration could not be loaded or contains invalid values.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ClaimerError {
    /// Shorthand for a [`ClaimerError::MalformedMessage`].
    pub fn malformed(kind: MessageKind, reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            kind,
            reason: reason.into(),
        }
    }

    /// Classify the error for the caller.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::SignatureMismatch(_) | Self::RevocationValidation(_) => ErrorClass::Verification,
            Self::Entropy(_) => ErrorClass::Environment,
            Self::MissingInput { .. }
            | Self::MalformedMessage { .. }
            | Self::InvalidMnemonic(_)
            | Self::InvalidClaim(_)
            | Self::SessionAlreadyConsumed
            | Self::UnknownAttribute(_)
            | Self::ArityMismatch(_)
            | Self::MissingWitness
            | Self::StaleWitness { .. }
            | Self::Canonicalization(_)
            | Self::Config(_) => ErrorClass::Input,
        }
    }
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations; use a string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for domain primitives.
///
/// Each primitive enforces its constraints at construction time and carries
/// the offending input so that callers can diagnose the problem directly.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Timestamp string is not valid UTC ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An attribute name is empty or contains the path separator.
    #[error("invalid attribute name \"{0}\" (names must be non-empty and must not contain '.')")]
    InvalidAttributeName(String),

    /// The claim is not a JSON object.
    #[error("expected a JSON object, received {0}")]
    NotAnObject(&'static str),

    /// The claim has no attributes.
    #[error("claim has no attributes")]
    EmptyClaim,

    /// A claim value cannot be canonicalized.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_names_operation_and_input() {
        let err = ClaimerError::MissingInput {
            operation: "key_from_mnemonic",
            missing: "mnemonic",
        };
        let msg = format!("{err}");
        assert!(msg.contains("key_from_mnemonic"));
        assert!(msg.contains("mnemonic is required"));
    }

    #[test]
    fn malformed_message_display_includes_kind() {
        let err = ClaimerError::malformed(MessageKind::Handshake, "nonce must be non-empty");
        let msg = format!("{err}");
        assert!(msg.contains("malformed handshake message"));
        assert!(msg.contains("nonce"));
    }

    #[test]
    fn verification_failures_are_classified() {
        assert_eq!(
            ClaimerError::SignatureMismatch("x".into()).class(),
            ErrorClass::Verification
        );
        assert_eq!(
            ClaimerError::RevocationValidation("x".into()).class(),
            ErrorClass::Verification
        );
    }

    #[test]
    fn input_failures_are_classified() {
        let inputs = vec![
            ClaimerError::SessionAlreadyConsumed,
            ClaimerError::UnknownAttribute("age".into()),
            ClaimerError::ArityMismatch("2 credentials, 1 key".into()),
            ClaimerError::InvalidMnemonic("bad checksum".into()),
            ClaimerError::InvalidClaim(ValidationError::EmptyClaim),
            ClaimerError::MissingWitness,
        ];
        for err in inputs {
            assert_eq!(err.class(), ErrorClass::Input, "{err}");
        }
    }

    #[test]
    fn entropy_is_environment() {
        assert_eq!(
            ClaimerError::Entropy("getrandom failed".into()).class(),
            ErrorClass::Environment
        );
    }

    #[test]
    fn canonicalization_converts_from() {
        let err: ClaimerError = CanonicalizationError::FloatRejected(1.5).into();
        assert!(matches!(err, ClaimerError::Canonicalization(_)));
        assert!(format!("{err}").contains("1.5"));
    }

    #[test]
    fn invalid_claim_wraps_validation_error() {
        let err = ClaimerError::InvalidClaim(ValidationError::NotAnObject("array"));
        assert!(format!("{err}").contains("expected a JSON object, received array"));
    }

    #[test]
    fn message_kind_display() {
        assert_eq!(MessageKind::IssueSignature.to_string(), "issue signature");
        assert_eq!(
            MessageKind::CombinedPresentationRequest.to_string(),
            "combined presentation request"
        );
    }
}
