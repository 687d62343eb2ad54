//! # Credential Engine Trait
//!
//! The capability boundary between claimer orchestration and the
//! signature/proof mathematics. The claimer never interprets commitment,
//! signature, witness or proof bytes; it only routes them through an
//! implementation of [`CredentialEngine`].
//!
//! ## Security Invariant
//!
//! Every method is a pure function of its inputs plus fresh randomness.
//! No method mutates its arguments: [`CredentialEngine::apply_revocation_delta`]
//! returns a new witness and leaves the old one intact, which is what makes
//! witness maintenance transactional at the claimer level.

use acred_core::Claim;
use thiserror::Error;

use crate::types::{
    AttestationRequest, BlindingSecrets, Challenge, Commitment, DisclosureProof,
    DisclosureStatement, HandshakeMessage, IssueSignatureMessage, IssuerPublicKey, MasterSecret,
    NonRevocationProof, RevocationUpdate, SignatureMaterial, Witness,
};

/// Failure reported by a credential engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An input is structurally unusable (wrong length, wrong issuer, bad
    /// sequencing).
    #[error("malformed input: {0}")]
    Malformed(String),
    /// An input was well-formed but did not verify.
    #[error("verification failed: {0}")]
    VerificationFailed(String),
    /// Fresh randomness could not be obtained.
    #[error("entropy unavailable: {0}")]
    Entropy(String),
}

/// Cryptographic operations the claimer delegates.
///
/// Implementations must be `Send + Sync`; the claimer holds no lock around
/// engine calls.
pub trait CredentialEngine: Send + Sync {
    /// Commit to the claimer secret and the claim for one issuance session.
    fn commit(
        &self,
        secret: &MasterSecret,
        issuer: &IssuerPublicKey,
        handshake: &HandshakeMessage,
        claim: &Claim,
    ) -> Result<Commitment, EngineError>;

    /// Verify the issuer's blind signature against the session binding and
    /// unblind it.
    fn verify_issuance(
        &self,
        secret: &MasterSecret,
        issuer: &IssuerPublicKey,
        claim: &Claim,
        secrets: &BlindingSecrets,
        request: &AttestationRequest,
        signature: &IssueSignatureMessage,
    ) -> Result<SignatureMaterial, EngineError>;

    /// Prove possession of every credential in `statements` under a single
    /// challenge, revealing only the listed attributes.
    fn prove_disclosure(
        &self,
        secret: &MasterSecret,
        statements: &[DisclosureStatement<'_>],
        challenge: &Challenge,
    ) -> Result<DisclosureProof, EngineError>;

    /// Check that a witness is valid for the issuer's accumulator at the
    /// witness's own index and publication time.
    fn verify_witness(&self, issuer: &IssuerPublicKey, witness: &Witness) -> Result<(), EngineError>;

    /// Prove the witness is a member of the issuer's current accumulator.
    fn prove_non_revocation(
        &self,
        issuer: &IssuerPublicKey,
        witness: &Witness,
        challenge: &Challenge,
    ) -> Result<NonRevocationProof, EngineError>;

    /// Advance a witness by exactly one published update.
    fn apply_revocation_delta(
        &self,
        issuer: &IssuerPublicKey,
        witness: &Witness,
        update: &RevocationUpdate,
    ) -> Result<Witness, EngineError>;
}

impl<E: CredentialEngine + ?Sized> CredentialEngine for std::sync::Arc<E> {
    fn commit(
        &self,
        secret: &MasterSecret,
        issuer: &IssuerPublicKey,
        handshake: &HandshakeMessage,
        claim: &Claim,
    ) -> Result<Commitment, EngineError> {
        (**self).commit(secret, issuer, handshake, claim)
    }

    fn verify_issuance(
        &self,
        secret: &MasterSecret,
        issuer: &IssuerPublicKey,
        claim: &Claim,
        secrets: &BlindingSecrets,
        request: &AttestationRequest,
        signature: &IssueSignatureMessage,
    ) -> Result<SignatureMaterial, EngineError> {
        (**self).verify_issuance(secret, issuer, claim, secrets, request, signature)
    }

    fn prove_disclosure(
        &self,
        secret: &MasterSecret,
        statements: &[DisclosureStatement<'_>],
        challenge: &Challenge,
    ) -> Result<DisclosureProof, EngineError> {
        (**self).prove_disclosure(secret, statements, challenge)
    }

    fn verify_witness(&self, issuer: &IssuerPublicKey, witness: &Witness) -> Result<(), EngineError> {
        (**self).verify_witness(issuer, witness)
    }

    fn prove_non_revocation(
        &self,
        issuer: &IssuerPublicKey,
        witness: &Witness,
        challenge: &Challenge,
    ) -> Result<NonRevocationProof, EngineError> {
        (**self).prove_non_revocation(issuer, witness, challenge)
    }

    fn apply_revocation_delta(
        &self,
        issuer: &IssuerPublicKey,
        witness: &Witness,
        update: &RevocationUpdate,
    ) -> Result<Witness, EngineError> {
        (**self).apply_revocation_delta(issuer, witness, update)
    }
}
