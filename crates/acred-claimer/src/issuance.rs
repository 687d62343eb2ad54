//! # Issuance Session
//!
//! Drives the claimer side of blind issuance:
//!
//! ```text
//! (no session) ──request_attestation──▶ SessionOpen ──build_credential──▶ CredentialAssembled
//!                                           │  ▲
//!                                           └──┘ signature rejected
//! ```
//!
//! The session captures the issuer key, handshake, claim and blinding
//! secrets at request time. [`Claimer::build_credential`] takes none of
//! them again, so a credential can only be assembled for the claim and
//! issuer the session was opened with.
//!
//! ## Security Invariant
//!
//! A session yields at most one credential. Once assembled, the blinding
//! secrets are dropped (and zeroized) and any further attempt fails with
//! [`ClaimerError::SessionAlreadyConsumed`]. This holds across
//! serialization: a serialized assembled session carries no secrets.

use acred_core::{Claim, ClaimerError, MessageKind};
use acred_engine::{
    AttestationRequest, BlindingSecrets, CredentialEngine, HandshakeMessage,
    IssueSignatureMessage, IssuerPublicKey,
};
use serde::{Deserialize, Serialize};

use crate::claimer::{engine_error, Claimer};
use crate::codec::Validate;
use crate::credential::AttestedClaim;

/// Where a session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Request sent, waiting for the issuer's signature.
    SessionOpen,
    /// A credential has been assembled; the session is spent.
    CredentialAssembled,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
enum SessionState {
    Open { secrets: BlindingSecrets },
    Assembled,
}

/// Claimer-side state of one issuance exchange.
#[derive(Debug, Serialize, Deserialize)]
pub struct IssuanceSession {
    issuer_key: IssuerPublicKey,
    handshake: HandshakeMessage,
    request: AttestationRequest,
    state: SessionState,
}

impl IssuanceSession {
    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Open { .. } => SessionPhase::SessionOpen,
            SessionState::Assembled => SessionPhase::CredentialAssembled,
        }
    }

    /// The issuer this session was opened with.
    pub fn issuer_key(&self) -> &IssuerPublicKey {
        &self.issuer_key
    }

    /// The claim being attested.
    pub fn claim(&self) -> &Claim {
        &self.request.claim
    }

    /// The request that was handed to the caller for transmission.
    pub fn request(&self) -> &AttestationRequest {
        &self.request
    }

    /// Assemble the credential and consume the session.
    ///
    /// Unlike [`Claimer::build_credential`], a rejected signature also
    /// discards the session; use the borrowing form to retry.
    pub fn finish<E: CredentialEngine>(
        mut self,
        claimer: &Claimer<E>,
        signature: &IssueSignatureMessage,
    ) -> Result<AttestedClaim, ClaimerError> {
        claimer.build_credential(&mut self, signature)
    }
}

impl<E: CredentialEngine> Claimer<E> {
    /// Open an issuance session for `claim` with the issuer behind
    /// `issuer_key`.
    ///
    /// Returns the session to keep and the request to send. Nothing is
    /// transmitted here.
    pub fn request_attestation(
        &self,
        issuer_key: &IssuerPublicKey,
        handshake: &HandshakeMessage,
        claim: Claim,
    ) -> Result<(IssuanceSession, AttestationRequest), ClaimerError> {
        handshake
            .validate()
            .map_err(|reason| ClaimerError::malformed(MessageKind::Handshake, reason))?;
        issuer_key
            .validate()
            .map_err(|reason| ClaimerError::malformed(MessageKind::IssuerPublicKey, reason))?;

        let commitment = self
            .engine()
            .commit(self.keys().secret(), issuer_key, handshake, &claim)
            .map_err(|e| engine_error(MessageKind::Handshake, e))?;

        tracing::debug!(
            issuer = %issuer_key.fingerprint(),
            context = %handshake.context,
            attributes = claim.len(),
            "issuance session opened"
        );

        let request = commitment.request;
        let session = IssuanceSession {
            issuer_key: issuer_key.clone(),
            handshake: handshake.clone(),
            request: request.clone(),
            state: SessionState::Open {
                secrets: commitment.secrets,
            },
        };
        Ok((session, request))
    }

    /// Verify the issuer's signature and assemble the credential.
    ///
    /// On a verification failure the session stays open so that a corrected
    /// signature message can still be applied.
    pub fn build_credential(
        &self,
        session: &mut IssuanceSession,
        signature: &IssueSignatureMessage,
    ) -> Result<AttestedClaim, ClaimerError> {
        let secrets = match &session.state {
            SessionState::Open { secrets } => secrets,
            SessionState::Assembled => return Err(ClaimerError::SessionAlreadyConsumed),
        };
        signature
            .validate()
            .map_err(|reason| ClaimerError::malformed(MessageKind::IssueSignature, reason))?;

        let material = self
            .engine()
            .verify_issuance(
                self.keys().secret(),
                &session.issuer_key,
                &session.request.claim,
                secrets,
                &session.request,
                signature,
            )
            .map_err(|e| engine_error(MessageKind::IssueSignature, e))?;

        session.state = SessionState::Assembled;

        let issuer = session.issuer_key.fingerprint();
        let credential = AttestedClaim::new(
            session.request.claim.clone(),
            issuer,
            material,
            signature.witness.clone(),
        );
        tracing::info!(
            issuer = %issuer,
            revocable = credential.witness().is_some(),
            "credential assembled"
        );
        Ok(credential)
    }
}

impl Validate for IssuanceSession {
    fn validate(&self) -> Result<(), String> {
        self.issuer_key.validate()?;
        self.handshake.validate()?;
        if self.request.issuer != self.issuer_key.fingerprint() {
            return Err("request is not addressed to the session's issuer key".into());
        }
        if self.request.nonce != self.handshake.nonce {
            return Err("request nonce does not match the handshake".into());
        }
        if let SessionState::Open { secrets } = &self.state {
            if secrets.expose().is_empty() {
                return Err("open session has no blinding secrets".into());
            }
        }
        Ok(())
    }
}
