//! # Selective-Disclosure Presentations
//!
//! A verifier asks for a subset of attributes, optionally a proof that the
//! credential is not revoked, and supplies a challenge. The claimer answers
//! with exactly the requested values plus engine proofs bound to that
//! challenge. Nothing else from the claim leaves the claimer.
//!
//! Attribute names address nested claim values with dotted paths, so
//! `contents.age` selects `{"contents": {"age": ...}}`.
//!
//! A combined presentation proves several credentials, possibly from
//! different issuers, in one proof. Credentials, issuer keys and per-issuer
//! requests are matched by position.

use std::collections::{BTreeMap, HashSet};

use acred_core::{ClaimerError, ContentDigest, MessageKind, Timestamp};
use acred_engine::{
    Challenge, CredentialEngine, DisclosureProof, DisclosureStatement, IssuerPublicKey,
    NonRevocationProof, Witness,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::claimer::{engine_error, revocation_error, Claimer};
use crate::codec::Validate;
use crate::credential::AttestedClaim;

// ── Requests ───────────────────────────────────────────────────────────

/// What a verifier wants from one credential.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeRequest {
    /// Attribute paths to disclose.
    pub requested_attributes: Vec<String>,
    /// Whether a non-revocation proof is required.
    #[serde(default)]
    pub require_non_revocation: bool,
    /// The witness must reflect an accumulator state published strictly
    /// after this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_after: Option<Timestamp>,
}

/// A verifier's request against a single credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationRequest {
    /// Requested attributes and freshness requirements.
    #[serde(flatten)]
    pub attributes: AttributeRequest,
    /// Verifier challenge; must be fresh per presentation.
    pub challenge: Challenge,
}

/// One issuer's share of a combined request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerRequest {
    /// Fingerprint of the issuer whose credential is expected here.
    pub issuer: ContentDigest,
    /// Requested attributes and freshness requirements.
    #[serde(flatten)]
    pub attributes: AttributeRequest,
}

/// A verifier's request spanning several credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedPresentationRequest {
    /// Verifier challenge shared by every part.
    pub challenge: Challenge,
    /// Per-credential requests, in credential order.
    pub requests: Vec<IssuerRequest>,
}

// ── Presentations ──────────────────────────────────────────────────────

/// Answer to a [`PresentationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    /// Fingerprint of the issuer vouching for the disclosed values.
    pub issuer: ContentDigest,
    /// Disclosed values by attribute path.
    pub disclosed: BTreeMap<String, Value>,
    /// Proof of possession of a credential carrying these values.
    pub proof: DisclosureProof,
    /// Present when the request required it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revocation: Option<NonRevocationProof>,
}

/// One credential's part of a [`CombinedPresentation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationPart {
    /// Issuer fingerprint.
    pub issuer: ContentDigest,
    /// Disclosed values by attribute path.
    pub disclosed: BTreeMap<String, Value>,
    /// Present when this part's request required it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revocation: Option<NonRevocationProof>,
}

/// Answer to a [`CombinedPresentationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedPresentation {
    /// Parts in request order.
    pub parts: Vec<PresentationPart>,
    /// A single proof covering every part.
    pub proof: DisclosureProof,
}

// ── Construction ───────────────────────────────────────────────────────

/// Collect the requested values, failing on the first unknown path.
fn disclose(
    credential: &AttestedClaim,
    request: &AttributeRequest,
) -> Result<BTreeMap<String, Value>, ClaimerError> {
    request
        .requested_attributes
        .iter()
        .map(|path| {
            credential
                .claim()
                .attribute(path)
                .map(|value| (path.clone(), value.clone()))
                .ok_or_else(|| ClaimerError::UnknownAttribute(path.clone()))
        })
        .collect()
}

/// The witness to prove with, if the request needs one.
fn required_witness<'c>(
    credential: &'c AttestedClaim,
    request: &AttributeRequest,
) -> Result<Option<&'c Witness>, ClaimerError> {
    if !request.require_non_revocation && request.updated_after.is_none() {
        return Ok(None);
    }
    let witness = credential.witness().ok_or(ClaimerError::MissingWitness)?;
    if let Some(required_after) = request.updated_after {
        if witness.published_at <= required_after {
            return Err(ClaimerError::StaleWitness {
                published_at: witness.published_at,
                required_after,
            });
        }
    }
    Ok(Some(witness))
}

fn prove_witness<E: CredentialEngine>(
    engine: &E,
    issuer_key: &IssuerPublicKey,
    witness: Option<&Witness>,
    challenge: &Challenge,
) -> Result<Option<NonRevocationProof>, ClaimerError> {
    witness
        .map(|w| {
            engine
                .prove_non_revocation(issuer_key, w, challenge)
                .map_err(revocation_error)
        })
        .transpose()
}

impl<E: CredentialEngine> Claimer<E> {
    /// Disclose the requested attributes of `credential`.
    pub fn build_presentation(
        &self,
        credential: &AttestedClaim,
        request: &PresentationRequest,
        issuer_key: &IssuerPublicKey,
    ) -> Result<Presentation, ClaimerError> {
        let issuer = issuer_key.fingerprint();
        if &issuer != credential.issuer() {
            return Err(ClaimerError::ArityMismatch(format!(
                "issuer key {issuer} did not issue this credential ({})",
                credential.issuer()
            )));
        }
        let disclosed = disclose(credential, &request.attributes)?;
        let witness = required_witness(credential, &request.attributes)?;

        let statement = DisclosureStatement {
            issuer: issuer_key,
            claim: credential.claim(),
            signature: credential.signature(),
            disclosed: &request.attributes.requested_attributes,
        };
        let proof = self
            .engine()
            .prove_disclosure(self.keys().secret(), &[statement], &request.challenge)
            .map_err(|e| engine_error(MessageKind::PresentationRequest, e))?;
        let non_revocation =
            prove_witness(self.engine(), issuer_key, witness, &request.challenge)?;

        tracing::debug!(
            issuer = %issuer,
            disclosed = disclosed.len(),
            non_revocation = non_revocation.is_some(),
            "presentation built"
        );
        Ok(Presentation {
            issuer,
            disclosed,
            proof,
            non_revocation,
        })
    }

    /// Disclose attributes from several credentials under one proof.
    ///
    /// `credentials`, `issuer_keys` and `request.requests` must have the same
    /// length and line up by position.
    pub fn build_combined_presentation(
        &self,
        credentials: &[AttestedClaim],
        request: &CombinedPresentationRequest,
        issuer_keys: &[IssuerPublicKey],
    ) -> Result<CombinedPresentation, ClaimerError> {
        if credentials.is_empty() {
            return Err(ClaimerError::ArityMismatch(
                "combined presentation needs at least one credential".into(),
            ));
        }
        if credentials.len() != issuer_keys.len() || credentials.len() != request.requests.len() {
            return Err(ClaimerError::ArityMismatch(format!(
                "{} credentials, {} issuer keys, {} requests",
                credentials.len(),
                issuer_keys.len(),
                request.requests.len()
            )));
        }

        let mut parts = Vec::with_capacity(credentials.len());
        let mut witnesses = Vec::with_capacity(credentials.len());
        for (i, ((credential, key), part)) in credentials
            .iter()
            .zip(issuer_keys)
            .zip(&request.requests)
            .enumerate()
        {
            let fingerprint = key.fingerprint();
            if credential.issuer() != &fingerprint || part.issuer != fingerprint {
                return Err(ClaimerError::ArityMismatch(format!(
                    "position {i}: credential issuer {}, key {fingerprint}, request issuer {}",
                    credential.issuer(),
                    part.issuer
                )));
            }
            parts.push(PresentationPart {
                issuer: fingerprint,
                disclosed: disclose(credential, &part.attributes)?,
                non_revocation: None,
            });
            witnesses.push(required_witness(credential, &part.attributes)?);
        }

        let statements: Vec<DisclosureStatement<'_>> = credentials
            .iter()
            .zip(issuer_keys)
            .zip(&request.requests)
            .map(|((credential, key), part)| DisclosureStatement {
                issuer: key,
                claim: credential.claim(),
                signature: credential.signature(),
                disclosed: &part.attributes.requested_attributes,
            })
            .collect();
        let proof = self
            .engine()
            .prove_disclosure(self.keys().secret(), &statements, &request.challenge)
            .map_err(|e| engine_error(MessageKind::CombinedPresentationRequest, e))?;

        for ((part, key), witness) in parts.iter_mut().zip(issuer_keys).zip(witnesses) {
            part.non_revocation = prove_witness(self.engine(), key, witness, &request.challenge)?;
        }

        tracing::debug!(parts = parts.len(), "combined presentation built");
        Ok(CombinedPresentation { parts, proof })
    }
}

// ── Validation ─────────────────────────────────────────────────────────

fn validate_challenge(challenge: &Challenge) -> Result<(), String> {
    if challenge.nonce.is_empty() {
        return Err("challenge nonce must be non-empty".into());
    }
    Ok(())
}

impl Validate for AttributeRequest {
    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for name in &self.requested_attributes {
            if name.is_empty() {
                return Err("requested attribute names must be non-empty".into());
            }
            if !seen.insert(name.as_str()) {
                return Err(format!("attribute \"{name}\" requested twice"));
            }
        }
        Ok(())
    }
}

impl Validate for PresentationRequest {
    fn validate(&self) -> Result<(), String> {
        validate_challenge(&self.challenge)?;
        self.attributes.validate()
    }
}

impl Validate for CombinedPresentationRequest {
    fn validate(&self) -> Result<(), String> {
        validate_challenge(&self.challenge)?;
        for (i, part) in self.requests.iter().enumerate() {
            part.attributes
                .validate()
                .map_err(|reason| format!("request {i}: {reason}"))?;
        }
        Ok(())
    }
}
