//! # Mock Credential Engine
//!
//! A deterministic, transparent stand-in for a real anonymous credential
//! scheme, for development and testing. Every "signature", "witness" and
//! "proof" is a domain-separated SHA-256 digest of its inputs.
//!
//! ## How It Works
//!
//! ```text
//! commitment = H("commit",  secret || blinding || nonce || pk || claim)
//! signature  = H("sign",    pk || claim || commitment)
//! unblinded  = H("unblind", signature || blinding)
//! handle     = H("handle",  commitment)
//! witness    = H("witness", pk || handle || accumulator_index || published_at)
//! update sig = H("update",  pk || index || revoked... || published_at)
//! ```
//!
//! Verification recomputes and compares in constant time.
//!
//! ## Security Warning
//!
//! **NOT PRIVATE, NOT UNFORGEABLE.** Anyone holding the public key can
//! produce a valid signature, and proofs reveal nothing a verifier could
//! check without the master secret. [`MockIssuer`] is the matching issuer
//! so that the whole lifecycle can run in a single process.

use std::collections::BTreeSet;

use acred_core::{CanonicalBytes, Claim, ContentDigest, Sha256Accumulator, Timestamp};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::traits::{CredentialEngine, EngineError};
use crate::types::{
    AttestationRequest, BlindingSecrets, Challenge, Commitment, DisclosureProof,
    DisclosureStatement, HandshakeMessage, IssueSignatureMessage, IssuerPublicKey, MasterSecret,
    NonRevocationProof, RevocationUpdate, SignatureMaterial, Witness,
};

const TAG_COMMIT: &str = "acred/mock/commit";
const TAG_SIGN: &str = "acred/mock/sign";
const TAG_UNBLIND: &str = "acred/mock/unblind";
const TAG_HANDLE: &str = "acred/mock/handle";
const TAG_WITNESS: &str = "acred/mock/witness";
const TAG_UPDATE: &str = "acred/mock/update";
const TAG_DISCLOSE: &str = "acred/mock/disclose";
const TAG_NON_REVOCATION: &str = "acred/mock/non-revocation";
const TAG_ISSUER_SEED: &str = "acred/mock/issuer-seed";

/// Length of every mock digest payload.
pub const DIGEST_LEN: usize = 32;

// ── Constructions ──────────────────────────────────────────────────────

fn random_bytes(len: usize) -> Result<Vec<u8>, EngineError> {
    let mut buf = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| EngineError::Entropy(e.to_string()))?;
    Ok(buf)
}

fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

fn commitment_bytes(
    secret: &MasterSecret,
    blinding: &[u8],
    nonce: &[u8],
    issuer: &IssuerPublicKey,
    claim: &Claim,
) -> Vec<u8> {
    let mut acc = Sha256Accumulator::new(TAG_COMMIT);
    acc.update(secret.expose())
        .update(blinding)
        .update(nonce)
        .update(&issuer.material)
        .update_canonical(claim.canonical_bytes());
    acc.finalize().as_bytes().to_vec()
}

fn signature_bytes(issuer: &IssuerPublicKey, claim: &Claim, commitment: &[u8]) -> Vec<u8> {
    let mut acc = Sha256Accumulator::new(TAG_SIGN);
    acc.update(&issuer.material)
        .update_canonical(claim.canonical_bytes())
        .update(commitment);
    acc.finalize().as_bytes().to_vec()
}

fn revocation_handle(commitment: &[u8]) -> ContentDigest {
    let mut acc = Sha256Accumulator::new(TAG_HANDLE);
    acc.update(commitment);
    acc.finalize()
}

fn witness_material(
    issuer: &IssuerPublicKey,
    handle: &ContentDigest,
    index: u64,
    published_at: &Timestamp,
) -> Vec<u8> {
    let mut acc = Sha256Accumulator::new(TAG_WITNESS);
    acc.update(&issuer.material)
        .update(handle.as_bytes())
        .update(&index.to_le_bytes())
        .update(published_at.to_iso8601().as_bytes());
    acc.finalize().as_bytes().to_vec()
}

fn witness_matches(issuer: &IssuerPublicKey, witness: &Witness) -> bool {
    let expected = witness_material(
        issuer,
        &witness.handle,
        witness.accumulator_index,
        &witness.published_at,
    );
    ct_eq(&expected, &witness.material)
}

fn update_signature(
    issuer: &IssuerPublicKey,
    index: u64,
    revoked: &[ContentDigest],
    published_at: &Timestamp,
) -> Vec<u8> {
    let mut acc = Sha256Accumulator::new(TAG_UPDATE);
    acc.update(&issuer.material).update(&index.to_le_bytes());
    acc.update(&(revoked.len() as u64).to_le_bytes());
    for handle in revoked {
        acc.update(handle.as_bytes());
    }
    acc.update(published_at.to_iso8601().as_bytes());
    acc.finalize().as_bytes().to_vec()
}

// ── Engine ─────────────────────────────────────────────────────────────

/// Deterministic SHA-256 credential engine. See the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockEngine;

impl CredentialEngine for MockEngine {
    fn commit(
        &self,
        secret: &MasterSecret,
        issuer: &IssuerPublicKey,
        handshake: &HandshakeMessage,
        claim: &Claim,
    ) -> Result<Commitment, EngineError> {
        if handshake.nonce.is_empty() {
            return Err(EngineError::Malformed("handshake nonce is empty".into()));
        }
        let blinding = random_bytes(DIGEST_LEN)?;
        let commitment = commitment_bytes(secret, &blinding, &handshake.nonce, issuer, claim);
        Ok(Commitment {
            secrets: BlindingSecrets::from_bytes(blinding),
            request: AttestationRequest {
                context: handshake.context.clone(),
                issuer: issuer.fingerprint(),
                claim: claim.clone(),
                commitment,
                nonce: handshake.nonce.clone(),
            },
        })
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
        if signature.signature.len() != DIGEST_LEN {
            return Err(EngineError::Malformed(format!(
                "expected a {DIGEST_LEN}-byte signature, got {}",
                signature.signature.len()
            )));
        }
        if request.issuer != issuer.fingerprint() {
            return Err(EngineError::VerificationFailed(
                "issuer key does not match the session".into(),
            ));
        }
        let expected =
            commitment_bytes(secret, secrets.expose(), &request.nonce, issuer, claim);
        if !ct_eq(&expected, &request.commitment) {
            return Err(EngineError::VerificationFailed(
                "commitment does not open to this claimer and claim".into(),
            ));
        }
        let expected_sig = signature_bytes(issuer, claim, &request.commitment);
        if !ct_eq(&expected_sig, &signature.signature) {
            return Err(EngineError::VerificationFailed(
                "blind signature does not verify".into(),
            ));
        }
        if let Some(witness) = &signature.witness {
            let handle = revocation_handle(&request.commitment);
            if witness.handle != handle || !witness_matches(issuer, witness) {
                return Err(EngineError::VerificationFailed(
                    "witness does not belong to this credential".into(),
                ));
            }
        }

        let mut acc = Sha256Accumulator::new(TAG_UNBLIND);
        acc.update(&signature.signature).update(secrets.expose());
        Ok(SignatureMaterial {
            bytes: acc.finalize().as_bytes().to_vec(),
        })
    }

    fn prove_disclosure(
        &self,
        secret: &MasterSecret,
        statements: &[DisclosureStatement<'_>],
        challenge: &Challenge,
    ) -> Result<DisclosureProof, EngineError> {
        if statements.is_empty() {
            return Err(EngineError::Malformed("no credentials to prove".into()));
        }
        let mut acc = Sha256Accumulator::new(TAG_DISCLOSE);
        acc.update(challenge.context.as_bytes())
            .update(&challenge.nonce)
            .update(secret.expose());
        for statement in statements {
            acc.update(&statement.issuer.material)
                .update(&statement.signature.bytes)
                .update(&(statement.disclosed.len() as u64).to_le_bytes());
            for path in statement.disclosed {
                let value = statement.claim.attribute(path).ok_or_else(|| {
                    EngineError::Malformed(format!("attribute \"{path}\" is not in the claim"))
                })?;
                let canonical = CanonicalBytes::new(value)
                    .map_err(|e| EngineError::Malformed(e.to_string()))?;
                acc.update(path.as_bytes()).update_canonical(&canonical);
            }
        }
        Ok(DisclosureProof {
            bytes: acc.finalize().as_bytes().to_vec(),
        })
    }

    fn verify_witness(&self, issuer: &IssuerPublicKey, witness: &Witness) -> Result<(), EngineError> {
        if witness_matches(issuer, witness) {
            Ok(())
        } else {
            Err(EngineError::VerificationFailed(
                "witness does not verify against the issuer key".into(),
            ))
        }
    }

    fn prove_non_revocation(
        &self,
        issuer: &IssuerPublicKey,
        witness: &Witness,
        challenge: &Challenge,
    ) -> Result<NonRevocationProof, EngineError> {
        self.verify_witness(issuer, witness)?;
        let mut acc = Sha256Accumulator::new(TAG_NON_REVOCATION);
        acc.update(&issuer.material)
            .update(&witness.material)
            .update(challenge.context.as_bytes())
            .update(&challenge.nonce);
        Ok(NonRevocationProof {
            issuer: issuer.fingerprint(),
            accumulator_index: witness.accumulator_index,
            published_at: witness.published_at,
            bytes: acc.finalize().as_bytes().to_vec(),
        })
    }

    fn apply_revocation_delta(
        &self,
        issuer: &IssuerPublicKey,
        witness: &Witness,
        update: &RevocationUpdate,
    ) -> Result<Witness, EngineError> {
        if update.issuer != issuer.fingerprint() {
            return Err(EngineError::Malformed(
                "update was published by a different issuer".into(),
            ));
        }
        if witness.accumulator_index.checked_add(1) != Some(update.accumulator_index) {
            return Err(EngineError::Malformed(format!(
                "update index {} does not follow witness index {}",
                update.accumulator_index, witness.accumulator_index
            )));
        }
        let expected = update_signature(
            issuer,
            update.accumulator_index,
            &update.revoked,
            &update.published_at,
        );
        if !ct_eq(&expected, &update.signature) {
            return Err(EngineError::VerificationFailed(
                "update signature does not verify".into(),
            ));
        }
        if update.revoked.contains(&witness.handle) {
            return Err(EngineError::VerificationFailed(
                "credential has been revoked".into(),
            ));
        }
        Ok(Witness {
            handle: witness.handle,
            accumulator_index: update.accumulator_index,
            published_at: update.published_at,
            material: witness_material(
                issuer,
                &witness.handle,
                update.accumulator_index,
                &update.published_at,
            ),
        })
    }
}

// ── Issuer ─────────────────────────────────────────────────────────────

/// Issuer counterpart of [`MockEngine`]: key generation, handshakes, blind
/// signing and a revocation accumulator with published updates.
///
/// The state is serializable so a development issuer can persist between
/// process invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockIssuer {
    public_key: IssuerPublicKey,
    context: String,
    supports_revocation: bool,
    accumulator_index: u64,
    published_at: Timestamp,
    #[serde(default)]
    revoked: BTreeSet<ContentDigest>,
    #[serde(default)]
    updates: Vec<RevocationUpdate>,
}

impl MockIssuer {
    /// Create an issuer with a fresh random key.
    pub fn new(context: impl Into<String>) -> Result<Self, EngineError> {
        let seed = random_bytes(DIGEST_LEN)?;
        Ok(Self::with_material(context.into(), seed))
    }

    /// Create an issuer whose key is derived from a fixed seed.
    pub fn from_seed(context: impl Into<String>, seed: &[u8]) -> Self {
        let mut acc = Sha256Accumulator::new(TAG_ISSUER_SEED);
        acc.update(seed);
        Self::with_material(context.into(), acc.finalize().as_bytes().to_vec())
    }

    fn with_material(context: String, material: Vec<u8>) -> Self {
        Self {
            public_key: IssuerPublicKey { material },
            context,
            supports_revocation: true,
            accumulator_index: 0,
            published_at: Timestamp::now(),
            revoked: BTreeSet::new(),
            updates: Vec::new(),
        }
    }

    /// Issue credentials without revocation witnesses.
    pub fn without_revocation(mut self) -> Self {
        self.supports_revocation = false;
        self
    }

    /// The issuer's public key.
    pub fn public_key(&self) -> &IssuerPublicKey {
        &self.public_key
    }

    /// Current accumulator index.
    pub fn accumulator_index(&self) -> u64 {
        self.accumulator_index
    }

    /// Publication time of the current accumulator state.
    pub fn published_at(&self) -> Timestamp {
        self.published_at
    }

    /// Every update published so far, oldest first.
    pub fn updates(&self) -> &[RevocationUpdate] {
        &self.updates
    }

    /// Whether a handle has been revoked.
    pub fn is_revoked(&self, handle: &ContentDigest) -> bool {
        self.revoked.contains(handle)
    }

    /// Open an issuance session.
    pub fn start_session(&self) -> Result<HandshakeMessage, EngineError> {
        Ok(HandshakeMessage {
            context: self.context.clone(),
            nonce: random_bytes(DIGEST_LEN)?,
        })
    }

    /// The revocation handle a request will be issued under.
    pub fn handle_for(request: &AttestationRequest) -> ContentDigest {
        revocation_handle(&request.commitment)
    }

    /// Blind-sign an attestation request.
    pub fn issue(&self, request: &AttestationRequest) -> Result<IssueSignatureMessage, EngineError> {
        if request.issuer != self.public_key.fingerprint() {
            return Err(EngineError::Malformed(
                "request is addressed to a different issuer".into(),
            ));
        }
        if request.context != self.context {
            return Err(EngineError::Malformed(format!(
                "request context \"{}\" does not match issuer context \"{}\"",
                request.context, self.context
            )));
        }
        if request.commitment.len() != DIGEST_LEN {
            return Err(EngineError::Malformed(format!(
                "expected a {DIGEST_LEN}-byte commitment, got {}",
                request.commitment.len()
            )));
        }
        let witness = self.supports_revocation.then(|| {
            let handle = revocation_handle(&request.commitment);
            Witness {
                handle,
                accumulator_index: self.accumulator_index,
                published_at: self.published_at,
                material: witness_material(
                    &self.public_key,
                    &handle,
                    self.accumulator_index,
                    &self.published_at,
                ),
            }
        });
        tracing::debug!(
            issuer = %self.public_key.fingerprint(),
            accumulator_index = self.accumulator_index,
            "mock issuer signed attestation request"
        );
        Ok(IssueSignatureMessage {
            signature: signature_bytes(&self.public_key, &request.claim, &request.commitment),
            witness,
        })
    }

    /// Revoke handles and publish the resulting update, timestamped now.
    pub fn revoke(&mut self, handles: &[ContentDigest]) -> Result<RevocationUpdate, EngineError> {
        self.revoke_at(handles, Timestamp::now())
    }

    /// Revoke handles and publish the resulting update with an explicit
    /// publication time.
    pub fn revoke_at(
        &mut self,
        handles: &[ContentDigest],
        published_at: Timestamp,
    ) -> Result<RevocationUpdate, EngineError> {
        let next = self
            .accumulator_index
            .checked_add(1)
            .ok_or_else(|| EngineError::Malformed("accumulator index exhausted".into()))?;
        let revoked: Vec<ContentDigest> = handles.to_vec();
        let update = RevocationUpdate {
            issuer: self.public_key.fingerprint(),
            accumulator_index: next,
            signature: update_signature(&self.public_key, next, &revoked, &published_at),
            revoked,
            published_at,
        };
        self.revoked.extend(handles.iter().copied());
        self.accumulator_index = next;
        self.published_at = published_at;
        self.updates.push(update.clone());
        tracing::debug!(
            accumulator_index = next,
            revoked = handles.len(),
            "mock issuer published revocation update"
        );
        Ok(update)
    }
}
