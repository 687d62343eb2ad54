//! # Attested Credentials and Witness Maintenance
//!
//! An [`AttestedClaim`] is the credential a claimer holds after issuance:
//! the claim, the issuer's unblinded signature, and an optional revocation
//! witness. The claim and signature never change. The witness advances as
//! the issuer publishes [`RevocationUpdate`]s.
//!
//! ## Update ordering
//!
//! Each update carries the accumulator index it produces. Against a witness
//! at index `w`:
//!
//! | update index | outcome |
//! |---|---|
//! | `<= w` | stale, skipped |
//! | `w + 1` | applied |
//! | `> w + 1` | rejected ("update too new") |
//!
//! ## Freshness
//!
//! A witness carries the publication time of the accumulator state it is
//! valid for. That time is bound into the witness material, so it only
//! moves when a verified update is applied.
//!
//! ## Security Invariant
//!
//! Updates are transactional. [`AttestedClaim::update_all`] folds the batch
//! over a copy of the witness and commits only if every step succeeds, so a
//! failure leaves the credential exactly as it was.

use acred_core::{Claim, ClaimerError, ContentDigest, Timestamp, UpdateOrdering};
use acred_engine::{CredentialEngine, IssuerPublicKey, RevocationUpdate, SignatureMaterial, Witness};
use serde::{Deserialize, Serialize};

use crate::claimer::revocation_error;
use crate::codec::Validate;

/// An issued credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedClaim {
    claim: Claim,
    issuer: ContentDigest,
    signature: SignatureMaterial,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    witness: Option<Witness>,
    #[serde(default)]
    update_counter: u64,
}

/// What an update call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateSummary {
    /// Updates that advanced the witness.
    pub applied: usize,
    /// Updates skipped because the witness already covered them.
    pub stale: usize,
    /// Witness index after the call.
    pub accumulator_index: u64,
}

impl AttestedClaim {
    pub(crate) fn new(
        claim: Claim,
        issuer: ContentDigest,
        signature: SignatureMaterial,
        witness: Option<Witness>,
    ) -> Self {
        Self {
            claim,
            issuer,
            signature,
            witness,
            update_counter: 0,
        }
    }

    /// The attested attributes.
    pub fn claim(&self) -> &Claim {
        &self.claim
    }

    /// Fingerprint of the issuing key.
    pub fn issuer(&self) -> &ContentDigest {
        &self.issuer
    }

    /// The unblinded issuer signature.
    pub fn signature(&self) -> &SignatureMaterial {
        &self.signature
    }

    /// The revocation witness, if the issuer supports revocation.
    pub fn witness(&self) -> Option<&Witness> {
        self.witness.as_ref()
    }

    /// Number of updates applied since issuance.
    pub fn update_counter(&self) -> u64 {
        self.update_counter
    }

    /// Publication time of the accumulator state the witness is valid for.
    pub fn witness_published_at(&self) -> Option<Timestamp> {
        self.witness.as_ref().map(|w| w.published_at)
    }

    /// Attach a witness delivered separately from the issuer's signature.
    ///
    /// Fails if the key is not this credential's issuer, a witness is
    /// already present, or the engine does not accept the witness.
    pub fn attach_witness<E: CredentialEngine>(
        &mut self,
        engine: &E,
        issuer_key: &IssuerPublicKey,
        witness: Witness,
    ) -> Result<(), ClaimerError> {
        self.check_issuer(issuer_key)?;
        if self.witness.is_some() {
            return Err(ClaimerError::RevocationValidation(
                "credential already carries a witness".into(),
            ));
        }
        engine
            .verify_witness(issuer_key, &witness)
            .map_err(revocation_error)?;
        tracing::debug!(
            issuer = %self.issuer,
            accumulator_index = witness.accumulator_index,
            "revocation witness attached"
        );
        self.witness = Some(witness);
        Ok(())
    }

    /// Apply one revocation update.
    pub fn update<E: CredentialEngine>(
        &mut self,
        engine: &E,
        issuer_key: &IssuerPublicKey,
        update: &RevocationUpdate,
    ) -> Result<UpdateSummary, ClaimerError> {
        self.update_all(
            engine,
            issuer_key,
            std::slice::from_ref(update),
            UpdateOrdering::Strict,
        )
    }

    /// Apply a batch of revocation updates, all or nothing.
    ///
    /// Under [`UpdateOrdering::Reorder`] the batch is sorted by accumulator
    /// index first. Under [`UpdateOrdering::Strict`] a batch that is not
    /// already ascending is rejected.
    pub fn update_all<E: CredentialEngine>(
        &mut self,
        engine: &E,
        issuer_key: &IssuerPublicKey,
        updates: &[RevocationUpdate],
        ordering: UpdateOrdering,
    ) -> Result<UpdateSummary, ClaimerError> {
        self.check_issuer(issuer_key)?;
        let start = self.witness.as_ref().ok_or_else(|| {
            ClaimerError::RevocationValidation("credential has no revocation witness".into())
        })?;

        let mut batch: Vec<&RevocationUpdate> = updates.iter().collect();
        match ordering {
            UpdateOrdering::Reorder => batch.sort_by_key(|u| u.accumulator_index),
            UpdateOrdering::Strict => {
                if let Some(pair) = batch
                    .windows(2)
                    .find(|w| w[1].accumulator_index < w[0].accumulator_index)
                {
                    return Err(ClaimerError::RevocationValidation(format!(
                        "updates out of order: index {} follows index {}",
                        pair[1].accumulator_index, pair[0].accumulator_index
                    )));
                }
            }
        }

        let fingerprint = issuer_key.fingerprint();
        let mut current = start.clone();
        let mut summary = UpdateSummary::default();
        for update in batch {
            match advance(engine, issuer_key, &fingerprint, &current, update) {
                Ok(Some(next)) => {
                    current = next;
                    summary.applied += 1;
                }
                Ok(None) => summary.stale += 1,
                Err(err) => {
                    tracing::warn!(
                        issuer = %fingerprint,
                        witness_index = current.accumulator_index,
                        update_index = update.accumulator_index,
                        error = %err,
                        "revocation update rejected, witness unchanged"
                    );
                    return Err(err);
                }
            }
        }
        summary.accumulator_index = current.accumulator_index;

        if summary.applied > 0 {
            let counter = u64::try_from(summary.applied)
                .ok()
                .and_then(|n| self.update_counter.checked_add(n))
                .ok_or_else(|| {
                    ClaimerError::RevocationValidation("update counter overflow".into())
                })?;
            self.witness = Some(current);
            self.update_counter = counter;
            tracing::info!(
                issuer = %fingerprint,
                accumulator_index = summary.accumulator_index,
                applied = summary.applied,
                stale = summary.stale,
                "revocation witness advanced"
            );
        }
        Ok(summary)
    }

    fn check_issuer(&self, issuer_key: &IssuerPublicKey) -> Result<(), ClaimerError> {
        let fingerprint = issuer_key.fingerprint();
        if fingerprint != self.issuer {
            return Err(ClaimerError::RevocationValidation(format!(
                "issuer key {fingerprint} did not issue this credential ({})",
                self.issuer
            )));
        }
        Ok(())
    }
}

/// One step of the fold. `Ok(None)` means the update is stale.
fn advance<E: CredentialEngine>(
    engine: &E,
    issuer_key: &IssuerPublicKey,
    fingerprint: &ContentDigest,
    witness: &Witness,
    update: &RevocationUpdate,
) -> Result<Option<Witness>, ClaimerError> {
    if &update.issuer != fingerprint {
        return Err(ClaimerError::RevocationValidation(format!(
            "update published by {}, expected {fingerprint}",
            update.issuer
        )));
    }
    if update.accumulator_index <= witness.accumulator_index {
        return Ok(None);
    }
    if update.accumulator_index - witness.accumulator_index > 1 {
        return Err(ClaimerError::RevocationValidation(format!(
            "update too new: index {} cannot follow witness index {}",
            update.accumulator_index, witness.accumulator_index
        )));
    }
    engine
        .apply_revocation_delta(issuer_key, witness, update)
        .map(Some)
        .map_err(revocation_error)
}

impl Validate for AttestedClaim {
    fn validate(&self) -> Result<(), String> {
        if self.signature.bytes.is_empty() {
            return Err("signature must be non-empty".into());
        }
        match &self.witness {
            Some(w) => w.validate(),
            None => Ok(()),
        }
    }
}
