//! # Protocol Payloads
//!
//! Opaque messages exchanged between claimer, issuer and verifier. Byte
//! payloads (commitments, signatures, witnesses, proofs) are produced and
//! interpreted only by a [`CredentialEngine`](crate::CredentialEngine); this
//! crate fixes their envelope and text encoding (hex inside JSON), not their
//! layout.
//!
//! ## Security Invariant
//!
//! [`MasterSecret`] and [`BlindingSecrets`] redact themselves in `Debug`
//! output and are zeroized on drop. `MasterSecret` has no serde impls.

use acred_core::hex::hex_bytes;
use acred_core::{Claim, ContentDigest, Sha256Accumulator, Timestamp};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

// ── Secrets ────────────────────────────────────────────────────────────

/// The claimer's long-term secret, bound into every credential it holds.
pub struct MasterSecret(Zeroizing<[u8; 32]>);

impl MasterSecret {
    /// Wrap 32 secret bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Borrow the secret bytes.
    pub fn expose(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Clone for MasterSecret {
    fn clone(&self) -> Self {
        Self::from_bytes(*self.0)
    }
}

impl PartialEq for MasterSecret {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.expose()[..].ct_eq(&other.expose()[..]).into()
    }
}

impl Eq for MasterSecret {}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterSecret([REDACTED])")
    }
}

/// Session-local blinding factors. They live only while an issuance session
/// is open and are what lets the claimer unblind the issuer's signature.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlindingSecrets(#[serde(with = "zeroizing_hex")] Zeroizing<Vec<u8>>);

impl BlindingSecrets {
    /// Wrap blinding bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Borrow the blinding bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for BlindingSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BlindingSecrets([REDACTED])")
    }
}

mod zeroizing_hex {
    use serde::{Deserializer, Serializer};
    use zeroize::Zeroizing;

    pub fn serialize<S: Serializer>(bytes: &Zeroizing<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        acred_core::hex::hex_bytes::serialize(bytes, s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Zeroizing<Vec<u8>>, D::Error> {
        acred_core::hex::hex_bytes::deserialize(d).map(Zeroizing::new)
    }
}

// ── Issuer-side messages ───────────────────────────────────────────────

/// An issuer's public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerPublicKey {
    /// Engine-specific key material.
    #[serde(with = "hex_bytes")]
    pub material: Vec<u8>,
}

impl IssuerPublicKey {
    /// Stable identifier of the key. Credentials, revocation updates and
    /// combined presentation requests name their issuer by fingerprint.
    pub fn fingerprint(&self) -> ContentDigest {
        let mut acc = Sha256Accumulator::new("acred/issuer-key");
        acc.update(&self.material);
        acc.finalize()
    }
}

/// The issuer's opening message for one issuance session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeMessage {
    /// Issuer-chosen session context (for example a claim type).
    pub context: String,
    /// Fresh issuer nonce.
    #[serde(with = "hex_bytes")]
    pub nonce: Vec<u8>,
}

/// The issuer's blind signature over a claimer's commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSignatureMessage {
    /// Blinded signature bytes.
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
    /// Revocation witness, present when the issuer supports revocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness>,
}

/// Membership witness in the issuer's revocation accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    /// Revocation handle the issuer assigned to this credential.
    pub handle: ContentDigest,
    /// Accumulator state this witness is valid for.
    pub accumulator_index: u64,
    /// When the issuer published that accumulator state.
    pub published_at: Timestamp,
    /// Engine-specific witness value.
    #[serde(with = "hex_bytes")]
    pub material: Vec<u8>,
}

/// A published change to the issuer's revocation accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationUpdate {
    /// Fingerprint of the publishing issuer's key.
    pub issuer: ContentDigest,
    /// Accumulator index after this update.
    pub accumulator_index: u64,
    /// Handles revoked by this update.
    #[serde(default)]
    pub revoked: Vec<ContentDigest>,
    /// Publication time.
    pub published_at: Timestamp,
    /// Issuer signature over the update.
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

// ── Claimer-side messages ──────────────────────────────────────────────

/// The claimer's request for attestation, sent to the issuer by external
/// transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRequest {
    /// Handshake context this request answers.
    pub context: String,
    /// Fingerprint of the issuer key the request is addressed to.
    pub issuer: ContentDigest,
    /// The attributes to attest.
    pub claim: Claim,
    /// Hiding commitment to the claimer's secret and blinding factors.
    #[serde(with = "hex_bytes")]
    pub commitment: Vec<u8>,
    /// Issuer nonce echoed from the handshake.
    #[serde(with = "hex_bytes")]
    pub nonce: Vec<u8>,
}

/// Output of [`CredentialEngine::commit`](crate::CredentialEngine::commit).
#[derive(Debug, Clone)]
pub struct Commitment {
    /// Secrets the claimer keeps until the signature arrives.
    pub secrets: BlindingSecrets,
    /// The message to send to the issuer.
    pub request: AttestationRequest,
}

/// Unblinded issuer signature held inside an attested credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureMaterial {
    /// Engine-specific signature bytes.
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

// ── Verifier-side messages ─────────────────────────────────────────────

/// A verifier challenge. The nonce must be fresh per presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Verifier context string.
    pub context: String,
    /// Verifier nonce.
    #[serde(with = "hex_bytes")]
    pub nonce: Vec<u8>,
}

/// One credential's share of a disclosure proof.
#[derive(Debug, Clone, Copy)]
pub struct DisclosureStatement<'a> {
    /// Key that signed the credential.
    pub issuer: &'a IssuerPublicKey,
    /// The credential's full claim.
    pub claim: &'a Claim,
    /// The credential's unblinded signature.
    pub signature: &'a SignatureMaterial,
    /// Attribute paths revealed to the verifier.
    pub disclosed: &'a [String],
}

/// Proof of possession of one or more credentials with selective disclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureProof {
    /// Engine-specific proof bytes.
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}

/// Proof that a credential is not revoked as of an accumulator index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRevocationProof {
    /// Fingerprint of the issuer whose accumulator was used.
    pub issuer: ContentDigest,
    /// Accumulator index the proof is valid for.
    pub accumulator_index: u64,
    /// Publication time of that accumulator state.
    pub published_at: Timestamp,
    /// Engine-specific proof bytes.
    #[serde(with = "hex_bytes")]
    pub bytes: Vec<u8>,
}
