//! # Operation Surface
//!
//! String-in, string-out entry points, one per claimer operation. Each takes
//! its inputs as JSON text in a fixed positional order, checks the input
//! count, decodes and validates every message, runs the operation and
//! encodes the result.
//!
//! | operation | inputs |
//! |---|---|
//! | `gen_key` | none |
//! | `key_from_mnemonic` | mnemonic, password |
//! | `request_attestation` | claimer key, claim, handshake, issuer key |
//! | `build_credential` | claimer key, session, signature |
//! | `build_presentation` | claimer key, credential, request, issuer key |
//! | `build_combined_presentation` | claimer key, credentials, request, issuer keys |
//! | `update_credential` | credential, update, issuer key |
//! | `update_all_credential` | credential, updates, issuer key |
//!
//! Mnemonic and password are plain text, not JSON. Outputs carrying key
//! material are returned in [`Zeroizing`] strings.

use acred_core::{Claim, ClaimerError, MessageKind, UpdateOrdering};
use acred_engine::{
    CredentialEngine, HandshakeMessage, IssueSignatureMessage, IssuerPublicKey, RevocationUpdate,
};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::claimer::Claimer;
use crate::codec::{decode, encode, require_inputs};
use crate::credential::AttestedClaim;
use crate::issuance::IssuanceSession;
use crate::keys::KeyMaterial;
use crate::presentation::{CombinedPresentationRequest, PresentationRequest};

#[derive(Serialize)]
struct RequestOutput<'a> {
    session: &'a IssuanceSession,
    message: &'a acred_engine::AttestationRequest,
}

#[derive(Serialize)]
struct CredentialOutput<'a> {
    credential: &'a AttestedClaim,
    session: &'a IssuanceSession,
}

/// The operation surface bound to one engine.
#[derive(Debug, Clone)]
pub struct Operations<E> {
    engine: E,
    ordering: UpdateOrdering,
}

impl<E: CredentialEngine + Clone> Operations<E> {
    /// Operations over `engine`, reordering update batches.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            ordering: UpdateOrdering::Reorder,
        }
    }

    /// Set how [`update_all_credential`](Self::update_all_credential) treats
    /// out-of-order batches.
    pub fn with_ordering(mut self, ordering: UpdateOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    fn claimer(&self, key: &str) -> Result<Claimer<E>, ClaimerError> {
        Ok(Claimer::new(KeyMaterial::import(key)?, self.engine.clone()))
    }

    /// Fresh claimer key, exported.
    pub fn gen_key(&self) -> Result<Zeroizing<String>, ClaimerError> {
        KeyMaterial::generate()?.export()
    }

    /// Claimer key derived from a mnemonic and password, exported.
    pub fn key_from_mnemonic(&self, inputs: &[&str]) -> Result<Zeroizing<String>, ClaimerError> {
        require_inputs("key_from_mnemonic", inputs, &["mnemonic", "password"])?;
        KeyMaterial::from_mnemonic(inputs[0], inputs[1])?.export()
    }

    /// Open an issuance session. Returns `{"session", "message"}`; the
    /// message goes to the issuer, the session stays with the claimer.
    pub fn request_attestation(&self, inputs: &[&str]) -> Result<String, ClaimerError> {
        require_inputs(
            "request_attestation",
            inputs,
            &["claimer key", "claim", "handshake", "issuer public key"],
        )?;
        let claimer = self.claimer(inputs[0])?;
        let claim = Claim::from_json(inputs[1])?;
        let handshake: HandshakeMessage = decode(MessageKind::Handshake, inputs[2])?;
        let issuer_key: IssuerPublicKey = decode(MessageKind::IssuerPublicKey, inputs[3])?;

        let (session, message) = claimer.request_attestation(&issuer_key, &handshake, claim)?;
        encode(&RequestOutput {
            session: &session,
            message: &message,
        })
    }

    /// Assemble a credential. Returns `{"credential", "session"}` where the
    /// session is now spent and must replace the caller's copy.
    pub fn build_credential(&self, inputs: &[&str]) -> Result<String, ClaimerError> {
        require_inputs(
            "build_credential",
            inputs,
            &["claimer key", "session", "issue signature"],
        )?;
        let claimer = self.claimer(inputs[0])?;
        let mut session: IssuanceSession = decode(MessageKind::Session, inputs[1])?;
        let signature: IssueSignatureMessage = decode(MessageKind::IssueSignature, inputs[2])?;

        let credential = claimer.build_credential(&mut session, &signature)?;
        encode(&CredentialOutput {
            credential: &credential,
            session: &session,
        })
    }

    /// Build a single-credential presentation.
    pub fn build_presentation(&self, inputs: &[&str]) -> Result<String, ClaimerError> {
        require_inputs(
            "build_presentation",
            inputs,
            &["claimer key", "credential", "presentation request", "issuer public key"],
        )?;
        let claimer = self.claimer(inputs[0])?;
        let credential: AttestedClaim = decode(MessageKind::Credential, inputs[1])?;
        let request: PresentationRequest = decode(MessageKind::PresentationRequest, inputs[2])?;
        let issuer_key: IssuerPublicKey = decode(MessageKind::IssuerPublicKey, inputs[3])?;

        encode(&claimer.build_presentation(&credential, &request, &issuer_key)?)
    }

    /// Build a presentation over several credentials.
    pub fn build_combined_presentation(&self, inputs: &[&str]) -> Result<String, ClaimerError> {
        require_inputs(
            "build_combined_presentation",
            inputs,
            &[
                "claimer key",
                "credential list",
                "combined presentation request",
                "issuer public key list",
            ],
        )?;
        let claimer = self.claimer(inputs[0])?;
        let credentials: Vec<AttestedClaim> = decode(MessageKind::CredentialList, inputs[1])?;
        let request: CombinedPresentationRequest =
            decode(MessageKind::CombinedPresentationRequest, inputs[2])?;
        let issuer_keys: Vec<IssuerPublicKey> =
            decode(MessageKind::IssuerPublicKeyList, inputs[3])?;

        encode(&claimer.build_combined_presentation(&credentials, &request, &issuer_keys)?)
    }

    /// Apply one revocation update. Returns the updated credential.
    pub fn update_credential(&self, inputs: &[&str]) -> Result<String, ClaimerError> {
        require_inputs(
            "update_credential",
            inputs,
            &["credential", "revocation update", "issuer public key"],
        )?;
        let mut credential: AttestedClaim = decode(MessageKind::Credential, inputs[0])?;
        let update: RevocationUpdate = decode(MessageKind::RevocationUpdate, inputs[1])?;
        let issuer_key: IssuerPublicKey = decode(MessageKind::IssuerPublicKey, inputs[2])?;

        credential.update(&self.engine, &issuer_key, &update)?;
        encode(&credential)
    }

    /// Apply a batch of revocation updates. Returns the updated credential.
    pub fn update_all_credential(&self, inputs: &[&str]) -> Result<String, ClaimerError> {
        require_inputs(
            "update_all_credential",
            inputs,
            &["credential", "revocation update list", "issuer public key"],
        )?;
        let mut credential: AttestedClaim = decode(MessageKind::Credential, inputs[0])?;
        let updates: Vec<RevocationUpdate> =
            decode(MessageKind::RevocationUpdateList, inputs[1])?;
        let issuer_key: IssuerPublicKey = decode(MessageKind::IssuerPublicKey, inputs[2])?;

        credential.update_all(&self.engine, &issuer_key, &updates, self.ordering)?;
        encode(&credential)
    }
}
