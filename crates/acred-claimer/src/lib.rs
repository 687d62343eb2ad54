//! # acred-claimer
//!
//! The claimer's half of an anonymous credential lifecycle: obtain a blind
//! signature over a claim, keep the resulting credential's revocation
//! witness current, and answer verifier requests while disclosing only the
//! attributes asked for.
//!
//! - **Keys** (`keys.rs`): master secret generation, BIP39 mnemonic
//!   derivation, explicit export and import.
//!
//! - **Issuance** (`issuance.rs`): the one-shot [`IssuanceSession`] state
//!   machine from request to assembled credential.
//!
//! - **Credential** (`credential.rs`): [`AttestedClaim`] and transactional
//!   witness updates.
//!
//! - **Presentation** (`presentation.rs`): single and combined
//!   selective-disclosure presentations.
//!
//! - **Codec** (`codec.rs`) and **Ops** (`ops.rs`): JSON message decoding
//!   with structural validation, and the string-level operation surface.
//!
//! All cryptography is delegated to an [`acred_engine::CredentialEngine`].
//!
//! ## Security Invariant
//!
//! Secrets (master secret, blinding factors) never appear in `Debug` output
//! or logs, are zeroized on drop, and leave the process only through
//! [`KeyMaterial::export`] or an open [`IssuanceSession`]'s serialization.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod claimer;
pub mod codec;
pub mod credential;
pub mod issuance;
pub mod keys;
pub mod ops;
pub mod presentation;

pub use claimer::Claimer;
pub use codec::{decode, encode, require_inputs, Validate};
pub use credential::{AttestedClaim, UpdateSummary};
pub use issuance::{IssuanceSession, SessionPhase};
pub use keys::KeyMaterial;
pub use ops::Operations;
pub use presentation::{
    AttributeRequest, CombinedPresentation, CombinedPresentationRequest, IssuerRequest,
    Presentation, PresentationPart, PresentationRequest,
};
