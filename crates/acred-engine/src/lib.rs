//! # acred-engine
//!
//! The boundary between claimer orchestration and credential cryptography.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): [`CredentialEngine`] is the capability the
//!   claimer delegates blind-signature verification, disclosure proofs and
//!   witness arithmetic to. Mock and real engines are interchangeable behind
//!   it.
//!
//! - **Types** (`types.rs`): the protocol payloads. Their byte contents are
//!   engine-defined; their JSON envelopes are fixed here.
//!
//! - **Mock** (`mock.rs`, feature `mock`, on by default): [`MockEngine`] and
//!   [`MockIssuer`], deterministic SHA-256 constructions with no privacy or
//!   unforgeability, for tests and local development.
//!
//! ## Crate Policy
//!
//! - Depends on `acred-core` internally.
//! - No `unsafe` code.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;
pub mod types;

#[cfg(feature = "mock")]
pub use mock::{MockEngine, MockIssuer};
pub use traits::{CredentialEngine, EngineError};
pub use types::{
    AttestationRequest, BlindingSecrets, Challenge, Commitment, DisclosureProof,
    DisclosureStatement, HandshakeMessage, IssueSignatureMessage, IssuerPublicKey, MasterSecret,
    NonRevocationProof, RevocationUpdate, SignatureMaterial, Witness,
};
