//! # acred-core
//!
//! Foundational types shared by every crate in the claimer workspace. It
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One error taxonomy.** [`ClaimerError`] is the only error a claimer
//!    operation returns, and [`ClaimerError::class()`] separates caller
//!    mistakes from verification failures.
//!
//! 2. **Validated claims.** A [`Claim`] is checked on construction and on
//!    deserialization: a non-empty object with no floats and no dotted names.
//!
//! 3. **`CanonicalBytes` newtype.** Every binding digest flows through
//!    [`CanonicalBytes`], and [`sha256_digest()`] accepts nothing else.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] is how witness freshness is
//!    recorded and compared.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod canonical;
pub mod claim;
pub mod config;
pub mod digest;
pub mod error;
pub mod hex;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use claim::Claim;
pub use config::{ClaimerConfig, LogFormat, UpdateOrdering};
pub use digest::{sha256_digest, ContentDigest, Sha256Accumulator};
pub use error::{CanonicalizationError, ClaimerError, ErrorClass, MessageKind, ValidationError};
pub use temporal::Timestamp;
