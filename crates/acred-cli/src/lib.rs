//! # acred-cli
//!
//! The `acred` command-line interface. Every protocol message lives in a
//! JSON file; commands read their inputs from files and write their outputs
//! to files (or stdout).
//!
//! ## Subcommands
//!
//! - `acred claimer`: key generation, issuance, presentations, witness
//!   updates.
//! - `acred issuer`: a file-backed mock issuer for local development.
//!
//! ```bash
//! acred issuer init --state issuer.json --context kyc --public-key issuer.pub.json
//! acred issuer handshake --state issuer.json -o hs.json
//! acred claimer keygen -o claimer.key
//! acred claimer request --key claimer.key --claim claim.json --handshake hs.json \
//!     --issuer-key issuer.pub.json --session session.json -o request.json
//! acred issuer sign --state issuer.json --request request.json -o sig.json
//! acred claimer build --key claimer.key --session session.json --signature sig.json -o cred.json
//! ```
//!
//! ## Exit codes
//!
//! `0` success, `1` error, `2` issuer or update data did not verify.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; protocol logic lives in `acred-claimer`.

pub mod claimer;
pub mod issuer;
pub mod logging;

use std::path::Path;

use anyhow::{Context, Result};

/// Exit code for input that failed cryptographic verification.
pub const EXIT_VERIFICATION_FAILED: u8 = 2;

/// Read a UTF-8 file, or stdin when the path is `-`.
pub fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Write text to a file, or to stdout when no path is given.
pub fn write_text(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(p) => {
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create directory: {}", parent.display())
                })?;
            }
            std::fs::write(p, text).with_context(|| format!("failed to write {}", p.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
