//! # Mock Issuer Subcommand
//!
//! A development issuer backed by [`MockIssuer`], persisted as a JSON state
//! file between invocations. It is enough to drive a claimer through
//! issuance, witness updates and revocation locally.
//!
//! The mock scheme offers no privacy or unforgeability. Never use it for
//! anything but testing.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};

use acred_core::ContentDigest;
use acred_engine::{AttestationRequest, MockIssuer};

use crate::{read_text, write_text};

/// Arguments for `acred issuer`.
#[derive(Args, Debug)]
pub struct IssuerArgs {
    #[command(subcommand)]
    pub command: IssuerCommand,
}

/// Mock issuer subcommands.
#[derive(Subcommand, Debug)]
pub enum IssuerCommand {
    /// Create a new issuer state file.
    Init {
        /// Issuer state file to create.
        #[arg(long)]
        state: PathBuf,
        /// Attestation context, e.g. "kyc".
        #[arg(long)]
        context: String,
        /// Derive the key from this seed instead of randomly.
        #[arg(long)]
        seed: Option<String>,
        /// Issue credentials without revocation witnesses.
        #[arg(long)]
        no_revocation: bool,
        /// Also write the public key here.
        #[arg(long)]
        public_key: Option<PathBuf>,
        /// Overwrite an existing state file.
        #[arg(long)]
        force: bool,
    },

    /// Write the issuer's public key.
    PublicKey {
        /// Issuer state file.
        #[arg(long)]
        state: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Start an issuance session.
    Handshake {
        /// Issuer state file.
        #[arg(long)]
        state: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Blind-sign an attestation request.
    Sign {
        /// Issuer state file.
        #[arg(long)]
        state: PathBuf,
        /// Attestation request from the claimer.
        #[arg(long)]
        request: PathBuf,
        /// Output file (stdout if omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the revocation handle a request is issued under.
    Handle {
        /// Attestation request.
        #[arg(long)]
        request: PathBuf,
    },

    /// Revoke handles and publish the next revocation update.
    Revoke {
        /// Issuer state file; updated in place.
        #[arg(long)]
        state: PathBuf,
        /// Revocation handle (hex); repeat for several, omit for none.
        #[arg(long = "handle")]
        handles: Vec<String>,
        /// Output file for the update (stdout if omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Write every published update after an accumulator index.
    Updates {
        /// Issuer state file.
        #[arg(long)]
        state: PathBuf,
        /// Only updates with a greater index.
        #[arg(long, default_value_t = 0)]
        since: u64,
        /// Output file (stdout if omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Execute the issuer subcommand.
pub fn run_issuer(args: &IssuerArgs) -> Result<u8> {
    match &args.command {
        IssuerCommand::Init {
            state,
            context,
            seed,
            no_revocation,
            public_key,
            force,
        } => {
            if state.exists() && !force {
                bail!(
                    "issuer state already exists: {} (pass --force to overwrite)",
                    state.display()
                );
            }
            let issuer = match seed {
                Some(seed) => MockIssuer::from_seed(context.as_str(), seed.as_bytes()),
                None => MockIssuer::new(context.as_str())?,
            };
            let issuer = if *no_revocation {
                issuer.without_revocation()
            } else {
                issuer
            };
            save(state, &issuer)?;
            if let Some(path) = public_key {
                write_text(Some(path), &serde_json::to_string(issuer.public_key())?)?;
            }
            println!(
                "OK: issuer {} initialized at {}",
                issuer.public_key().fingerprint(),
                state.display()
            );
            Ok(0)
        }
        IssuerCommand::PublicKey { state, output } => {
            let issuer = load(state)?;
            write_text(output.as_deref(), &serde_json::to_string(issuer.public_key())?)?;
            Ok(0)
        }
        IssuerCommand::Handshake { state, output } => {
            let handshake = load(state)?.start_session()?;
            write_text(output.as_deref(), &serde_json::to_string(&handshake)?)?;
            Ok(0)
        }
        IssuerCommand::Sign {
            state,
            request,
            output,
        } => {
            let issuer = load(state)?;
            let signature = issuer.issue(&read_request(request)?)?;
            write_text(output.as_deref(), &serde_json::to_string(&signature)?)?;
            Ok(0)
        }
        IssuerCommand::Handle { request } => {
            println!("{}", MockIssuer::handle_for(&read_request(request)?).to_hex());
            Ok(0)
        }
        IssuerCommand::Revoke {
            state,
            handles,
            output,
        } => {
            let mut issuer = load(state)?;
            let handles = handles
                .iter()
                .map(|h| {
                    ContentDigest::from_hex(h.trim())
                        .map_err(|e| anyhow!("invalid revocation handle \"{h}\": {e}"))
                })
                .collect::<Result<Vec<_>>>()?;
            let update = issuer.revoke(&handles)?;
            save(state, &issuer)?;
            tracing::info!(
                accumulator_index = update.accumulator_index,
                revoked = handles.len(),
                "published revocation update"
            );
            write_text(output.as_deref(), &serde_json::to_string(&update)?)?;
            Ok(0)
        }
        IssuerCommand::Updates {
            state,
            since,
            output,
        } => {
            let issuer = load(state)?;
            let updates: Vec<_> = issuer
                .updates()
                .iter()
                .filter(|u| u.accumulator_index > *since)
                .collect();
            write_text(output.as_deref(), &serde_json::to_string(&updates)?)?;
            Ok(0)
        }
    }
}

fn load(path: &Path) -> Result<MockIssuer> {
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid issuer state: {}", path.display()))
}

fn save(path: &Path, issuer: &MockIssuer) -> Result<()> {
    write_text(Some(path), &serde_json::to_string_pretty(issuer)?)
}

fn read_request(path: &Path) -> Result<AttestationRequest> {
    let text = read_text(path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid attestation request: {}", path.display()))
}
