//! # Claimer Subcommand
//!
//! File-based front end over [`acred_claimer::Operations`]. Key files hold
//! exported key material; every other file holds one JSON protocol message.
//!
//! ## Security Invariant
//!
//! Key material is only ever written to the path given with `-o`, never to
//! stdout or logs, except by `mnemonic`, whose whole purpose is to show the
//! phrase.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use acred_claimer::{KeyMaterial, Operations};
use acred_core::{ClaimerConfig, ClaimerError, ErrorClass, UpdateOrdering};
use acred_engine::CredentialEngine;

use crate::{read_text, write_text, EXIT_VERIFICATION_FAILED};

/// Arguments for `acred claimer`.
#[derive(Args, Debug)]
pub struct ClaimerArgs {
    #[command(subcommand)]
    pub command: ClaimerCommand,
}

/// Claimer subcommands.
#[derive(Subcommand, Debug)]
pub enum ClaimerCommand {
    /// Generate fresh key material.
    Keygen {
        /// Key file to write.
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Print a fresh 24-word mnemonic.
    Mnemonic,

    /// Derive key material from a mnemonic and password.
    FromMnemonic {
        /// File holding the mnemonic phrase.
        #[arg(long)]
        mnemonic: PathBuf,
        /// Mnemonic password; empty if omitted.
        #[arg(long, default_value = "")]
        password: String,
        /// Derive the key at this index instead of the base key.
        #[arg(long)]
        index: Option<u32>,
        /// Key file to write.
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Open an issuance session and produce the attestation request.
    Request {
        /// Claimer key file.
        #[arg(long)]
        key: PathBuf,
        /// Claim JSON.
        #[arg(long)]
        claim: PathBuf,
        /// Issuer handshake.
        #[arg(long)]
        handshake: PathBuf,
        /// Issuer public key.
        #[arg(long)]
        issuer_key: PathBuf,
        /// Where to keep the session state.
        #[arg(long)]
        session: PathBuf,
        /// Where to write the request for the issuer (stdout if omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Verify the issuer's signature and assemble the credential.
    ///
    /// The session file is rewritten as spent.
    Build {
        /// Claimer key file.
        #[arg(long)]
        key: PathBuf,
        /// Session state written by `request`.
        #[arg(long)]
        session: PathBuf,
        /// Issuer signature message.
        #[arg(long)]
        signature: PathBuf,
        /// Credential file to write (stdout if omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Answer a presentation request from one credential.
    Present {
        /// Claimer key file.
        #[arg(long)]
        key: PathBuf,
        /// Credential file.
        #[arg(long)]
        credential: PathBuf,
        /// Verifier request.
        #[arg(long)]
        request: PathBuf,
        /// Public key of the credential's issuer.
        #[arg(long)]
        issuer_key: PathBuf,
        /// Presentation file to write (stdout if omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Answer a combined request from several credentials.
    ///
    /// Credentials and issuer keys pair up in the order given.
    PresentCombined {
        /// Claimer key file.
        #[arg(long)]
        key: PathBuf,
        /// Credential file; repeat in request order.
        #[arg(long = "credential", required = true)]
        credentials: Vec<PathBuf>,
        /// Combined verifier request.
        #[arg(long)]
        request: PathBuf,
        /// Issuer public key; repeat in request order.
        #[arg(long = "issuer-key", required = true)]
        issuer_keys: Vec<PathBuf>,
        /// Presentation file to write (stdout if omitted).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Apply revocation updates to a credential, in place.
    Update {
        /// Credential file; rewritten on success.
        #[arg(long)]
        credential: PathBuf,
        /// Revocation update file; repeat for a batch.
        #[arg(long = "update", required = true)]
        updates: Vec<PathBuf>,
        /// Issuer public key.
        #[arg(long)]
        issuer_key: PathBuf,
        /// Reject out-of-order batches regardless of configuration.
        #[arg(long)]
        strict: bool,
    },
}

/// Execute the claimer subcommand.
pub fn run_claimer<E>(args: &ClaimerArgs, config: &ClaimerConfig, engine: E) -> Result<u8>
where
    E: CredentialEngine + Clone,
{
    let ops = Operations::new(engine).with_ordering(config.revocation.ordering);
    match &args.command {
        ClaimerCommand::Keygen { output } => {
            let key = ops.gen_key()?;
            write_text(Some(output), &key)?;
            println!("OK: wrote claimer key to {}", output.display());
            Ok(0)
        }
        ClaimerCommand::Mnemonic => {
            let phrase = KeyMaterial::generate_mnemonic()?;
            println!("{}", phrase.as_str());
            Ok(0)
        }
        ClaimerCommand::FromMnemonic {
            mnemonic,
            password,
            index,
            output,
        } => cmd_from_mnemonic(&ops, mnemonic, password, *index, output),
        ClaimerCommand::Request {
            key,
            claim,
            handshake,
            issuer_key,
            session,
            output,
        } => {
            let inputs = read_all(&[key, claim, handshake, issuer_key])?;
            let out = ops.request_attestation(&as_strs(&inputs))?;
            let (session_state, request) = split(&out, "session", "message")?;
            write_text(Some(session), &session_state)?;
            write_text(output.as_deref(), &request)?;
            Ok(0)
        }
        ClaimerCommand::Build {
            key,
            session,
            signature,
            output,
        } => {
            let inputs = read_all(&[key, session, signature])?;
            let Some(out) = verified(ops.build_credential(&as_strs(&inputs)))? else {
                return Ok(EXIT_VERIFICATION_FAILED);
            };
            let (credential, spent) = split(&out, "credential", "session")?;
            write_text(Some(session), &spent)?;
            write_text(output.as_deref(), &credential)?;
            Ok(0)
        }
        ClaimerCommand::Present {
            key,
            credential,
            request,
            issuer_key,
            output,
        } => {
            let inputs = read_all(&[key, credential, request, issuer_key])?;
            let Some(out) = verified(ops.build_presentation(&as_strs(&inputs)))? else {
                return Ok(EXIT_VERIFICATION_FAILED);
            };
            write_text(output.as_deref(), &out)?;
            Ok(0)
        }
        ClaimerCommand::PresentCombined {
            key,
            credentials,
            request,
            issuer_keys,
            output,
        } => {
            let inputs = [
                read_text(key)?,
                json_array(credentials)?,
                read_text(request)?,
                json_array(issuer_keys)?,
            ];
            let Some(out) = verified(ops.build_combined_presentation(&as_strs(&inputs)))? else {
                return Ok(EXIT_VERIFICATION_FAILED);
            };
            write_text(output.as_deref(), &out)?;
            Ok(0)
        }
        ClaimerCommand::Update {
            credential,
            updates,
            issuer_key,
            strict,
        } => {
            let ops = if *strict {
                ops.with_ordering(UpdateOrdering::Strict)
            } else {
                ops
            };
            cmd_update(&ops, credential, updates, issuer_key)
        }
    }
}

fn cmd_from_mnemonic<E: CredentialEngine + Clone>(
    ops: &Operations<E>,
    mnemonic: &Path,
    password: &str,
    index: Option<u32>,
    output: &Path,
) -> Result<u8> {
    let phrase = read_text(mnemonic)?;
    let phrase = phrase.trim();
    let key = match index {
        None => ops.key_from_mnemonic(&[phrase, password])?,
        Some(i) => KeyMaterial::from_mnemonic_at(phrase, password, i)?.export()?,
    };
    write_text(Some(output), &key)?;
    println!("OK: wrote claimer key to {}", output.display());
    Ok(0)
}

fn cmd_update<E: CredentialEngine + Clone>(
    ops: &Operations<E>,
    credential: &Path,
    updates: &[PathBuf],
    issuer_key: &Path,
) -> Result<u8> {
    let cred = read_text(credential)?;
    let key = read_text(issuer_key)?;
    let result = match updates {
        [single] => ops.update_credential(&[&cred, &read_text(single)?, &key]),
        many => ops.update_all_credential(&[&cred, &json_array(many)?, &key]),
    };
    let Some(updated) = verified(result)? else {
        return Ok(EXIT_VERIFICATION_FAILED);
    };
    write_text(Some(credential), &updated)?;
    println!("OK: updated {}", credential.display());
    Ok(0)
}

/// Separate verification failures, which get their own exit code, from
/// everything else.
fn verified<T>(result: std::result::Result<T, ClaimerError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.class() == ErrorClass::Verification => {
            tracing::warn!(error = %err, "verification failed");
            println!("FAIL: {err}");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn read_all(paths: &[&PathBuf]) -> Result<Vec<String>> {
    paths.iter().map(|p| read_text(p)).collect()
}

fn as_strs(inputs: &[String]) -> Vec<&str> {
    inputs.iter().map(String::as_str).collect()
}

/// Join several JSON files into one JSON array, preserving order.
fn json_array(paths: &[PathBuf]) -> Result<String> {
    let items = paths
        .iter()
        .map(|p| {
            let text = read_text(p)?;
            serde_json::from_str::<Value>(&text)
                .with_context(|| format!("failed to parse JSON: {}", p.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Value::Array(items).to_string())
}

/// Split a two-field JSON object into its fields' JSON text.
fn split(out: &str, first: &str, second: &str) -> Result<(String, String)> {
    let value: Value = serde_json::from_str(out).context("operation returned invalid JSON")?;
    let field = |name: &str| {
        value
            .get(name)
            .map(Value::to_string)
            .ok_or_else(|| anyhow!("operation output has no \"{name}\" field"))
    };
    Ok((field(first)?, field(second)?))
}
