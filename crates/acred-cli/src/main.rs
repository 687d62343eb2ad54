//! # acred CLI entry point
//!
//! Loads configuration, installs the tracing subscriber and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use acred_cli::claimer::{run_claimer, ClaimerArgs};
use acred_cli::issuer::{run_issuer, IssuerArgs};
use acred_core::ClaimerConfig;
use acred_engine::MockEngine;

/// Anonymous credential claimer.
///
/// Holds claimer keys, obtains blind-signed credentials, keeps their
/// revocation witnesses current and builds selective-disclosure
/// presentations.
#[derive(Parser, Debug)]
#[command(name = "acred", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Claimer operations: keys, issuance, presentations, updates.
    Claimer(ClaimerArgs),

    /// File-backed mock issuer for local development.
    Issuer(IssuerArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClaimerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(1);
        }
    };
    if let Err(e) = acred_cli::logging::init(&config.logging, cli.verbose) {
        eprintln!("error: {e:#}");
        return ExitCode::from(1);
    }
    tracing::debug!(
        ordering = config.revocation.ordering.as_str(),
        "acred CLI starting"
    );

    let result = match cli.command {
        Commands::Claimer(args) => run_claimer(&args, &config, MockEngine),
        Commands::Issuer(args) => run_issuer(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acred_cli::claimer::ClaimerCommand;
    use acred_cli::issuer::IssuerCommand;

    #[test]
    fn parse_claimer_request() {
        let cli = Cli::try_parse_from([
            "acred",
            "claimer",
            "request",
            "--key",
            "k.json",
            "--claim",
            "c.json",
            "--handshake",
            "h.json",
            "--issuer-key",
            "pk.json",
            "--session",
            "s.json",
        ])
        .unwrap();
        let Commands::Claimer(args) = cli.command else {
            panic!("expected claimer command");
        };
        let ClaimerCommand::Request { output, session, .. } = args.command else {
            panic!("expected request");
        };
        assert!(output.is_none());
        assert_eq!(session, PathBuf::from("s.json"));
    }

    #[test]
    fn parse_combined_repeats_in_order() {
        let cli = Cli::try_parse_from([
            "acred",
            "claimer",
            "present-combined",
            "--key",
            "k",
            "--credential",
            "a.json",
            "--credential",
            "b.json",
            "--request",
            "r.json",
            "--issuer-key",
            "pa.json",
            "--issuer-key",
            "pb.json",
        ])
        .unwrap();
        let Commands::Claimer(args) = cli.command else {
            panic!("expected claimer command");
        };
        let ClaimerCommand::PresentCombined {
            credentials,
            issuer_keys,
            ..
        } = args.command
        else {
            panic!("expected present-combined");
        };
        assert_eq!(credentials, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(issuer_keys, vec![PathBuf::from("pa.json"), PathBuf::from("pb.json")]);
    }

    #[test]
    fn parse_update_requires_an_update() {
        assert!(Cli::try_parse_from([
            "acred",
            "claimer",
            "update",
            "--credential",
            "c.json",
            "--issuer-key",
            "pk.json",
        ])
        .is_err());
    }

    #[test]
    fn parse_from_mnemonic_defaults_to_empty_password() {
        let cli = Cli::try_parse_from([
            "acred",
            "claimer",
            "from-mnemonic",
            "--mnemonic",
            "phrase.txt",
            "-o",
            "k.json",
        ])
        .unwrap();
        let Commands::Claimer(args) = cli.command else {
            panic!("expected claimer command");
        };
        let ClaimerCommand::FromMnemonic {
            password, index, ..
        } = args.command
        else {
            panic!("expected from-mnemonic");
        };
        assert_eq!(password, "");
        assert_eq!(index, None);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "acred",
            "issuer",
            "revoke",
            "--state",
            "i.json",
            "--handle",
            "aa",
            "--handle",
            "bb",
            "-vv",
            "--config",
            "acred.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("acred.yaml")));
        let Commands::Issuer(args) = cli.command else {
            panic!("expected issuer command");
        };
        assert!(matches!(
            args.command,
            IssuerCommand::Revoke { ref handles, .. } if handles.len() == 2
        ));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
