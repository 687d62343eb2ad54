//! Tracing subscriber setup.
//!
//! `-v` flags take precedence over the configured level. Logs go to stderr
//! so that command output on stdout stays machine-readable.

use acred_core::config::LoggingConfig;
use acred_core::LogFormat;
use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// The filter directive for a verbosity count and configured level.
pub fn filter_directive(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig, verbose: u8) -> Result<()> {
    let directive = filter_directive(verbose, &config.level);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter \"{directive}\""))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
