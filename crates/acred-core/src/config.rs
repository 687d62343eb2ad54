//! Claimer configuration.
//!
//! Loaded from an optional YAML file, then overridden by environment
//! variables:
//!
//! - `ACRED_LOG_LEVEL`: `tracing` filter directive (default `warn`)
//! - `ACRED_LOG_FORMAT`: `text` or `json` (default `text`)
//! - `ACRED_UPDATE_ORDERING`: `reorder` or `strict` (default `reorder`)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ClaimerError;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ClaimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(ClaimerError::Config(format!(
                "unknown log format \"{other}\" (expected text or json)"
            ))),
        }
    }
}

/// How `update_all` treats revocation updates that arrive out of order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOrdering {
    /// Sort the batch by accumulator index before applying it.
    #[default]
    Reorder,
    /// Reject a batch that is not already in ascending index order.
    Strict,
}

impl UpdateOrdering {
    /// Lowercase name as used in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reorder => "reorder",
            Self::Strict => "strict",
        }
    }
}

impl std::str::FromStr for UpdateOrdering {
    type Err = ClaimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reorder" => Ok(Self::Reorder),
            "strict" => Ok(Self::Strict),
            other => Err(ClaimerError::Config(format!(
                "unknown update ordering \"{other}\" (expected reorder or strict)"
            ))),
        }
    }
}

/// `logging` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `acred_claimer=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// `revocation` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevocationConfig {
    /// Ordering policy for batched updates.
    pub ordering: UpdateOrdering,
}

/// Complete claimer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClaimerConfig {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Revocation witness maintenance settings.
    pub revocation: RevocationConfig,
}

impl ClaimerConfig {
    /// Load from an optional YAML file, then apply process environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ClaimerError> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a YAML file. No environment overrides are applied.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ClaimerError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClaimerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse YAML text. An empty document yields the defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ClaimerError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| ClaimerError::Config(e.to_string()))
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ClaimerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("ACRED_LOG_LEVEL") {
            if level.trim().is_empty() {
                return Err(ClaimerError::Config(
                    "ACRED_LOG_LEVEL must be non-empty".to_string(),
                ));
            }
            self.logging.level = level;
        }
        if let Some(format) = lookup("ACRED_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        if let Some(ordering) = lookup("ACRED_UPDATE_ORDERING") {
            self.revocation.ordering = ordering.parse()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = ClaimerConfig::default();
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.format, LogFormat::Text);
        assert_eq!(cfg.revocation.ordering, UpdateOrdering::Reorder);
    }

    #[test]
    fn yaml_sections_parse() {
        let cfg = ClaimerConfig::from_yaml_str(
            "logging:\n  level: debug\n  format: json\nrevocation:\n  ordering: strict\n",
        )
        .unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.revocation.ordering, UpdateOrdering::Strict);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = ClaimerConfig::from_yaml_str("revocation:\n  ordering: strict\n").unwrap();
        assert_eq!(cfg.logging, LoggingConfig::default());
        assert_eq!(cfg.revocation.ordering, UpdateOrdering::Strict);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(
            ClaimerConfig::from_yaml_str("  \n").unwrap(),
            ClaimerConfig::default()
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ClaimerConfig::from_yaml_str("revocation:\n  order: strict\n").unwrap_err();
        assert!(matches!(err, ClaimerError::Config(_)));
    }

    #[test]
    fn invalid_ordering_in_yaml_is_rejected() {
        assert!(ClaimerConfig::from_yaml_str("revocation:\n  ordering: sometimes\n").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = ClaimerConfig::from_yaml_str("logging:\n  level: info\n").unwrap();
        cfg.apply_env(env(&[
            ("ACRED_LOG_LEVEL", "trace"),
            ("ACRED_LOG_FORMAT", "JSON"),
            ("ACRED_UPDATE_ORDERING", "strict"),
        ]))
        .unwrap();
        assert_eq!(cfg.logging.level, "trace");
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.revocation.ordering, UpdateOrdering::Strict);
    }

    #[test]
    fn invalid_env_value_is_a_config_error() {
        let mut cfg = ClaimerConfig::default();
        let err = cfg
            .apply_env(env(&[("ACRED_UPDATE_ORDERING", "random")]))
            .unwrap_err();
        assert!(format!("{err}").contains("unknown update ordering"));
        let err = cfg.apply_env(env(&[("ACRED_LOG_LEVEL", " ")])).unwrap_err();
        assert!(matches!(err, ClaimerError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  format: json").unwrap();
        let cfg = ClaimerConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClaimerConfig::from_yaml_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(format!("{err}").contains("cannot read"));
    }
}
