//! Gate configuration.
//!
//! The cipher mode is resolved once, here, and threaded into every component
//! that hashes, derives, or encrypts. Nothing re-reads it per call.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PinGateError, Result};

/// Environment variable that overrides the configured cipher mode.
pub const MODE_ENV_VAR: &str = "PINGATE_CIPHER_MODE";

pub const DEFAULT_GROUPS_KEY: &str = "dizzy-saved-pins";
pub const DEFAULT_MAPPINGS_KEY: &str = "dizzy-pin-mappings";

/// The two supported cryptographic strength tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherMode {
    /// PBKDF2-HMAC-SHA256 + AES-256-GCM, SHA-256 PIN digests.
    #[default]
    Primary,
    /// Positional XOR mixing and a repeating-key XOR stream. Not authenticated:
    /// a corrupted blob can decrypt to garbage instead of failing, and so can
    /// a blob opened with the wrong PIN. Only the group digest check in
    /// [`PinCredentialStore::verify_group`](crate::PinCredentialStore::verify_group)
    /// rejects a wrong PIN in this mode.
    Fallback,
}

impl CipherMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

impl FromStr for CipherMode {
    type Err = PinGateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "fallback" => Ok(Self::Fallback),
            other => Err(PinGateError::Config(format!("unknown cipher mode: {other}"))),
        }
    }
}

/// Configuration for an [`AccessGate`](crate::AccessGate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub cipher_mode: CipherMode,
    /// Logical persistence key for the PIN group collection.
    #[serde(default = "default_groups_key")]
    pub groups_key: String,
    /// Logical persistence key for the access mapping collection.
    #[serde(default = "default_mappings_key")]
    pub mappings_key: String,
}

fn default_groups_key() -> String {
    DEFAULT_GROUPS_KEY.to_string()
}

fn default_mappings_key() -> String {
    DEFAULT_MAPPINGS_KEY.to_string()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cipher_mode: CipherMode::default(),
            groups_key: default_groups_key(),
            mappings_key: default_mappings_key(),
        }
    }
}

impl GateConfig {
    pub fn with_mode(mode: CipherMode) -> Self {
        Self {
            cipher_mode: mode,
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PinGateError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| PinGateError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| PinGateError::Config(e.to_string()))
    }

    /// Apply the `PINGATE_CIPHER_MODE` override if it is set.
    pub fn with_env_override(self) -> Result<Self> {
        self.with_mode_override(std::env::var(MODE_ENV_VAR).ok().as_deref())
    }

    /// Apply a mode override taken from the environment or a CLI flag.
    pub fn with_mode_override(mut self, value: Option<&str>) -> Result<Self> {
        if let Some(raw) = value.filter(|v| !v.trim().is_empty()) {
            self.cipher_mode = raw.parse()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_launcher_keys() {
        let config = GateConfig::default();
        assert_eq!(config.cipher_mode, CipherMode::Primary);
        assert_eq!(config.groups_key, "dizzy-saved-pins");
        assert_eq!(config.mappings_key, "dizzy-pin-mappings");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = GateConfig::from_json(r#"{"cipher_mode":"fallback"}"#).unwrap();
        assert_eq!(config.cipher_mode, CipherMode::Fallback);
        assert_eq!(config.mappings_key, DEFAULT_MAPPINGS_KEY);
    }

    #[test]
    fn override_parses_mode() {
        let config = GateConfig::default()
            .with_mode_override(Some(" Fallback "))
            .unwrap();
        assert_eq!(config.cipher_mode, CipherMode::Fallback);

        let unchanged = GateConfig::default().with_mode_override(Some("")).unwrap();
        assert_eq!(unchanged.cipher_mode, CipherMode::Primary);

        assert!(matches!(
            GateConfig::default().with_mode_override(Some("plaintext")),
            Err(PinGateError::Config(_))
        ));
    }

    #[test]
    fn read_reports_missing_file() {
        let err = GateConfig::read(Path::new("/nonexistent/pingate.json")).unwrap_err();
        assert!(matches!(err, PinGateError::Config(_)));
    }
}
