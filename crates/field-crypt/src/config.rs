//! Configuration loading and validation for the transform service.
//!
//! Values are read from `FIELD_CRYPT_*` environment variables. The secret has
//! no default: a host that starts without one fails immediately.

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::{CipherKind, KeyDerivation, DEFAULT_PREFIX};

/// Prefix shared by every environment variable this crate reads.
pub const ENV_PREFIX: &str = "FIELD_CRYPT";

/// Validated transform service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Secret the cipher key is derived from. **Required.**
    pub secret_key: String,

    /// Cipher identifier, e.g. `"AES-256-CBC"`.
    #[serde(default)]
    pub cipher: CipherKind,

    /// How the secret becomes key bytes.
    #[serde(default)]
    pub key_derivation: KeyDerivation,

    /// Tag marking a stored value as an encrypted blob. Also the prefix of the
    /// host's per-field setting names.
    #[serde(default = "default_blob_prefix")]
    pub blob_prefix: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_blob_prefix() -> String {
    DEFAULT_PREFIX.into()
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Configuration with the given secret and every other value defaulted.
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            cipher: CipherKind::default(),
            key_derivation: KeyDerivation::default(),
            blob_prefix: default_blob_prefix(),
            log_level: default_log_level(),
        }
    }

    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `FIELD_CRYPT_SECRET_KEY` is absent or empty, or if
    /// any variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load and validate configuration from an explicit variable map, keyed by
    /// full variable name (e.g. `FIELD_CRYPT_SECRET_KEY`).
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_vars(vars: config::Map<String, String>) -> Result<Self> {
        Self::load(config::Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    pub fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.secret_key, "FIELD_CRYPT_SECRET_KEY")?;
        if self.blob_prefix.is_empty() {
            anyhow::bail!("FIELD_CRYPT_BLOB_PREFIX must not be empty");
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("secret_key", &"[REDACTED]")
            .field("cipher", &self.cipher)
            .field("key_derivation", &self.key_derivation)
            .field("blob_prefix", &self.blob_prefix)
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_blob_prefix(), "_acf_efo_");
        assert_eq!(default_log_level(), "info");
        let cfg = Config::with_secret("s");
        assert_eq!(cfg.cipher, CipherKind::Aes256Cbc);
        assert_eq!(cfg.key_derivation, KeyDerivation::HexDigest);
    }

    #[test]
    fn loads_from_vars() {
        let cfg = Config::from_vars(vars(&[
            ("FIELD_CRYPT_SECRET_KEY", "hunter2"),
            ("FIELD_CRYPT_CIPHER", "aes-128-cbc"),
            ("FIELD_CRYPT_KEY_DERIVATION", "raw-digest"),
            ("FIELD_CRYPT_BLOB_PREFIX", "enc:"),
        ]))
        .unwrap();
        assert_eq!(cfg.secret_key, "hunter2");
        assert_eq!(cfg.cipher, CipherKind::Aes128Cbc);
        assert_eq!(cfg.key_derivation, KeyDerivation::RawDigest);
        assert_eq!(cfg.blob_prefix, "enc:");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn missing_secret_fails() {
        assert!(Config::from_vars(vars(&[])).is_err());
    }

    #[test]
    fn blank_secret_fails() {
        assert!(Config::from_vars(vars(&[("FIELD_CRYPT_SECRET_KEY", "   ")])).is_err());
    }

    #[test]
    fn unknown_cipher_fails() {
        assert!(Config::from_vars(vars(&[
            ("FIELD_CRYPT_SECRET_KEY", "s"),
            ("FIELD_CRYPT_CIPHER", "DES-CBC"),
        ]))
        .is_err());
    }

    #[test]
    fn validate_rejects_empty_prefix() {
        let mut cfg = Config::with_secret("s");
        cfg.blob_prefix = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn secret_redacted_in_debug() {
        let s = format!("{:?}", Config::with_secret("hunter2"));
        assert!(!s.contains("hunter2"));
        assert!(s.contains("REDACTED"));
    }
}
