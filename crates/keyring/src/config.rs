//! Configuration loading and lookup.
//!
//! Two layers live here:
//!
//! - [`Settings`]: process settings for the `keyring` binary, read from
//!   `KEYRING_*` environment variables at startup.
//! - [`Repository`]: the key→value lookup that key store factories read
//!   encryption settings through. It is implemented for [`config::Config`],
//!   which [`load`] builds from an optional TOML file and `KEYRING_APP__*`
//!   variables.
//!
//! # Encryption settings
//!
//! | key                           | meaning                                       |
//! |-------------------------------|-----------------------------------------------|
//! | `app.key`                     | legacy single key, optionally `base64:`-encoded |
//! | `app.cipher`                  | cipher of the legacy key                      |
//! | `app.encryption.current_key`  | id of the key used for new tokens             |
//! | `app.encryption.key_provider` | name of an alternate key store factory        |
//! | `app.encryption.keys`         | ordered map `{id = {value, cipher}}`          |

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::crypto::CipherId;

pub const APP_KEY: &str = "app.key";
pub const APP_CIPHER: &str = "app.cipher";
pub const CURRENT_KEY: &str = "app.encryption.current_key";
pub const KEY_PROVIDER: &str = "app.encryption.key_provider";
pub const KEYS: &str = "app.encryption.keys";

/// One entry of the `app.encryption.keys` map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyEntry {
    /// Key material, raw or `<scheme>:<payload>`.
    pub value: String,
    /// Cipher the key is used with.
    #[serde(default)]
    pub cipher: CipherId,
}

/// Read-only view of encryption configuration.
pub trait Repository {
    /// String value at `key`, or `None` if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the value exists but is not a string.
    fn string(&self, key: &str) -> Result<Option<String>, config::ConfigError>;

    /// Entries of the key map at `key` in declaration order; empty if unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a map of [`KeyEntry`] tables.
    fn key_entries(&self, key: &str) -> Result<Vec<(String, KeyEntry)>, config::ConfigError>;

    /// Cipher named at `key`, defaulting to [`CipherId::default`] when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a supported cipher.
    fn cipher(&self, key: &str) -> Result<CipherId, config::ConfigError> {
        match self.string(key)? {
            None => Ok(CipherId::default()),
            Some(name) => name
                .parse()
                .map_err(|e| config::ConfigError::Message(format!("{key}: {e}"))),
        }
    }
}

impl Repository for config::Config {
    fn string(&self, key: &str) -> Result<Option<String>, config::ConfigError> {
        match self.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn key_entries(&self, key: &str) -> Result<Vec<(String, KeyEntry)>, config::ConfigError> {
        let table = match self.get_table(key) {
            Ok(table) => table,
            Err(config::ConfigError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        table
            .into_iter()
            .map(|(id, value)| value.try_deserialize::<KeyEntry>().map(|entry| (id, entry)))
            .collect()
    }
}

/// Build the encryption configuration: `file` (TOML) if given, then
/// `KEYRING_APP__*` environment variables on top
/// (`KEYRING_APP__ENCRYPTION__CURRENT_KEY` → `app.encryption.current_key`).
///
/// Key ids read from the file keep their case. Environment keys are lowercased
/// by the `config` crate, so ids declared through the environment are lowercase.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load(file: Option<&str>) -> Result<config::Config> {
    let mut builder = config::Config::builder();
    if let Some(path) = file {
        builder = builder.add_source(config::File::new(path, config::FileFormat::Toml));
    }
    builder
        .add_source(
            config::Environment::with_prefix("KEYRING")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .with_context(|| match file {
            Some(path) => format!("failed to build encryption configuration from {path}"),
            None => "failed to build encryption configuration".to_owned(),
        })
}

/// Validated process settings for the `keyring` binary.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional TOML file holding the encryption settings.
    #[serde(default)]
    pub config_file: Option<String>,
}

fn default_log_level() -> String {
    "info".into()
}

impl Settings {
    /// Load and validate settings from `KEYRING_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("KEYRING"))
            .build()
            .context("failed to build settings from environment")?;

        let s: Settings = cfg
            .try_deserialize()
            .context("failed to deserialise settings")?;

        s.validate()?;
        Ok(s)
    }

    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("KEYRING_LOG_LEVEL must not be empty");
        }
        if let Some(path) = &self.config_file {
            if path.trim().is_empty() {
                anyhow::bail!("KEYRING_CONFIG_FILE must not be empty when set");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(overrides: &[(&str, &str)]) -> config::Config {
        overrides
            .iter()
            .fold(config::Config::builder(), |b, (k, v)| {
                b.set_override(*k, *v).unwrap()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_rejects_empty_log_level() {
        let s = Settings {
            log_level: " ".into(),
            config_file: None,
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_config_file() {
        let s = Settings {
            log_level: "info".into(),
            config_file: Some("".into()),
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_accepts_valid_settings() {
        let s = Settings {
            log_level: "debug".into(),
            config_file: Some("/etc/keyring.toml".into()),
        };
        assert!(s.validate().is_ok());
    }

    #[test]
    fn missing_string_is_none() {
        let cfg = repo(&[(APP_KEY, "secret")]);
        assert_eq!(cfg.string(APP_KEY).unwrap().as_deref(), Some("secret"));
        assert_eq!(cfg.string(CURRENT_KEY).unwrap(), None);
    }

    #[test]
    fn cipher_defaults_and_parses() {
        let cfg = repo(&[(APP_CIPHER, "AES-256-CBC")]);
        assert_eq!(cfg.cipher(APP_CIPHER).unwrap(), CipherId::Aes256Cbc);
        assert_eq!(cfg.cipher("app.other_cipher").unwrap(), CipherId::Aes128Cbc);

        let cfg = repo(&[(APP_CIPHER, "AES-256-CFB8")]);
        assert!(cfg.cipher(APP_CIPHER).is_err());
    }

    fn from_toml(toml: &str) -> config::Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
    }

    #[test]
    fn key_entries_read_from_table() {
        let cfg = repo(&[
            ("app.encryption.keys.key-1.value", "base64:AAAA"),
            ("app.encryption.keys.key-1.cipher", "AES-256-CBC"),
            ("app.encryption.keys.key-2.value", "raw"),
        ]);
        let entries = cfg.key_entries(KEYS).unwrap();
        let key_1 = entries.iter().find(|(id, _)| id == "key-1").unwrap();
        let key_2 = entries.iter().find(|(id, _)| id == "key-2").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(key_1.1.cipher, CipherId::Aes256Cbc);
        assert_eq!(key_2.1.value, "raw");
        assert_eq!(key_2.1.cipher, CipherId::Aes128Cbc);
    }

    #[test]
    fn key_entries_keep_file_order_and_case() {
        let cfg = from_toml(
            r#"
            [app.encryption.keys.zeta]
            value = "z"

            [app.encryption.keys.Key-B]
            value = "b"
            cipher = "AES-256-CBC"

            [app.encryption.keys.alpha]
            value = "a"
            "#,
        );
        let entries = cfg.key_entries(KEYS).unwrap();
        let ids: Vec<_> = entries.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["zeta", "Key-B", "alpha"]);
        assert_eq!(entries[1].1.value, "b");
        assert_eq!(entries[1].1.cipher, CipherId::Aes256Cbc);
    }

    #[test]
    fn key_entries_empty_when_unset() {
        let cfg = repo(&[]);
        assert!(cfg.key_entries(KEYS).unwrap().is_empty());
    }

    #[test]
    fn key_entries_reject_missing_value() {
        let cfg = repo(&[("app.encryption.keys.key-1.cipher", "AES-128-CBC")]);
        assert!(cfg.key_entries(KEYS).is_err());
    }
}
