//! Key store construction strategies.
//!
//! [`Dispatcher`] decides which [`KeyStoreFactory`] builds the store:
//!
//! 1. If `app.encryption.key_provider` names a provider, it is resolved through
//!    the caller's [`FactoryResolver`] and used.
//! 2. Otherwise [`AppKeyFactory`] builds a single-key store from `app.key`.
//!
//! Factories run once at startup; none of them is on the encryption hot path.

pub mod app_key;
pub mod rotation;

pub use app_key::AppKeyFactory;
pub use rotation::KeyRotationFactory;

use thiserror::Error;
use tracing::info;

use crate::config::{Repository, KEY_PROVIDER};
use crate::key::{DecodeError, KeyStore};

/// Errors produced while building a key store.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Neither `app.key` nor any other key source is configured.
    #[error("no application encryption key has been specified")]
    MissingAppKey,

    /// Configured key material for `id` could not be decoded.
    #[error("key {id:?} could not be decoded")]
    Decode {
        id: String,
        #[source]
        source: DecodeError,
    },

    /// `app.encryption.key_provider` names a provider the resolver does not know.
    #[error("unknown key provider {0:?}")]
    UnknownProvider(String),

    /// A configuration value is present but malformed.
    #[error("invalid encryption configuration")]
    Config(#[from] config::ConfigError),
}

/// A strategy that builds a [`KeyStore`] from configuration.
pub trait KeyStoreFactory {
    /// Build a key store.
    ///
    /// # Errors
    ///
    /// Returns [`FactoryError`] if the configuration is incomplete or invalid.
    fn make(&self, config: &dyn Repository) -> Result<KeyStore, FactoryError>;
}

/// Looks up alternate key store factories by provider name.
#[cfg_attr(test, mockall::automock)]
pub trait FactoryResolver {
    /// The factory registered under `name`, if any.
    fn resolve(&self, name: &str) -> Option<Box<dyn KeyStoreFactory>>;
}

/// Resolves the factories shipped with this crate.
///
/// | name           | factory                 |
/// |----------------|-------------------------|
/// | `key_rotation` | [`KeyRotationFactory`]  |
/// | `app_key`      | [`AppKeyFactory`]       |
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinResolver;

impl BuiltinResolver {
    pub const KEY_ROTATION: &'static str = "key_rotation";
    pub const APP_KEY: &'static str = "app_key";
}

impl FactoryResolver for BuiltinResolver {
    fn resolve(&self, name: &str) -> Option<Box<dyn KeyStoreFactory>> {
        match name {
            Self::KEY_ROTATION => Some(Box::new(KeyRotationFactory)),
            Self::APP_KEY => Some(Box::new(AppKeyFactory)),
            _ => None,
        }
    }
}

/// Chooses a factory from configuration and delegates to it.
pub struct Dispatcher<'r> {
    resolver: &'r dyn FactoryResolver,
}

impl<'r> Dispatcher<'r> {
    pub fn new(resolver: &'r dyn FactoryResolver) -> Self {
        Self { resolver }
    }
}

impl KeyStoreFactory for Dispatcher<'_> {
    fn make(&self, config: &dyn Repository) -> Result<KeyStore, FactoryError> {
        let provider = config.string(KEY_PROVIDER)?.filter(|p| !p.trim().is_empty());
        match provider {
            Some(name) => {
                let factory = self
                    .resolver
                    .resolve(name.trim())
                    .ok_or_else(|| FactoryError::UnknownProvider(name.clone()))?;
                info!(provider = %name, "building key store from configured provider");
                factory.make(config)
            }
            None => AppKeyFactory.make(config),
        }
    }
}

/// In-memory [`Repository`] for factory tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use crate::config::{KeyEntry, Repository};

    #[derive(Default)]
    pub struct MapRepository {
        pub strings: HashMap<String, String>,
        pub keys: Vec<(String, KeyEntry)>,
    }

    impl MapRepository {
        pub fn with(mut self, key: &str, value: &str) -> Self {
            self.strings.insert(key.into(), value.into());
            self
        }

        pub fn with_key(mut self, id: &str, entry: KeyEntry) -> Self {
            self.keys.push((id.into(), entry));
            self
        }
    }

    impl Repository for MapRepository {
        fn string(&self, key: &str) -> Result<Option<String>, config::ConfigError> {
            Ok(self.strings.get(key).cloned())
        }

        fn key_entries(&self, _key: &str) -> Result<Vec<(String, KeyEntry)>, config::ConfigError> {
            Ok(self.keys.clone())
        }
    }
}
