//! Single-key store from the legacy `app.key` / `app.cipher` settings.

use tracing::info;

use super::{FactoryError, KeyStoreFactory};
use crate::config::{Repository, APP_CIPHER, APP_KEY};
use crate::key::{decode, Key, KeyStore, APP_KEY_ID};

/// Builds a store holding exactly one key, `app-key`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppKeyFactory;

impl KeyStoreFactory for AppKeyFactory {
    fn make(&self, config: &dyn Repository) -> Result<KeyStore, FactoryError> {
        let key = legacy_key(config)?.ok_or(FactoryError::MissingAppKey)?;
        info!(key_id = APP_KEY_ID, cipher = %key.cipher(), "built single-key store");

        let mut store = KeyStore::new();
        store.put(key);
        Ok(store)
    }
}

/// The `app-key` entry built from `app.key`, or `None` if it is unset or empty.
///
/// If the key starts with `base64:` it is decoded before use; keys may be
/// encoded for presentation, the store always holds raw bytes.
pub(crate) fn legacy_key(config: &dyn Repository) -> Result<Option<Key>, FactoryError> {
    let Some(encoded) = config.string(APP_KEY)?.filter(|k| !k.is_empty()) else {
        return Ok(None);
    };
    let cipher = config.cipher(APP_CIPHER)?;
    let secret = decode(&encoded).map_err(|source| FactoryError::Decode {
        id: APP_KEY_ID.to_owned(),
        source,
    })?;
    Ok(Some(Key::new(APP_KEY_ID, secret, cipher)))
}
