//! Multi-key store from the `app.encryption.keys` map.
//!
//! When `app.key` is also set it is appended last under the `app-key` id, so
//! tokens sealed before the switch to rotation keep decrypting.

use tracing::info;

use super::app_key::legacy_key;
use super::{FactoryError, KeyStoreFactory};
use crate::config::{Repository, KEYS};
use crate::key::{decode, Key, KeyStore};

/// Builds a store with one key per configured entry, plus the legacy key.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyRotationFactory;

impl KeyStoreFactory for KeyRotationFactory {
    fn make(&self, config: &dyn Repository) -> Result<KeyStore, FactoryError> {
        let entries = config.key_entries(KEYS)?;
        let configured = entries.into_iter().map(|(id, entry)| -> Result<Key, FactoryError> {
            let secret = decode(&entry.value).map_err(|source| FactoryError::Decode {
                id: id.clone(),
                source,
            })?;
            Ok(Key::new(id, secret, entry.cipher))
        });
        let legacy = legacy_key(config)?;
        let has_legacy = legacy.is_some();

        let mut store = KeyStore::new();
        store.try_put_all(configured.chain(legacy.map(Ok)))?;

        info!(keys = store.count(), legacy = has_legacy, "built rotation key store");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyEntry, APP_CIPHER, APP_KEY};
    use crate::crypto::CipherId;
    use crate::factory::testing::MapRepository;
    use crate::key::APP_KEY_ID;

    const ENCODED: &str = "base64:IUHRqAQ99pZ0A1MPjbuv1D6ff3jxv0GIvS2qIW4JNU4=";

    fn entry(value: &str, cipher: CipherId) -> KeyEntry {
        KeyEntry {
            value: value.into(),
            cipher,
        }
    }

    fn stub(id: &str, value: &str, cipher: CipherId) -> Key {
        Key::new(id, decode(value).unwrap(), cipher)
    }

    #[test]
    fn makes_store_from_keys_and_app_key() {
        let config = MapRepository::default()
            .with_key("key-1", entry(ENCODED, CipherId::Aes128Cbc))
            .with_key("key-2", entry(ENCODED, CipherId::Aes128Cbc))
            .with_key("key-3", entry(ENCODED, CipherId::Aes128Cbc))
            .with(APP_KEY, ENCODED)
            .with(APP_CIPHER, "AES-128-CBC");

        let store = KeyRotationFactory.make(&config).unwrap();

        let mut expected = KeyStore::new();
        expected.put_all([
            stub("key-1", ENCODED, CipherId::Aes128Cbc),
            stub("key-2", ENCODED, CipherId::Aes128Cbc),
            stub("key-3", ENCODED, CipherId::Aes128Cbc),
            stub(APP_KEY_ID, ENCODED, CipherId::Aes128Cbc),
        ]);
        assert_eq!(store, expected);
    }

    #[test]
    fn keeps_configured_order_with_mixed_ciphers() {
        let wide = "base64:MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";
        let config = MapRepository::default()
            .with_key("zeta", entry(ENCODED, CipherId::Aes128Cbc))
            .with_key("alpha", entry(wide, CipherId::Aes256Cbc));

        let store = KeyRotationFactory.make(&config).unwrap();
        let ids: Vec<_> = store.iter().map(Key::id).collect();
        assert_eq!(ids, ["zeta", "alpha"]);
        assert_eq!(store.get_by_id("alpha").unwrap().cipher(), CipherId::Aes256Cbc);
        assert!(store.get_by_id(APP_KEY_ID).is_none());
    }

    #[test]
    fn legacy_key_is_appended_last() {
        let config = MapRepository::default()
            .with(APP_KEY, "0123456789abcdef")
            .with_key("key-1", entry(ENCODED, CipherId::Aes256Cbc));

        let store = KeyRotationFactory.make(&config).unwrap();
        assert_eq!(store.count(), 2);
        assert_eq!(store.get_all()[1].id(), APP_KEY_ID);
        assert_eq!(store.get_all()[1].secret(), b"0123456789abcdef");
    }

    #[test]
    fn undecodable_entry_fails_the_whole_store() {
        let config = MapRepository::default()
            .with_key("good", entry(ENCODED, CipherId::Aes128Cbc))
            .with_key("bad", entry("base64:%%%", CipherId::Aes128Cbc));

        match KeyRotationFactory.make(&config) {
            Err(FactoryError::Decode { id, .. }) => assert_eq!(id, "bad"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn no_keys_yields_empty_store() {
        let store = KeyRotationFactory.make(&MapRepository::default()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn file_order_is_kept_and_legacy_key_comes_last() {
        let config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [app]
                key = "0123456789abcdef"

                [app.encryption.keys.zeta]
                value = "base64:IUHRqAQ99pZ0A1MPjbuv1D6ff3jxv0GIvS2qIW4JNU4="
                cipher = "AES-256-CBC"

                [app.encryption.keys.Key-B]
                value = "base64:IUHRqAQ99pZ0A1MPjbuv1D6ff3jxv0GIvS2qIW4JNU4="
                cipher = "AES-256-CBC"

                [app.encryption.keys.alpha]
                value = "0123456789abcdef"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let store = KeyRotationFactory.make(&config).unwrap();
        let ids: Vec<_> = store.iter().map(Key::id).collect();
        assert_eq!(ids, ["zeta", "Key-B", "alpha", APP_KEY_ID]);
        assert_eq!(store.get_by_id("Key-B").unwrap().cipher(), CipherId::Aes256Cbc);
        assert_eq!(store.get_by_id(APP_KEY_ID).unwrap().cipher(), CipherId::Aes128Cbc);
    }
}
