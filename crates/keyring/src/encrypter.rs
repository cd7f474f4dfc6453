//! The authenticated encryption engine.
//!
//! An [`Encrypter`] seals values under its active key and opens tokens sealed
//! under any key in its store. A token names the key that sealed it, so the
//! active key can change without breaking old tokens.
//!
//! # Decrypt pipeline
//!
//! 1. Parse the token into an [`Envelope`] → [`DecryptError::InvalidPayload`].
//! 2. Check every field is present and the IV has the cipher's length →
//!    [`DecryptError::InvalidPayload`].
//! 3. Check the MAC with the key named by `keyId` → [`DecryptError::InvalidMac`].
//! 4. Decrypt → [`DecryptError::Cipher`].
//!
//! Structure is always checked before the MAC, and the ciphertext is never
//! touched before the MAC passes.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{DecryptError, EncryptError, Envelope, StringEncrypter};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::crypto::{cipher, mac, CipherId};
use crate::key::{Key, KeyStore};

/// Errors that prevent an [`Encrypter`] from being constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The store holds no keys.
    #[error("key store must contain at least one key")]
    EmptyKeyStore,

    /// No current key was named and the store holds more than one key.
    #[error("key store may only contain one key if no current key id is provided (found {0})")]
    AmbiguousDefaultKey(usize),

    /// The named current key is not in the store.
    #[error("current key {0:?} is not in the key store")]
    UnknownCurrentKey(String),

    /// A stored key's secret does not fit its cipher.
    #[error(
        "key {id:?} is unusable: the only supported ciphers are AES-128-CBC and AES-256-CBC \
         with the correct key lengths ({cipher} needs {expected} bytes, got {actual})"
    )]
    UnsupportedKey {
        id: String,
        cipher: CipherId,
        expected: usize,
        actual: usize,
    },
}

/// Seals and opens tokens with a set of rotating keys.
///
/// Cheap to clone; clones share the same immutable key store. All methods take
/// `&self` and hold no locks, so one instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct Encrypter {
    store: Arc<KeyStore>,
    active: usize,
}

impl Encrypter {
    /// Take over `store` and select the key used for new tokens.
    ///
    /// With no `current_key`, the store must hold exactly one key. Every key in
    /// the store is validated, not only the active one, so a key needed later
    /// for old tokens cannot turn out to be unusable at first use.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the store is empty, the default key is
    /// ambiguous, `current_key` is not in the store, or any key's secret
    /// length does not match its cipher.
    pub fn new(
        store: impl Into<Arc<KeyStore>>,
        current_key: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        let store = store.into();

        if store.is_empty() {
            return Err(ConfigurationError::EmptyKeyStore);
        }

        let active = match current_key {
            None if store.count() > 1 => {
                return Err(ConfigurationError::AmbiguousDefaultKey(store.count()))
            }
            None => 0,
            Some(id) => store
                .iter()
                .position(|k| k.id() == id)
                .ok_or_else(|| ConfigurationError::UnknownCurrentKey(id.to_owned()))?,
        };

        if let Some(bad) = store.iter().find(|k| !k.is_supported()) {
            return Err(ConfigurationError::UnsupportedKey {
                id: bad.id().to_owned(),
                cipher: bad.cipher(),
                expected: bad.cipher().key_len(),
                actual: bad.secret().len(),
            });
        }

        let encrypter = Self { store, active };
        info!(
            key_id = %encrypter.active_key().id(),
            cipher = %encrypter.active_key().cipher(),
            keys = encrypter.store.count(),
            "encrypter ready"
        );
        Ok(encrypter)
    }

    /// Returns `true` if `secret` is a valid key for `cipher`.
    pub fn supported(secret: &[u8], cipher: CipherId) -> bool {
        cipher.accepts(secret)
    }

    /// Fresh random key material sized for `cipher`.
    pub fn generate_key(cipher: CipherId) -> Vec<u8> {
        cipher::random_bytes(cipher.key_len())
    }

    /// The key used for new tokens.
    pub fn active_key(&self) -> &Key {
        &self.store.get_all()[self.active]
    }

    /// The store this encrypter reads keys from.
    pub fn key_store(&self) -> &KeyStore {
        &self.store
    }

    /// Serialize `value` and seal it.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptError`] if serialization or encryption fails.
    pub fn encrypt<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, EncryptError> {
        let serialized = serde_json::to_vec(value).map_err(EncryptError::Serialize)?;
        self.encrypt_bytes(&serialized)
    }

    /// Seal `value` as-is, without structured serialization.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptError`] if encryption fails.
    pub fn encrypt_string(&self, value: &str) -> Result<String, EncryptError> {
        self.encrypt_bytes(value.as_bytes())
    }

    /// Seal raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptError::Cipher`] if the block cipher rejects the key, or
    /// [`EncryptError::Envelope`] if the envelope cannot be encoded.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<String, EncryptError> {
        let key = self.active_key();
        let iv = cipher::random_bytes(key.cipher().iv_len());

        let ciphertext = cipher::encrypt(key.cipher(), key.secret(), &iv, plaintext)
            .map_err(|_| EncryptError::Cipher)?;

        let iv = STANDARD.encode(iv);
        let value = STANDARD.encode(ciphertext);
        let mac = mac::envelope_mac(key.secret(), &iv, &value);

        Envelope {
            iv,
            value,
            mac,
            key_id: key.id().to_owned(),
        }
        .to_token()
    }

    /// Open a token and deserialize the value it carries.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptError`] if the token is rejected, cannot be decrypted,
    /// or does not hold a serialized `T`.
    pub fn decrypt<T: DeserializeOwned>(&self, token: &str) -> Result<T, DecryptError> {
        let plaintext = self.decrypt_bytes(token)?;
        serde_json::from_slice(&plaintext).map_err(|e| self.rejected(DecryptError::Unserialize(e)))
    }

    /// Open a token sealed with [`Encrypter::encrypt_string`].
    ///
    /// # Errors
    ///
    /// Returns [`DecryptError`] if the token is rejected or cannot be decrypted
    /// to UTF-8 text.
    pub fn decrypt_string(&self, token: &str) -> Result<String, DecryptError> {
        let plaintext = self.decrypt_bytes(token)?;
        String::from_utf8(plaintext).map_err(|_| self.rejected(DecryptError::Cipher))
    }

    /// Open a token and return the raw plaintext bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptError`] if the token is malformed, its MAC does not
    /// verify, or decryption fails.
    pub fn decrypt_bytes(&self, token: &str) -> Result<Vec<u8>, DecryptError> {
        self.open(token).map_err(|e| self.rejected(e))
    }

    fn open(&self, token: &str) -> Result<Vec<u8>, DecryptError> {
        let envelope = Envelope::from_token(token)?;
        let key = self.store.get_by_id(&envelope.key_id);

        let iv = self.valid_payload(&envelope, key)?;
        let key = key
            .filter(|k| self.valid_mac(&envelope, k))
            .ok_or(DecryptError::InvalidMac)?;

        let ciphertext = STANDARD
            .decode(&envelope.value)
            .map_err(|_| DecryptError::Cipher)?;
        cipher::decrypt(key.cipher(), key.secret(), &iv, &ciphertext)
            .map_err(|_| DecryptError::Cipher)
    }

    /// Structural checks; returns the decoded IV.
    ///
    /// The IV length comes from the cipher of the key that sealed the token.
    /// An unknown key id falls back to the active cipher so that the token
    /// reaches the MAC check and is reported as a MAC failure.
    fn valid_payload(&self, envelope: &Envelope, key: Option<&Key>) -> Result<Vec<u8>, DecryptError> {
        if !envelope.is_complete() {
            return Err(DecryptError::InvalidPayload);
        }
        let iv = STANDARD
            .decode(&envelope.iv)
            .map_err(|_| DecryptError::InvalidPayload)?;
        let cipher = key.unwrap_or_else(|| self.active_key()).cipher();
        if iv.len() != cipher.iv_len() {
            return Err(DecryptError::InvalidPayload);
        }
        Ok(iv)
    }

    fn valid_mac(&self, envelope: &Envelope, key: &Key) -> bool {
        let expected = mac::envelope_mac(key.secret(), &envelope.iv, &envelope.value);
        mac::macs_match(&envelope.mac, &expected)
    }

    fn rejected(&self, err: DecryptError) -> DecryptError {
        debug!(code = err.code(), "token rejected");
        err
    }
}

impl StringEncrypter for Encrypter {
    fn encrypt_string(&self, value: &str) -> Result<String, EncryptError> {
        Encrypter::encrypt_string(self, value)
    }

    fn decrypt_string(&self, token: &str) -> Result<String, DecryptError> {
        Encrypter::decrypt_string(self, token)
    }
}
