//! Keys, the ordered key store, and decoding of configured key material.
//!
//! # Security invariants
//!
//! - Secret bytes are **never** logged or printed; `Debug` is redacted.
//! - Secret memory is zeroed when the owning [`Key`] is dropped.
//! - A key's secret length is not checked here. The encrypter validates every
//!   key against its cipher when it is constructed.

pub mod decoder;
pub mod store;

pub use decoder::{decode, DecodeError, Scheme};
pub use store::KeyStore;

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::crypto::CipherId;

/// Identifier reserved for the key built from the legacy `app.key` setting.
pub const APP_KEY_ID: &str = "app-key";

/// Raw secret key material.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which plaintext key material lives in RAM.
#[derive(Clone)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    /// Take ownership of `bytes` as secret material.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the raw bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Number of secret bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBytes([REDACTED])")
    }
}

impl PartialEq for SecretBytes {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SecretBytes {}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for SecretBytes {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

/// A named secret paired with the cipher it is used with.
///
/// Keys are values: construct once, derive modified copies with the `with_*`
/// methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    id: String,
    secret: SecretBytes,
    cipher: CipherId,
}

impl Key {
    /// Create a key from its identifier, raw secret, and cipher.
    pub fn new(id: impl Into<String>, secret: impl Into<SecretBytes>, cipher: CipherId) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            cipher,
        }
    }

    /// Identifier recorded as `keyId` in tokens sealed with this key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw secret bytes. Never log these.
    pub fn secret(&self) -> &[u8] {
        self.secret.expose()
    }

    /// Cipher this key encrypts with.
    pub fn cipher(&self) -> CipherId {
        self.cipher
    }

    /// Returns `true` if the secret length matches the cipher.
    pub fn is_supported(&self) -> bool {
        self.cipher.accepts(self.secret())
    }

    /// Copy of this key under a different identifier.
    pub fn with_id(&self, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..self.clone()
        }
    }

    /// Copy of this key with different secret material.
    pub fn with_secret(&self, secret: impl Into<SecretBytes>) -> Self {
        Self {
            secret: secret.into(),
            ..self.clone()
        }
    }

    /// Copy of this key paired with a different cipher.
    pub fn with_cipher(&self, cipher: CipherId) -> Self {
        Self {
            cipher,
            ..self.clone()
        }
    }
}
