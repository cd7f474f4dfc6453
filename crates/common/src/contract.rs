//! The string-only encrypter contract consumed by outer layers.
//!
//! HTTP-facing collaborators (cookie and CSRF-token handling, for example)
//! only need to seal and open strings. They depend on this trait instead of the
//! concrete engine so that the engine crate stays out of their build.

use crate::error::{DecryptError, EncryptError};

/// Seal and open text values as opaque tokens.
pub trait StringEncrypter: Send + Sync {
    /// Encrypt `value` without structured serialization.
    fn encrypt_string(&self, value: &str) -> Result<String, EncryptError>;

    /// Decrypt a token produced by [`StringEncrypter::encrypt_string`].
    fn decrypt_string(&self, token: &str) -> Result<String, DecryptError>;
}
