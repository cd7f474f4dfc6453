//! Error types returned by the encrypter contract.
//!
//! Both enums are coarse: a failed decrypt tells the caller which
//! class of rejection happened, never which byte or field caused it.

use thiserror::Error;

/// Failure while producing an encrypted token.
///
/// Cryptographic failures are not transient; callers must not retry.
#[derive(Debug, Error)]
pub enum EncryptError {
    /// The value could not be converted through the structured serializer.
    #[error("could not serialize the value")]
    Serialize(#[source] serde_json::Error),

    /// The block cipher rejected the key or IV.
    #[error("could not encrypt the data")]
    Cipher,

    /// The envelope could not be encoded.
    #[error("could not encode the payload")]
    Envelope(#[source] serde_json::Error),
}

/// Failure while opening an encrypted token.
///
/// Variants map to stable codes (see [`DecryptError::code`]):
/// - [`DecryptError::InvalidPayload`] → `invalid_payload`
/// - [`DecryptError::InvalidMac`] → `invalid_mac`
/// - [`DecryptError::Cipher`] → `decrypt_failure`
/// - [`DecryptError::Unserialize`] → `unserialize_failure`
#[derive(Debug, Error)]
pub enum DecryptError {
    /// The token is not a well-formed envelope, or its IV has the wrong length.
    #[error("the payload is invalid")]
    InvalidPayload,

    /// The MAC does not authenticate the envelope under the key it names.
    #[error("the MAC is invalid")]
    InvalidMac,

    /// The authenticated ciphertext could not be decrypted.
    #[error("could not decrypt the data")]
    Cipher,

    /// The decrypted plaintext is not a serialized value of the requested type.
    #[error("could not unserialize the decrypted value")]
    Unserialize(#[source] serde_json::Error),
}

impl DecryptError {
    /// Short machine-readable code, safe to use as a log field.
    pub fn code(&self) -> &'static str {
        match self {
            DecryptError::InvalidPayload => "invalid_payload",
            DecryptError::InvalidMac => "invalid_mac",
            DecryptError::Cipher => "decrypt_failure",
            DecryptError::Unserialize(_) => "unserialize_failure",
        }
    }

    /// Returns `true` when the token itself was rejected before decryption,
    /// i.e. it is malformed or forged.
    pub fn is_rejected_token(&self) -> bool {
        matches!(self, DecryptError::InvalidPayload | DecryptError::InvalidMac)
    }
}
