//! The envelope exchanged between `encrypt` and `decrypt`.
//!
//! On the wire a token is `base64(json(Envelope))`:
//!
//! ```text
//! { "iv": "<base64>", "value": "<base64 ciphertext>", "mac": "<hex hmac-sha256>", "keyId": "<id>" }
//! ```
//!
//! Field order is irrelevant; every field is a required string.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{DecryptError, EncryptError};

/// A self-describing encrypted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64 of the initialisation vector.
    pub iv: String,
    /// Base64 of the raw ciphertext.
    pub value: String,
    /// Hex-encoded HMAC-SHA256 over `iv || value`.
    pub mac: String,
    /// Identifier of the key that produced this envelope.
    #[serde(rename = "keyId")]
    pub key_id: String,
}

impl Envelope {
    /// Encode this envelope as an opaque transport token.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptError::Envelope`] if JSON encoding fails.
    pub fn to_token(&self) -> Result<String, EncryptError> {
        let json = serde_json::to_vec(self).map_err(EncryptError::Envelope)?;
        Ok(STANDARD.encode(json))
    }

    /// Parse a transport token back into an [`Envelope`].
    ///
    /// Only the structure is checked here; field contents are validated by
    /// the encrypter.
    ///
    /// # Errors
    ///
    /// Returns [`DecryptError::InvalidPayload`] if the token is not base64, not
    /// JSON, or lacks any of the four fields.
    pub fn from_token(token: &str) -> Result<Self, DecryptError> {
        let json = STANDARD
            .decode(token.trim())
            .map_err(|_| DecryptError::InvalidPayload)?;
        serde_json::from_slice(&json).map_err(|_| DecryptError::InvalidPayload)
    }

    /// Returns `true` if every field carries a value.
    pub fn is_complete(&self) -> bool {
        !self.iv.is_empty()
            && !self.value.is_empty()
            && !self.mac.is_empty()
            && !self.key_id.is_empty()
    }
}
