//! Decoding of configured key material.
//!
//! Keys arrive from configuration as text. A value of the form
//! `<scheme>:<payload>` is decoded with the named scheme; a value without a
//! `:` is used as raw key bytes. Raw secrets therefore must not contain a
//! colon.

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use super::SecretBytes;

/// Errors produced while decoding key material.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The prefix before `:` names no known scheme.
    #[error("unknown key encoding scheme {0:?}")]
    UnknownScheme(String),

    /// The payload is not valid for its scheme.
    #[error("key payload is not valid {0}")]
    InvalidPayload(Scheme),
}

/// Encoding schemes accepted as a key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Standard, padded base64 (`base64:...`).
    Base64,
}

impl Scheme {
    /// Prefix written before the `:` separator.
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Base64 => "base64",
        }
    }

    /// Decode `payload` into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidPayload`] if `payload` is malformed.
    pub fn decode(self, payload: &str) -> Result<Vec<u8>, DecodeError> {
        match self {
            Scheme::Base64 => STANDARD
                .decode(payload)
                .map_err(|_| DecodeError::InvalidPayload(self)),
        }
    }

    /// Encode raw bytes as `<scheme>:<payload>`.
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Scheme::Base64 => format!("{}:{}", self.as_str(), STANDARD.encode(bytes)),
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base64" => Ok(Scheme::Base64),
            other => Err(DecodeError::UnknownScheme(other.to_owned())),
        }
    }
}

/// Turn a configured key string into raw secret bytes.
///
/// # Errors
///
/// Returns [`DecodeError`] if the prefix names an unknown scheme or the payload
/// does not decode. The caller has no usable key material in that case.
pub fn decode(text: &str) -> Result<SecretBytes, DecodeError> {
    match text.split_once(':') {
        None => Ok(SecretBytes::from(text.as_bytes())),
        Some((scheme, payload)) => scheme.parse::<Scheme>()?.decode(payload).map(SecretBytes::new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENCODED: &str = "base64:IUHRqAQ99pZ0A1MPjbuv1D6ff3jxv0GIvS2qIW4JNU4=";

    #[test]
    fn decodes_base64_prefixed_key() {
        let secret = decode(ENCODED).unwrap();
        assert_eq!(secret.len(), 32);
        assert_eq!(secret.expose()[0], 0x21);
    }

    #[test]
    fn raw_key_without_separator_is_returned_unchanged() {
        let secret = decode("aaaaaaaaaaaaaaaa").unwrap();
        assert_eq!(secret.expose(), b"aaaaaaaaaaaaaaaa");
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        assert_eq!(
            decode("hex:00ff").unwrap_err(),
            DecodeError::UnknownScheme("hex".into())
        );
    }

    #[test]
    fn invalid_payload_is_rejected() {
        assert_eq!(
            decode("base64:***").unwrap_err(),
            DecodeError::InvalidPayload(Scheme::Base64)
        );
    }

    #[test]
    fn encode_then_decode_recovers_bytes() {
        let raw = [0x3Au8, 0x00, 0xFF, 0x10];
        let encoded = Scheme::Base64.encode(&raw);
        assert!(encoded.starts_with("base64:"));
        assert_eq!(decode(&encoded).unwrap().expose(), &raw);
    }
}
