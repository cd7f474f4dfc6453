//! AES-CBC payload encryption and HMAC-SHA256 authentication primitives.
//!
//! This module knows nothing about keys, stores, or envelopes. It provides the
//! low-level operations the encrypter composes.
//!
//! # Token format
//!
//! ```text
//! base64({"iv": base64(iv), "value": base64(aes_cbc(plaintext)), "mac": hex(hmac), "keyId": id})
//! ```
//!
//! `mac = HMAC-SHA256(secret, base64(iv) || base64(ciphertext))`.

pub mod cipher;
pub mod mac;

pub use cipher::{CipherError, CipherId, IV_LEN};
