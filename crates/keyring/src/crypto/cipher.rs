//! AES-CBC encryption and decryption of whole payloads.
//!
//! **Algorithm choice:** AES-CBC with PKCS#7 padding, keyed with 128 or 256 bits.
//! CBC provides no integrity on its own; every ciphertext produced here must be
//! authenticated with [`super::mac`] before it leaves the process, and every
//! ciphertext must be authenticated before it is handed to [`decrypt`].

use std::{fmt, str::FromStr};

use aes::{Aes128, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Byte length of a CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// The supported cipher configurations.
///
/// Textual names follow the OpenSSL spelling (`AES-128-CBC`, `AES-256-CBC`) and
/// parse case-insensitively. Nothing else is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CipherId {
    /// AES with a 16-byte key in CBC mode.
    #[default]
    Aes128Cbc,
    /// AES with a 32-byte key in CBC mode.
    Aes256Cbc,
}

impl CipherId {
    /// Canonical textual name.
    pub fn as_str(self) -> &'static str {
        match self {
            CipherId::Aes128Cbc => "AES-128-CBC",
            CipherId::Aes256Cbc => "AES-256-CBC",
        }
    }

    /// Required secret length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            CipherId::Aes128Cbc => 16,
            CipherId::Aes256Cbc => 32,
        }
    }

    /// Required IV length in bytes.
    pub fn iv_len(self) -> usize {
        IV_LEN
    }

    /// Returns `true` if `secret` has exactly the length this cipher needs.
    pub fn accepts(self, secret: &[u8]) -> bool {
        secret.len() == self.key_len()
    }
}

impl fmt::Display for CipherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherId {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("AES-128-CBC") {
            Ok(CipherId::Aes128Cbc)
        } else if s.eq_ignore_ascii_case("AES-256-CBC") {
            Ok(CipherId::Aes256Cbc)
        } else {
            Err(CipherError::UnsupportedCipher(s.to_owned()))
        }
    }
}

impl TryFrom<String> for CipherId {
    type Error = CipherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CipherId> for String {
    fn from(value: CipherId) -> Self {
        value.as_str().to_owned()
    }
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The cipher name is not one of the supported AES-CBC configurations.
    #[error("unsupported cipher {0:?}: only AES-128-CBC and AES-256-CBC are supported")]
    UnsupportedCipher(String),

    /// The key or IV does not have the length the cipher requires.
    #[error("invalid key or IV length for {0}")]
    InvalidLength(CipherId),

    /// Decryption failed: truncated ciphertext or bad padding.
    #[error("cbc decryption failed")]
    Decrypt,
}

/// Fill a fresh buffer of `len` bytes from the OS CSPRNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf
}

/// Encrypt `plaintext` under `key` and `iv` with PKCS#7 padding.
///
/// # Errors
///
/// Returns [`CipherError::InvalidLength`] if `key` or `iv` has the wrong length
/// for `cipher`.
pub fn encrypt(
    cipher: CipherId,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let invalid = |_| CipherError::InvalidLength(cipher);
    let ciphertext = match cipher {
        CipherId::Aes128Cbc => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        CipherId::Aes256Cbc => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(invalid)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };
    Ok(ciphertext)
}

/// Decrypt `ciphertext` under `key` and `iv`, stripping PKCS#7 padding.
///
/// # Errors
///
/// Returns [`CipherError::InvalidLength`] if `key` or `iv` has the wrong length,
/// or [`CipherError::Decrypt`] if the ciphertext is not a whole number of
/// blocks or its padding is malformed.
pub fn decrypt(
    cipher: CipherId,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
        return Err(CipherError::Decrypt);
    }
    let invalid = |_| CipherError::InvalidLength(cipher);
    let plaintext = match cipher {
        CipherId::Aes128Cbc => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        CipherId::Aes256Cbc => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(invalid)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
    };
    plaintext.map_err(|_| CipherError::Decrypt)
}
