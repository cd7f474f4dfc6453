//! HMAC-SHA256 envelope authentication and blinded comparison.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::cipher::random_bytes;

type HmacSha256 = Hmac<Sha256>;

/// Byte length of the single-use key that blinds a MAC comparison.
pub const BLINDING_NONCE_LEN: usize = 16;

/// Raw HMAC-SHA256 of `parts` concatenated, keyed with `key`.
fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

/// Hex-encoded HMAC-SHA256 over the base64 IV followed by the cipher output.
pub fn envelope_mac(secret: &[u8], iv_b64: &str, value: &str) -> String {
    hex::encode(hmac_sha256(secret, &[iv_b64.as_bytes(), value.as_bytes()]))
}

/// Compare a supplied MAC against the expected one without leaking timing.
///
/// Both strings are first hashed under a fresh random nonce so that the
/// constant-time comparison always runs over two 32-byte values, whatever
/// length or content the caller supplied.
pub fn macs_match(supplied: &str, expected: &str) -> bool {
    let nonce = random_bytes(BLINDING_NONCE_LEN);
    let a = hmac_sha256(&nonce, &[supplied.as_bytes()]);
    let b = hmac_sha256(&nonce, &[expected.as_bytes()]);
    a[..].ct_eq(&b[..]).into()
}
