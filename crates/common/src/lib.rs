//! Envelope wire format, error taxonomy, and the encrypter contract shared across `keyring` crates.

pub mod contract;
pub mod error;
pub mod protocol;

pub use contract::StringEncrypter;
pub use error::{DecryptError, EncryptError};
pub use protocol::Envelope;
