//! Authenticated symmetric encryption with rotating keys.
//!
//! Values are sealed with AES-CBC and authenticated with HMAC-SHA256 under the
//! active key of a [`KeyStore`]. Every token records which key sealed it, so
//! older tokens keep decrypting after the active key changes.
//!
//! ```no_run
//! use keyring::{bootstrap, config, factory::BuiltinResolver};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = config::load(Some("keyring.toml"))?;
//! let encrypter = bootstrap::encrypter_from_config(&cfg, &BuiltinResolver)?;
//! let token = encrypter.encrypt_string("secret")?;
//! assert_eq!(encrypter.decrypt_string(&token)?, "secret");
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod crypto;
pub mod encrypter;
pub mod factory;
pub mod key;
pub mod telemetry;

pub use common::{DecryptError, EncryptError, Envelope, StringEncrypter};
pub use crypto::CipherId;
pub use encrypter::{ConfigurationError, Encrypter};
pub use key::{Key, KeyStore};
