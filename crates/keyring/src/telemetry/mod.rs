//! Structured logging for the `keyring` binary.
//!
//! Logs are JSON lines on stderr so that stdout carries only command output
//! (keys and tokens) and can be piped.
//!
//! # Logging invariants
//!
//! - **No key material or plaintext** may appear in any log field. Key ids,
//!   cipher names and [`common::DecryptError::code`] values are safe.
//! - Level comes from `KEYRING_LOG_LEVEL` (default `info`); `RUST_LOG`
//!   overrides it when set.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// Events go to stderr because `encrypt`, `decrypt` and `generate-key` print
/// their result on stdout, and a log line mixed into that output would corrupt
/// a token or key piped to another program.
///
/// # Errors
///
/// Returns an error if a subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init()
        .context("failed to initialise tracing subscriber")
}
