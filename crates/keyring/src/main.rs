//! `keyring` command-line entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Settings`] from environment variables.
//! 2. Initialise structured logging.
//! 3. Run the command. Commands that touch tokens first load the encryption
//!    configuration and bind an [`Encrypter`] to the configured key store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use keyring::config::{self, Settings};
use keyring::factory::BuiltinResolver;
use keyring::key::Scheme;
use keyring::{bootstrap, telemetry, CipherId, Encrypter};

#[derive(Parser)]
#[command(name = "keyring", version, about = "Encrypt and decrypt tokens with rotating keys")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a new random key, base64-encoded for use in configuration
    GenerateKey {
        /// Cipher the key is sized for
        #[arg(long, default_value_t = CipherId::default())]
        cipher: CipherId,
    },
    /// Encrypt a string with the current key and print the token
    Encrypt {
        /// Plaintext to encrypt
        value: String,
    },
    /// Decrypt a token and print the plaintext
    Decrypt {
        /// Token produced by `encrypt`
        token: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 1. Settings
    // -----------------------------------------------------------------------
    let settings = Settings::from_env().map_err(|e| {
        // Logging is not yet up; write to stderr directly.
        eprintln!("ERROR: settings invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&settings.log_level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "keyring starting");

    // -----------------------------------------------------------------------
    // 3. Command
    // -----------------------------------------------------------------------
    match cli.command {
        Command::GenerateKey { cipher } => {
            println!("{}", Scheme::Base64.encode(&Encrypter::generate_key(cipher)));
        }
        Command::Encrypt { value } => {
            let token = encrypter(&settings)?
                .encrypt_string(&value)
                .context("encryption failed")?;
            println!("{token}");
        }
        Command::Decrypt { token } => {
            let plaintext = encrypter(&settings)?
                .decrypt_string(&token)
                .context("decryption failed")?;
            println!("{plaintext}");
        }
    }

    Ok(())
}

fn encrypter(settings: &Settings) -> Result<Encrypter> {
    let cfg = config::load(settings.config_file.as_deref())?;
    bootstrap::encrypter_from_config(&cfg, &BuiltinResolver)
}
