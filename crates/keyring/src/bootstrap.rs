//! Wiring from configuration to a ready [`Encrypter`].

use anyhow::{Context, Result};

use crate::config::{Repository, CURRENT_KEY};
use crate::encrypter::Encrypter;
use crate::factory::{Dispatcher, FactoryResolver, KeyStoreFactory};

/// Build the key store selected by `config` and bind an [`Encrypter`] to it.
///
/// The current key comes from `app.encryption.current_key`; a blank value is
/// treated as unset.
///
/// # Errors
///
/// Returns an error if the key store cannot be built or the encrypter rejects
/// it.
pub fn encrypter_from_config(
    config: &dyn Repository,
    resolver: &dyn FactoryResolver,
) -> Result<Encrypter> {
    let store = Dispatcher::new(resolver)
        .make(config)
        .context("failed to build key store")?;

    let current = config
        .string(CURRENT_KEY)
        .context("failed to read current key id")?
        .filter(|id| !id.trim().is_empty());

    Encrypter::new(store, current.as_deref()).context("failed to initialise encrypter")
}
