use hwq_core::auth::Caller;
use hwq_core::queue::QueueCore;

use crate::client::globalsettings::GlobalSettings;
use crate::config::Config;
use crate::identity::{CachedResolver, DirectoryFile};
use crate::storage::FileStore;

pub type ClientCore = QueueCore<FileStore, CachedResolver<DirectoryFile>>;

/// Opened record store together with the authenticated caller of the command.
pub struct ClientContext {
    core: ClientCore,
    caller: Caller,
}

impl ClientContext {
    pub fn new(core: ClientCore, caller: Caller) -> Self {
        Self { core, caller }
    }

    pub fn core(&self) -> &ClientCore {
        &self.core
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }
}

pub fn create_core(config: &Config, store: FileStore) -> crate::Result<ClientCore> {
    let directory = match &config.identity.directory {
        Some(path) => DirectoryFile::load(path)?,
        None => {
            log::debug!("No identity directory configured, user tokens will be rejected");
            DirectoryFile::default()
        }
    };
    let resolver = CachedResolver::new(
        directory,
        config.identity.cache_capacity,
        config.identity.cache_ttl,
    );
    Ok(QueueCore::new(
        store,
        resolver,
        config.provider_table()?,
        config.ledger(),
    ))
}

/// Opens the record store and authenticates the credential passed on the command line.
pub fn get_client_context(gsettings: &GlobalSettings) -> anyhow::Result<ClientContext> {
    let Some(credential) = gsettings.credential() else {
        anyhow::bail!("No credential was given, use `--token` or `--api-key`");
    };
    let store = FileStore::open(gsettings.store_path())?;
    let core = create_core(gsettings.config(), store)?;
    let caller = core.authenticate(credential)?;
    Ok(ClientContext::new(core, caller))
}
