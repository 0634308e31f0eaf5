use std::path::{Path, PathBuf};

use hwq_core::auth::Credential;

use crate::client::output::outputs::Output;
use crate::config::Config;

pub struct GlobalSettings {
    config: Config,
    store_path: PathBuf,
    credential: Option<Credential>,
    printer: Box<dyn Output>,
}

impl GlobalSettings {
    pub fn new(
        config: Config,
        store_path: PathBuf,
        credential: Option<Credential>,
        printer: Box<dyn Output>,
    ) -> Self {
        GlobalSettings {
            config,
            store_path,
            credential,
            printer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn printer(&self) -> &dyn Output {
        self.printer.as_ref()
    }
}
