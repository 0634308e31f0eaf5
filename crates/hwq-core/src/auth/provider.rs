use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::common::error::CoreError;

pub type ProviderName = String;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProviderEntry {
    pub name: ProviderName,
    pub api_key: String,
    pub platforms: BTreeSet<String>,
}

/// Static out-of-band configuration of the hardware providers.
#[derive(Debug, Clone, Default)]
pub struct ProviderTable {
    by_key: BTreeMap<String, ProviderName>,
    platforms: BTreeMap<ProviderName, BTreeSet<String>>,
}

impl ProviderTable {
    pub fn new(entries: impl IntoIterator<Item = ProviderEntry>) -> crate::Result<Self> {
        let mut table = ProviderTable::default();
        for entry in entries {
            if table.by_key.contains_key(&entry.api_key) {
                return crate::common::error::validation_error(format!(
                    "Provider '{}' reuses an API key of another provider",
                    entry.name
                ));
            }
            if table.platforms.contains_key(&entry.name) {
                return crate::common::error::validation_error(format!(
                    "Provider '{}' is defined twice",
                    entry.name
                ));
            }
            table.by_key.insert(entry.api_key, entry.name.clone());
            table.platforms.insert(entry.name, entry.platforms);
        }
        Ok(table)
    }

    pub fn provider_for_key(&self, api_key: &str) -> Option<&ProviderName> {
        self.by_key.get(api_key)
    }

    /// Platforms operated by `provider`; an unknown provider operates none.
    pub fn provider_platforms(&self, provider: &str) -> impl Iterator<Item = &str> {
        self.platforms
            .get(provider)
            .into_iter()
            .flat_map(|platforms| platforms.iter().map(|p| p.as_str()))
    }

    pub fn is_platform_allowed(&self, provider: &str, platform: &str) -> bool {
        self.platforms
            .get(provider)
            .is_some_and(|platforms| platforms.contains(platform))
    }

    /// Fails with [`CoreError::PlatformMismatch`] listing the platforms the provider may use.
    pub fn check_platform(&self, provider: &str, platform: &str) -> crate::Result<()> {
        if self.is_platform_allowed(provider, platform) {
            Ok(())
        } else {
            Err(CoreError::PlatformMismatch {
                provider: provider.to_string(),
                platform: platform.to_string(),
                allowed: self
                    .provider_platforms(provider)
                    .map(|p| p.to_string())
                    .collect(),
            })
        }
    }
}
