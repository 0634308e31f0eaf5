use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Deserialize;

use hwq_core::auth::{IdentityResolver, Principal};
use hwq_core::{CoreError, Map, Set};

use crate::common::error::error;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryUser {
    username: String,
    token: String,
    #[serde(default)]
    teams: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryDef {
    #[serde(default, rename = "user")]
    users: Vec<DirectoryUser>,
    #[serde(default)]
    public: Vec<String>,
}

/// Directory of users and their teams, read from a TOML file:
///
/// ```toml
/// public = ["open-lab"]
///
/// [[user]]
/// username = "alice"
/// token = "..."
/// teams = ["collab-neuro-editor"]
/// ```
#[derive(Debug, Default)]
pub struct DirectoryFile {
    principals: Map<String, Principal>,
    public: Set<String>,
}

impl DirectoryFile {
    pub fn from_toml(text: &str) -> crate::Result<Self> {
        let def: DirectoryDef = toml::from_str(text)?;
        let mut principals = Map::default();
        for user in def.users {
            let principal = Principal::from_team_names(user.username, &user.teams);
            if let Some(previous) = principals.insert(user.token, principal) {
                return error(format!(
                    "Token of user '{}' is used by another user",
                    previous.username
                ));
            }
        }
        Ok(Self {
            principals,
            public: def.public.into_iter().collect(),
        })
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        log::debug!("Loading identity directory from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::GenericError(format!(
                "Cannot read identity directory {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&text)
    }

    pub fn user_count(&self) -> usize {
        self.principals.len()
    }
}

impl IdentityResolver for DirectoryFile {
    fn resolve(&self, token: &str) -> hwq_core::Result<Principal> {
        self.principals
            .get(token)
            .cloned()
            .ok_or(CoreError::Unauthenticated)
    }

    fn is_collab_public(&self, collaboration: &str) -> hwq_core::Result<bool> {
        Ok(self.public.contains(collaboration))
    }
}

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
}

struct Caches {
    principals: LruCache<String, CacheEntry<Principal>>,
    public: LruCache<String, CacheEntry<bool>>,
}

fn lookup<T: Clone>(
    cache: &mut LruCache<String, CacheEntry<T>>,
    key: &str,
    ttl: Duration,
) -> Option<T> {
    let entry = cache.get(key)?;
    if entry.inserted_at.elapsed() < ttl {
        return Some(entry.value.clone());
    }
    cache.pop(key);
    None
}

fn store<T>(cache: &mut LruCache<String, CacheEntry<T>>, key: &str, value: T) {
    cache.put(
        key.to_string(),
        CacheEntry {
            value,
            inserted_at: Instant::now(),
        },
    );
}

/// Bounded cache of successful lookups in front of another resolver.
///
/// Entries expire after `ttl`. Failed lookups are never cached. The lock is not held while the
/// inner resolver is being called.
pub struct CachedResolver<R> {
    inner: R,
    ttl: Duration,
    caches: Mutex<Caches>,
}

impl<R> CachedResolver<R> {
    pub fn new(inner: R, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            caches: Mutex::new(Caches {
                principals: LruCache::new(capacity),
                public: LruCache::new(capacity),
            }),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn lock(&self) -> hwq_core::Result<MutexGuard<'_, Caches>> {
        self.caches.lock().map_err(|_| {
            log::error!("Identity cache lock is poisoned");
            CoreError::UpstreamUnavailable("identity cache lock is poisoned".to_string())
        })
    }
}

impl<R: IdentityResolver> IdentityResolver for CachedResolver<R> {
    fn resolve(&self, token: &str) -> hwq_core::Result<Principal> {
        if let Some(principal) = lookup(&mut self.lock()?.principals, token, self.ttl) {
            return Ok(principal);
        }
        let principal = self.inner.resolve(token)?;
        store(&mut self.lock()?.principals, token, principal.clone());
        Ok(principal)
    }

    fn is_collab_public(&self, collaboration: &str) -> hwq_core::Result<bool> {
        if let Some(public) = lookup(&mut self.lock()?.public, collaboration, self.ttl) {
            return Ok(public);
        }
        let public = self.inner.is_collab_public(collaboration)?;
        store(&mut self.lock()?.public, collaboration, public);
        Ok(public)
    }
}
