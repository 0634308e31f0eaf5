use crate::auth::{IdentityResolver, Principal};
use crate::common::error::CoreError;
use crate::common::{Map, Set};

/// Deterministic in-memory identity directory.
#[derive(Default)]
pub struct StaticDirectory {
    users: Map<String, Principal>,
    public: Set<String>,
    offline: bool,
}

impl StaticDirectory {
    pub fn with_user(mut self, token: &str, principal: Principal) -> Self {
        self.users.insert(token.to_string(), principal);
        self
    }

    pub fn with_public(mut self, collaboration: &str) -> Self {
        self.public.insert(collaboration.to_string());
        self
    }

    /// Every lookup fails as if the directory service timed out.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    fn check_online(&self) -> crate::Result<()> {
        if self.offline {
            Err(CoreError::UpstreamUnavailable(
                "directory timed out".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl IdentityResolver for StaticDirectory {
    fn resolve(&self, token: &str) -> crate::Result<Principal> {
        self.check_online()?;
        self.users
            .get(token)
            .cloned()
            .ok_or(CoreError::Unauthenticated)
    }

    fn is_collab_public(&self, collaboration: &str) -> crate::Result<bool> {
        self.check_online()?;
        Ok(self.public.contains(collaboration))
    }
}
