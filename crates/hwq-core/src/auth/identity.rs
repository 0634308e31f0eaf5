use crate::auth::principal::Principal;
use crate::auth::provider::{ProviderName, ProviderTable};
use crate::common::error::CoreError;

/// External directory service that turns bearer tokens into principals.
///
/// Implementations report an invalid token as [`CoreError::Unauthenticated`] and a failed or
/// timed out lookup as [`CoreError::UpstreamUnavailable`].
pub trait IdentityResolver {
    fn resolve(&self, token: &str) -> crate::Result<Principal>;

    fn is_collab_public(&self, collaboration: &str) -> crate::Result<bool>;
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for &R {
    fn resolve(&self, token: &str) -> crate::Result<Principal> {
        (**self).resolve(token)
    }

    fn is_collab_public(&self, collaboration: &str) -> crate::Result<bool> {
        (**self).is_collab_public(collaboration)
    }
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for std::sync::Arc<R> {
    fn resolve(&self, token: &str) -> crate::Result<Principal> {
        (**self).resolve(token)
    }

    fn is_collab_public(&self, collaboration: &str) -> crate::Result<bool> {
        (**self).is_collab_public(collaboration)
    }
}

#[derive(Debug, Clone)]
pub enum Credential {
    Bearer(String),
    ApiKey(String),
}

/// Resolved caller of an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Caller {
    User(Principal),
    Provider(ProviderName),
}

impl Caller {
    pub fn name(&self) -> &str {
        match self {
            Caller::User(principal) => &principal.username,
            Caller::Provider(name) => name,
        }
    }

    pub fn as_user(&self) -> crate::Result<&Principal> {
        match self {
            Caller::User(principal) => Ok(principal),
            Caller::Provider(name) => Err(CoreError::forbidden(format!(
                "Provider '{name}' cannot perform user operations"
            ))),
        }
    }

    pub fn as_provider(&self) -> crate::Result<&str> {
        match self {
            Caller::Provider(name) => Ok(name),
            Caller::User(principal) => Err(CoreError::forbidden(format!(
                "User '{}' cannot perform provider operations",
                principal.username
            ))),
        }
    }
}

pub fn authenticate<R: IdentityResolver>(
    resolver: &R,
    providers: &ProviderTable,
    credential: &Credential,
) -> crate::Result<Caller> {
    match credential {
        Credential::Bearer(token) => {
            let principal = resolver.resolve(token)?;
            log::debug!("Authenticated user {}", principal.username);
            Ok(Caller::User(principal))
        }
        Credential::ApiKey(key) => match providers.provider_for_key(key) {
            Some(name) => {
                log::debug!("Authenticated provider {name}");
                Ok(Caller::Provider(name.clone()))
            }
            None => {
                log::warn!("Rejected unknown provider API key");
                Err(CoreError::Unauthenticated)
            }
        },
    }
}
