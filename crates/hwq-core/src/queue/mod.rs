//! Caller-facing operations over jobs, sessions, projects and quotas.
//!
//! Every operation authenticates nothing by itself: it receives an already resolved
//! [`Caller`], performs its checks and runs the whole read-modify-write sequence inside one
//! record store transaction.

pub mod jobs;
pub mod projects;
pub mod quotas;
pub mod sessions;

use serde::{Deserialize, Serialize};

use crate::auth::{
    authenticate, can_view, collabs_for, Caller, Credential, IdentityResolver, Principal,
    ProviderTable, Role,
};
use crate::common::error::CoreError;
use crate::ledger::{DebitReceipt, Ledger};
use crate::model::{Job, Session};
use crate::store::RecordStore;

/// Record after a provider report, with the quota charges the report caused.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateOutcome<T> {
    pub record: T,
    pub debit: Option<DebitReceipt>,
}

/// Records that belong to a collaboration, an owner and a hardware platform.
pub(crate) trait Scoped {
    const KIND: &'static str;

    fn record_id(&self) -> String;
    fn collaboration(&self) -> &str;
    fn owner(&self) -> &str;
    fn platform(&self) -> &str;
}

impl Scoped for Job {
    const KIND: &'static str = "job";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
    fn collaboration(&self) -> &str {
        &self.collaboration
    }
    fn owner(&self) -> &str {
        &self.owner
    }
    fn platform(&self) -> &str {
        &self.hardware_platform
    }
}

impl Scoped for Session {
    const KIND: &'static str = "session";

    fn record_id(&self) -> String {
        self.id.to_string()
    }
    fn collaboration(&self) -> &str {
        &self.collaboration
    }
    fn owner(&self) -> &str {
        &self.owner
    }
    fn platform(&self) -> &str {
        &self.hardware_platform
    }
}

/// Filter fields shared by job and session listings that depend on who is asking.
pub(crate) struct ListScope<'a> {
    pub collaborations: &'a mut Option<Vec<String>>,
    pub owner: &'a mut Option<String>,
    pub platforms: &'a mut Option<Vec<String>>,
}

pub struct QueueCore<S, R> {
    store: S,
    identity: R,
    providers: ProviderTable,
    ledger: Ledger,
}

impl<S: RecordStore, R: IdentityResolver> QueueCore<S, R> {
    pub fn new(store: S, identity: R, providers: ProviderTable, ledger: Ledger) -> Self {
        Self {
            store,
            identity,
            providers,
            ledger,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn identity(&self) -> &R {
        &self.identity
    }

    pub fn providers(&self) -> &ProviderTable {
        &self.providers
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn authenticate(&self, credential: &Credential) -> crate::Result<Caller> {
        authenticate(&self.identity, &self.providers, credential)
    }

    /// Owners always see their own records, whatever happened to their memberships.
    pub(crate) fn user_can_view(
        &self,
        principal: &Principal,
        collaboration: &str,
        owner: Option<&str>,
    ) -> crate::Result<bool> {
        if owner == Some(principal.username.as_str()) {
            return Ok(true);
        }
        can_view(principal, collaboration, &self.identity)
    }

    /// Users see records of collaborations they can view, providers records on their
    /// platforms. Anything else does not exist for the caller.
    pub(crate) fn check_visible<T: Scoped>(&self, caller: &Caller, record: &T) -> crate::Result<()> {
        let visible = match caller {
            Caller::User(principal) => {
                self.user_can_view(principal, record.collaboration(), Some(record.owner()))?
            }
            Caller::Provider(name) => self.providers.is_platform_allowed(name, record.platform()),
        };
        if visible {
            Ok(())
        } else {
            log::debug!(
                "{} {} hidden from {}",
                T::KIND,
                record.record_id(),
                caller.name()
            );
            Err(CoreError::NotFound {
                kind: T::KIND,
                id: record.record_id(),
            })
        }
    }

    /// Owner or administrator, after the record is known to be visible.
    pub(crate) fn check_owner_or_admin<T: Scoped>(
        &self,
        principal: &Principal,
        record: &T,
        action: &str,
    ) -> crate::Result<()> {
        if principal.username == record.owner() || principal.is_admin() {
            Ok(())
        } else {
            log::warn!(
                "User {} denied to {action} {} {}",
                principal.username,
                T::KIND,
                record.record_id()
            );
            Err(CoreError::forbidden(format!(
                "Only the owner or an administrator can {action} {} {}",
                T::KIND,
                record.record_id()
            )))
        }
    }

    /// Narrows a listing to what the caller may see.
    ///
    /// Administrators are not restricted. Other users listing explicit collaborations must be
    /// able to view each of them; without a collaboration filter they get their own records,
    /// or records of their collaborations when asking about another owner. Providers only
    /// list their own platforms.
    pub(crate) fn restrict_listing(&self, caller: &Caller, scope: ListScope) -> crate::Result<()> {
        match caller {
            Caller::User(principal) if principal.is_admin() => {}
            Caller::User(principal) => {
                if let Some(collaborations) = scope.collaborations.as_ref() {
                    for collaboration in collaborations {
                        if !can_view(principal, collaboration, &self.identity)? {
                            return Err(CoreError::not_found("collaboration", collaboration));
                        }
                    }
                } else if scope
                    .owner
                    .as_deref()
                    .is_some_and(|owner| owner != principal.username)
                {
                    let mut collaborations: Vec<String> =
                        collabs_for(principal, &Role::ALL).into_iter().collect();
                    collaborations.sort();
                    *scope.collaborations = Some(collaborations);
                } else {
                    *scope.owner = Some(principal.username.clone());
                }
            }
            Caller::Provider(name) => {
                let allowed: Vec<String> = match scope.platforms.take() {
                    Some(requested) => requested
                        .into_iter()
                        .filter(|p| self.providers.is_platform_allowed(name, p))
                        .collect(),
                    None => self
                        .providers
                        .provider_platforms(name)
                        .map(|p| p.to_string())
                        .collect(),
                };
                *scope.platforms = Some(allowed);
            }
        }
        Ok(())
    }
}
