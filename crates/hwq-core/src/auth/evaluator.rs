//! Decisions about what a principal may see or change.
//!
//! Administrators of the platform pass every collaboration check.

use crate::auth::identity::IdentityResolver;
use crate::auth::principal::{Principal, Role};
use crate::common::Set;

pub fn is_admin(principal: &Principal) -> bool {
    principal.is_admin()
}

/// Membership-only part of [`can_view`], no directory lookup involved.
pub fn is_member(principal: &Principal, collaboration: &str) -> bool {
    collaboration == principal.private_collaboration()
        || principal.has_role(collaboration, &Role::ALL)
        || is_admin(principal)
}

/// A principal can view its private collaboration, collaborations it is a member of in any
/// role, and collaborations the directory flags as public.
pub fn can_view<R: IdentityResolver + ?Sized>(
    principal: &Principal,
    collaboration: &str,
    directory: &R,
) -> crate::Result<bool> {
    if is_member(principal, collaboration) {
        return Ok(true);
    }
    directory.is_collab_public(collaboration)
}

pub fn can_edit(principal: &Principal, collaboration: &str) -> bool {
    collaboration == principal.private_collaboration()
        || principal.has_role(collaboration, &Role::EDITORS)
        || is_admin(principal)
}

/// Collaborations where the principal holds one of `roles`, always including its private one.
pub fn collabs_for(principal: &Principal, roles: &[Role]) -> Set<String> {
    let mut result: Set<String> = principal
        .memberships
        .iter()
        .filter(|m| roles.contains(&m.role))
        .map(|m| m.collaboration.clone())
        .collect();
    result.insert(principal.private_collaboration());
    result
}
