pub mod evaluator;
pub mod identity;
pub mod principal;
pub mod provider;

pub use evaluator::{can_edit, can_view, collabs_for, is_admin};
pub use identity::{authenticate, Caller, Credential, IdentityResolver};
pub use principal::{Membership, Principal, Role, ADMIN_COLLABORATION};
pub use provider::{ProviderEntry, ProviderName, ProviderTable};
