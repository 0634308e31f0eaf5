//! Engine of the hardware queue: who may do what, how jobs and sessions move through their
//! lifecycles, and how their usage is charged against project quotas.
//!
//! The engine keeps no state between calls. Everything lives in a [`store::RecordStore`];
//! identities come from an [`auth::IdentityResolver`].

#[macro_use]
pub(crate) mod common;

pub mod auth;
pub mod ledger;
pub mod model;
pub mod queue;
pub mod store;

#[cfg(test)]
pub(crate) mod tests;

pub use crate::common::error::CoreError;
pub use crate::common::ids::{CommentId, JobId, ProjectId, QuotaId, SessionId};
pub use crate::common::{Map, Set};

pub type Error = CoreError;
pub type Result<T> = std::result::Result<T, Error>;
