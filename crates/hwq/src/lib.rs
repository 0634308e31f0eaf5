pub mod client;
pub mod common;
pub mod config;
pub mod identity;
pub mod storage;

#[cfg(test)]
pub(crate) mod tests;

pub use hwq_core::{JobId, ProjectId, QuotaId, SessionId};

pub type Error = crate::common::error::HwqError;
pub type Result<T> = std::result::Result<T, Error>;

pub const HWQ_VERSION: &str = env!("CARGO_PKG_VERSION");
