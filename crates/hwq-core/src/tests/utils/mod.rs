pub mod builders;
pub mod directory;
pub mod env;
pub mod store;

pub use builders::{accepted_project, quota, JobBuilder, QuotaBuilder};
pub use directory::StaticDirectory;
