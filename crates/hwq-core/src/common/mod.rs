#[macro_use]
pub(crate) mod macros;

pub(crate) mod data_structures;
pub mod error;
pub mod ids;

pub use data_structures::{Map, Set};
