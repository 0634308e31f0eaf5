use clap::Parser;

use hwq_core::model::ResourceUsage;
use hwq_core::store::Pagination;

use crate::client::context::ClientContext;

pub mod job;
pub mod project;
pub mod provider;
pub mod quota;
pub mod session;

#[derive(Parser)]
pub struct PageOpts {
    /// Skips the first N records
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Shows at most N records
    #[arg(long)]
    pub limit: Option<usize>,
}

impl From<PageOpts> for Pagination {
    fn from(opts: PageOpts) -> Self {
        Pagination::new(opts.offset, opts.limit)
    }
}

pub(crate) fn parse_json(text: &str) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(text).map_err(|e| anyhow::anyhow!("Invalid JSON document: {e}"))
}

/// Empty lists on the command line mean "no filter".
pub(crate) fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() { None } else { Some(values) }
}

/// Usage tagged with `units`, or with the canonical unit of `platform` when none was given.
pub(crate) fn usage_in_units(
    context: &ClientContext,
    platform: &str,
    value: f64,
    units: Option<String>,
) -> anyhow::Result<ResourceUsage> {
    let units = match units {
        Some(units) => units,
        None => context
            .core()
            .ledger()
            .platforms()
            .require(platform)?
            .to_string(),
    };
    Ok(ResourceUsage::new(value, units))
}
