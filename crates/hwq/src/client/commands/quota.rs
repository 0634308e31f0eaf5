use clap::Parser;

use hwq_core::model::QuotaUpdate;
use hwq_core::{ProjectId, QuotaId};

use crate::client::context::ClientContext;
use crate::client::globalsettings::GlobalSettings;

#[derive(Parser)]
pub struct QuotaAddOpts {
    /// ID of an accepted project
    pub project_id: ProjectId,

    /// Platform of the allocation
    pub platform: String,

    /// Size of the allocation, in the unit of the platform
    pub limit: f64,
}

#[derive(Parser)]
pub struct QuotaListOpts {
    /// ID of the project
    pub project_id: ProjectId,
}

#[derive(Parser)]
pub struct QuotaSetOpts {
    /// ID of the quota
    pub quota_id: QuotaId,

    /// New size of the allocation
    #[arg(long)]
    pub limit: Option<f64>,

    /// Corrected consumed amount
    #[arg(long)]
    pub usage: Option<f64>,
}

#[derive(Parser)]
pub struct QuotaIdOpts {
    /// ID of the quota
    pub quota_id: QuotaId,
}

pub fn add_quota(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: QuotaAddOpts,
) -> anyhow::Result<()> {
    let quota = context.core().create_quota(
        context.caller(),
        opts.project_id,
        &opts.platform,
        opts.limit,
    )?;
    gsettings.printer().print_quota(quota);
    Ok(())
}

pub fn list_quotas(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: QuotaListOpts,
) -> anyhow::Result<()> {
    let quotas = context
        .core()
        .list_quotas(context.caller(), opts.project_id)?;
    gsettings.printer().print_quota_list(quotas);
    Ok(())
}

pub fn set_quota(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: QuotaSetOpts,
) -> anyhow::Result<()> {
    let update = QuotaUpdate {
        limit: opts.limit,
        usage: opts.usage,
    };
    let quota = context
        .core()
        .update_quota(context.caller(), opts.quota_id, update)?;
    gsettings.printer().print_quota(quota);
    Ok(())
}

pub fn delete_quota(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: QuotaIdOpts,
) -> anyhow::Result<()> {
    context
        .core()
        .delete_quota(context.caller(), opts.quota_id)?;
    gsettings
        .printer()
        .print_done(&format!("Quota {} was deleted", opts.quota_id));
    Ok(())
}
