//! Quota accounting: which allocations apply to a collaboration on a platform, whether a new
//! job or session may be admitted, and how consumed usage is spread over the allocations.

use serde::{Deserialize, Serialize};

use crate::common::error::CoreError;
use crate::model::{PlatformTable, Quota, ResourceUsage};
use crate::store::{ProjectQuery, QuotaQuery, StoreTx};
use crate::QuotaId;

/// Priority order in which the quotas of a collaboration are consumed.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum QuotaOrder {
    /// Oldest quota first, ties broken by id.
    #[default]
    CreationTime,
    /// Projects in store order, then the quotas of each project in store order.
    StoreOrder,
}

/// What happens to usage that does not fit into the remaining capacity of any quota.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// The excess is not billed anywhere; it is logged and reported in the receipt.
    #[default]
    Drop,
    /// The whole debit fails with `QuotaExhausted` and nothing is charged.
    Reject,
    /// The excess is added to the last quota, which may then exceed its limit.
    ChargeLast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCharge {
    /// Position in the ordered quota list.
    pub index: usize,
    pub amount: f64,
    pub new_usage: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DebitPlan {
    pub charges: Vec<PlannedCharge>,
    pub uncharged: f64,
}

/// Walks `quotas` in order, skipping exhausted ones. A quota that can absorb the rest of the
/// amount is the last one touched; every quota before it is filled up to its limit.
pub fn plan_debit(quotas: &[Quota], amount: f64) -> DebitPlan {
    let mut plan = DebitPlan::default();
    let mut amount = amount;
    for (index, quota) in quotas.iter().enumerate() {
        if amount <= 0.0 {
            break;
        }
        let remaining = quota.remaining();
        if remaining <= 0.0 {
            continue;
        }
        if amount <= remaining {
            plan.charges.push(PlannedCharge {
                index,
                amount,
                // `remaining` is rounded, so the sum may land one ulp above the limit
                new_usage: (quota.usage + amount).min(quota.limit),
            });
            amount = 0.0;
        } else {
            plan.charges.push(PlannedCharge {
                index,
                amount: remaining,
                new_usage: quota.limit,
            });
            amount -= remaining;
        }
    }
    plan.uncharged = amount.max(0.0);
    plan
}

/// True if at least one quota still has capacity left.
pub fn has_capacity(quotas: &[Quota]) -> bool {
    quotas.iter().any(|q| q.usage < q.limit)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Charge {
    pub quota_id: QuotaId,
    pub amount: f64,
}

/// Outcome of a debit that was applied.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DebitReceipt {
    pub charges: Vec<Charge>,
    /// Usage that could not be billed to any quota.
    pub uncharged: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    platforms: PlatformTable,
    order: QuotaOrder,
    overflow: OverflowPolicy,
}

impl Ledger {
    pub fn new(platforms: PlatformTable, order: QuotaOrder, overflow: OverflowPolicy) -> Self {
        Self {
            platforms,
            order,
            overflow,
        }
    }

    pub fn platforms(&self) -> &PlatformTable {
        &self.platforms
    }

    pub fn order(&self) -> QuotaOrder {
        self.order
    }

    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }

    /// Quotas of accepted projects of `collaboration` on `platform`, in consumption order.
    pub fn available_quotas(
        &self,
        tx: &dyn StoreTx,
        collaboration: &str,
        platform: &str,
    ) -> crate::Result<Vec<Quota>> {
        let projects = tx.query_projects(&ProjectQuery {
            collaborations: Some(vec![collaboration.to_string()]),
            accepted: Some(true),
        })?;
        let mut quotas = Vec::new();
        for project in &projects {
            quotas.extend(tx.query_quotas(&QuotaQuery {
                project_ids: Some(vec![project.id]),
                platform: Some(platform.to_string()),
            })?);
        }
        match self.order {
            QuotaOrder::CreationTime => quotas.sort_by_key(|q| (q.created_at, q.id)),
            QuotaOrder::StoreOrder => {}
        }
        Ok(quotas)
    }

    /// Coarse admission check: some capacity exists. The eventual usage is unknown here.
    pub fn can_admit(
        &self,
        tx: &dyn StoreTx,
        collaboration: &str,
        platform: &str,
    ) -> crate::Result<bool> {
        Ok(has_capacity(
            &self.available_quotas(tx, collaboration, platform)?,
        ))
    }

    pub fn check_admission(
        &self,
        tx: &dyn StoreTx,
        collaboration: &str,
        platform: &str,
    ) -> crate::Result<()> {
        if self.can_admit(tx, collaboration, platform)? {
            Ok(())
        } else {
            log::info!(
                "Admission denied: no remaining quota for collaboration {collaboration} on {platform}"
            );
            Err(CoreError::QuotaExhausted {
                collaboration: collaboration.to_string(),
                platform: platform.to_string(),
            })
        }
    }

    /// Charges `usage` to the quotas of `collaboration` on `platform`.
    ///
    /// Must run inside a record store transaction: on error nothing is written by the ledger,
    /// and the caller's transaction is expected to discard its own writes as well.
    pub fn debit(
        &self,
        tx: &mut dyn StoreTx,
        collaboration: &str,
        platform: &str,
        usage: &ResourceUsage,
    ) -> crate::Result<DebitReceipt> {
        self.platforms.check_units(platform, &usage.units)?;
        usage.validate()?;
        if usage.value == 0.0 {
            return Ok(DebitReceipt::default());
        }

        let mut quotas = self.available_quotas(&*tx, collaboration, platform)?;
        let mut plan = plan_debit(&quotas, usage.value);

        if plan.uncharged > 0.0 {
            match self.overflow {
                OverflowPolicy::Drop => {
                    log::warn!(
                        "{} {} of usage by collaboration {collaboration} on {platform} exceed all quotas and are not billed",
                        plan.uncharged,
                        usage.units
                    );
                }
                OverflowPolicy::Reject => {
                    log::info!(
                        "Debit of {} {} rejected for collaboration {collaboration} on {platform}: insufficient quota",
                        usage.value,
                        usage.units
                    );
                    return Err(CoreError::QuotaExhausted {
                        collaboration: collaboration.to_string(),
                        platform: platform.to_string(),
                    });
                }
                OverflowPolicy::ChargeLast => {
                    if let Some(last) = quotas.len().checked_sub(1) {
                        charge_last(&mut plan, &quotas, last);
                    } else {
                        log::warn!(
                            "Collaboration {collaboration} has no quota on {platform}, {} {} are not billed",
                            plan.uncharged,
                            usage.units
                        );
                    }
                }
            }
        }

        let mut receipt = DebitReceipt {
            charges: Vec::with_capacity(plan.charges.len()),
            uncharged: plan.uncharged,
        };
        for charge in &plan.charges {
            let quota = &mut quotas[charge.index];
            quota.usage = charge.new_usage;
            tx.update_quota(quota)?;
            log::debug!(
                "Charged {} {} to quota {} ({}/{})",
                charge.amount,
                usage.units,
                quota.id,
                quota.usage,
                quota.limit
            );
            receipt.charges.push(Charge {
                quota_id: quota.id,
                amount: charge.amount,
            });
        }
        log::info!(
            "Debited {} {} from collaboration {collaboration} on {platform} across {} quota(s)",
            usage.value - receipt.uncharged,
            usage.units,
            receipt.charges.len()
        );
        Ok(receipt)
    }
}

fn charge_last(plan: &mut DebitPlan, quotas: &[Quota], last: usize) {
    let excess = plan.uncharged;
    match plan.charges.iter_mut().find(|c| c.index == last) {
        Some(charge) => {
            charge.amount += excess;
            charge.new_usage += excess;
        }
        None => plan.charges.push(PlannedCharge {
            index: last,
            amount: excess,
            new_usage: quotas[last].usage + excess,
        }),
    }
    plan.uncharged = 0.0;
}
