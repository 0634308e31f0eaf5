use chrono::Utc;

use crate::auth::{Caller, IdentityResolver};
use crate::common::error::{validation_error, CoreError};
use crate::model::{ProjectStatus, Quota, QuotaUpdate};
use crate::queue::projects::load_project;
use crate::queue::QueueCore;
use crate::store::{QuotaQuery, RecordStore, StoreTx};
use crate::{ProjectId, QuotaId};

fn load_quota(tx: &dyn StoreTx, quota_id: QuotaId) -> crate::Result<Quota> {
    tx.get_quota(quota_id)?
        .ok_or_else(|| CoreError::not_found("quota", quota_id))
}

fn check_amount(name: &str, value: f64) -> crate::Result<()> {
    if !value.is_finite() || value < 0.0 {
        return validation_error(format!(
            "Quota {name} must be a finite non-negative number, got {value}"
        ));
    }
    Ok(())
}

impl<S: RecordStore, R: IdentityResolver> QueueCore<S, R> {
    /// Grants an allocation on `platform` to an accepted project. The quota is denominated in
    /// the platform's canonical unit.
    pub fn create_quota(
        &self,
        caller: &Caller,
        project_id: ProjectId,
        platform: &str,
        limit: f64,
    ) -> crate::Result<Quota> {
        let principal = caller.as_user()?;
        check_amount("limit", limit)?;
        let units = self.ledger.platforms().require(platform)?.to_string();
        let quota = self.store.transaction(|tx| {
            let project = self.load_project_as_admin(&*tx, principal, project_id, "grant quota to")?;
            if project.status() != ProjectStatus::Accepted {
                return validation_error(format!(
                    "Quotas can only be granted to accepted projects, project {project_id} is {}",
                    project.status()
                ));
            }
            let mut quota = Quota {
                id: QuotaId::default(),
                project_id,
                platform: platform.to_string(),
                units,
                limit,
                usage: 0.0,
                created_at: Utc::now(),
            };
            quota.id = tx.insert_quota(quota.clone())?;
            Ok(quota)
        })?;
        log::info!(
            "Quota {} of {} {} on {platform} granted to project {project_id}",
            quota.id,
            quota.limit,
            quota.units
        );
        Ok(quota)
    }

    pub fn list_quotas(&self, caller: &Caller, project_id: ProjectId) -> crate::Result<Vec<Quota>> {
        let principal = caller.as_user()?;
        let (project, quotas) = self.store.read(|tx| {
            let project = load_project(tx, project_id)?;
            let quotas = tx.query_quotas(&QuotaQuery {
                project_ids: Some(vec![project_id]),
                platform: None,
            })?;
            Ok((project, quotas))
        })?;
        self.check_project_visible(principal, &project)?;
        Ok(quotas)
    }

    /// Administrative correction of a quota's limit or usage.
    pub fn update_quota(
        &self,
        caller: &Caller,
        quota_id: QuotaId,
        update: QuotaUpdate,
    ) -> crate::Result<Quota> {
        let principal = caller.as_user()?;
        self.store.transaction(|tx| {
            let mut quota = load_quota(&*tx, quota_id)?;
            self.load_project_as_admin(&*tx, principal, quota.project_id, "change quotas of")
                .map_err(|error| match error {
                    CoreError::NotFound { .. } => CoreError::not_found("quota", quota_id),
                    error => error,
                })?;
            if let Some(limit) = update.limit {
                check_amount("limit", limit)?;
                quota.limit = limit;
            }
            if let Some(usage) = update.usage {
                check_amount("usage", usage)?;
                quota.usage = usage;
            }
            if quota.usage > quota.limit {
                return validation_error(format!(
                    "Quota usage {} cannot exceed its limit {}",
                    quota.usage, quota.limit
                ));
            }
            tx.update_quota(&quota)?;
            log::info!(
                "Quota {quota_id} set to {}/{} {} by {}",
                quota.usage,
                quota.limit,
                quota.units,
                principal.username
            );
            Ok(quota)
        })
    }

    pub fn delete_quota(&self, caller: &Caller, quota_id: QuotaId) -> crate::Result<()> {
        let principal = caller.as_user()?;
        self.store.transaction(|tx| {
            let quota = load_quota(&*tx, quota_id)?;
            self.load_project_as_admin(&*tx, principal, quota.project_id, "change quotas of")
                .map_err(|error| match error {
                    CoreError::NotFound { .. } => CoreError::not_found("quota", quota_id),
                    error => error,
                })?;
            tx.delete_quota(quota_id)?;
            log::info!("Quota {quota_id} deleted by {}", principal.username);
            Ok(())
        })
    }
}
