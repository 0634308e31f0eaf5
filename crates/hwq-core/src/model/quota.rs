use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ProjectId, QuotaId};

/// A bounded allocation of hardware time owned by an accepted project.
///
/// The ledger keeps `0 <= usage <= limit` unless the `ChargeLast` overflow policy is in use.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Quota {
    /// Assigned by the record store on insertion.
    pub id: QuotaId,
    pub project_id: ProjectId,
    pub platform: String,
    pub units: String,
    pub limit: f64,
    pub usage: f64,
    pub created_at: DateTime<Utc>,
}

impl Quota {
    #[inline]
    pub fn remaining(&self) -> f64 {
        self.limit - self.usage
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() <= 0.0
    }
}

/// Administrative correction of a quota.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct QuotaUpdate {
    pub limit: Option<f64>,
    pub usage: Option<f64>,
}
