use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::error::CoreError;
use crate::model::usage::ResourceUsage;
use crate::SessionId;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Finished,
    Error,
    Removed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Finished => "finished",
            SessionStatus::Error => "error",
            SessionStatus::Removed => "removed",
        }
    }

    pub fn check_close(&self, next: SessionStatus) -> crate::Result<()> {
        match (self, next) {
            (SessionStatus::Running, SessionStatus::Finished | SessionStatus::Error) => Ok(()),
            _ => Err(CoreError::InvalidTransition {
                kind: "session",
                from: self.to_string(),
                to: next.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "running" => SessionStatus::Running,
            "finished" => SessionStatus::Finished,
            "error" => SessionStatus::Error,
            "removed" => SessionStatus::Removed,
            _ => {
                return Err(CoreError::Validation(format!(
                    "Unknown session status '{s}'"
                )));
            }
        })
    }
}

/// Interactive use of a hardware platform, opened and closed by its provider.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    /// Assigned by the record store on insertion.
    pub id: SessionId,
    pub collaboration: String,
    pub owner: String,
    pub hardware_platform: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Cumulative usage of the whole session.
    pub resource_usage: ResourceUsage,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionDraft {
    pub collaboration: String,
    pub owner: String,
    pub hardware_platform: String,
}
