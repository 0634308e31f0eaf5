use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::error::CoreError;
use crate::model::usage::ResourceUsage;
use crate::JobId;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    Validated,
    Running,
    Mapped,
    Finished,
    Error,
    Removed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Validated => "validated",
            JobStatus::Running => "running",
            JobStatus::Mapped => "mapped",
            JobStatus::Finished => "finished",
            JobStatus::Error => "error",
            JobStatus::Removed => "removed",
        }
    }

    /// Finished, failed and removed jobs never run again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Error | JobStatus::Removed
        )
    }

    /// Reports a completion timestamp when entering this state.
    pub fn is_completion(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Error)
    }

    /// Transitions a provider may drive. Removal is reserved to the owner and administrators.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Submitted, Validated | Running | Error)
                | (Validated, Running | Error)
                | (Running, Mapped | Finished | Error)
                | (Mapped, Finished | Error)
        )
    }

    pub fn check_transition(&self, next: JobStatus) -> crate::Result<()> {
        if *self == next || self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                kind: "job",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "submitted" => JobStatus::Submitted,
            "validated" => JobStatus::Validated,
            "running" => JobStatus::Running,
            "mapped" => JobStatus::Mapped,
            "finished" => JobStatus::Finished,
            "error" => JobStatus::Error,
            "removed" => JobStatus::Removed,
            _ => return Err(CoreError::Validation(format!("Unknown job status '{s}'"))),
        })
    }
}

/// Reference to an input or output file of a job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DataItem {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl DataItem {
    pub fn new<T: Into<String>>(url: T) -> Self {
        Self {
            url: url.into(),
            hash: None,
            size: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Job {
    /// Assigned by the record store on insertion.
    pub id: JobId,
    pub collaboration: String,
    pub owner: String,
    pub hardware_platform: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub resource_usage: Option<ResourceUsage>,

    // Payload, not interpreted by the lifecycle.
    pub code: String,
    pub command: Option<String>,
    pub hardware_config: Option<serde_json::Value>,
    pub input_data: Vec<DataItem>,
    pub output_data: Vec<DataItem>,
    pub provenance: Option<serde_json::Value>,
}

/// Fields supplied by a user when submitting a job.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct JobDraft {
    pub collaboration: String,
    pub hardware_platform: String,
    pub code: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub hardware_config: Option<serde_json::Value>,
    #[serde(default)]
    pub input_data: Vec<DataItem>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A provider report about a job. Every field is optional; absent fields are left untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub output_data: Option<Vec<DataItem>>,
    pub provenance: Option<serde_json::Value>,
    pub log: Option<String>,
    pub resource_usage: Option<ResourceUsage>,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RemoveMode {
    /// Marks the job as `removed`, the record is kept.
    Soft,
    /// Deletes the job together with its tags, comments, log and data links.
    Hard,
}
