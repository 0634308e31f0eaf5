use chrono::{DateTime, Utc};
use derive_builder::Builder;

use crate::model::{Job, JobStatus, Project, Quota};
use crate::{JobId, ProjectId, QuotaId};

pub struct JobBuilder {
    id: JobId,
    collaboration: String,
    owner: String,
    platform: String,
    status: JobStatus,
    submitted_at: DateTime<Utc>,
}

impl Default for JobBuilder {
    fn default() -> Self {
        Self {
            id: JobId::new(0),
            collaboration: "neuro".to_string(),
            owner: "alice".to_string(),
            platform: "SpiNNaker".to_string(),
            status: JobStatus::Submitted,
            submitted_at: Utc::now(),
        }
    }
}

impl JobBuilder {
    pub fn id(mut self, id: u64) -> Self {
        self.id = JobId::new(id);
        self
    }

    pub fn collaboration(mut self, collaboration: &str) -> Self {
        self.collaboration = collaboration.to_string();
        self
    }

    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = owner.to_string();
        self
    }

    pub fn platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    pub fn submitted_at(mut self, submitted_at: DateTime<Utc>) -> Self {
        self.submitted_at = submitted_at;
        self
    }

    pub fn build(self) -> Job {
        Job {
            id: self.id,
            collaboration: self.collaboration,
            owner: self.owner,
            hardware_platform: self.platform,
            status: self.status,
            submitted_at: self.submitted_at,
            completed_at: None,
            resource_usage: None,
            code: "import pyNN.spiNNaker as sim".to_string(),
            command: None,
            hardware_config: None,
            input_data: Vec::new(),
            output_data: Vec::new(),
            provenance: None,
        }
    }
}

#[derive(Builder)]
#[builder(pattern = "owned", build_fn(name = "finish"))]
pub struct QuotaConfig {
    #[builder(default)]
    project: ProjectId,
    #[builder(default = "\"SpiNNaker\".to_string()")]
    hardware_platform: String,
    #[builder(default = "\"core-hours\".to_string()")]
    units: String,
    limit: f64,
    #[builder(default)]
    usage: f64,
    // Equal timestamps leave the insertion order as the tie-break
    #[builder(default = "DateTime::UNIX_EPOCH")]
    created_at: DateTime<Utc>,
}

pub use QuotaConfigBuilder as QuotaBuilder;

impl QuotaConfigBuilder {
    pub fn new(limit: f64) -> Self {
        Self::default().limit(limit)
    }

    pub fn platform(self, platform: &str, units: &str) -> Self {
        self.hardware_platform(platform.to_string())
            .units(units.to_string())
    }

    pub fn build(self) -> Quota {
        let config = self.finish().unwrap();
        Quota {
            id: QuotaId::new(0),
            project_id: config.project,
            platform: config.hardware_platform,
            units: config.units,
            limit: config.limit,
            usage: config.usage,
            created_at: config.created_at,
        }
    }
}

/// SpiNNaker quota of `project`.
pub fn quota(project_id: ProjectId, limit: f64, usage: f64) -> Quota {
    QuotaBuilder::new(limit)
        .usage(usage)
        .project(project_id)
        .build()
}

pub fn accepted_project(collaboration: &str) -> Project {
    let now = Utc::now();
    Project {
        id: ProjectId::new(0),
        collaboration: collaboration.to_string(),
        owner: "alice".to_string(),
        title: "Cortical microcircuit".to_string(),
        abstract_: String::new(),
        description: String::new(),
        submission_date: Some(now),
        decision_date: Some(now),
        accepted: true,
    }
}
