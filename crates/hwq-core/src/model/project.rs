use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProjectId;

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    InPreparation,
    UnderReview,
    Accepted,
    Rejected,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::InPreparation => "in_preparation",
            ProjectStatus::UnderReview => "under_review",
            ProjectStatus::Accepted => "accepted",
            ProjectStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "in_preparation" => ProjectStatus::InPreparation,
            "under_review" => ProjectStatus::UnderReview,
            "accepted" => ProjectStatus::Accepted,
            "rejected" => ProjectStatus::Rejected,
            _ => {
                return crate::common::error::validation_error(format!(
                    "Unknown project status '{s}'"
                ));
            }
        })
    }
}

/// A request for resources on behalf of one collaboration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    /// Assigned by the record store on insertion.
    pub id: ProjectId,
    pub collaboration: String,
    pub owner: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_: String,
    pub description: String,
    pub submission_date: Option<DateTime<Utc>>,
    pub decision_date: Option<DateTime<Utc>>,
    pub accepted: bool,
}

impl Project {
    /// The status is never stored, it is always derived from the dates and the decision.
    pub fn status(&self) -> ProjectStatus {
        if self.submission_date.is_none() {
            ProjectStatus::InPreparation
        } else if self.accepted {
            ProjectStatus::Accepted
        } else if self.decision_date.is_none() {
            ProjectStatus::UnderReview
        } else {
            ProjectStatus::Rejected
        }
    }
}

/// Fields supplied by a caller when creating a project.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ProjectDraft {
    pub collaboration: String,
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub submit: bool,
}

/// Partial modification of a project. `submit` moves the project under review.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub submit: bool,
}

#[cfg(test)]
mod tests {
    use super::{Project, ProjectStatus};
    use chrono::Utc;

    fn project() -> Project {
        Project {
            id: 1.into(),
            collaboration: "neuro".into(),
            owner: "alice".into(),
            title: "t".into(),
            abstract_: String::new(),
            description: String::new(),
            submission_date: None,
            decision_date: None,
            accepted: false,
        }
    }

    #[test]
    fn test_derived_status() {
        let mut p = project();
        assert_eq!(p.status(), ProjectStatus::InPreparation);

        p.submission_date = Some(Utc::now());
        assert_eq!(p.status(), ProjectStatus::UnderReview);

        p.decision_date = Some(Utc::now());
        assert_eq!(p.status(), ProjectStatus::Rejected);

        p.accepted = true;
        assert_eq!(p.status(), ProjectStatus::Accepted);
    }

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in [
            ProjectStatus::InPreparation,
            ProjectStatus::UnderReview,
            ProjectStatus::Accepted,
            ProjectStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), status);
        }
        assert!("approved".parse::<ProjectStatus>().is_err());
    }
}
