use chrono::Utc;

use crate::auth::{can_edit, collabs_for, Caller, IdentityResolver, Principal, Role};
use crate::common::error::CoreError;
use crate::model::{Project, ProjectDraft, ProjectStatus, ProjectUpdate};
use crate::queue::QueueCore;
use crate::store::{ProjectQuery, QuotaQuery, RecordStore, StoreTx};
use crate::ProjectId;

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub collaboration: Option<String>,
    pub status: Option<ProjectStatus>,
}

pub(crate) fn load_project(tx: &dyn StoreTx, project_id: ProjectId) -> crate::Result<Project> {
    tx.get_project(project_id)?
        .ok_or_else(|| CoreError::not_found("project", project_id))
}

impl<S: RecordStore, R: IdentityResolver> QueueCore<S, R> {
    pub(crate) fn check_project_visible(
        &self,
        principal: &Principal,
        project: &Project,
    ) -> crate::Result<()> {
        if self.user_can_view(principal, &project.collaboration, Some(&project.owner))? {
            Ok(())
        } else {
            Err(CoreError::not_found("project", project.id))
        }
    }

    /// Loads a project the caller can see and fails with `Forbidden` unless it is an
    /// administrator.
    pub(crate) fn load_project_as_admin(
        &self,
        tx: &dyn StoreTx,
        principal: &Principal,
        project_id: ProjectId,
        action: &str,
    ) -> crate::Result<Project> {
        let project = load_project(tx, project_id)?;
        self.check_project_visible(principal, &project)?;
        if !principal.is_admin() {
            log::warn!(
                "User {} denied to {action} project {project_id}",
                principal.username
            );
            return Err(CoreError::forbidden(format!(
                "Only administrators can {action} project {project_id}"
            )));
        }
        Ok(project)
    }

    pub fn create_project(&self, caller: &Caller, draft: ProjectDraft) -> crate::Result<Project> {
        let principal = caller.as_user()?;
        if draft.title.trim().is_empty() {
            return crate::common::error::validation_error(
                "Project title cannot be empty".to_string(),
            );
        }
        if !can_edit(principal, &draft.collaboration) {
            return Err(CoreError::forbidden(format!(
                "User '{}' cannot create projects in collaboration '{}'",
                principal.username, draft.collaboration
            )));
        }
        let mut project = Project {
            id: ProjectId::default(),
            collaboration: draft.collaboration,
            owner: principal.username.clone(),
            title: draft.title,
            abstract_: draft.abstract_,
            description: draft.description,
            submission_date: draft.submit.then(Utc::now),
            decision_date: None,
            accepted: false,
        };
        project.id = self
            .store
            .transaction(|tx| tx.insert_project(project.clone()))?;
        log::info!(
            "Project {} created by {} in collaboration {} ({})",
            project.id,
            project.owner,
            project.collaboration,
            project.status()
        );
        Ok(project)
    }

    pub fn get_project(&self, caller: &Caller, project_id: ProjectId) -> crate::Result<Project> {
        let principal = caller.as_user()?;
        let project = self.store.read(|tx| load_project(tx, project_id))?;
        self.check_project_visible(principal, &project)?;
        Ok(project)
    }

    pub fn list_projects(
        &self,
        caller: &Caller,
        filter: ProjectFilter,
    ) -> crate::Result<Vec<Project>> {
        let principal = caller.as_user()?;
        let collaborations = match filter.collaboration {
            Some(collaboration) => {
                if !self.user_can_view(principal, &collaboration, None)? {
                    return Err(CoreError::not_found("collaboration", collaboration));
                }
                Some(vec![collaboration])
            }
            None if principal.is_admin() => None,
            None => Some(collabs_for(principal, &Role::ALL).into_iter().collect()),
        };
        let query = ProjectQuery {
            collaborations,
            accepted: None,
        };
        let projects = self.store.read(|tx| tx.query_projects(&query))?;
        Ok(projects
            .into_iter()
            .filter(|p| filter.status.is_none_or(|status| p.status() == status))
            .collect())
    }

    /// Editors change projects still in preparation; administrators change any project.
    pub fn update_project(
        &self,
        caller: &Caller,
        project_id: ProjectId,
        update: ProjectUpdate,
    ) -> crate::Result<Project> {
        let principal = caller.as_user()?;
        self.store.transaction(|tx| {
            let mut project = load_project(&*tx, project_id)?;
            self.check_project_visible(principal, &project)?;
            if !principal.is_admin() {
                if !can_edit(principal, &project.collaboration) {
                    return Err(CoreError::forbidden(format!(
                        "User '{}' cannot edit project {project_id}",
                        principal.username
                    )));
                }
                if project.status() != ProjectStatus::InPreparation {
                    return Err(CoreError::forbidden(format!(
                        "Project {project_id} is {} and can no longer be edited",
                        project.status()
                    )));
                }
            }
            if let Some(title) = update.title {
                if title.trim().is_empty() {
                    return crate::common::error::validation_error(
                        "Project title cannot be empty".to_string(),
                    );
                }
                project.title = title;
            }
            if let Some(abstract_) = update.abstract_ {
                project.abstract_ = abstract_;
            }
            if let Some(description) = update.description {
                project.description = description;
            }
            if update.submit && project.submission_date.is_none() {
                project.submission_date = Some(Utc::now());
                log::info!("Project {project_id} submitted for review");
            }
            tx.update_project(&project)?;
            Ok(project)
        })
    }

    /// Accepts or rejects a project under review.
    pub fn decide_project(
        &self,
        caller: &Caller,
        project_id: ProjectId,
        accepted: bool,
    ) -> crate::Result<Project> {
        let principal = caller.as_user()?;
        let project = self.store.transaction(|tx| {
            let mut project = self.load_project_as_admin(&*tx, principal, project_id, "decide")?;
            let status = project.status();
            if status != ProjectStatus::UnderReview {
                return Err(CoreError::InvalidTransition {
                    kind: "project",
                    from: status.to_string(),
                    to: if accepted {
                        ProjectStatus::Accepted
                    } else {
                        ProjectStatus::Rejected
                    }
                    .to_string(),
                });
            }
            project.accepted = accepted;
            project.decision_date = Some(Utc::now());
            tx.update_project(&project)?;
            Ok(project)
        })?;
        log::info!(
            "Project {project_id} {} by {}",
            project.status(),
            principal.username
        );
        Ok(project)
    }

    /// Deletes a project together with its quotas.
    pub fn delete_project(&self, caller: &Caller, project_id: ProjectId) -> crate::Result<()> {
        let principal = caller.as_user()?;
        self.store.transaction(|tx| {
            self.load_project_as_admin(&*tx, principal, project_id, "delete")?;
            let quotas = tx.query_quotas(&QuotaQuery {
                project_ids: Some(vec![project_id]),
                platform: None,
            })?;
            for quota in &quotas {
                tx.delete_quota(quota.id)?;
            }
            tx.delete_project(project_id)?;
            log::info!(
                "Project {project_id} deleted by {} with {} quota(s)",
                principal.username,
                quotas.len()
            );
            Ok(())
        })
    }
}
