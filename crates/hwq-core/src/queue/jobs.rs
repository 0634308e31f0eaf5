use chrono::Utc;

use crate::auth::{can_edit, Caller, IdentityResolver, Principal};
use crate::common::error::CoreError;
use crate::model::annotation::normalize_tags;
use crate::model::{Comment, Job, JobDraft, JobStatus, JobUpdate, RemoveMode};
use crate::queue::{ListScope, QueueCore, UpdateOutcome};
use crate::store::{JobQuery, Pagination, RecordStore, StoreTx};
use crate::{CommentId, JobId};

fn load_job(tx: &dyn StoreTx, job_id: JobId) -> crate::Result<Job> {
    tx.get_job(job_id)?
        .ok_or_else(|| CoreError::not_found("job", job_id))
}

impl<S: RecordStore, R: IdentityResolver> QueueCore<S, R> {
    /// Submits a new job. The caller must be able to edit the collaboration and the
    /// collaboration must have some quota left on the platform.
    pub fn create_job(&self, caller: &Caller, draft: JobDraft) -> crate::Result<Job> {
        let principal = caller.as_user()?;
        self.ledger.platforms().require(&draft.hardware_platform)?;
        if !can_edit(principal, &draft.collaboration) {
            log::warn!(
                "User {} cannot submit jobs to collaboration {}",
                principal.username,
                draft.collaboration
            );
            return Err(CoreError::forbidden(format!(
                "User '{}' cannot submit jobs to collaboration '{}'",
                principal.username, draft.collaboration
            )));
        }
        let tags = normalize_tags(&draft.tags)?;

        let job = self.store.transaction(|tx| {
            self.ledger
                .check_admission(&*tx, &draft.collaboration, &draft.hardware_platform)?;
            let mut job = Job {
                id: JobId::default(),
                collaboration: draft.collaboration,
                owner: principal.username.clone(),
                hardware_platform: draft.hardware_platform,
                status: JobStatus::Submitted,
                submitted_at: Utc::now(),
                completed_at: None,
                resource_usage: None,
                code: draft.code,
                command: draft.command,
                hardware_config: draft.hardware_config,
                input_data: draft.input_data,
                output_data: Vec::new(),
                provenance: None,
            };
            job.id = tx.insert_job(job.clone())?;
            if !tags.is_empty() {
                tx.set_tags(job.id, tags)?;
            }
            Ok(job)
        })?;
        log::info!(
            "Job {} submitted by {} to {} in collaboration {}",
            job.id,
            job.owner,
            job.hardware_platform,
            job.collaboration
        );
        Ok(job)
    }

    pub fn get_job(&self, caller: &Caller, job_id: JobId) -> crate::Result<Job> {
        let job = self.store.read(|tx| load_job(tx, job_id))?;
        self.check_visible(caller, &job)?;
        Ok(job)
    }

    /// Lists jobs visible to the caller. Removed jobs are only listed when their status is
    /// asked for explicitly.
    pub fn list_jobs(
        &self,
        caller: &Caller,
        mut query: JobQuery,
        page: Pagination,
    ) -> crate::Result<Vec<Job>> {
        self.restrict_listing(
            caller,
            ListScope {
                collaborations: &mut query.collaborations,
                owner: &mut query.owner,
                platforms: &mut query.platforms,
            },
        )?;
        if query.statuses.is_none() {
            query.statuses = Some(
                [
                    JobStatus::Submitted,
                    JobStatus::Validated,
                    JobStatus::Running,
                    JobStatus::Mapped,
                    JobStatus::Finished,
                    JobStatus::Error,
                ]
                .to_vec(),
            );
        }
        if !query.tags.is_empty() {
            query.tags = normalize_tags(&query.tags)?;
        }
        self.store.read(|tx| tx.query_jobs(&query, page))
    }

    /// Oldest submitted job waiting on `platform`.
    pub fn next_job(&self, caller: &Caller, platform: &str) -> crate::Result<Option<Job>> {
        let provider = caller.as_provider()?;
        self.providers.check_platform(provider, platform)?;
        let query = JobQuery {
            platforms: Some(vec![platform.to_string()]),
            statuses: Some(vec![JobStatus::Submitted]),
            ..Default::default()
        };
        let job = self
            .store
            .read(|tx| tx.query_jobs(&query, Pagination::new(0, Some(1))))?
            .into_iter()
            .next();
        if let Some(job) = &job {
            log::debug!("Provider {provider} picked job {} on {platform}", job.id);
        }
        Ok(job)
    }

    /// Applies a provider report. Reported usage is charged to the collaboration's quotas in
    /// the same transaction, so a failed debit leaves the job untouched.
    pub fn report_job_update(
        &self,
        caller: &Caller,
        job_id: JobId,
        update: JobUpdate,
    ) -> crate::Result<UpdateOutcome<Job>> {
        let provider = caller.as_provider()?;
        let outcome = self.store.transaction(|tx| {
            let mut job = load_job(&*tx, job_id)?;
            self.providers.check_platform(provider, &job.hardware_platform)?;

            if let Some(status) = update.status {
                if status == JobStatus::Removed {
                    return Err(CoreError::InvalidTransition {
                        kind: "job",
                        from: job.status.to_string(),
                        to: status.to_string(),
                    });
                }
                job.status.check_transition(status)?;
                if status != job.status {
                    log::debug!("Job {job_id}: {} -> {status}", job.status);
                    if status.is_completion() {
                        job.completed_at = Some(Utc::now());
                    }
                    job.status = status;
                }
            }
            if let Some(output_data) = update.output_data {
                job.output_data = output_data;
            }
            if let Some(provenance) = update.provenance {
                job.provenance = Some(provenance);
            }
            if let Some(log) = update.log {
                tx.set_log(job_id, log)?;
            }
            if let Some(usage) = &update.resource_usage {
                job.resource_usage = Some(usage.clone());
            }
            tx.update_job(&job)?;

            let debit = match &update.resource_usage {
                Some(usage) => Some(self.ledger.debit(
                    tx,
                    &job.collaboration,
                    &job.hardware_platform,
                    usage,
                )?),
                None => None,
            };
            Ok(UpdateOutcome { record: job, debit })
        })?;
        log::info!(
            "Provider {provider} updated job {job_id} (status {})",
            outcome.record.status
        );
        Ok(outcome)
    }

    pub fn append_log(&self, caller: &Caller, job_id: JobId, text: &str) -> crate::Result<()> {
        let provider = caller.as_provider()?;
        self.store.transaction(|tx| {
            let job = load_job(&*tx, job_id)?;
            self.providers.check_platform(provider, &job.hardware_platform)?;
            let mut log = tx.get_log(job_id)?.unwrap_or_default();
            log.push_str(text);
            tx.set_log(job_id, log)
        })
    }

    pub fn get_log(&self, caller: &Caller, job_id: JobId) -> crate::Result<Option<String>> {
        let (job, log) = self
            .store
            .read(|tx| Ok((load_job(tx, job_id)?, tx.get_log(job_id)?)))?;
        self.check_visible(caller, &job)?;
        Ok(log)
    }

    /// Soft removal marks the job as removed; hard removal, reserved to administrators,
    /// deletes it with its tags, comments and log.
    pub fn remove_job(&self, caller: &Caller, job_id: JobId, mode: RemoveMode) -> crate::Result<()> {
        let principal = caller.as_user()?;
        self.store.transaction(|tx| {
            let mut job = load_job(&*tx, job_id)?;
            self.check_visible(caller, &job)?;
            match mode {
                RemoveMode::Soft => {
                    self.check_owner_or_admin(principal, &job, "remove")?;
                    if job.status != JobStatus::Removed {
                        job.status = JobStatus::Removed;
                        tx.update_job(&job)?;
                    }
                }
                RemoveMode::Hard => {
                    if !principal.is_admin() {
                        return Err(CoreError::forbidden(format!(
                            "Only administrators can delete job {job_id}"
                        )));
                    }
                    tx.delete_job(job_id)?;
                }
            }
            Ok(())
        })?;
        log::info!("Job {job_id} removed by {} ({mode:?})", principal.username);
        Ok(())
    }

    /// Owner or editors of the job's collaboration may annotate it.
    fn check_annotate(&self, principal: &Principal, job: &Job) -> crate::Result<()> {
        if principal.username == job.owner || can_edit(principal, &job.collaboration) {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!(
                "User '{}' cannot annotate job {}",
                principal.username, job.id
            )))
        }
    }

    pub fn get_tags(&self, caller: &Caller, job_id: JobId) -> crate::Result<Vec<String>> {
        let (job, tags) = self
            .store
            .read(|tx| Ok((load_job(tx, job_id)?, tx.get_tags(job_id)?)))?;
        self.check_visible(caller, &job)?;
        Ok(tags)
    }

    /// Returns the resulting tag list.
    pub fn add_tags<T: AsRef<str>>(
        &self,
        caller: &Caller,
        job_id: JobId,
        tags: &[T],
    ) -> crate::Result<Vec<String>> {
        let principal = caller.as_user()?;
        let new_tags = normalize_tags(tags)?;
        self.store.transaction(|tx| {
            let job = load_job(&*tx, job_id)?;
            self.check_visible(caller, &job)?;
            self.check_annotate(principal, &job)?;
            let mut current = tx.get_tags(job_id)?;
            for tag in new_tags {
                if !current.contains(&tag) {
                    current.push(tag);
                }
            }
            tx.set_tags(job_id, current.clone())?;
            Ok(current)
        })
    }

    /// Returns the resulting tag list. Tags the job does not carry are ignored.
    pub fn remove_tags<T: AsRef<str>>(
        &self,
        caller: &Caller,
        job_id: JobId,
        tags: &[T],
    ) -> crate::Result<Vec<String>> {
        let principal = caller.as_user()?;
        let removed = normalize_tags(tags)?;
        self.store.transaction(|tx| {
            let job = load_job(&*tx, job_id)?;
            self.check_visible(caller, &job)?;
            self.check_annotate(principal, &job)?;
            let mut current = tx.get_tags(job_id)?;
            current.retain(|tag| !removed.contains(tag));
            tx.set_tags(job_id, current.clone())?;
            Ok(current)
        })
    }

    pub fn add_comment(&self, caller: &Caller, job_id: JobId, content: &str) -> crate::Result<Comment> {
        let principal = caller.as_user()?;
        if content.trim().is_empty() {
            return crate::common::error::validation_error("Comment cannot be empty".to_string());
        }
        self.store.transaction(|tx| {
            let job = load_job(&*tx, job_id)?;
            self.check_visible(caller, &job)?;
            self.check_annotate(principal, &job)?;
            let mut comment = Comment {
                id: CommentId::default(),
                job_id,
                author: principal.username.clone(),
                content: content.to_string(),
                created_at: Utc::now(),
            };
            comment.id = tx.insert_comment(comment.clone())?;
            Ok(comment)
        })
    }

    pub fn list_comments(&self, caller: &Caller, job_id: JobId) -> crate::Result<Vec<Comment>> {
        let (job, comments) = self
            .store
            .read(|tx| Ok((load_job(tx, job_id)?, tx.query_comments(job_id)?)))?;
        self.check_visible(caller, &job)?;
        Ok(comments)
    }

    /// Authors delete their own comments, administrators any comment.
    pub fn delete_comment(&self, caller: &Caller, comment_id: CommentId) -> crate::Result<()> {
        let principal = caller.as_user()?;
        self.store.transaction(|tx| {
            let comment = tx
                .get_comment(comment_id)?
                .ok_or_else(|| CoreError::not_found("comment", comment_id))?;
            let job = load_job(&*tx, comment.job_id)?;
            match self.check_visible(caller, &job) {
                Err(CoreError::NotFound { .. }) => {
                    return Err(CoreError::not_found("comment", comment_id));
                }
                result => result?,
            }
            if comment.author != principal.username && !principal.is_admin() {
                return Err(CoreError::forbidden(format!(
                    "Only the author or an administrator can delete comment {comment_id}"
                )));
            }
            tx.delete_comment(comment_id)
        })
    }
}
