//! Contract of the durable record store.
//!
//! The core never holds state between requests. Every operation runs inside either
//! [`RecordStore::read`] or [`RecordStore::transaction`]; a transaction covers the whole
//! read-modify-write sequence of an operation (admission check and insert, quota walk and
//! persist) and discards every write when the closure returns an error.

pub mod memory;

use chrono::{DateTime, Utc};

use crate::model::{Comment, Job, JobStatus, Project, Quota, Session, SessionStatus};
use crate::{CommentId, JobId, ProjectId, QuotaId, SessionId};

pub use memory::{MemoryStore, Tables};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Pagination {
    pub fn new(offset: usize, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }

    pub fn apply<T>(&self, items: impl Iterator<Item = T>) -> Vec<T> {
        let items = items.skip(self.offset);
        match self.limit {
            Some(limit) => items.take(limit).collect(),
            None => items.collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    pub collaborations: Option<Vec<String>>,
    pub accepted: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct QuotaQuery {
    pub project_ids: Option<Vec<ProjectId>>,
    pub platform: Option<String>,
}

/// Filter over jobs. Results are ordered by submission time, ties broken by id.
#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub collaborations: Option<Vec<String>>,
    pub owner: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub statuses: Option<Vec<JobStatus>>,
    /// The job must carry every listed tag.
    pub tags: Vec<String>,
    pub submitted_after: Option<DateTime<Utc>>,
    pub submitted_before: Option<DateTime<Utc>>,
}

/// Filter over sessions. Results are ordered by start time, ties broken by id.
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    pub collaborations: Option<Vec<String>>,
    pub owner: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub statuses: Option<Vec<SessionStatus>>,
}

/// Row-level access to the stored records.
///
/// Inserts ignore the `id` of the passed record and return the identifier assigned by the
/// store. Updates and deletes of a missing row fail with `NotFound`.
pub trait StoreTx {
    fn get_project(&self, id: ProjectId) -> crate::Result<Option<Project>>;
    fn query_projects(&self, query: &ProjectQuery) -> crate::Result<Vec<Project>>;
    fn insert_project(&mut self, project: Project) -> crate::Result<ProjectId>;
    fn update_project(&mut self, project: &Project) -> crate::Result<()>;
    fn delete_project(&mut self, id: ProjectId) -> crate::Result<()>;

    fn get_quota(&self, id: QuotaId) -> crate::Result<Option<Quota>>;
    fn query_quotas(&self, query: &QuotaQuery) -> crate::Result<Vec<Quota>>;
    fn insert_quota(&mut self, quota: Quota) -> crate::Result<QuotaId>;
    fn update_quota(&mut self, quota: &Quota) -> crate::Result<()>;
    fn delete_quota(&mut self, id: QuotaId) -> crate::Result<()>;

    fn get_job(&self, id: JobId) -> crate::Result<Option<Job>>;
    fn query_jobs(&self, query: &JobQuery, page: Pagination) -> crate::Result<Vec<Job>>;
    fn insert_job(&mut self, job: Job) -> crate::Result<JobId>;
    fn update_job(&mut self, job: &Job) -> crate::Result<()>;
    /// Deletes the job together with its tags, comments and log.
    fn delete_job(&mut self, id: JobId) -> crate::Result<()>;

    fn get_tags(&self, job_id: JobId) -> crate::Result<Vec<String>>;
    fn set_tags(&mut self, job_id: JobId, tags: Vec<String>) -> crate::Result<()>;
    fn get_log(&self, job_id: JobId) -> crate::Result<Option<String>>;
    fn set_log(&mut self, job_id: JobId, content: String) -> crate::Result<()>;

    fn get_comment(&self, id: CommentId) -> crate::Result<Option<Comment>>;
    fn query_comments(&self, job_id: JobId) -> crate::Result<Vec<Comment>>;
    fn insert_comment(&mut self, comment: Comment) -> crate::Result<CommentId>;
    fn delete_comment(&mut self, id: CommentId) -> crate::Result<()>;

    fn get_session(&self, id: SessionId) -> crate::Result<Option<Session>>;
    fn query_sessions(&self, query: &SessionQuery, page: Pagination)
    -> crate::Result<Vec<Session>>;
    fn insert_session(&mut self, session: Session) -> crate::Result<SessionId>;
    fn update_session(&mut self, session: &Session) -> crate::Result<()>;
}

/// A store able to run closures with exclusive, all-or-nothing access to its records.
pub trait RecordStore {
    fn read<T>(&self, f: impl FnOnce(&dyn StoreTx) -> crate::Result<T>) -> crate::Result<T>;

    /// Runs `f` as one unit. If `f` fails, none of its writes become visible.
    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut dyn StoreTx) -> crate::Result<T>,
    ) -> crate::Result<T>;
}

impl<S: RecordStore> RecordStore for std::sync::Arc<S> {
    fn read<T>(&self, f: impl FnOnce(&dyn StoreTx) -> crate::Result<T>) -> crate::Result<T> {
        (**self).read(f)
    }

    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut dyn StoreTx) -> crate::Result<T>,
    ) -> crate::Result<T> {
        (**self).transaction(f)
    }
}
