use std::cell::Cell;

use crate::common::error::CoreError;
use crate::model::{Comment, Job, Project, Quota, Session};
use crate::store::{
    JobQuery, MemoryStore, Pagination, ProjectQuery, QuotaQuery, RecordStore, SessionQuery,
    StoreTx,
};
use crate::{CommentId, JobId, ProjectId, QuotaId, SessionId};

/// Memory store whose transactions fail on the n-th quota update.
pub struct FlakyStore {
    pub inner: MemoryStore,
    quota_updates_before_failure: Cell<Option<usize>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            quota_updates_before_failure: Cell::new(None),
        }
    }

    /// The next transaction lets `count` quota updates through and fails on the following one.
    pub fn fail_after_quota_updates(&self, count: usize) {
        self.quota_updates_before_failure.set(Some(count));
    }
}

impl RecordStore for FlakyStore {
    fn read<T>(&self, f: impl FnOnce(&dyn StoreTx) -> crate::Result<T>) -> crate::Result<T> {
        self.inner.read(f)
    }

    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut dyn StoreTx) -> crate::Result<T>,
    ) -> crate::Result<T> {
        let budget = self.quota_updates_before_failure.take();
        self.inner.transaction(|tx| {
            let mut flaky = FlakyTx {
                inner: tx,
                quota_updates_left: budget,
            };
            let tx: &mut dyn StoreTx = &mut flaky;
            f(tx)
        })
    }
}

struct FlakyTx<'a> {
    inner: &'a mut dyn StoreTx,
    quota_updates_left: Option<usize>,
}

impl StoreTx for FlakyTx<'_> {
    fn get_project(&self, id: ProjectId) -> crate::Result<Option<Project>> {
        self.inner.get_project(id)
    }
    fn query_projects(&self, query: &ProjectQuery) -> crate::Result<Vec<Project>> {
        self.inner.query_projects(query)
    }
    fn insert_project(&mut self, project: Project) -> crate::Result<ProjectId> {
        self.inner.insert_project(project)
    }
    fn update_project(&mut self, project: &Project) -> crate::Result<()> {
        self.inner.update_project(project)
    }
    fn delete_project(&mut self, id: ProjectId) -> crate::Result<()> {
        self.inner.delete_project(id)
    }

    fn get_quota(&self, id: QuotaId) -> crate::Result<Option<Quota>> {
        self.inner.get_quota(id)
    }
    fn query_quotas(&self, query: &QuotaQuery) -> crate::Result<Vec<Quota>> {
        self.inner.query_quotas(query)
    }
    fn insert_quota(&mut self, quota: Quota) -> crate::Result<QuotaId> {
        self.inner.insert_quota(quota)
    }
    fn update_quota(&mut self, quota: &Quota) -> crate::Result<()> {
        match self.quota_updates_left {
            Some(0) => Err(CoreError::UpstreamUnavailable(
                "connection reset".to_string(),
            )),
            Some(n) => {
                self.quota_updates_left = Some(n - 1);
                self.inner.update_quota(quota)
            }
            None => self.inner.update_quota(quota),
        }
    }
    fn delete_quota(&mut self, id: QuotaId) -> crate::Result<()> {
        self.inner.delete_quota(id)
    }

    fn get_job(&self, id: JobId) -> crate::Result<Option<Job>> {
        self.inner.get_job(id)
    }
    fn query_jobs(&self, query: &JobQuery, page: Pagination) -> crate::Result<Vec<Job>> {
        self.inner.query_jobs(query, page)
    }
    fn insert_job(&mut self, job: Job) -> crate::Result<JobId> {
        self.inner.insert_job(job)
    }
    fn update_job(&mut self, job: &Job) -> crate::Result<()> {
        self.inner.update_job(job)
    }
    fn delete_job(&mut self, id: JobId) -> crate::Result<()> {
        self.inner.delete_job(id)
    }

    fn get_tags(&self, job_id: JobId) -> crate::Result<Vec<String>> {
        self.inner.get_tags(job_id)
    }
    fn set_tags(&mut self, job_id: JobId, tags: Vec<String>) -> crate::Result<()> {
        self.inner.set_tags(job_id, tags)
    }
    fn get_log(&self, job_id: JobId) -> crate::Result<Option<String>> {
        self.inner.get_log(job_id)
    }
    fn set_log(&mut self, job_id: JobId, content: String) -> crate::Result<()> {
        self.inner.set_log(job_id, content)
    }

    fn get_comment(&self, id: CommentId) -> crate::Result<Option<Comment>> {
        self.inner.get_comment(id)
    }
    fn query_comments(&self, job_id: JobId) -> crate::Result<Vec<Comment>> {
        self.inner.query_comments(job_id)
    }
    fn insert_comment(&mut self, comment: Comment) -> crate::Result<CommentId> {
        self.inner.insert_comment(comment)
    }
    fn delete_comment(&mut self, id: CommentId) -> crate::Result<()> {
        self.inner.delete_comment(id)
    }

    fn get_session(&self, id: SessionId) -> crate::Result<Option<Session>> {
        self.inner.get_session(id)
    }
    fn query_sessions(
        &self,
        query: &SessionQuery,
        page: Pagination,
    ) -> crate::Result<Vec<Session>> {
        self.inner.query_sessions(query, page)
    }
    fn insert_session(&mut self, session: Session) -> crate::Result<SessionId> {
        self.inner.insert_session(session)
    }
    fn update_session(&mut self, session: &Session) -> crate::Result<()> {
        self.inner.update_session(session)
    }
}

