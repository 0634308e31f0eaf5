use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::common::error::CoreError;
use crate::common::ids::IdCounter;
use crate::model::{Comment, Job, Project, Quota, Session};
use crate::store::{
    JobQuery, Pagination, ProjectQuery, QuotaQuery, RecordStore, SessionQuery, StoreTx,
};
use crate::{CommentId, JobId, ProjectId, QuotaId, SessionId};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct Counters {
    project: IdCounter,
    quota: IdCounter,
    job: IdCounter,
    comment: IdCounter,
    session: IdCounter,
}

/// All records of the in-memory store. Rows are kept ordered by their identifier, which is
/// the natural iteration order of the store.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Tables {
    projects: BTreeMap<ProjectId, Project>,
    quotas: BTreeMap<QuotaId, Quota>,
    jobs: BTreeMap<JobId, Job>,
    tags: BTreeMap<JobId, Vec<String>>,
    logs: BTreeMap<JobId, String>,
    comments: BTreeMap<CommentId, Comment>,
    sessions: BTreeMap<SessionId, Session>,
    counters: Counters,
}

fn contains<T: PartialEq>(filter: &Option<Vec<T>>, value: &T) -> bool {
    filter.as_ref().is_none_or(|values| values.contains(value))
}

fn update_row<K: Ord + Copy + ToString, V: Clone>(
    table: &mut BTreeMap<K, V>,
    kind: &'static str,
    id: K,
    value: &V,
) -> crate::Result<()> {
    match table.get_mut(&id) {
        Some(row) => {
            *row = value.clone();
            Ok(())
        }
        None => Err(CoreError::not_found(kind, id)),
    }
}

fn delete_row<K: Ord + ToString, V>(
    table: &mut BTreeMap<K, V>,
    kind: &'static str,
    id: K,
) -> crate::Result<V> {
    table
        .remove(&id)
        .ok_or_else(|| CoreError::not_found(kind, id))
}

impl StoreTx for Tables {
    fn get_project(&self, id: ProjectId) -> crate::Result<Option<Project>> {
        Ok(self.projects.get(&id).cloned())
    }

    fn query_projects(&self, query: &ProjectQuery) -> crate::Result<Vec<Project>> {
        Ok(self
            .projects
            .values()
            .filter(|p| contains(&query.collaborations, &p.collaboration))
            .filter(|p| query.accepted.is_none_or(|accepted| p.accepted == accepted))
            .cloned()
            .collect())
    }

    fn insert_project(&mut self, mut project: Project) -> crate::Result<ProjectId> {
        let id = ProjectId::new(self.counters.project.increment());
        project.id = id;
        self.projects.insert(id, project);
        Ok(id)
    }

    fn update_project(&mut self, project: &Project) -> crate::Result<()> {
        update_row(&mut self.projects, "project", project.id, project)
    }

    fn delete_project(&mut self, id: ProjectId) -> crate::Result<()> {
        delete_row(&mut self.projects, "project", id).map(|_| ())
    }

    fn get_quota(&self, id: QuotaId) -> crate::Result<Option<Quota>> {
        Ok(self.quotas.get(&id).cloned())
    }

    fn query_quotas(&self, query: &QuotaQuery) -> crate::Result<Vec<Quota>> {
        Ok(self
            .quotas
            .values()
            .filter(|q| contains(&query.project_ids, &q.project_id))
            .filter(|q| {
                query
                    .platform
                    .as_ref()
                    .is_none_or(|platform| &q.platform == platform)
            })
            .cloned()
            .collect())
    }

    fn insert_quota(&mut self, mut quota: Quota) -> crate::Result<QuotaId> {
        let id = QuotaId::new(self.counters.quota.increment());
        quota.id = id;
        self.quotas.insert(id, quota);
        Ok(id)
    }

    fn update_quota(&mut self, quota: &Quota) -> crate::Result<()> {
        update_row(&mut self.quotas, "quota", quota.id, quota)
    }

    fn delete_quota(&mut self, id: QuotaId) -> crate::Result<()> {
        delete_row(&mut self.quotas, "quota", id).map(|_| ())
    }

    fn get_job(&self, id: JobId) -> crate::Result<Option<Job>> {
        Ok(self.jobs.get(&id).cloned())
    }

    fn query_jobs(&self, query: &JobQuery, page: Pagination) -> crate::Result<Vec<Job>> {
        let mut jobs: Vec<&Job> = self
            .jobs
            .values()
            .filter(|j| contains(&query.collaborations, &j.collaboration))
            .filter(|j| query.owner.as_ref().is_none_or(|owner| &j.owner == owner))
            .filter(|j| contains(&query.platforms, &j.hardware_platform))
            .filter(|j| contains(&query.statuses, &j.status))
            .filter(|j| query.submitted_after.is_none_or(|t| j.submitted_at >= t))
            .filter(|j| query.submitted_before.is_none_or(|t| j.submitted_at < t))
            .filter(|j| {
                query.tags.is_empty()
                    || self
                        .tags
                        .get(&j.id)
                        .is_some_and(|tags| query.tags.iter().all(|t| tags.contains(t)))
            })
            .collect();
        jobs.sort_by_key(|j| (j.submitted_at, j.id));
        Ok(page.apply(jobs.into_iter().cloned()))
    }

    fn insert_job(&mut self, mut job: Job) -> crate::Result<JobId> {
        let id = JobId::new(self.counters.job.increment());
        job.id = id;
        self.jobs.insert(id, job);
        Ok(id)
    }

    fn update_job(&mut self, job: &Job) -> crate::Result<()> {
        update_row(&mut self.jobs, "job", job.id, job)
    }

    fn delete_job(&mut self, id: JobId) -> crate::Result<()> {
        delete_row(&mut self.jobs, "job", id)?;
        self.tags.remove(&id);
        self.logs.remove(&id);
        self.comments.retain(|_, comment| comment.job_id != id);
        Ok(())
    }

    fn get_tags(&self, job_id: JobId) -> crate::Result<Vec<String>> {
        Ok(self.tags.get(&job_id).cloned().unwrap_or_default())
    }

    fn set_tags(&mut self, job_id: JobId, tags: Vec<String>) -> crate::Result<()> {
        if !self.jobs.contains_key(&job_id) {
            return Err(CoreError::not_found("job", job_id));
        }
        if tags.is_empty() {
            self.tags.remove(&job_id);
        } else {
            self.tags.insert(job_id, tags);
        }
        Ok(())
    }

    fn get_log(&self, job_id: JobId) -> crate::Result<Option<String>> {
        Ok(self.logs.get(&job_id).cloned())
    }

    fn set_log(&mut self, job_id: JobId, content: String) -> crate::Result<()> {
        if !self.jobs.contains_key(&job_id) {
            return Err(CoreError::not_found("job", job_id));
        }
        self.logs.insert(job_id, content);
        Ok(())
    }

    fn get_comment(&self, id: CommentId) -> crate::Result<Option<Comment>> {
        Ok(self.comments.get(&id).cloned())
    }

    fn query_comments(&self, job_id: JobId) -> crate::Result<Vec<Comment>> {
        Ok(self
            .comments
            .values()
            .filter(|c| c.job_id == job_id)
            .cloned()
            .collect())
    }

    fn insert_comment(&mut self, mut comment: Comment) -> crate::Result<CommentId> {
        if !self.jobs.contains_key(&comment.job_id) {
            return Err(CoreError::not_found("job", comment.job_id));
        }
        let id = CommentId::new(self.counters.comment.increment());
        comment.id = id;
        self.comments.insert(id, comment);
        Ok(id)
    }

    fn delete_comment(&mut self, id: CommentId) -> crate::Result<()> {
        delete_row(&mut self.comments, "comment", id).map(|_| ())
    }

    fn get_session(&self, id: SessionId) -> crate::Result<Option<Session>> {
        Ok(self.sessions.get(&id).cloned())
    }

    fn query_sessions(
        &self,
        query: &SessionQuery,
        page: Pagination,
    ) -> crate::Result<Vec<Session>> {
        let mut sessions: Vec<&Session> = self
            .sessions
            .values()
            .filter(|s| contains(&query.collaborations, &s.collaboration))
            .filter(|s| query.owner.as_ref().is_none_or(|owner| &s.owner == owner))
            .filter(|s| contains(&query.platforms, &s.hardware_platform))
            .filter(|s| contains(&query.statuses, &s.status))
            .collect();
        sessions.sort_by_key(|s| (s.started_at, s.id));
        Ok(page.apply(sessions.into_iter().cloned()))
    }

    fn insert_session(&mut self, mut session: Session) -> crate::Result<SessionId> {
        let id = SessionId::new(self.counters.session.increment());
        session.id = id;
        self.sessions.insert(id, session);
        Ok(id)
    }

    fn update_session(&mut self, session: &Session) -> crate::Result<()> {
        update_row(&mut self.sessions, "session", session.id, session)
    }
}

/// Reference [`RecordStore`] keeping every record in memory.
///
/// Transactions are serialized behind a single lock and run against a working copy of the
/// tables, which replaces the committed tables only when the transaction succeeds.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
        }
    }

    /// Replaces the committed tables, e.g. with a newer version read from disk.
    pub fn replace_tables(&self, tables: Tables) -> crate::Result<()> {
        *self.lock()? = tables;
        Ok(())
    }

    /// Copy of the committed tables.
    pub fn snapshot(&self) -> crate::Result<Tables> {
        Ok(self.lock()?.clone())
    }

    /// Runs a transaction and calls `before_commit` with the tables that are about to be
    /// committed. If `before_commit` fails, the transaction is discarded.
    pub fn transaction_with_hook<T>(
        &self,
        f: impl FnOnce(&mut dyn StoreTx) -> crate::Result<T>,
        before_commit: impl FnOnce(&Tables) -> crate::Result<()>,
    ) -> crate::Result<T> {
        let mut committed = self.lock()?;
        let mut working = committed.clone();
        let tx: &mut dyn StoreTx = &mut working;
        let value = f(tx)?;
        before_commit(&working)?;
        *committed = working;
        Ok(value)
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.tables.try_lock().is_err()
    }

    fn lock(&self) -> crate::Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| {
            log::error!("Record store lock is poisoned");
            CoreError::UpstreamUnavailable("record store lock is poisoned".to_string())
        })
    }
}

impl RecordStore for MemoryStore {
    fn read<T>(&self, f: impl FnOnce(&dyn StoreTx) -> crate::Result<T>) -> crate::Result<T> {
        let tables = self.lock()?;
        let tx: &dyn StoreTx = &*tables;
        f(tx)
    }

    fn transaction<T>(
        &self,
        f: impl FnOnce(&mut dyn StoreTx) -> crate::Result<T>,
    ) -> crate::Result<T> {
        self.transaction_with_hook(f, |_| Ok(()))
    }
}
