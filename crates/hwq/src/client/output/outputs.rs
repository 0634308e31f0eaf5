use hwq_core::auth::Caller;
use hwq_core::ledger::DebitReceipt;
use hwq_core::model::{Comment, Job, Project, Quota, Session};
use hwq_core::JobId;

#[derive(clap::ValueEnum, Clone)]
pub enum Outputs {
    CLI,
    JSON,
    Quiet,
}

/// Everything a job detail shows besides the job itself.
pub struct JobAnnotations {
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
}

pub trait Output {
    // Jobs
    fn print_job_submitted(&self, job: Job);
    fn print_job_list(&self, jobs: Vec<Job>);
    fn print_job_detail(&self, job: Job, annotations: JobAnnotations);
    fn print_job_log(&self, job_id: JobId, log: Option<String>);
    fn print_job_tags(&self, job_id: JobId, tags: Vec<String>);
    fn print_comment(&self, comment: Comment);
    fn print_comment_list(&self, comments: Vec<Comment>);

    // Provider reports
    fn print_next_job(&self, job: Option<Job>);
    fn print_job_report(&self, job: Job, debit: Option<DebitReceipt>);
    fn print_session_report(&self, session: Session, debit: Option<DebitReceipt>);

    // Sessions
    fn print_session_list(&self, sessions: Vec<Session>);
    fn print_session_detail(&self, session: Session);

    // Projects and quotas
    fn print_project_list(&self, projects: Vec<Project>);
    fn print_project_detail(&self, project: Project, quotas: Vec<Quota>);
    fn print_quota_list(&self, quotas: Vec<Quota>);
    fn print_quota(&self, quota: Quota);

    /// `platforms` are the platforms served by a provider caller.
    fn print_whoami(&self, caller: &Caller, platforms: Vec<String>);
    /// Confirms an operation that returns no record.
    fn print_done(&self, message: &str);

    fn print_error(&self, error: anyhow::Error);
}
