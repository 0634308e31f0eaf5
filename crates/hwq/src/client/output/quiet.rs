use hwq_core::auth::Caller;
use hwq_core::ledger::DebitReceipt;
use hwq_core::model::{Comment, Job, Project, Quota, Session};
use hwq_core::JobId;

use crate::client::output::outputs::{JobAnnotations, Output};

/// Prints only identifiers and states, one record per line.
#[derive(Default)]
pub struct Quiet;

impl Output for Quiet {
    // Jobs
    fn print_job_submitted(&self, job: Job) {
        println!("{}", job.id)
    }
    fn print_job_list(&self, jobs: Vec<Job>) {
        for job in jobs {
            println!("{} {}", job.id, job.status.as_str().to_uppercase())
        }
    }
    fn print_job_detail(&self, _job: Job, _annotations: JobAnnotations) {}
    fn print_job_log(&self, _job_id: JobId, log: Option<String>) {
        if let Some(log) = log {
            print!("{log}")
        }
    }
    fn print_job_tags(&self, _job_id: JobId, tags: Vec<String>) {
        for tag in tags {
            println!("{tag}")
        }
    }
    fn print_comment(&self, comment: Comment) {
        println!("{}", comment.id)
    }
    fn print_comment_list(&self, comments: Vec<Comment>) {
        for comment in comments {
            println!("{}", comment.id)
        }
    }

    // Provider reports
    fn print_next_job(&self, job: Option<Job>) {
        if let Some(job) = job {
            println!("{}", job.id)
        }
    }
    fn print_job_report(&self, _job: Job, _debit: Option<DebitReceipt>) {}
    fn print_session_report(&self, _session: Session, _debit: Option<DebitReceipt>) {}

    // Sessions
    fn print_session_list(&self, sessions: Vec<Session>) {
        for session in sessions {
            println!(
                "{} {}",
                session.id,
                session.status.as_str().to_uppercase()
            )
        }
    }
    fn print_session_detail(&self, _session: Session) {}

    // Projects and quotas
    fn print_project_list(&self, projects: Vec<Project>) {
        for project in projects {
            println!(
                "{} {}",
                project.id,
                project.status().as_str().to_uppercase()
            )
        }
    }
    fn print_project_detail(&self, _project: Project, _quotas: Vec<Quota>) {}
    fn print_quota_list(&self, quotas: Vec<Quota>) {
        for quota in quotas {
            println!("{} {} {}", quota.id, quota.usage, quota.limit)
        }
    }
    fn print_quota(&self, quota: Quota) {
        println!("{}", quota.id)
    }

    fn print_whoami(&self, caller: &Caller, _platforms: Vec<String>) {
        println!("{}", caller.name())
    }
    fn print_done(&self, _message: &str) {}

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{:?}", error);
    }
}
