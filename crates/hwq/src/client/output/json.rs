use serde_json::{json, Value};

use hwq_core::auth::Caller;
use hwq_core::ledger::DebitReceipt;
use hwq_core::model::{Comment, Job, Project, Quota, Session};
use hwq_core::JobId;

use crate::client::output::outputs::{JobAnnotations, Output};

#[derive(Default)]
pub struct JsonOutput;

impl JsonOutput {
    fn print(&self, data: Value) {
        match serde_json::to_string_pretty(&data) {
            Ok(text) => println!("{text}"),
            Err(e) => log::error!("Cannot serialize output: {e}"),
        }
    }
}

impl Output for JsonOutput {
    fn print_job_submitted(&self, job: Job) {
        self.print(json!({ "id": job.id }));
    }

    fn print_job_list(&self, jobs: Vec<Job>) {
        self.print(json!(jobs));
    }

    fn print_job_detail(&self, job: Job, annotations: JobAnnotations) {
        self.print(json!({
            "job": job,
            "tags": annotations.tags,
            "comments": annotations.comments,
        }));
    }

    fn print_job_log(&self, job_id: JobId, log: Option<String>) {
        self.print(json!({ "id": job_id, "log": log }));
    }

    fn print_job_tags(&self, job_id: JobId, tags: Vec<String>) {
        self.print(json!({ "id": job_id, "tags": tags }));
    }

    fn print_comment(&self, comment: Comment) {
        self.print(json!(comment));
    }

    fn print_comment_list(&self, comments: Vec<Comment>) {
        self.print(json!(comments));
    }

    fn print_next_job(&self, job: Option<Job>) {
        self.print(json!(job));
    }

    fn print_job_report(&self, job: Job, debit: Option<DebitReceipt>) {
        self.print(json!({ "job": job, "debit": debit }));
    }

    fn print_session_report(&self, session: Session, debit: Option<DebitReceipt>) {
        self.print(json!({ "session": session, "debit": debit }));
    }

    fn print_session_list(&self, sessions: Vec<Session>) {
        self.print(json!(sessions));
    }

    fn print_session_detail(&self, session: Session) {
        self.print(json!(session));
    }

    fn print_project_list(&self, projects: Vec<Project>) {
        self.print(json!(projects
            .into_iter()
            .map(format_project)
            .collect::<Vec<_>>()));
    }

    fn print_project_detail(&self, project: Project, quotas: Vec<Quota>) {
        self.print(json!({
            "project": format_project(project),
            "quotas": quotas,
        }));
    }

    fn print_quota_list(&self, quotas: Vec<Quota>) {
        self.print(json!(quotas));
    }

    fn print_quota(&self, quota: Quota) {
        self.print(json!(quota));
    }

    fn print_whoami(&self, caller: &Caller, platforms: Vec<String>) {
        let data = match caller {
            Caller::User(principal) => json!({
                "user": principal.username,
                "admin": principal.is_admin(),
                "memberships": principal.memberships,
            }),
            Caller::Provider(name) => json!({
                "provider": name,
                "platforms": platforms,
            }),
        };
        self.print(data);
    }

    fn print_done(&self, message: &str) {
        self.print(json!({ "message": message }));
    }

    fn print_error(&self, error: anyhow::Error) {
        self.print(json!({ "error": format!("{error:?}") }));
    }
}

/// The project status is derived, so it is added next to the stored fields.
fn format_project(project: Project) -> Value {
    let status = project.status();
    let mut value = json!(project);
    if let Value::Object(map) = &mut value {
        map.insert("status".to_string(), json!(status));
    }
    value
}
