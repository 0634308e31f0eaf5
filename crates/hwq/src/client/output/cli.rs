use cli_table::format::{Justify, Separator};
use cli_table::{print_stdout, Cell, CellStruct, Color, ColorChoice, Style, Table, TableStruct};

use chrono::{DateTime, Local, Utc};
use colored::Colorize;

use hwq_core::auth::Caller;
use hwq_core::ledger::DebitReceipt;
use hwq_core::model::{
    Comment, DataItem, Job, JobStatus, Project, ProjectStatus, Quota, ResourceUsage, Session,
    SessionStatus,
};
use hwq_core::JobId;

use crate::client::output::outputs::{JobAnnotations, Output};

pub struct CliOutput {
    color_policy: ColorChoice,
}

impl CliOutput {
    pub fn new(color_policy: ColorChoice) -> CliOutput {
        CliOutput { color_policy }
    }

    fn print_vertical_table(&self, rows: Vec<Vec<CellStruct>>) {
        let table = rows.table().separator(
            Separator::builder()
                .column(Some(Default::default()))
                .build(),
        );
        self.print_table(table);
    }

    fn print_horizontal_table(&self, rows: Vec<Vec<CellStruct>>, header: Vec<CellStruct>) {
        let table = rows
            .table()
            .separator(
                Separator::builder()
                    .title(Some(Default::default()))
                    .column(Some(Default::default()))
                    .build(),
            )
            .title(header);
        self.print_table(table);
    }

    fn print_table(&self, table: TableStruct) {
        let table = table.color_choice(self.color_policy);
        if let Err(e) = print_stdout(table) {
            log::error!("Cannot print table to stdout: {:?}", e);
        }
    }

    fn print_debit(&self, debit: Option<DebitReceipt>) {
        let Some(debit) = debit else {
            return;
        };
        for charge in &debit.charges {
            println!("Charged {} to quota {}", charge.amount, charge.quota_id);
        }
        if debit.uncharged > 0.0 {
            println!(
                "{} {} could not be charged to any quota",
                "Warning:".color(colored::Color::Yellow),
                debit.uncharged
            );
        }
    }
}

impl Output for CliOutput {
    fn print_job_submitted(&self, job: Job) {
        println!(
            "Job submitted {}, job ID: {}",
            "successfully".color(colored::Color::Green),
            job.id
        );
    }

    fn print_job_list(&self, jobs: Vec<Job>) {
        let rows: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                vec![
                    job.id.cell().justify(Justify::Right),
                    job.collaboration.cell(),
                    job.owner.cell(),
                    job.hardware_platform.cell(),
                    job_status_to_cell(job.status),
                    format_datetime(job.submitted_at).cell(),
                ]
            })
            .collect();

        let header = vec![
            "ID".cell().bold(true),
            "Collaboration".cell().bold(true),
            "Owner".cell().bold(true),
            "Platform".cell().bold(true),
            "State".cell().bold(true),
            "Submitted".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_job_detail(&self, job: Job, annotations: JobAnnotations) {
        let Job {
            id,
            collaboration,
            owner,
            hardware_platform,
            status,
            submitted_at,
            completed_at,
            resource_usage,
            code,
            command,
            hardware_config,
            input_data,
            output_data,
            provenance,
        } = job;

        let mut rows = vec![
            vec!["ID".cell().bold(true), id.cell()],
            vec!["Collaboration".cell().bold(true), collaboration.cell()],
            vec!["Owner".cell().bold(true), owner.cell()],
            vec!["Platform".cell().bold(true), hardware_platform.cell()],
            vec!["State".cell().bold(true), job_status_to_cell(status)],
            vec![
                "Submitted".cell().bold(true),
                format_datetime(submitted_at).cell(),
            ],
            vec![
                "Completed".cell().bold(true),
                completed_at.map(format_datetime).unwrap_or_default().cell(),
            ],
            vec![
                "Makespan".cell().bold(true),
                completed_at
                    .map(|end| format_elapsed(submitted_at, end))
                    .unwrap_or_default()
                    .cell(),
            ],
            vec![
                "Usage".cell().bold(true),
                resource_usage
                    .as_ref()
                    .map(format_usage)
                    .unwrap_or_default()
                    .cell(),
            ],
            vec!["Command".cell().bold(true), command.unwrap_or_default().cell()],
            vec!["Code".cell().bold(true), code.cell()],
        ];
        if let Some(config) = hardware_config {
            rows.push(vec![
                "Hardware config".cell().bold(true),
                config.to_string().cell(),
            ]);
        }
        rows.push(vec![
            "Input data".cell().bold(true),
            format_data_items(&input_data).cell(),
        ]);
        rows.push(vec![
            "Output data".cell().bold(true),
            format_data_items(&output_data).cell(),
        ]);
        if let Some(provenance) = provenance {
            rows.push(vec![
                "Provenance".cell().bold(true),
                provenance.to_string().cell(),
            ]);
        }
        rows.push(vec![
            "Tags".cell().bold(true),
            annotations.tags.join(", ").cell(),
        ]);
        rows.push(vec![
            "Comments".cell().bold(true),
            annotations.comments.len().cell(),
        ]);
        self.print_vertical_table(rows);
    }

    fn print_job_log(&self, job_id: JobId, log: Option<String>) {
        match log {
            Some(log) => print!("{log}"),
            None => log::info!("Job {job_id} has no log"),
        }
    }

    fn print_job_tags(&self, job_id: JobId, tags: Vec<String>) {
        if tags.is_empty() {
            println!("Job {job_id} has no tags");
        } else {
            println!("Job {job_id} tags: {}", tags.join(", "));
        }
    }

    fn print_comment(&self, comment: Comment) {
        println!("Comment {} added to job {}", comment.id, comment.job_id);
    }

    fn print_comment_list(&self, comments: Vec<Comment>) {
        let rows: Vec<_> = comments
            .into_iter()
            .map(|comment| {
                vec![
                    comment.id.cell().justify(Justify::Right),
                    comment.author.cell(),
                    format_datetime(comment.created_at).cell(),
                    comment.content.cell(),
                ]
            })
            .collect();
        let header = vec![
            "ID".cell().bold(true),
            "Author".cell().bold(true),
            "Created".cell().bold(true),
            "Comment".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_next_job(&self, job: Option<Job>) {
        match job {
            Some(job) => self.print_job_detail(
                job,
                JobAnnotations {
                    tags: vec![],
                    comments: vec![],
                },
            ),
            None => println!("No job is waiting"),
        }
    }

    fn print_job_report(&self, job: Job, debit: Option<DebitReceipt>) {
        println!("Job {} is {}", job.id, job.status);
        self.print_debit(debit);
    }

    fn print_session_report(&self, session: Session, debit: Option<DebitReceipt>) {
        println!(
            "Session {} is {}, usage {}",
            session.id,
            session.status,
            format_usage(&session.resource_usage)
        );
        self.print_debit(debit);
    }

    fn print_session_list(&self, sessions: Vec<Session>) {
        let rows: Vec<_> = sessions
            .into_iter()
            .map(|session| {
                vec![
                    session.id.cell().justify(Justify::Right),
                    session.collaboration.cell(),
                    session.owner.cell(),
                    session.hardware_platform.cell(),
                    session_status_to_cell(session.status),
                    format_usage(&session.resource_usage).cell(),
                ]
            })
            .collect();
        let header = vec![
            "ID".cell().bold(true),
            "Collaboration".cell().bold(true),
            "Owner".cell().bold(true),
            "Platform".cell().bold(true),
            "State".cell().bold(true),
            "Usage".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_session_detail(&self, session: Session) {
        let duration = session
            .ended_at
            .map(|end| format_elapsed(session.started_at, end))
            .unwrap_or_default();
        let rows = vec![
            vec!["ID".cell().bold(true), session.id.cell()],
            vec!["Collaboration".cell().bold(true), session.collaboration.cell()],
            vec!["Owner".cell().bold(true), session.owner.cell()],
            vec!["Platform".cell().bold(true), session.hardware_platform.cell()],
            vec!["State".cell().bold(true), session_status_to_cell(session.status)],
            vec![
                "Started".cell().bold(true),
                format_datetime(session.started_at).cell(),
            ],
            vec![
                "Ended".cell().bold(true),
                session.ended_at.map(format_datetime).unwrap_or_default().cell(),
            ],
            vec!["Duration".cell().bold(true), duration.cell()],
            vec![
                "Usage".cell().bold(true),
                format_usage(&session.resource_usage).cell(),
            ],
        ];
        self.print_vertical_table(rows);
    }

    fn print_project_list(&self, projects: Vec<Project>) {
        let rows: Vec<_> = projects
            .into_iter()
            .map(|project| {
                let status = project_status_to_cell(project.status());
                vec![
                    project.id.cell().justify(Justify::Right),
                    project.collaboration.cell(),
                    project.owner.cell(),
                    project.title.cell(),
                    status,
                ]
            })
            .collect();
        let header = vec![
            "ID".cell().bold(true),
            "Collaboration".cell().bold(true),
            "Owner".cell().bold(true),
            "Title".cell().bold(true),
            "State".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_project_detail(&self, project: Project, quotas: Vec<Quota>) {
        let status = project_status_to_cell(project.status());
        let quotas = quotas
            .iter()
            .map(|quota| {
                format!(
                    "{}: {}/{} {} (quota {})",
                    quota.platform, quota.usage, quota.limit, quota.units, quota.id
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        let rows = vec![
            vec!["ID".cell().bold(true), project.id.cell()],
            vec!["Collaboration".cell().bold(true), project.collaboration.cell()],
            vec!["Owner".cell().bold(true), project.owner.cell()],
            vec!["Title".cell().bold(true), project.title.cell()],
            vec!["Abstract".cell().bold(true), project.abstract_.cell()],
            vec!["Description".cell().bold(true), project.description.cell()],
            vec!["State".cell().bold(true), status],
            vec![
                "Submitted".cell().bold(true),
                project
                    .submission_date
                    .map(format_datetime)
                    .unwrap_or_default()
                    .cell(),
            ],
            vec![
                "Decided".cell().bold(true),
                project
                    .decision_date
                    .map(format_datetime)
                    .unwrap_or_default()
                    .cell(),
            ],
            vec!["Quotas".cell().bold(true), quotas.cell()],
        ];
        self.print_vertical_table(rows);
    }

    fn print_quota_list(&self, quotas: Vec<Quota>) {
        let rows: Vec<_> = quotas
            .into_iter()
            .map(|quota| {
                let usage = if quota.is_exhausted() {
                    quota
                        .usage
                        .cell()
                        .foreground_color(Some(Color::Red))
                        .justify(Justify::Right)
                } else {
                    quota.usage.cell().justify(Justify::Right)
                };
                vec![
                    quota.id.cell().justify(Justify::Right),
                    quota.project_id.cell().justify(Justify::Right),
                    quota.platform.cell(),
                    usage,
                    quota.limit.cell().justify(Justify::Right),
                    quota.units.cell(),
                ]
            })
            .collect();
        let header = vec![
            "ID".cell().bold(true),
            "Project".cell().bold(true),
            "Platform".cell().bold(true),
            "Usage".cell().bold(true),
            "Limit".cell().bold(true),
            "Units".cell().bold(true),
        ];
        self.print_horizontal_table(rows, header);
    }

    fn print_quota(&self, quota: Quota) {
        self.print_quota_list(vec![quota]);
    }

    fn print_whoami(&self, caller: &Caller, platforms: Vec<String>) {
        let rows = match caller {
            Caller::User(principal) => {
                let memberships = principal
                    .memberships
                    .iter()
                    .map(|m| format!("{} ({})", m.collaboration, m.role))
                    .collect::<Vec<_>>()
                    .join("\n");
                vec![
                    vec!["User".cell().bold(true), principal.username.as_str().cell()],
                    vec!["Administrator".cell().bold(true), principal.is_admin().cell()],
                    vec!["Collaborations".cell().bold(true), memberships.cell()],
                ]
            }
            Caller::Provider(name) => vec![
                vec!["Provider".cell().bold(true), name.as_str().cell()],
                vec!["Platforms".cell().bold(true), platforms.join("\n").cell()],
            ],
        };
        self.print_vertical_table(rows);
    }

    fn print_done(&self, message: &str) {
        println!("{message}");
    }

    fn print_error(&self, error: anyhow::Error) {
        eprintln!("{:?}", error);
    }
}

fn job_status_to_cell(status: JobStatus) -> CellStruct {
    let color = match status {
        JobStatus::Submitted | JobStatus::Validated => Color::Cyan,
        JobStatus::Running | JobStatus::Mapped => Color::Yellow,
        JobStatus::Finished => Color::Green,
        JobStatus::Error => Color::Red,
        JobStatus::Removed => Color::Magenta,
    };
    status
        .as_str()
        .to_uppercase()
        .cell()
        .foreground_color(Some(color))
}

fn session_status_to_cell(status: SessionStatus) -> CellStruct {
    let color = match status {
        SessionStatus::Running => Color::Yellow,
        SessionStatus::Finished => Color::Green,
        SessionStatus::Error => Color::Red,
        SessionStatus::Removed => Color::Magenta,
    };
    status
        .as_str()
        .to_uppercase()
        .cell()
        .foreground_color(Some(color))
}

fn project_status_to_cell(status: ProjectStatus) -> CellStruct {
    let color = match status {
        ProjectStatus::InPreparation => Color::Cyan,
        ProjectStatus::UnderReview => Color::Yellow,
        ProjectStatus::Accepted => Color::Green,
        ProjectStatus::Rejected => Color::Red,
    };
    status
        .as_str()
        .to_uppercase()
        .cell()
        .foreground_color(Some(color))
}

fn format_datetime(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%d.%m.%Y %H:%M:%S")
        .to_string()
}

fn format_elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let elapsed = (end - start).to_std().unwrap_or_default();
    // Sub-second precision is noise here
    let elapsed = std::time::Duration::from_secs(elapsed.as_secs());
    humantime::format_duration(elapsed).to_string()
}

fn format_usage(usage: &ResourceUsage) -> String {
    format!("{} {}", usage.value, usage.units)
}

fn format_data_items(items: &[DataItem]) -> String {
    items
        .iter()
        .map(|item| match (&item.hash, item.size) {
            (Some(hash), Some(size)) => format!("{} ({size} B, {hash})", item.url),
            (None, Some(size)) => format!("{} ({size} B)", item.url),
            (Some(hash), None) => format!("{} ({hash})", item.url),
            (None, None) => item.url.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use hwq_core::model::DataItem;

    use super::{format_data_items, format_elapsed};

    #[test]
    fn test_format_elapsed() {
        let start = Utc::now();
        let end = start + Duration::seconds(3725) + Duration::milliseconds(300);
        insta::assert_snapshot!(format_elapsed(start, end), @"1h 2m 5s");
        assert_eq!(format_elapsed(end, start), "0s");
    }

    #[test]
    fn test_format_data_items() {
        let mut hashed = DataItem::new("https://example.org/spikes.h5");
        hashed.hash = Some("ab12".to_string());
        hashed.size = Some(1024);
        let plain = DataItem::new("https://example.org/log.txt");
        insta::assert_snapshot!(format_data_items(&[hashed, plain]), @r"
        https://example.org/spikes.h5 (1024 B, ab12)
        https://example.org/log.txt
        ");
    }
}
