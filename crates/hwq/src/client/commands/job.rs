use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use hwq_core::model::{DataItem, JobDraft, JobStatus, RemoveMode};
use hwq_core::store::JobQuery;
use hwq_core::{CommentId, JobId};

use crate::client::commands::{non_empty, parse_json, PageOpts};
use crate::client::context::ClientContext;
use crate::client::globalsettings::GlobalSettings;
use crate::client::output::outputs::JobAnnotations;

#[derive(Parser)]
pub struct JobSubmitOpts {
    /// Collaboration the job belongs to
    #[arg(long = "collab")]
    pub collaboration: String,

    /// Hardware platform that should run the job
    #[arg(long)]
    pub platform: String,

    /// Code of the experiment
    #[arg(long, required_unless_present = "code_file", conflicts_with = "code_file")]
    pub code: Option<String>,

    /// Reads the code of the experiment from a file
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub code_file: Option<PathBuf>,

    /// Command line passed to the code on the platform
    #[arg(long)]
    pub command: Option<String>,

    /// Hardware configuration as a JSON document
    #[arg(long, value_parser = parse_json)]
    pub hardware_config: Option<serde_json::Value>,

    /// URL of an input file (can be used multiple times)
    #[arg(long = "input")]
    pub inputs: Vec<String>,

    /// Tag of the job (can be used multiple times)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Parser)]
pub struct JobListOpts {
    /// Shows only jobs of the given collaboration (can be used multiple times)
    #[arg(long = "collab")]
    pub collaborations: Vec<String>,

    /// Shows only jobs submitted by the given user
    #[arg(long)]
    pub owner: Option<String>,

    /// Shows only jobs for the given platform (can be used multiple times)
    #[arg(long = "platform")]
    pub platforms: Vec<String>,

    /// Shows only jobs in the given state (can be used multiple times).
    /// Removed jobs are hidden unless requested.
    #[arg(long = "status")]
    pub statuses: Vec<JobStatus>,

    /// Shows only jobs carrying all the given tags
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Shows only jobs submitted after the given time (RFC 3339)
    #[arg(long)]
    pub submitted_after: Option<DateTime<Utc>>,

    /// Shows only jobs submitted before the given time (RFC 3339)
    #[arg(long)]
    pub submitted_before: Option<DateTime<Utc>>,

    #[clap(flatten)]
    pub page: PageOpts,
}

#[derive(Parser)]
pub struct JobIdOpts {
    /// ID of the job
    pub job_id: JobId,
}

#[derive(Parser)]
pub struct JobRemoveOpts {
    /// ID of the job
    pub job_id: JobId,

    /// Deletes the job with its tags, comments and log (administrators only)
    #[arg(long)]
    pub hard: bool,
}

#[derive(Parser)]
pub struct JobTagOpts {
    /// ID of the job
    pub job_id: JobId,

    /// Tags to add or remove
    #[arg(required = true)]
    pub tags: Vec<String>,
}

#[derive(Parser)]
pub struct JobCommentOpts {
    /// ID of the job
    pub job_id: JobId,

    /// Text of the comment
    pub content: String,
}

#[derive(Parser)]
pub struct CommentDeleteOpts {
    /// ID of the comment
    pub comment_id: CommentId,
}

pub fn submit_job(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobSubmitOpts,
) -> anyhow::Result<()> {
    let code = match (opts.code, opts.code_file) {
        (Some(code), _) => code,
        (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Cannot read code from {}: {e}", path.display())
        })?,
        (None, None) => anyhow::bail!("No code was given, use `--code` or `--code-file`"),
    };
    let draft = JobDraft {
        collaboration: opts.collaboration,
        hardware_platform: opts.platform,
        code,
        command: opts.command,
        hardware_config: opts.hardware_config,
        input_data: opts.inputs.into_iter().map(DataItem::new).collect(),
        tags: opts.tags,
    };
    let job = context.core().create_job(context.caller(), draft)?;
    gsettings.printer().print_job_submitted(job);
    Ok(())
}

pub fn list_jobs(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobListOpts,
) -> anyhow::Result<()> {
    let query = JobQuery {
        collaborations: non_empty(opts.collaborations),
        owner: opts.owner,
        platforms: non_empty(opts.platforms),
        statuses: non_empty(opts.statuses),
        tags: opts.tags,
        submitted_after: opts.submitted_after,
        submitted_before: opts.submitted_before,
    };
    let jobs = context
        .core()
        .list_jobs(context.caller(), query, opts.page.into())?;
    gsettings.printer().print_job_list(jobs);
    Ok(())
}

pub fn job_info(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobIdOpts,
) -> anyhow::Result<()> {
    let core = context.core();
    let job = core.get_job(context.caller(), opts.job_id)?;
    let annotations = JobAnnotations {
        tags: core.get_tags(context.caller(), opts.job_id)?,
        comments: core.list_comments(context.caller(), opts.job_id)?,
    };
    gsettings.printer().print_job_detail(job, annotations);
    Ok(())
}

pub fn remove_job(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobRemoveOpts,
) -> anyhow::Result<()> {
    let mode = if opts.hard {
        RemoveMode::Hard
    } else {
        RemoveMode::Soft
    };
    context
        .core()
        .remove_job(context.caller(), opts.job_id, mode)?;
    gsettings
        .printer()
        .print_done(&format!("Job {} was removed", opts.job_id));
    Ok(())
}

pub fn tag_job(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobTagOpts,
) -> anyhow::Result<()> {
    let tags = context
        .core()
        .add_tags(context.caller(), opts.job_id, &opts.tags)?;
    gsettings.printer().print_job_tags(opts.job_id, tags);
    Ok(())
}

pub fn untag_job(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobTagOpts,
) -> anyhow::Result<()> {
    let tags = context
        .core()
        .remove_tags(context.caller(), opts.job_id, &opts.tags)?;
    gsettings.printer().print_job_tags(opts.job_id, tags);
    Ok(())
}

pub fn comment_job(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobCommentOpts,
) -> anyhow::Result<()> {
    let comment = context
        .core()
        .add_comment(context.caller(), opts.job_id, &opts.content)?;
    gsettings.printer().print_comment(comment);
    Ok(())
}

pub fn list_comments(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobIdOpts,
) -> anyhow::Result<()> {
    let comments = context
        .core()
        .list_comments(context.caller(), opts.job_id)?;
    gsettings.printer().print_comment_list(comments);
    Ok(())
}

pub fn delete_comment(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: CommentDeleteOpts,
) -> anyhow::Result<()> {
    context
        .core()
        .delete_comment(context.caller(), opts.comment_id)?;
    gsettings
        .printer()
        .print_done(&format!("Comment {} was deleted", opts.comment_id));
    Ok(())
}

pub fn job_log(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobIdOpts,
) -> anyhow::Result<()> {
    let log = context.core().get_log(context.caller(), opts.job_id)?;
    gsettings.printer().print_job_log(opts.job_id, log);
    Ok(())
}
