use std::path::PathBuf;

use clap::Parser;

use hwq_core::model::{
    DataItem, JobStatus, JobUpdate, ResourceUsage, SessionDraft, SessionStatus,
};
use hwq_core::{JobId, SessionId};

use crate::client::commands::{parse_json, usage_in_units};
use crate::client::context::ClientContext;
use crate::client::globalsettings::GlobalSettings;

#[derive(Parser)]
pub struct NextJobOpts {
    /// Platform for which a job should be picked up
    pub platform: String,
}

#[derive(Parser)]
pub struct JobReportOpts {
    /// ID of the job
    pub job_id: JobId,

    /// New state of the job
    #[arg(long)]
    pub status: Option<JobStatus>,

    /// URL of an output file (can be used multiple times).
    /// Replaces the output files reported before.
    #[arg(long = "output")]
    pub outputs: Vec<String>,

    /// Provenance record as a JSON document
    #[arg(long, value_parser = parse_json)]
    pub provenance: Option<serde_json::Value>,

    /// Replaces the log of the job with the content of a file
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Resources consumed by the job
    #[arg(long)]
    pub usage: Option<f64>,

    /// Unit of `--usage`, defaults to the unit of the job's platform
    #[arg(long, requires = "usage")]
    pub units: Option<String>,
}

#[derive(Parser)]
pub struct AppendLogOpts {
    /// ID of the job
    pub job_id: JobId,

    /// Text appended to the log
    pub text: String,
}

#[derive(Parser)]
pub struct SessionStartOpts {
    /// Collaboration the session is accounted to
    #[arg(long = "collab")]
    pub collaboration: String,

    /// User that opened the session
    #[arg(long)]
    pub owner: String,

    /// Platform the session runs on
    #[arg(long)]
    pub platform: String,
}

#[derive(Parser)]
pub struct SessionUsageOpts {
    /// ID of the session
    pub session_id: SessionId,

    /// Total resources consumed by the session so far
    pub usage: f64,

    /// Unit of the usage, defaults to the unit of the session
    #[arg(long)]
    pub units: Option<String>,
}

#[derive(Parser)]
pub struct SessionCloseOpts {
    /// ID of the session
    pub session_id: SessionId,

    /// Total resources consumed by the session
    pub usage: f64,

    /// Final state of the session
    #[arg(long, default_value = "finished")]
    pub status: SessionStatus,

    /// Unit of the usage, defaults to the unit of the session
    #[arg(long)]
    pub units: Option<String>,
}

pub fn next_job(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: NextJobOpts,
) -> anyhow::Result<()> {
    let job = context.core().next_job(context.caller(), &opts.platform)?;
    gsettings.printer().print_next_job(job);
    Ok(())
}

pub fn report_job(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: JobReportOpts,
) -> anyhow::Result<()> {
    let resource_usage = match opts.usage {
        Some(value) => {
            let job = context.core().get_job(context.caller(), opts.job_id)?;
            Some(usage_in_units(
                context,
                &job.hardware_platform,
                value,
                opts.units,
            )?)
        }
        None => None,
    };
    let log = match opts.log_file {
        Some(path) => Some(std::fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Cannot read log from {}: {e}", path.display())
        })?),
        None => None,
    };
    let output_data = if opts.outputs.is_empty() {
        None
    } else {
        Some(opts.outputs.into_iter().map(DataItem::new).collect())
    };
    let update = JobUpdate {
        status: opts.status,
        output_data,
        provenance: opts.provenance,
        log,
        resource_usage,
    };
    let outcome = context
        .core()
        .report_job_update(context.caller(), opts.job_id, update)?;
    gsettings
        .printer()
        .print_job_report(outcome.record, outcome.debit);
    Ok(())
}

pub fn append_log(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: AppendLogOpts,
) -> anyhow::Result<()> {
    context
        .core()
        .append_log(context.caller(), opts.job_id, &opts.text)?;
    gsettings
        .printer()
        .print_done(&format!("Log of job {} was extended", opts.job_id));
    Ok(())
}

pub fn start_session(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: SessionStartOpts,
) -> anyhow::Result<()> {
    let draft = SessionDraft {
        collaboration: opts.collaboration,
        owner: opts.owner,
        hardware_platform: opts.platform,
    };
    let session = context.core().create_session(context.caller(), draft)?;
    gsettings.printer().print_session_report(session, None);
    Ok(())
}

fn session_units(
    context: &ClientContext,
    session_id: SessionId,
    units: Option<String>,
) -> anyhow::Result<String> {
    match units {
        Some(units) => Ok(units),
        None => Ok(context
            .core()
            .get_session(context.caller(), session_id)?
            .resource_usage
            .units),
    }
}

pub fn report_session_usage(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: SessionUsageOpts,
) -> anyhow::Result<()> {
    let units = session_units(context, opts.session_id, opts.units)?;
    let outcome = context.core().report_session_usage(
        context.caller(),
        opts.session_id,
        ResourceUsage::new(opts.usage, units),
    )?;
    gsettings
        .printer()
        .print_session_report(outcome.record, outcome.debit);
    Ok(())
}

pub fn close_session(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: SessionCloseOpts,
) -> anyhow::Result<()> {
    let units = session_units(context, opts.session_id, opts.units)?;
    let outcome = context.core().report_session_close(
        context.caller(),
        opts.session_id,
        opts.status,
        ResourceUsage::new(opts.usage, units),
    )?;
    gsettings
        .printer()
        .print_session_report(outcome.record, outcome.debit);
    Ok(())
}
