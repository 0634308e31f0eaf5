use clap::Parser;

use hwq_core::model::{ProjectDraft, ProjectStatus, ProjectUpdate};
use hwq_core::queue::projects::ProjectFilter;
use hwq_core::ProjectId;

use crate::client::context::ClientContext;
use crate::client::globalsettings::GlobalSettings;

#[derive(Parser)]
pub struct ProjectCreateOpts {
    /// Collaboration applying for the resources
    #[arg(long = "collab")]
    pub collaboration: String,

    /// Title of the project
    #[arg(long)]
    pub title: String,

    /// Short summary of the project
    #[arg(long = "abstract", default_value = "")]
    pub abstract_: String,

    /// Full description of the project
    #[arg(long, default_value = "")]
    pub description: String,

    /// Submits the project for review right away
    #[arg(long)]
    pub submit: bool,
}

#[derive(Parser)]
pub struct ProjectUpdateOpts {
    /// ID of the project
    pub project_id: ProjectId,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New summary
    #[arg(long = "abstract")]
    pub abstract_: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,

    /// Submits the project for review
    #[arg(long)]
    pub submit: bool,
}

#[derive(clap::ValueEnum, Clone, Copy)]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Parser)]
pub struct ProjectDecideOpts {
    /// ID of the project
    pub project_id: ProjectId,

    /// Outcome of the review
    #[arg(value_enum)]
    pub decision: Decision,
}

#[derive(Parser)]
pub struct ProjectListOpts {
    /// Shows only projects of the given collaboration
    #[arg(long = "collab")]
    pub collaboration: Option<String>,

    /// Shows only projects in the given state
    #[arg(long)]
    pub status: Option<ProjectStatus>,
}

#[derive(Parser)]
pub struct ProjectIdOpts {
    /// ID of the project
    pub project_id: ProjectId,
}

pub fn create_project(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: ProjectCreateOpts,
) -> anyhow::Result<()> {
    let draft = ProjectDraft {
        collaboration: opts.collaboration,
        title: opts.title,
        abstract_: opts.abstract_,
        description: opts.description,
        submit: opts.submit,
    };
    let project = context.core().create_project(context.caller(), draft)?;
    gsettings.printer().print_project_detail(project, vec![]);
    Ok(())
}

pub fn update_project(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: ProjectUpdateOpts,
) -> anyhow::Result<()> {
    let update = ProjectUpdate {
        title: opts.title,
        abstract_: opts.abstract_,
        description: opts.description,
        submit: opts.submit,
    };
    let project = context
        .core()
        .update_project(context.caller(), opts.project_id, update)?;
    gsettings.printer().print_project_detail(project, vec![]);
    Ok(())
}

pub fn decide_project(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: ProjectDecideOpts,
) -> anyhow::Result<()> {
    let accepted = matches!(opts.decision, Decision::Accept);
    let project = context
        .core()
        .decide_project(context.caller(), opts.project_id, accepted)?;
    gsettings.printer().print_project_detail(project, vec![]);
    Ok(())
}

pub fn list_projects(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: ProjectListOpts,
) -> anyhow::Result<()> {
    let filter = ProjectFilter {
        collaboration: opts.collaboration,
        status: opts.status,
    };
    let projects = context.core().list_projects(context.caller(), filter)?;
    gsettings.printer().print_project_list(projects);
    Ok(())
}

pub fn project_info(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: ProjectIdOpts,
) -> anyhow::Result<()> {
    let core = context.core();
    let project = core.get_project(context.caller(), opts.project_id)?;
    let quotas = core.list_quotas(context.caller(), opts.project_id)?;
    gsettings.printer().print_project_detail(project, quotas);
    Ok(())
}

pub fn delete_project(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: ProjectIdOpts,
) -> anyhow::Result<()> {
    context
        .core()
        .delete_project(context.caller(), opts.project_id)?;
    gsettings
        .printer()
        .print_done(&format!("Project {} was deleted", opts.project_id));
    Ok(())
}
