use clap::Parser;

use hwq_core::model::SessionStatus;
use hwq_core::store::SessionQuery;
use hwq_core::SessionId;

use crate::client::commands::{non_empty, PageOpts};
use crate::client::context::ClientContext;
use crate::client::globalsettings::GlobalSettings;

#[derive(Parser)]
pub struct SessionListOpts {
    /// Shows only sessions of the given collaboration (can be used multiple times)
    #[arg(long = "collab")]
    pub collaborations: Vec<String>,

    /// Shows only sessions of the given user
    #[arg(long)]
    pub owner: Option<String>,

    /// Shows only sessions on the given platform (can be used multiple times)
    #[arg(long = "platform")]
    pub platforms: Vec<String>,

    /// Shows only sessions in the given state (can be used multiple times)
    #[arg(long = "status")]
    pub statuses: Vec<SessionStatus>,

    #[clap(flatten)]
    pub page: PageOpts,
}

#[derive(Parser)]
pub struct SessionIdOpts {
    /// ID of the session
    pub session_id: SessionId,
}

pub fn list_sessions(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: SessionListOpts,
) -> anyhow::Result<()> {
    let query = SessionQuery {
        collaborations: non_empty(opts.collaborations),
        owner: opts.owner,
        platforms: non_empty(opts.platforms),
        statuses: non_empty(opts.statuses),
    };
    let sessions = context
        .core()
        .list_sessions(context.caller(), query, opts.page.into())?;
    gsettings.printer().print_session_list(sessions);
    Ok(())
}

pub fn session_info(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: SessionIdOpts,
) -> anyhow::Result<()> {
    let session = context
        .core()
        .get_session(context.caller(), opts.session_id)?;
    gsettings.printer().print_session_detail(session);
    Ok(())
}

pub fn remove_session(
    gsettings: &GlobalSettings,
    context: &ClientContext,
    opts: SessionIdOpts,
) -> anyhow::Result<()> {
    context
        .core()
        .remove_session(context.caller(), opts.session_id)?;
    gsettings
        .printer()
        .print_done(&format!("Session {} was removed", opts.session_id));
    Ok(())
}
