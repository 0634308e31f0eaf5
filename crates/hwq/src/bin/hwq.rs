use std::io;
use std::io::IsTerminal;

use clap::{CommandFactory, FromArgMatches};
use clap_complete::generate;
use cli_table::ColorChoice;

use hwq::client::commands::job::{
    comment_job, delete_comment, job_info, job_log, list_comments, list_jobs, remove_job,
    submit_job, tag_job, untag_job,
};
use hwq::client::commands::project::{
    create_project, decide_project, delete_project, list_projects, project_info, update_project,
};
use hwq::client::commands::provider::{
    append_log, close_session, next_job, report_job, report_session_usage, start_session,
};
use hwq::client::commands::quota::{add_quota, delete_quota, list_quotas, set_quota};
use hwq::client::commands::session::{list_sessions, remove_session, session_info};
use hwq::client::context::{get_client_context, ClientContext};
use hwq::client::globalsettings::GlobalSettings;
use hwq::client::output::cli::CliOutput;
use hwq::client::output::json::JsonOutput;
use hwq::client::output::outputs::{Output, Outputs};
use hwq::client::output::quiet::Quiet;
use hwq::common::cli::{
    ColorPolicy, CommonOpts, GenerateCompletionOpts, JobCommand, JobOpts, ProjectCommand,
    ProjectOpts, ProviderCommand, ProviderOpts, QuotaCommand, QuotaOpts, RootOptions,
    SessionCommand, SessionOpts, SubCommand,
};
use hwq::common::setup::setup_logging;
use hwq::config::Config;
use hwq_core::auth::{Caller, Credential};

// Commands

fn command_job(gsettings: &GlobalSettings, opts: JobOpts) -> anyhow::Result<()> {
    let context = get_client_context(gsettings)?;
    match opts.subcmd {
        JobCommand::Submit(opts) => submit_job(gsettings, &context, opts),
        JobCommand::List(opts) => list_jobs(gsettings, &context, opts),
        JobCommand::Info(opts) => job_info(gsettings, &context, opts),
        JobCommand::Remove(opts) => remove_job(gsettings, &context, opts),
        JobCommand::Tag(opts) => tag_job(gsettings, &context, opts),
        JobCommand::Untag(opts) => untag_job(gsettings, &context, opts),
        JobCommand::Comment(opts) => comment_job(gsettings, &context, opts),
        JobCommand::Comments(opts) => list_comments(gsettings, &context, opts),
        JobCommand::DeleteComment(opts) => delete_comment(gsettings, &context, opts),
        JobCommand::Log(opts) => job_log(gsettings, &context, opts),
    }
}

fn command_provider(gsettings: &GlobalSettings, opts: ProviderOpts) -> anyhow::Result<()> {
    let context = get_client_context(gsettings)?;
    match opts.subcmd {
        ProviderCommand::Next(opts) => next_job(gsettings, &context, opts),
        ProviderCommand::Update(opts) => report_job(gsettings, &context, opts),
        ProviderCommand::AppendLog(opts) => append_log(gsettings, &context, opts),
        ProviderCommand::SessionStart(opts) => start_session(gsettings, &context, opts),
        ProviderCommand::SessionUsage(opts) => report_session_usage(gsettings, &context, opts),
        ProviderCommand::SessionClose(opts) => close_session(gsettings, &context, opts),
    }
}

fn command_session(gsettings: &GlobalSettings, opts: SessionOpts) -> anyhow::Result<()> {
    let context = get_client_context(gsettings)?;
    match opts.subcmd {
        SessionCommand::List(opts) => list_sessions(gsettings, &context, opts),
        SessionCommand::Info(opts) => session_info(gsettings, &context, opts),
        SessionCommand::Remove(opts) => remove_session(gsettings, &context, opts),
    }
}

fn command_project(gsettings: &GlobalSettings, opts: ProjectOpts) -> anyhow::Result<()> {
    let context = get_client_context(gsettings)?;
    match opts.subcmd {
        ProjectCommand::Create(opts) => create_project(gsettings, &context, opts),
        ProjectCommand::Update(opts) => update_project(gsettings, &context, opts),
        ProjectCommand::Decide(opts) => decide_project(gsettings, &context, opts),
        ProjectCommand::List(opts) => list_projects(gsettings, &context, opts),
        ProjectCommand::Info(opts) => project_info(gsettings, &context, opts),
        ProjectCommand::Delete(opts) => delete_project(gsettings, &context, opts),
    }
}

fn command_quota(gsettings: &GlobalSettings, opts: QuotaOpts) -> anyhow::Result<()> {
    let context = get_client_context(gsettings)?;
    match opts.subcmd {
        QuotaCommand::Add(opts) => add_quota(gsettings, &context, opts),
        QuotaCommand::List(opts) => list_quotas(gsettings, &context, opts),
        QuotaCommand::Set(opts) => set_quota(gsettings, &context, opts),
        QuotaCommand::Delete(opts) => delete_quota(gsettings, &context, opts),
    }
}

fn command_whoami(gsettings: &GlobalSettings) -> anyhow::Result<()> {
    let context: ClientContext = get_client_context(gsettings)?;
    let platforms = match context.caller() {
        Caller::Provider(name) => context
            .core()
            .providers()
            .provider_platforms(name)
            .map(|p| p.to_string())
            .collect(),
        Caller::User(_) => vec![],
    };
    gsettings.printer().print_whoami(context.caller(), platforms);
    Ok(())
}

fn make_global_settings(opts: CommonOpts) -> hwq::Result<GlobalSettings> {
    let config = Config::load(opts.config.as_deref())?;
    let store_path = opts.store.unwrap_or_else(|| config.store_path());
    let credential = match (opts.token, opts.api_key) {
        (Some(token), _) => Some(Credential::Bearer(token)),
        (None, Some(key)) => Some(Credential::ApiKey(key)),
        (None, None) => None,
    };

    let color_policy = match opts.colors {
        ColorPolicy::Always => ColorChoice::AlwaysAnsi,
        ColorPolicy::Auto => {
            if io::stdout().is_terminal() {
                ColorChoice::Auto
            } else {
                ColorChoice::Never
            }
        }
        ColorPolicy::Never => ColorChoice::Never,
    };

    // Create Printer
    let printer: Box<dyn Output> = match opts.output_mode {
        Outputs::CLI => {
            // Set colored public for CLI
            match color_policy {
                ColorChoice::Always | ColorChoice::AlwaysAnsi => {
                    colored::control::set_override(true)
                }
                ColorChoice::Never => colored::control::set_override(false),
                _ => {}
            }

            Box::new(CliOutput::new(color_policy))
        }
        Outputs::JSON => Box::<JsonOutput>::default(),
        Outputs::Quiet => Box::<Quiet>::default(),
    };

    Ok(GlobalSettings::new(config, store_path, credential, printer))
}

fn generate_completion(opts: GenerateCompletionOpts) -> anyhow::Result<()> {
    let generator = opts.shell;

    let mut app = RootOptions::command();
    eprintln!("Generating completion file for {generator}...");
    generate(generator, &mut app, "hwq".to_string(), &mut io::stdout());
    Ok(())
}

fn main() -> hwq::Result<()> {
    let matches = RootOptions::command().get_matches();
    let top_opts = match RootOptions::from_arg_matches(&matches) {
        Ok(opts) => opts,
        Err(error) => error.exit(),
    };

    setup_logging(top_opts.common.debug);

    let gsettings = make_global_settings(top_opts.common)?;

    let result = match top_opts.subcmd {
        SubCommand::Job(opts) => command_job(&gsettings, opts),
        SubCommand::Provider(opts) => command_provider(&gsettings, opts),
        SubCommand::Session(opts) => command_session(&gsettings, opts),
        SubCommand::Project(opts) => command_project(&gsettings, opts),
        SubCommand::Quota(opts) => command_quota(&gsettings, opts),
        SubCommand::Whoami => command_whoami(&gsettings),
        SubCommand::GenerateCompletion(opts) => generate_completion(opts),
    };

    if let Err(e) = result {
        gsettings.printer().print_error(e);
        std::process::exit(1);
    }

    Ok(())
}
