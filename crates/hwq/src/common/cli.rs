use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::client::commands::job::{
    CommentDeleteOpts, JobCommentOpts, JobIdOpts, JobListOpts, JobRemoveOpts, JobSubmitOpts,
    JobTagOpts,
};
use crate::client::commands::project::{
    ProjectCreateOpts, ProjectDecideOpts, ProjectIdOpts, ProjectListOpts, ProjectUpdateOpts,
};
use crate::client::commands::provider::{
    AppendLogOpts, JobReportOpts, NextJobOpts, SessionCloseOpts, SessionStartOpts,
    SessionUsageOpts,
};
use crate::client::commands::quota::{QuotaAddOpts, QuotaIdOpts, QuotaListOpts, QuotaSetOpts};
use crate::client::commands::session::{SessionIdOpts, SessionListOpts};
use crate::client::output::outputs::Outputs;

#[derive(clap::ValueEnum, Clone)]
pub enum ColorPolicy {
    /// Use colors if the stdout is detected to be a terminal.
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

// Common CLI options
#[derive(Parser)]
pub struct CommonOpts {
    /// Path of the configuration file
    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        global = true,
        env = "HWQ_CONFIG",
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub config: Option<PathBuf>,

    /// Path of the record file, overrides the configuration
    #[arg(
        long,
        value_hint = clap::ValueHint::FilePath,
        global = true,
        env = "HWQ_STORE",
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub store: Option<PathBuf>,

    /// Bearer token of a user
    #[arg(
        long,
        global = true,
        env = "HWQ_TOKEN",
        hide_env_values = true,
        conflicts_with = "api_key",
        help_heading("GLOBAL OPTIONS")
    )]
    pub token: Option<String>,

    /// API key of a hardware provider
    #[arg(
        long,
        global = true,
        env = "HWQ_API_KEY",
        hide_env_values = true,
        help_heading("GLOBAL OPTIONS")
    )]
    pub api_key: Option<String>,

    /// Sets console color policy
    #[arg(
        long,
        default_value_t = ColorPolicy::Auto,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub colors: ColorPolicy,

    /// Sets output formatting
    #[arg(
        long,
        env = "HWQ_OUTPUT_MODE",
        default_value_t = Outputs::CLI,
        value_enum,
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub output_mode: Outputs,

    /// Enables more detailed log output
    #[arg(
        long,
        env = "HWQ_DEBUG",
        global = true,
        help_heading("GLOBAL OPTIONS"),
        hide_short_help(true)
    )]
    pub debug: bool,
}

// Root CLI options
#[derive(Parser)]
#[command(
    author,
    about,
    version(crate::HWQ_VERSION),
    disable_help_subcommand(true),
    help_expected(true)
)]
pub struct RootOptions {
    #[clap(flatten)]
    pub common: CommonOpts,

    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser)]
pub enum SubCommand {
    /// Commands for jobs
    Job(JobOpts),
    /// Commands used by hardware providers
    Provider(ProviderOpts),
    /// Commands for interactive sessions
    Session(SessionOpts),
    /// Commands for resource projects
    Project(ProjectOpts),
    /// Commands for quotas of accepted projects
    Quota(QuotaOpts),
    /// Shows the identity behind the given credential
    Whoami,
    /// Generate shell completion script
    GenerateCompletion(GenerateCompletionOpts),
}

#[derive(Parser)]
pub struct JobOpts {
    #[clap(subcommand)]
    pub subcmd: JobCommand,
}

#[derive(Parser)]
pub enum JobCommand {
    /// Submit a new job
    Submit(JobSubmitOpts),
    /// Display information about jobs
    List(JobListOpts),
    /// Display detailed information about a job
    Info(JobIdOpts),
    /// Remove a job
    Remove(JobRemoveOpts),
    /// Add tags to a job
    Tag(JobTagOpts),
    /// Remove tags from a job
    Untag(JobTagOpts),
    /// Comment on a job
    Comment(JobCommentOpts),
    /// Display comments of a job
    Comments(JobIdOpts),
    /// Delete a comment
    DeleteComment(CommentDeleteOpts),
    /// Display the log of a job
    Log(JobIdOpts),
}

#[derive(Parser)]
pub struct ProviderOpts {
    #[clap(subcommand)]
    pub subcmd: ProviderCommand,
}

#[derive(Parser)]
pub enum ProviderCommand {
    /// Pick up the oldest submitted job of a platform
    Next(NextJobOpts),
    /// Report the state, outputs or usage of a job
    Update(JobReportOpts),
    /// Append text to the log of a job
    AppendLog(AppendLogOpts),
    /// Open an interactive session
    SessionStart(SessionStartOpts),
    /// Report the usage of a running session
    SessionUsage(SessionUsageOpts),
    /// Close a session and report its final usage
    SessionClose(SessionCloseOpts),
}

#[derive(Parser)]
pub struct SessionOpts {
    #[clap(subcommand)]
    pub subcmd: SessionCommand,
}

#[derive(Parser)]
pub enum SessionCommand {
    /// Display information about sessions
    List(SessionListOpts),
    /// Display detailed information about a session
    Info(SessionIdOpts),
    /// Remove a session
    Remove(SessionIdOpts),
}

#[derive(Parser)]
pub struct ProjectOpts {
    #[clap(subcommand)]
    pub subcmd: ProjectCommand,
}

#[derive(Parser)]
pub enum ProjectCommand {
    /// Create a new project
    Create(ProjectCreateOpts),
    /// Change a project
    Update(ProjectUpdateOpts),
    /// Accept or reject a submitted project
    Decide(ProjectDecideOpts),
    /// Display information about projects
    List(ProjectListOpts),
    /// Display a project with its quotas
    Info(ProjectIdOpts),
    /// Delete a project with its quotas
    Delete(ProjectIdOpts),
}

#[derive(Parser)]
pub struct QuotaOpts {
    #[clap(subcommand)]
    pub subcmd: QuotaCommand,
}

#[derive(Parser)]
pub enum QuotaCommand {
    /// Grant a quota to an accepted project
    Add(QuotaAddOpts),
    /// Display the quotas of a project
    List(QuotaListOpts),
    /// Correct the limit or usage of a quota
    Set(QuotaSetOpts),
    /// Delete a quota
    Delete(QuotaIdOpts),
}

#[derive(Parser)]
pub struct GenerateCompletionOpts {
    /// Shell flavour for which the completion script should be generated
    #[arg(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::common::cli::{
        JobCommand, JobOpts, ProviderCommand, ProviderOpts, RootOptions, SubCommand,
    };

    #[test]
    fn verify_root_cli() {
        use clap::CommandFactory;
        RootOptions::command().debug_assert()
    }

    #[test]
    fn test_parse_job_list_filters() {
        let opts = RootOptions::try_parse_from([
            "hwq",
            "--token",
            "t",
            "job",
            "list",
            "--status",
            "running",
            "--status",
            "mapped",
            "--tag",
            "v1",
            "--limit",
            "5",
        ])
        .unwrap();
        match opts.subcmd {
            SubCommand::Job(JobOpts {
                subcmd: JobCommand::List(list),
            }) => {
                assert_eq!(list.statuses.len(), 2);
                assert_eq!(list.tags, vec!["v1".to_string()]);
                assert_eq!(list.page.limit, Some(5));
                assert_eq!(list.page.offset, 0);
            }
            _ => panic!("Unexpected command"),
        }
    }

    #[test]
    fn test_invalid_status_is_rejected() {
        assert!(
            RootOptions::try_parse_from(["hwq", "job", "list", "--status", "sleeping"]).is_err()
        );
    }

    #[test]
    fn test_units_require_usage() {
        assert!(
            RootOptions::try_parse_from(["hwq", "provider", "update", "1", "--units", "hours"])
                .is_err()
        );
        let opts = RootOptions::try_parse_from([
            "hwq", "provider", "update", "1", "--usage", "2.5", "--status", "finished",
        ])
        .unwrap();
        assert!(matches!(
            opts.subcmd,
            SubCommand::Provider(ProviderOpts {
                subcmd: ProviderCommand::Update(ref update),
            }) if update.usage == Some(2.5) && update.units.is_none()
        ));
    }

    #[test]
    fn test_token_and_api_key_conflict() {
        assert!(
            RootOptions::try_parse_from(["hwq", "--token", "t", "--api-key", "k", "whoami"])
                .is_err()
        );
    }

    #[test]
    fn test_submit_requires_code() {
        assert!(
            RootOptions::try_parse_from([
                "hwq",
                "job",
                "submit",
                "--collab",
                "neuro",
                "--platform",
                "SpiNNaker"
            ])
            .is_err()
        );
    }
}
