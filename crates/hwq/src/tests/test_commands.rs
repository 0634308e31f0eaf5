use clap::Parser;

use hwq_core::auth::{Caller, Credential};
use hwq_core::model::{JobStatus, SessionStatus};
use hwq_core::store::{JobQuery, Pagination};
use hwq_core::{CoreError, JobId, ProjectId, SessionId};

use crate::client::commands::job::{
    comment_job, job_log, list_jobs, remove_job, submit_job, tag_job, untag_job, JobCommentOpts,
    JobIdOpts, JobListOpts, JobRemoveOpts, JobSubmitOpts, JobTagOpts,
};
use crate::client::commands::project::{
    create_project, decide_project, ProjectCreateOpts, ProjectDecideOpts,
};
use crate::client::commands::provider::{
    append_log, close_session, next_job, report_job, report_session_usage, start_session,
    AppendLogOpts, JobReportOpts, NextJobOpts, SessionCloseOpts, SessionStartOpts,
    SessionUsageOpts,
};
use crate::client::commands::quota::{add_quota, QuotaAddOpts};
use crate::client::context::get_client_context;
use crate::tests::env::TestEnv;

fn opts<T: Parser>(args: &[&str]) -> T {
    T::try_parse_from(std::iter::once("hwq").chain(args.iter().copied())).unwrap()
}

fn core_error(error: &anyhow::Error) -> &CoreError {
    error.downcast_ref::<CoreError>().unwrap()
}

fn submit(env: &TestEnv, token: &str, args: &[&str]) -> anyhow::Result<()> {
    let (gsettings, context) = env.user(token);
    submit_job(&gsettings, &context, opts::<JobSubmitOpts>(args))
}

/// Alice submits a tagged SpiNNaker job to "neuro".
fn submit_neuro_job(env: &TestEnv) {
    submit(
        env,
        "alice-token",
        &[
            "--collab",
            "neuro",
            "--platform",
            "SpiNNaker",
            "--code",
            "import pyNN",
            "--hardware-config",
            r#"{"boards": 1}"#,
            "--input",
            "https://example.org/in.dat",
            "--tag",
            "v1",
        ],
    )
    .unwrap();
}

/// Accepted "neuro" project holding a quota of `limit` on `platform`.
fn grant_quota(env: &TestEnv, platform: &str, limit: &str) -> ProjectId {
    let (gsettings, context) = env.user("alice-token");
    create_project(
        &gsettings,
        &context,
        opts::<ProjectCreateOpts>(&["--collab", "neuro", "--title", "Cortex", "--submit"]),
    )
    .unwrap();
    let project_id = context
        .core()
        .list_projects(context.caller(), Default::default())
        .unwrap()
        .iter()
        .map(|p| p.id)
        .max()
        .unwrap();

    let (gsettings, context) = env.user("carol-token");
    let id = project_id.to_string();
    decide_project(
        &gsettings,
        &context,
        opts::<ProjectDecideOpts>(&[&id, "accept"]),
    )
    .unwrap();
    add_quota(
        &gsettings,
        &context,
        opts::<QuotaAddOpts>(&[&id, platform, limit]),
    )
    .unwrap();
    project_id
}

/// Environment where "neuro" may run on SpiNNaker.
fn neuro_env() -> TestEnv {
    let env = TestEnv::new();
    grant_quota(&env, "SpiNNaker", "100");
    env
}

#[test]
fn test_missing_credential() {
    let env = TestEnv::new();
    let error = get_client_context(&env.settings_without_credential())
        .err()
        .unwrap();
    assert!(error.to_string().contains("No credential"));
}

#[test]
fn test_unknown_credentials() {
    let env = TestEnv::new();
    for credential in [
        Credential::Bearer("nobody".to_string()),
        Credential::ApiKey("wrong".to_string()),
    ] {
        let error = get_client_context(&env.settings(credential)).err().unwrap();
        assert!(matches!(core_error(&error), CoreError::Unauthenticated));
    }
}

#[test]
fn test_callers() {
    let env = TestEnv::new();
    let (_, context) = env.user("alice-token");
    assert!(matches!(context.caller(), Caller::User(p) if p.username == "alice"));
    let (_, context) = env.provider();
    assert_eq!(context.caller(), &Caller::Provider("manchester".to_string()));
}

#[test]
fn test_submit_and_list_jobs() {
    let env = neuro_env();
    submit_neuro_job(&env);

    let (gsettings, context) = env.user("bob-token");
    list_jobs(
        &gsettings,
        &context,
        opts::<JobListOpts>(&["--collab", "neuro", "--tag", "v1"]),
    )
    .unwrap();

    let jobs = context
        .core()
        .list_jobs(context.caller(), JobQuery::default(), Pagination::default())
        .unwrap();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.id, JobId::new(1));
    assert_eq!(job.owner, "alice");
    assert_eq!(job.status, JobStatus::Submitted);
    assert_eq!(job.code, "import pyNN");
    assert_eq!(job.hardware_config, Some(serde_json::json!({"boards": 1})));
    assert_eq!(job.input_data.len(), 1);
    assert_eq!(
        context.core().get_tags(context.caller(), job.id).unwrap(),
        vec!["v1".to_string()]
    );
}

#[test]
fn test_submit_code_from_file() {
    let env = neuro_env();
    let path = env.store_path().with_file_name("run.py");
    std::fs::write(&path, "print('spikes')").unwrap();
    let path = path.to_string_lossy().to_string();
    submit(
        &env,
        "alice-token",
        &[
            "--collab",
            "neuro",
            "--platform",
            "SpiNNaker",
            "--code-file",
            &path,
        ],
    )
    .unwrap();

    let (_, context) = env.user("alice-token");
    let job = context.core().get_job(context.caller(), JobId::new(1)).unwrap();
    assert_eq!(job.code, "print('spikes')");
}

#[test]
fn test_viewer_cannot_submit() {
    let env = TestEnv::new();
    let error = submit(
        &env,
        "bob-token",
        &["--collab", "neuro", "--platform", "SpiNNaker", "--code", "x"],
    )
    .unwrap_err();
    assert!(matches!(core_error(&error), CoreError::Forbidden(_)));

    let (_, context) = env.user("bob-token");
    assert!(context
        .core()
        .list_jobs(context.caller(), JobQuery::default(), Pagination::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_provider_lifecycle_is_persisted() {
    let env = neuro_env();
    submit_neuro_job(&env);

    let (gsettings, context) = env.provider();
    next_job(&gsettings, &context, opts::<NextJobOpts>(&["SpiNNaker"])).unwrap();
    report_job(
        &gsettings,
        &context,
        opts::<JobReportOpts>(&["1", "--status", "running"]),
    )
    .unwrap();
    append_log(
        &gsettings,
        &context,
        opts::<AppendLogOpts>(&["1", "booting\n"]),
    )
    .unwrap();
    report_job(
        &gsettings,
        &context,
        opts::<JobReportOpts>(&[
            "1",
            "--status",
            "finished",
            "--output",
            "https://example.org/out.dat",
            "--provenance",
            r#"{"machine": "spinn-5"}"#,
        ]),
    )
    .unwrap();

    // Fresh context, so everything is read back from the record file.
    let (gsettings, context) = env.user("alice-token");
    let job = context.core().get_job(context.caller(), JobId::new(1)).unwrap();
    assert_eq!(job.status, JobStatus::Finished);
    assert!(job.completed_at.is_some());
    assert_eq!(job.output_data.len(), 1);
    assert_eq!(
        job.provenance,
        Some(serde_json::json!({"machine": "spinn-5"}))
    );
    assert_eq!(
        context.core().get_log(context.caller(), job.id).unwrap(),
        Some("booting\n".to_string())
    );
    job_log(&gsettings, &context, opts::<JobIdOpts>(&["1"])).unwrap();
}

#[test]
fn test_report_from_log_file() {
    let env = neuro_env();
    submit_neuro_job(&env);
    let path = env.store_path().with_file_name("job.log");
    std::fs::write(&path, "full log").unwrap();
    let path = path.to_string_lossy().to_string();

    let (gsettings, context) = env.provider();
    report_job(
        &gsettings,
        &context,
        opts::<JobReportOpts>(&["1", "--log-file", &path]),
    )
    .unwrap();
    assert_eq!(
        context
            .core()
            .get_log(context.caller(), JobId::new(1))
            .unwrap(),
        Some("full log".to_string())
    );
}

#[test]
fn test_invalid_transition_keeps_job() {
    let env = neuro_env();
    submit_neuro_job(&env);

    let (gsettings, context) = env.provider();
    let error = report_job(
        &gsettings,
        &context,
        opts::<JobReportOpts>(&["1", "--status", "mapped"]),
    )
    .unwrap_err();
    assert!(matches!(
        core_error(&error),
        CoreError::InvalidTransition { kind: "job", .. }
    ));

    let (_, context) = env.user("alice-token");
    let job = context.core().get_job(context.caller(), JobId::new(1)).unwrap();
    assert_eq!(job.status, JobStatus::Submitted);
}

#[test]
fn test_job_usage_is_charged_to_quota() {
    let env = TestEnv::new();
    let project_id = grant_quota(&env, "SpiNNaker", "100");
    submit_neuro_job(&env);

    let (gsettings, context) = env.provider();
    report_job(
        &gsettings,
        &context,
        opts::<JobReportOpts>(&["1", "--status", "running"]),
    )
    .unwrap();
    report_job(
        &gsettings,
        &context,
        opts::<JobReportOpts>(&["1", "--status", "finished", "--usage", "30"]),
    )
    .unwrap();

    let (_, context) = env.user("carol-token");
    let quotas = context
        .core()
        .list_quotas(context.caller(), project_id)
        .unwrap();
    assert_eq!(quotas.len(), 1);
    assert_eq!(quotas[0].units, "core-hours");
    assert_eq!(quotas[0].usage, 30.0);

    let job = context.core().get_job(context.caller(), JobId::new(1)).unwrap();
    let usage = job.resource_usage.unwrap();
    assert_eq!(usage.value, 30.0);
    assert_eq!(usage.units, "core-hours");
}

#[test]
fn test_usage_in_wrong_units_is_rejected() {
    let env = neuro_env();
    submit_neuro_job(&env);

    let (gsettings, context) = env.provider();
    let error = report_job(
        &gsettings,
        &context,
        opts::<JobReportOpts>(&["1", "--usage", "1", "--units", "wafer-hours"]),
    )
    .unwrap_err();
    assert!(matches!(core_error(&error), CoreError::UnitMismatch { .. }));
}

#[test]
fn test_tags_and_comments() {
    let env = neuro_env();
    submit_neuro_job(&env);

    let (gsettings, context) = env.user("alice-token");
    tag_job(
        &gsettings,
        &context,
        opts::<JobTagOpts>(&["1", "v2", "best"]),
    )
    .unwrap();
    untag_job(&gsettings, &context, opts::<JobTagOpts>(&["1", "v1"])).unwrap();
    comment_job(
        &gsettings,
        &context,
        opts::<JobCommentOpts>(&["1", "Nice raster plot"]),
    )
    .unwrap();

    let (_, context) = env.user("bob-token");
    let mut tags = context
        .core()
        .get_tags(context.caller(), JobId::new(1))
        .unwrap();
    tags.sort();
    assert_eq!(tags, vec!["best".to_string(), "v2".to_string()]);
    let comments = context
        .core()
        .list_comments(context.caller(), JobId::new(1))
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author, "alice");
    assert_eq!(comments[0].content, "Nice raster plot");
}

#[test]
fn test_soft_and_hard_removal() {
    let env = neuro_env();
    submit_neuro_job(&env);
    submit_neuro_job(&env);

    let (gsettings, context) = env.user("alice-token");
    remove_job(&gsettings, &context, opts::<JobRemoveOpts>(&["1"])).unwrap();
    let error =
        remove_job(&gsettings, &context, opts::<JobRemoveOpts>(&["2", "--hard"])).unwrap_err();
    assert!(matches!(core_error(&error), CoreError::Forbidden(_)));

    let (gsettings, context) = env.user("carol-token");
    remove_job(&gsettings, &context, opts::<JobRemoveOpts>(&["2", "--hard"])).unwrap();

    let (_, context) = env.user("alice-token");
    let job = context.core().get_job(context.caller(), JobId::new(1)).unwrap();
    assert_eq!(job.status, JobStatus::Removed);
    let error = context
        .core()
        .get_job(context.caller(), JobId::new(2))
        .unwrap_err();
    assert!(matches!(error, CoreError::NotFound { kind: "job", .. }));
}

#[test]
fn test_session_usage_and_close() {
    let env = TestEnv::new();
    let project_id = grant_quota(&env, "SpiNNaker", "10");

    let (gsettings, context) = env.provider();
    start_session(
        &gsettings,
        &context,
        opts::<SessionStartOpts>(&[
            "--collab",
            "neuro",
            "--owner",
            "alice",
            "--platform",
            "SpiNNaker",
        ]),
    )
    .unwrap();
    report_session_usage(&gsettings, &context, opts::<SessionUsageOpts>(&["1", "4"])).unwrap();
    close_session(&gsettings, &context, opts::<SessionCloseOpts>(&["1", "6"])).unwrap();

    let (_, context) = env.user("alice-token");
    let session = context
        .core()
        .get_session(context.caller(), SessionId::new(1))
        .unwrap();
    assert_eq!(session.status, SessionStatus::Finished);
    assert_eq!(session.resource_usage.value, 6.0);
    assert_eq!(session.resource_usage.units, "core-hours");

    let (_, context) = env.user("carol-token");
    let quotas = context
        .core()
        .list_quotas(context.caller(), project_id)
        .unwrap();
    assert_eq!(quotas[0].usage, 6.0);
}

#[test]
fn test_provider_limited_to_its_platforms() {
    let env = TestEnv::new();
    grant_quota(&env, "BrainScaleS", "5");
    submit(
        &env,
        "alice-token",
        &["--collab", "neuro", "--platform", "BrainScaleS", "--code", "x"],
    )
    .unwrap();

    let (gsettings, context) = env.provider();
    let error = next_job(&gsettings, &context, opts::<NextJobOpts>(&["BrainScaleS"])).unwrap_err();
    assert!(matches!(
        core_error(&error),
        CoreError::PlatformMismatch { .. }
    ));
}
