use std::collections::BTreeSet;

use crate::auth::{
    Caller, Membership, Principal, ProviderEntry, ProviderTable, Role, ADMIN_COLLABORATION,
};
use crate::ledger::{Ledger, OverflowPolicy, QuotaOrder};
use crate::model::{Job, JobDraft, PlatformTable};
use crate::queue::QueueCore;
use crate::store::{MemoryStore, RecordStore};
use crate::tests::utils::{accepted_project, QuotaBuilder, StaticDirectory};
use crate::{ProjectId, QuotaId};

pub type TestCore<S = MemoryStore> = QueueCore<S, StaticDirectory>;

pub const MANCHESTER_KEY: &str = "manchester-key";
pub const HEIDELBERG_KEY: &str = "heidelberg-key";

/// Editor of "neuro".
pub fn alice() -> Principal {
    Principal::new("alice", vec![Membership::new("neuro", Role::Editor)])
}

/// Viewer of "neuro".
pub fn bob() -> Principal {
    Principal::new("bob", vec![Membership::new("neuro", Role::Viewer)])
}

/// Platform administrator.
pub fn carol() -> Principal {
    Principal::new(
        "carol",
        vec![Membership::new(ADMIN_COLLABORATION, Role::Administrator)],
    )
}

/// Member of nothing.
pub fn dave() -> Principal {
    Principal::new("dave", vec![])
}

pub fn user(principal: Principal) -> Caller {
    Caller::User(principal)
}

/// Operates SpiNNaker.
pub fn manchester() -> Caller {
    Caller::Provider("manchester".to_string())
}

/// Operates both BrainScaleS systems.
pub fn heidelberg() -> Caller {
    Caller::Provider("heidelberg".to_string())
}

pub fn directory() -> StaticDirectory {
    StaticDirectory::default()
        .with_user("alice-token", alice())
        .with_user("bob-token", bob())
        .with_user("carol-token", carol())
        .with_user("dave-token", dave())
        .with_public("open-lab")
}

pub fn providers() -> ProviderTable {
    let entry = |name: &str, key: &str, platforms: &[&str]| ProviderEntry {
        name: name.to_string(),
        api_key: key.to_string(),
        platforms: platforms
            .iter()
            .map(|p| p.to_string())
            .collect::<BTreeSet<_>>(),
    };
    ProviderTable::new([
        entry("manchester", MANCHESTER_KEY, &["SpiNNaker"]),
        entry("heidelberg", HEIDELBERG_KEY, &["BrainScaleS", "BrainScaleS-2"]),
    ])
    .unwrap()
}

pub fn create_test_core() -> TestCore {
    create_test_core_with(MemoryStore::new(), OverflowPolicy::Drop)
}

pub fn create_test_core_with<S: RecordStore>(store: S, overflow: OverflowPolicy) -> TestCore<S> {
    QueueCore::new(
        store,
        directory(),
        providers(),
        Ledger::new(
            PlatformTable::default(),
            QuotaOrder::CreationTime,
            overflow,
        ),
    )
}

/// Accepted project of `collaboration` with one quota on `platform`, inserted directly.
pub fn grant<S: RecordStore>(
    core: &TestCore<S>,
    collaboration: &str,
    platform: &str,
    limit: f64,
) -> (ProjectId, QuotaId) {
    let units = core
        .ledger()
        .platforms()
        .canonical_units(platform)
        .unwrap()
        .to_string();
    core.store()
        .transaction(|tx| {
            let project = tx.insert_project(accepted_project(collaboration))?;
            let quota = tx.insert_quota(
                QuotaBuilder::new(limit)
                    .project(project)
                    .platform(platform, &units)
                    .build(),
            )?;
            Ok((project, quota))
        })
        .unwrap()
}

pub fn quota_usage<S: RecordStore>(core: &TestCore<S>, quota_id: QuotaId) -> f64 {
    core.store()
        .read(|tx| tx.get_quota(quota_id))
        .unwrap()
        .unwrap()
        .usage
}

pub fn draft(collaboration: &str, platform: &str) -> JobDraft {
    JobDraft {
        collaboration: collaboration.to_string(),
        hardware_platform: platform.to_string(),
        code: "sim.run(1000)".to_string(),
        ..Default::default()
    }
}

/// Job of alice in "neuro" on SpiNNaker, with a fresh quota behind it.
pub fn submit_test_job(core: &TestCore) -> Job {
    grant(core, "neuro", "SpiNNaker", 100.0);
    core.create_job(&user(alice()), draft("neuro", "SpiNNaker"))
        .unwrap()
}

