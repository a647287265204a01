// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness: a Foreman over the in-memory store with fake dispatchers.

use crate::config::ForemanConfig;
use crate::foreman::{store_deps, Foreman, StoreForeman};
use fm_adapters::{
    AgentDirectory, FakeLauncher, FakeMessenger, JobRegistry, NewJob, StoreAgentDirectory,
    StoreJobRegistry, StorePolicySource,
};
use fm_core::test_support::online_agent;
use fm_core::{AgentId, AgentRecord, Clock, Condition, FakeClock, Job, MonitoringPolicy, OrgId};
use fm_storage::MemoryStore;

pub(crate) const HOUR_MS: u64 = 60 * 60 * 1000;

pub(crate) type TestForeman = StoreForeman<MemoryStore, FakeLauncher, FakeMessenger, FakeClock>;

/// Route engine logs to the test writer; filter with `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub(crate) struct Harness {
    pub store: MemoryStore,
    pub clock: FakeClock,
    pub launcher: FakeLauncher,
    pub messenger: FakeMessenger,
    pub directory: StoreAgentDirectory<MemoryStore>,
    pub registry: StoreJobRegistry<MemoryStore, FakeClock>,
    pub policy: StorePolicySource<MemoryStore>,
    pub foreman: TestForeman,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(FakeLauncher::batch(), FakeMessenger::batch(), ForemanConfig::default())
    }

    pub fn with(launcher: FakeLauncher, messenger: FakeMessenger, config: ForemanConfig) -> Self {
        init_tracing();
        let org = OrgId::root();
        let store = MemoryStore::new();
        let clock = FakeClock::at(10 * HOUR_MS);
        let deps = store_deps(
            store.clone(),
            &org,
            clock.clone(),
            &config,
            launcher.clone(),
            messenger.clone(),
        );
        let directory = deps.directory.clone();
        let registry = deps.registry.clone();
        let policy = deps.policy.clone();
        let foreman = Foreman::new(org, deps, clock.clone(), config);
        Self { store, clock, launcher, messenger, directory, registry, policy, foreman }
    }

    /// Agent seen just now carrying `labels`.
    pub async fn agent(&self, id: &str, labels: &[&str]) -> AgentRecord {
        self.put(online_agent(id, self.clock.epoch_ms(), labels)).await
    }

    pub async fn put(&self, record: AgentRecord) -> AgentRecord {
        self.directory.upsert(&record).await.unwrap();
        record
    }

    pub async fn record(&self, id: &str) -> AgentRecord {
        self.directory.get(&AgentId::new(id)).await.unwrap().unwrap()
    }

    pub async fn running_job(&self, conditions: Vec<Condition>) -> Job {
        self.registry.create(NewJob::default().conditions(conditions).start(true)).await.unwrap()
    }

    pub async fn set_policy(&self, policy: MonitoringPolicy) -> MonitoringPolicy {
        self.policy.set_policy(policy.global, policy.per_label).await.unwrap()
    }
}
