// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: one organization over the in-memory store.

pub use fm_adapters::{
    AgentDirectory, FakeLauncher, FakeMessenger, JobRegistry, NewJob, StoreAgentDirectory,
    StoreJobRegistry, StorePolicySource,
};
pub use fm_core::test_support::{labels, online_agent, two_label_policy};
pub use fm_core::{AgentId, AgentRecord, Clock, Condition, FakeClock, Job, JobState, OrgId};
pub use fm_engine::{store_deps, Foreman, ForemanConfig, StoreForeman, TickReport};
pub use fm_storage::{MemoryStore, StoreOp};
pub use std::time::Duration;

pub const HOUR_MS: u64 = 60 * 60 * 1000;

pub struct World {
    pub store: MemoryStore,
    pub clock: FakeClock,
    pub launcher: FakeLauncher,
    pub messenger: FakeMessenger,
    pub directory: StoreAgentDirectory<MemoryStore>,
    pub registry: StoreJobRegistry<MemoryStore, FakeClock>,
    pub policy: StorePolicySource<MemoryStore>,
    pub foreman: StoreForeman<MemoryStore, FakeLauncher, FakeMessenger, FakeClock>,
}

impl World {
    pub fn new() -> Self {
        let org = OrgId::root();
        let store = MemoryStore::new();
        let clock = FakeClock::at(24 * HOUR_MS);
        let config = ForemanConfig::default();
        let launcher = FakeLauncher::batch();
        let messenger = FakeMessenger::batch();
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

    pub async fn agent(&self, id: &str, agent_labels: &[&str]) {
        self.directory.upsert(&online_agent(id, self.clock.epoch_ms(), agent_labels)).await.unwrap();
    }

    pub async fn record(&self, id: &str) -> AgentRecord {
        self.directory.get(&AgentId::new(id)).await.unwrap().unwrap()
    }

    pub async fn job(&self, conditions: Vec<Condition>) -> Job {
        self.registry.create(NewJob::default().conditions(conditions).start(true)).await.unwrap()
    }

    pub async fn tick(&self) -> TickReport {
        self.foreman.run_once().await.unwrap()
    }

    /// Tick after `secs` seconds have passed.
    pub async fn tick_after(&self, secs: u64) -> TickReport {
        self.clock.advance(Duration::from_secs(secs));
        self.tick().await
    }
}
