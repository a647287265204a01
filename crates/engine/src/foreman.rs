// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Foreman: one reconciliation loop per organization.
//!
//! A tick runs the job-membership half (expire, compute, execute) and then
//! the monitoring half (compute, execute). Everything is recomputed from
//! the directory and registry on every tick, so a tick that fails partway
//! leaves nothing for the next one to clean up.

use crate::config::ForemanConfig;
use crate::error::ForemanError;
use crate::plan::Plan;
use fm_adapters::{
    AgentDirectory, JobRegistry, Launcher, Messenger, PolicySource, StoreAgentDirectory,
    StoreJobRegistry, StorePolicySource,
};
use fm_core::{Clock, JobId, OrgId};
use fm_storage::DocumentStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Collaborators a Foreman reconciles against.
pub struct ForemanDeps<D, R, P, L, M> {
    pub directory: D,
    pub registry: R,
    pub policy: P,
    pub launcher: L,
    pub messenger: M,
}

/// Foreman wired to store-backed directory, registry and policy.
pub type StoreForeman<S, L, M, C> =
    Foreman<StoreAgentDirectory<S>, StoreJobRegistry<S, C>, StorePolicySource<S>, L, M, C>;

/// Build store-backed collaborators for `org`.
pub fn store_deps<S, L, M, C>(
    store: S,
    org: &OrgId,
    clock: C,
    config: &ForemanConfig,
    launcher: L,
    messenger: M,
) -> ForemanDeps<StoreAgentDirectory<S>, StoreJobRegistry<S, C>, StorePolicySource<S>, L, M>
where
    S: DocumentStore,
    C: Clock,
{
    ForemanDeps {
        directory: StoreAgentDirectory::new(store.clone(), org).with_page_size(config.page_size),
        registry: StoreJobRegistry::new(store.clone(), clock, org)
            .with_default_expiry(config.default_job_expiry),
        policy: StorePolicySource::new(store, org),
        launcher,
        messenger,
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The plan the tick computed and executed
    pub plan: Plan,
    /// Jobs stopped because their deadline passed
    pub expired: Vec<JobId>,
    /// Agents committed per job
    pub scheduled: Vec<(JobId, usize)>,
    /// Agents committed per monitoring group
    pub pushed: Vec<(String, usize)>,
    /// Job- or group-local failures, each logged
    pub errors: usize,
}

impl TickReport {
    pub fn agents_scheduled(&self) -> usize {
        self.scheduled.iter().map(|(_, n)| n).sum()
    }

    pub fn agents_pushed(&self) -> usize {
        self.pushed.iter().map(|(_, n)| n).sum()
    }
}

/// Reconciliation engine for one organization.
pub struct Foreman<D, R, P, L, M, C> {
    pub(crate) org: OrgId,
    pub(crate) directory: D,
    pub(crate) registry: R,
    pub(crate) policy: P,
    pub(crate) launcher: L,
    pub(crate) messenger: M,
    pub(crate) clock: C,
    pub(crate) config: ForemanConfig,
    /// Dispatch capabilities, read once at construction
    pub(crate) batch_launch: bool,
    pub(crate) batch_message: bool,
}

impl<D, R, P, L, M, C> Foreman<D, R, P, L, M, C>
where
    D: AgentDirectory,
    R: JobRegistry,
    P: PolicySource,
    L: Launcher,
    M: Messenger,
    C: Clock,
{
    pub fn new(org: OrgId, deps: ForemanDeps<D, R, P, L, M>, clock: C, config: ForemanConfig) -> Self {
        let batch_launch = deps.launcher.supports_batch();
        let batch_message = deps.messenger.supports_batch();
        Self {
            org,
            directory: deps.directory,
            registry: deps.registry,
            policy: deps.policy,
            launcher: deps.launcher,
            messenger: deps.messenger,
            clock,
            config,
            batch_launch,
            batch_message,
        }
    }

    pub fn org(&self) -> &OrgId {
        &self.org
    }

    /// Run one tick to completion.
    pub async fn run_once(&self) -> Result<TickReport, ForemanError> {
        self.tick(&CancellationToken::new()).await
    }

    /// Tick every `tick_interval` until `cancel` fires.
    ///
    /// A tick already in flight when the token fires stops at its next page
    /// boundary during computation; execution always runs to completion.
    pub async fn run(self, cancel: CancellationToken) {
        info!(org = %self.org, interval_ms = self.config.tick_interval.as_millis() as u64, "foreman started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.tick_interval) => {}
            }
            match self.tick(&cancel).await {
                Ok(report) => {
                    debug!(
                        org = %self.org,
                        expired = report.expired.len(),
                        scheduled = report.agents_scheduled(),
                        groups = report.pushed.len(),
                        pushed = report.agents_pushed(),
                        errors = report.errors,
                        "tick complete"
                    );
                }
                Err(ForemanError::Cancelled) => break,
                Err(e) => warn!(org = %self.org, error = %e, "tick abandoned"),
            }
        }
        info!(org = %self.org, "foreman stopped");
    }

    /// Spawn [`Foreman::run`] on the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub(crate) async fn tick(&self, cancel: &CancellationToken) -> Result<TickReport, ForemanError> {
        let mut report = TickReport::default();
        let mut plan = Plan::new();

        let now = self.clock.epoch_ms();
        self.compute_job_membership(&mut plan, &mut report, now, cancel).await?;
        self.execute_job_updates(&plan, now, &mut report).await;

        self.compute_monitoring_membership(&mut plan, cancel).await?;
        self.execute_monitoring_updates(&plan, &mut report).await;

        report.plan = plan;
        Ok(report)
    }
}

#[cfg(test)]
#[path = "foreman_tests.rs"]
mod tests;
