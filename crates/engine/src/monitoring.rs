// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitoring table: push the current policy to agents holding a stale one.

use crate::error::ForemanError;
use crate::foreman::{Foreman, TickReport};
use crate::plan::Plan;
use fm_adapters::{AgentDirectory, DispatchError, JobRegistry, Launcher, Messenger, PolicySource};
use fm_core::agent::fields;
use fm_core::{group_key, AgentId, Clock, MonitoringMessage};
use fm_storage::{Filter, RangeBound};
use futures_util::TryStreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Directory filter for online agents behind policy `version`.
pub(crate) fn stale_filter(version: u64, online_cutoff_ms: u64) -> Filter {
    Filter::And(vec![
        Filter::range_or_missing(fields::LAST_MONITORING_VERSION, RangeBound::Below(version)),
        Filter::range(fields::LAST_SEEN_AT, RangeBound::AtLeast(online_cutoff_ms)),
    ])
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
    /// Group stale agents by monitoring group key, one message per group.
    pub(crate) async fn compute_monitoring_membership(
        &self,
        plan: &mut Plan,
        cancel: &CancellationToken,
    ) -> Result<(), ForemanError> {
        let policy = self.policy.current().await?;
        plan.monitoring_version = policy.version;
        if policy.version == 0 {
            return Ok(());
        }

        let cutoff = self.config.online_cutoff_ms(self.clock.epoch_ms());
        let max_wait_secs = self.config.default_max_wait.as_secs();
        let mut pages = self.directory.scan(stale_filter(policy.version, cutoff));
        while let Some(page) = pages.try_next().await? {
            if cancel.is_cancelled() {
                return Err(ForemanError::Cancelled);
            }
            for agent in page {
                let labels = policy.group_labels(&agent.labels);
                plan.add_to_group(group_key(&labels), agent.agent_id, || {
                    policy.build_message(&labels, max_wait_secs)
                });
            }
        }
        Ok(())
    }

    /// Send each group its message, then record the version it now holds.
    pub(crate) async fn execute_monitoring_updates(&self, plan: &Plan, report: &mut TickReport) {
        for (key, agents) in &plan.agents_by_group_key {
            let Some(message) = plan.monitoring_message_by_group_key.get(key) else {
                continue;
            };

            if let Err(e) = self.send(message, agents).await {
                warn!(org = %self.org, group = %key, agents = agents.len(), error = %e, "monitoring push failed");
                report.errors += 1;
                continue;
            }

            if let Err(e) = self.directory.mark_monitoring_applied(agents, plan.monitoring_version).await {
                warn!(org = %self.org, group = %key, agents = agents.len(), error = %e, "failed to mark monitoring applied");
                report.errors += 1;
                continue;
            }

            info!(
                org = %self.org,
                group = %key,
                version = plan.monitoring_version,
                agents = agents.len(),
                "pushed monitoring table"
            );
            report.pushed.push((key.clone(), agents.len()));
        }
    }

    async fn send(&self, message: &MonitoringMessage, agents: &[AgentId]) -> Result<(), DispatchError> {
        if self.batch_message {
            return self.messenger.send_to_many(message, agents).await;
        }
        debug!(group = %message.group_key, agents = agents.len(), "messenger has no batch path, sending per agent");
        for agent in agents {
            self.messenger.send(message, agent).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "monitoring_tests.rs"]
mod tests;
