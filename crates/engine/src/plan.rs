// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The diff computed by one tick.

use fm_core::{AgentId, Job, JobId, MonitoringMessage};
use indexmap::IndexMap;
use std::collections::BTreeMap;

/// Work one tick has decided to do.
///
/// Filled by the compute phases, consumed by the execute phases, then
/// dropped. Jobs keep lifecycle order; agents keep directory scan order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    /// Jobs each agent is missing
    pub agent_to_jobs: IndexMap<AgentId, Vec<JobId>>,
    /// Jobs referenced by `agent_to_jobs`, in lifecycle order
    pub jobs_by_id: IndexMap<JobId, Job>,
    /// One message per monitoring group
    pub monitoring_message_by_group_key: BTreeMap<String, MonitoringMessage>,
    /// Stale agents grouped by monitoring group key
    pub agents_by_group_key: BTreeMap<String, Vec<AgentId>>,
    /// Policy version the monitoring half was computed against
    pub monitoring_version: u64,
    /// Running jobs whose directory scan failed this tick
    pub unscanned_jobs: Vec<JobId>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the tick found nothing to do.
    pub fn is_empty(&self) -> bool {
        self.agent_to_jobs.is_empty() && self.agents_by_group_key.is_empty()
    }

    /// Record that `agent` is missing `job`.
    pub fn assign(&mut self, agent: AgentId, job: &Job) {
        if !self.jobs_by_id.contains_key(&job.id) {
            self.jobs_by_id.insert(job.id.clone(), job.clone());
        }
        let jobs = self.agent_to_jobs.entry(agent).or_default();
        if !jobs.contains(&job.id) {
            jobs.push(job.id.clone());
        }
    }

    /// Inverse of `agent_to_jobs`, keyed in lifecycle order.
    ///
    /// Jobs with no agents are omitted.
    pub fn job_to_agents(&self) -> IndexMap<JobId, Vec<AgentId>> {
        let mut inverse: IndexMap<JobId, Vec<AgentId>> =
            self.jobs_by_id.keys().map(|id| (id.clone(), Vec::new())).collect();
        for (agent, jobs) in &self.agent_to_jobs {
            for job in jobs {
                if let Some(agents) = inverse.get_mut(job) {
                    agents.push(agent.clone());
                }
            }
        }
        inverse.retain(|_, agents| !agents.is_empty());
        inverse
    }

    /// Put `agent` in the group `key`, building the group's message on first use.
    pub fn add_to_group(
        &mut self,
        key: String,
        agent: AgentId,
        build_message: impl FnOnce() -> MonitoringMessage,
    ) {
        if !self.monitoring_message_by_group_key.contains_key(&key) {
            self.monitoring_message_by_group_key.insert(key.clone(), build_message());
        }
        self.agents_by_group_key.entry(key).or_default().push(agent);
    }

    /// Number of agents the monitoring half touches.
    pub fn monitoring_agent_count(&self) -> usize {
        self.agents_by_group_key.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
