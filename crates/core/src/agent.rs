// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier and directory record.
//!
//! An agent is a remote endpoint under fleet management. The record holds
//! the subset of its directory entry the control plane reconciles against:
//! liveness, labels, and the two convergence markers the Foreman advances.

use crate::job::JobId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

crate::define_id! {
    /// Unique identifier for a managed agent.
    pub struct AgentId("agt-");
}

/// Operating system family reported by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OsKind {
    Windows,
    Linux,
    Darwin,
}

crate::simple_display! {
    OsKind {
        Windows => "windows",
        Linux => "linux",
        Darwin => "darwin",
    }
}

/// Document field names of an agent record in the directory index.
///
/// Filters and scripted updates address fields by these names, so they are
/// part of the stored format.
pub mod fields {
    pub const AGENT_ID: &str = "agent_id";
    pub const LAST_SEEN_AT: &str = "last_seen_at_ms";
    pub const LABELS: &str = "labels";
    pub const OS: &str = "os";
    pub const APPLIED_JOB_IDS: &str = "applied_job_ids";
    pub const LAST_JOB_SYNC_AT: &str = "last_job_sync_at_ms";
    pub const LAST_MONITORING_VERSION: &str = "last_monitoring_version";
}

/// Directory entry for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub agent_id: AgentId,
    /// Last time the agent talked to the server
    pub last_seen_at_ms: u64,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsKind>,
    /// Jobs already scheduled on this agent. Only ever grows.
    #[serde(default)]
    pub applied_job_ids: BTreeSet<JobId>,
    /// When the Foreman last committed a job assignment for this agent
    #[serde(default)]
    pub last_job_sync_at_ms: u64,
    /// Monitoring policy version last pushed to this agent (0 = never / stale)
    #[serde(default)]
    pub last_monitoring_version: u64,
}

impl AgentRecord {
    pub fn new(agent_id: impl Into<AgentId>, last_seen_at_ms: u64) -> Self {
        Self {
            agent_id: agent_id.into(),
            last_seen_at_ms,
            labels: BTreeSet::new(),
            os: None,
            applied_job_ids: BTreeSet::new(),
            last_job_sync_at_ms: 0,
            last_monitoring_version: 0,
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_os(mut self, os: OsKind) -> Self {
        self.os = Some(os);
        self
    }

    pub fn has_applied(&self, job_id: &JobId) -> bool {
        self.applied_job_ids.contains(job_id)
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
