// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet-wide jobs and their lifecycle state machine.

use crate::agent::{AgentId, OsKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a fleet-wide job.
    pub struct JobId("job-");
}

/// Lifecycle state of a job.
///
/// `Paused → Running → Stopped`. Only `Running` jobs are reconciled, and the
/// Foreman itself never moves a job out of `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Paused,
    Running,
    Stopped,
}

crate::simple_display! {
    JobState {
        Paused => "paused",
        Running => "running",
        Stopped => "stopped",
    }
}

impl JobState {
    /// Whether moving from `self` to `to` is an allowed explicit transition.
    ///
    /// `Stopped → Running` is a resurrection: the registry must hand the job a
    /// fresh creation time so earlier sync markers cannot suppress it.
    pub fn can_transition_to(self, to: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, to),
            (Paused, Running) | (Running, Paused) | (Stopped, Running) | (_, Stopped)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("job {job_id}: cannot move from {from} to {to}")]
pub struct TransitionError {
    pub job_id: JobId,
    pub from: JobState,
    pub to: JobState,
}

/// Run-time counters for a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    #[serde(default)]
    pub scheduled: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub errored: u64,
}

/// Targeting condition carried by a job.
///
/// A job carries any number of conditions; an agent must satisfy all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Condition {
    /// Agent must carry at least one of these labels
    LabelInclude(BTreeSet<String>),
    /// Agent must carry none of these labels
    LabelExclude(BTreeSet<String>),
    /// Agent must report this operating system
    Os(OsKind),
    /// Matches every agent
    None,
}

impl Condition {
    pub fn include<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition::LabelInclude(labels.into_iter().map(Into::into).collect())
    }

    pub fn exclude<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Condition::LabelExclude(labels.into_iter().map(Into::into).collect())
    }
}

/// Opaque work descriptor handed to the launcher.
///
/// The control plane never looks inside `body`; it only stamps the job and,
/// on the per-agent path, the target agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl StartRequest {
    pub fn new(body: serde_json::Value) -> Self {
        Self { job_id: None, agent_id: None, body }
    }

    /// Clone of this request addressed to a single agent.
    pub fn for_agent(&self, agent_id: &AgentId) -> Self {
        Self { agent_id: Some(agent_id.clone()), ..self.clone() }
    }
}

/// A fleet-wide job ("hunt").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub start_request: StartRequest,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Synchronization epoch: agents synced after this never get the job again
    pub create_time_ms: u64,
    pub expires_at_ms: u64,
    pub state: JobState,
    #[serde(default)]
    pub stats: JobStats,
}

impl Job {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms < now_ms
    }

    /// Apply an explicit lifecycle transition.
    pub fn transition(&mut self, to: JobState) -> Result<(), TransitionError> {
        if !self.state.can_transition_to(to) {
            return Err(TransitionError { job_id: self.id.clone(), from: self.state, to });
        }
        self.state = to;
        Ok(())
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "job-test",
        }
        set {
            start_request: StartRequest = StartRequest::default(),
            conditions: Vec<Condition> = Vec::new(),
            create_time_ms: u64 = 1_000_000,
            expires_at_ms: u64 = u64::MAX,
            state: JobState = JobState::Running,
            stats: JobStats = JobStats::default(),
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
