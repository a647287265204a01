// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::agent::AgentRecord;
use crate::policy::{ArtifactSpec, MonitoringPolicy};
use std::collections::BTreeSet;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::job::JobState;
    use proptest::prelude::*;

    pub fn arb_job_state() -> impl Strategy<Value = JobState> {
        prop_oneof![Just(JobState::Paused), Just(JobState::Running), Just(JobState::Stopped)]
    }
}

// ── Factories ───────────────────────────────────────────────────────────

pub fn labels<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

/// Agent seen at `seen_at_ms` carrying `agent_labels`.
pub fn online_agent(id: &str, seen_at_ms: u64, agent_labels: &[&str]) -> AgentRecord {
    AgentRecord::new(id, seen_at_ms).with_labels(agent_labels.iter().copied())
}

/// Policy at version 1 with one global artifact and labels `L1`, `L2`
/// (in that order), each contributing one artifact.
pub fn two_label_policy() -> MonitoringPolicy {
    let mut policy = MonitoringPolicy { version: 1, ..Default::default() };
    policy.global.push(ArtifactSpec::named("Global.Events"));
    policy.per_label.insert("L1".into(), vec![ArtifactSpec::named("L1.Events")]);
    policy.per_label.insert("L2".into(), vec![ArtifactSpec::named("L2.Events")]);
    policy
}
