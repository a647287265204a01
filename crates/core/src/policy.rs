// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitoring policy, group keys, and the messages built from them.
//!
//! The policy is a global artifact list plus an ordered table of per-label
//! artifact lists. An agent's *group* is the subset of policy labels it
//! carries, in policy-table order; every agent in a group receives the same
//! message, so messages are built once per group rather than once per agent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Separator between labels in a group key.
pub const GROUP_KEY_SEPARATOR: &str = "|";

/// One continuous-collection artifact as written in the policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wait_secs: Option<u64>,
    /// Ignored for monitoring: event queries never time out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ArtifactSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
            max_wait_secs: None,
            timeout_secs: None,
        }
    }
}

/// Collection timeout carried by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeout {
    Never,
    After(u64),
}

/// An artifact with defaults applied, ready to ship to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    pub max_wait_secs: u64,
    pub timeout: Timeout,
}

/// The monitoring table pushed to every agent of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringMessage {
    pub version: u64,
    pub group_key: String,
    pub requests: Vec<CollectorRequest>,
}

/// Global + per-label continuous-collection configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringPolicy {
    /// Bumped on every policy change; agents below it are stale
    pub version: u64,
    #[serde(default)]
    pub global: Vec<ArtifactSpec>,
    /// Per-label artifacts. Iteration order is the policy's label order.
    #[serde(default)]
    pub per_label: IndexMap<String, Vec<ArtifactSpec>>,
}

impl MonitoringPolicy {
    /// Policy labels carried by an agent, in policy-table order.
    pub fn group_labels<'a>(&'a self, agent_labels: &BTreeSet<String>) -> Vec<&'a str> {
        self.per_label.keys().filter(|label| agent_labels.contains(*label)).map(String::as_str).collect()
    }

    /// Build the message for a group.
    ///
    /// Starts from the global artifacts and appends each group label's
    /// artifacts in policy order, so a larger label set always yields a
    /// superset of a smaller one's requests.
    pub fn build_message(&self, group_labels: &[&str], default_max_wait_secs: u64) -> MonitoringMessage {
        let label_specs =
            group_labels.iter().filter_map(|label| self.per_label.get(*label)).flatten();
        let requests = self
            .global
            .iter()
            .chain(label_specs)
            .map(|spec| CollectorRequest {
                name: spec.name.clone(),
                parameters: spec.parameters.clone(),
                max_wait_secs: spec.max_wait_secs.unwrap_or(default_max_wait_secs),
                timeout: Timeout::Never,
            })
            .collect();
        MonitoringMessage { version: self.version, group_key: group_key(group_labels), requests }
    }
}

/// Canonical key for a group; the empty key means "global only".
pub fn group_key(group_labels: &[&str]) -> String {
    group_labels.join(GROUP_KEY_SEPARATOR)
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
