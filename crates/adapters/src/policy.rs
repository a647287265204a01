// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitoring policy source.

use crate::indices;
use async_trait::async_trait;
use fm_core::{ArtifactSpec, MonitoringPolicy, OrgId};
use fm_storage::{DocumentStore, StoreError};
use indexmap::IndexMap;
use thiserror::Error;

/// Document id of the policy within the organization's config index
pub const POLICY_DOC_ID: &str = "monitoring_policy";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid monitoring policy: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[async_trait]
pub trait PolicySource: Clone + Send + Sync + 'static {
    /// The policy in force. An organization without one gets an empty
    /// policy at version 0, which no agent is ever behind.
    async fn current(&self) -> Result<MonitoringPolicy, PolicyError>;
}

/// Policy source reading a single document from the config index.
#[derive(Clone)]
pub struct StorePolicySource<S> {
    store: S,
    index: String,
}

impl<S: DocumentStore> StorePolicySource<S> {
    pub fn new(store: S, org: &OrgId) -> Self {
        Self { store, index: indices::config(org) }
    }

    /// Replace the policy, bumping its version past the stored one.
    pub async fn set_policy(
        &self,
        global: Vec<ArtifactSpec>,
        per_label: IndexMap<String, Vec<ArtifactSpec>>,
    ) -> Result<MonitoringPolicy, PolicyError> {
        let previous = self.current().await?;
        let policy = MonitoringPolicy { version: previous.version + 1, global, per_label };
        self.store.set(&self.index, POLICY_DOC_ID, serde_json::to_value(&policy)?).await?;
        tracing::info!(index = %self.index, version = policy.version, "monitoring policy updated");
        Ok(policy)
    }
}

#[async_trait]
impl<S: DocumentStore> PolicySource for StorePolicySource<S> {
    async fn current(&self) -> Result<MonitoringPolicy, PolicyError> {
        match self.store.get(&self.index, POLICY_DOC_ID).await? {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Ok(MonitoringPolicy::default()),
        }
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
