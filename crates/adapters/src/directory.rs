// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent directory: the stored set of agent records.
//!
//! Reads are streamed page by page so a scan never holds more than one page
//! of the agent population in memory. Writes are set-matched bulk mutations;
//! nothing here reads a record in order to write it back.

use crate::indices;
use async_trait::async_trait;
use fm_core::agent::fields;
use fm_core::{AgentId, AgentRecord, JobId, OrgId};
use fm_storage::{DocumentStore, Filter, Mutation, PageRequest, StoreError};
use futures_util::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors from agent directory operations
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid agent record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Stream of agent pages.
pub type AgentPages = BoxStream<'static, Result<Vec<AgentRecord>, DirectoryError>>;

/// Default number of agents fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[async_trait]
pub trait AgentDirectory: Clone + Send + Sync + 'static {
    /// Stream every agent matching `filter`, one page per item.
    fn scan(&self, filter: Filter) -> AgentPages;

    async fn get(&self, id: &AgentId) -> Result<Option<AgentRecord>, DirectoryError>;

    /// Insert or replace a record (ingestion path).
    async fn upsert(&self, record: &AgentRecord) -> Result<(), DirectoryError>;

    /// Replace an agent's labels.
    ///
    /// Clears the agent's monitoring version so its monitoring group is
    /// recomputed on the next tick. Returns whether the agent exists.
    async fn set_labels(&self, id: &AgentId, labels: BTreeSet<String>) -> Result<bool, DirectoryError>;

    /// Commit a job assignment: add the job to each agent's applied set
    /// (only if not already present) and, when given, record the sync time.
    async fn mark_job_applied(
        &self,
        agents: &[AgentId],
        job_id: &JobId,
        synced_at_ms: Option<u64>,
    ) -> Result<u64, DirectoryError>;

    /// Commit a monitoring push: record the policy version each agent holds.
    async fn mark_monitoring_applied(
        &self,
        agents: &[AgentId],
        version: u64,
    ) -> Result<u64, DirectoryError>;
}

/// Agent directory backed by a [`DocumentStore`] index.
#[derive(Clone)]
pub struct StoreAgentDirectory<S> {
    store: S,
    index: String,
    page_size: usize,
}

impl<S: DocumentStore> StoreAgentDirectory<S> {
    pub fn new(store: S, org: &OrgId) -> Self {
        Self { store, index: indices::agents(org), page_size: DEFAULT_PAGE_SIZE }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

fn id_strings(agents: &[AgentId]) -> Vec<String> {
    agents.iter().map(|a| a.to_string()).collect()
}

async fn fetch_page<S: DocumentStore>(
    store: &S,
    index: &str,
    filter: &Filter,
    page: &PageRequest,
) -> Result<(Vec<AgentRecord>, Option<PageRequest>), DirectoryError> {
    let result = store.query(index, filter, page).await?;
    let records = result
        .hits
        .into_iter()
        .filter_map(|doc| match serde_json::from_value::<AgentRecord>(doc.source) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index, id = %doc.id, error = %e, "skipping malformed agent record");
                None
            }
        })
        .collect();
    Ok((records, result.next))
}

#[async_trait]
impl<S: DocumentStore> AgentDirectory for StoreAgentDirectory<S> {
    fn scan(&self, filter: Filter) -> AgentPages {
        let store = self.store.clone();
        let index = self.index.clone();
        stream::try_unfold(Some(PageRequest::first(self.page_size)), move |page| {
            let store = store.clone();
            let index = index.clone();
            let filter = filter.clone();
            async move {
                let Some(page) = page else {
                    return Ok(None);
                };
                let (records, next) = fetch_page(&store, &index, &filter, &page).await?;
                Ok::<_, DirectoryError>(Some((records, next)))
            }
        })
        .boxed()
    }

    async fn get(&self, id: &AgentId) -> Result<Option<AgentRecord>, DirectoryError> {
        match self.store.get(&self.index, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, record: &AgentRecord) -> Result<(), DirectoryError> {
        let doc = serde_json::to_value(record)?;
        self.store.set(&self.index, &record.agent_id, doc).await?;
        Ok(())
    }

    async fn set_labels(&self, id: &AgentId, labels: BTreeSet<String>) -> Result<bool, DirectoryError> {
        let mutations = [
            Mutation::set(fields::LABELS, serde_json::to_value(labels)?),
            Mutation::set(fields::LAST_MONITORING_VERSION, 0u64),
        ];
        let updated = self.store.update_by_ids(&self.index, &[id.to_string()], &mutations).await?;
        Ok(updated > 0)
    }

    async fn mark_job_applied(
        &self,
        agents: &[AgentId],
        job_id: &JobId,
        synced_at_ms: Option<u64>,
    ) -> Result<u64, DirectoryError> {
        let mut mutations = vec![Mutation::add_to_set(fields::APPLIED_JOB_IDS, job_id.as_str())];
        if let Some(synced_at_ms) = synced_at_ms {
            mutations.push(Mutation::set(fields::LAST_JOB_SYNC_AT, synced_at_ms));
        }
        Ok(self.store.update_by_ids(&self.index, &id_strings(agents), &mutations).await?)
    }

    async fn mark_monitoring_applied(
        &self,
        agents: &[AgentId],
        version: u64,
    ) -> Result<u64, DirectoryError> {
        let mutations = [Mutation::set(fields::LAST_MONITORING_VERSION, version)];
        Ok(self.store.update_by_ids(&self.index, &id_strings(agents), &mutations).await?)
    }
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
