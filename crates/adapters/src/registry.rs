// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job registry ("hunt dispatcher"): CRUD and lifecycle over stored jobs.

use crate::indices;
use async_trait::async_trait;
use fm_core::{Clock, Condition, Job, JobId, JobState, JobStats, OrgId, StartRequest, TransitionError};
use fm_storage::{DocumentStore, Filter, Mutation, PageRequest, StoreError};
use std::time::Duration;
use thiserror::Error;

/// Errors from job registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid job record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Default lifetime of a job that was created without an explicit expiry
pub const DEFAULT_JOB_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const PAGE_SIZE: usize = 500;

/// Parameters for a new job.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub start_request: StartRequest,
    pub conditions: Vec<Condition>,
    pub expires_at_ms: Option<u64>,
    /// Create in `Running` rather than `Paused`
    pub start: bool,
}

impl NewJob {
    pub fn new(start_request: StartRequest) -> Self {
        Self { start_request, ..Default::default() }
    }

    fm_core::setters! {
        set {
            conditions: Vec<Condition>,
            start: bool,
        }
        option {
            expires_at_ms: u64,
        }
    }
}

#[async_trait]
pub trait JobRegistry: Clone + Send + Sync + 'static {
    async fn create(&self, new_job: NewJob) -> Result<Job, RegistryError>;

    async fn get(&self, id: &JobId) -> Result<Option<Job>, RegistryError>;

    /// Running jobs in lifecycle (creation) order.
    async fn list_active(&self) -> Result<Vec<Job>, RegistryError>;

    /// Move a paused or stopped job to running with a fresh creation time.
    async fn start(&self, id: &JobId) -> Result<Job, RegistryError>;

    async fn pause(&self, id: &JobId) -> Result<Job, RegistryError>;

    /// Stop a job. Idempotent.
    async fn stop(&self, id: &JobId) -> Result<(), RegistryError>;

    /// Count agents a job was committed to.
    async fn record_scheduled(&self, id: &JobId, count: u64) -> Result<(), RegistryError>;
}

/// Job registry backed by a [`DocumentStore`] index.
#[derive(Clone)]
pub struct StoreJobRegistry<S, C> {
    store: S,
    clock: C,
    index: String,
    default_expiry: Duration,
}

impl<S: DocumentStore, C: Clock> StoreJobRegistry<S, C> {
    pub fn new(store: S, clock: C, org: &OrgId) -> Self {
        Self { store, clock, index: indices::jobs(org), default_expiry: DEFAULT_JOB_EXPIRY }
    }

    pub fn with_default_expiry(mut self, expiry: Duration) -> Self {
        self.default_expiry = expiry;
        self
    }

    async fn load(&self, id: &JobId) -> Result<Job, RegistryError> {
        match self.store.get(&self.index, id).await? {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Err(RegistryError::NotFound(id.clone())),
        }
    }

    async fn save(&self, job: &Job) -> Result<(), RegistryError> {
        self.store.set(&self.index, &job.id, serde_json::to_value(job)?).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore, C: Clock> JobRegistry for StoreJobRegistry<S, C> {
    async fn create(&self, new_job: NewJob) -> Result<Job, RegistryError> {
        let now = self.clock.epoch_ms();
        let id = JobId::generate();
        let job = Job {
            start_request: StartRequest { job_id: Some(id.clone()), ..new_job.start_request },
            id,
            conditions: new_job.conditions,
            create_time_ms: now,
            expires_at_ms: new_job
                .expires_at_ms
                .unwrap_or_else(|| now.saturating_add(self.default_expiry.as_millis() as u64)),
            state: if new_job.start { JobState::Running } else { JobState::Paused },
            stats: JobStats::default(),
        };
        self.save(&job).await?;
        tracing::info!(job_id = %job.id, state = %job.state, expires_at_ms = job.expires_at_ms, "job created");
        Ok(job)
    }

    async fn get(&self, id: &JobId) -> Result<Option<Job>, RegistryError> {
        match self.load(id).await {
            Ok(job) => Ok(Some(job)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_active(&self) -> Result<Vec<Job>, RegistryError> {
        let filter = Filter::term("state", JobState::Running.to_string());
        let mut jobs = Vec::new();
        let mut page = Some(PageRequest::first(PAGE_SIZE));
        while let Some(request) = page {
            let result = self.store.query(&self.index, &filter, &request).await?;
            for doc in result.hits {
                jobs.push(serde_json::from_value::<Job>(doc.source)?);
            }
            page = result.next;
        }
        jobs.sort_by(|a, b| a.create_time_ms.cmp(&b.create_time_ms).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }

    async fn start(&self, id: &JobId) -> Result<Job, RegistryError> {
        let mut job = self.load(id).await?;
        job.transition(JobState::Running)?;
        // New synchronization epoch: agents synced before now must be
        // eligible again, even after a stop/start cycle.
        job.create_time_ms = self.clock.epoch_ms();
        self.save(&job).await?;
        tracing::info!(job_id = %job.id, create_time_ms = job.create_time_ms, "job started");
        Ok(job)
    }

    async fn pause(&self, id: &JobId) -> Result<Job, RegistryError> {
        let mut job = self.load(id).await?;
        job.transition(JobState::Paused)?;
        self.save(&job).await?;
        tracing::info!(job_id = %job.id, "job paused");
        Ok(job)
    }

    async fn stop(&self, id: &JobId) -> Result<(), RegistryError> {
        let mutations = [Mutation::set("state", JobState::Stopped.to_string())];
        let updated = self.store.update_by_ids(&self.index, &[id.to_string()], &mutations).await?;
        if updated == 0 {
            return Err(RegistryError::NotFound(id.clone()));
        }
        tracing::info!(job_id = %id, "job stopped");
        Ok(())
    }

    async fn record_scheduled(&self, id: &JobId, count: u64) -> Result<(), RegistryError> {
        let mutations = [Mutation::increment("stats.scheduled", count)];
        self.store.update_by_ids(&self.index, &[id.to_string()], &mutations).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
