// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fm_core::FakeClock;
use fm_storage::{MemoryStore, StoreOp};
use serde_json::json;

fn registry() -> (MemoryStore, FakeClock, StoreJobRegistry<MemoryStore, FakeClock>) {
    let store = MemoryStore::new();
    let clock = FakeClock::new();
    let registry = StoreJobRegistry::new(store.clone(), clock.clone(), &OrgId::root());
    (store, clock, registry)
}

#[tokio::test]
async fn create_stamps_id_time_and_default_expiry() {
    let (_, _, registry) = registry();
    let registry = registry.with_default_expiry(Duration::from_secs(60));

    let job = registry.create(NewJob::new(StartRequest::new(json!({"artifact": "X"})))).await.unwrap();

    assert!(job.id.as_str().starts_with("job-"));
    assert_eq!(job.start_request.job_id.as_ref(), Some(&job.id));
    assert_eq!(job.create_time_ms, 1_000_000);
    assert_eq!(job.expires_at_ms, 1_060_000);
    assert_eq!(job.state, JobState::Paused);
    assert_eq!(registry.get(&job.id).await.unwrap(), Some(job));
}

#[tokio::test]
async fn create_honours_explicit_expiry_and_start() {
    let (_, _, registry) = registry();
    let new_job = NewJob::new(StartRequest::default())
        .expires_at_ms(5u64)
        .start(true)
        .conditions(vec![Condition::include(["L1"])]);

    let job = registry.create(new_job).await.unwrap();

    assert_eq!(job.expires_at_ms, 5);
    assert_eq!(job.state, JobState::Running);
    assert_eq!(job.conditions, [Condition::include(["L1"])]);
}

#[tokio::test]
async fn get_missing_is_none() {
    let (_, _, registry) = registry();
    assert_eq!(registry.get(&JobId::new("job-nope")).await.unwrap(), None);
}

#[tokio::test]
async fn list_active_returns_running_jobs_in_creation_order() {
    let (_, clock, registry) = registry();
    let mut running = Vec::new();
    for i in 0..5 {
        clock.advance(Duration::from_secs(1));
        let job = registry.create(NewJob::default().start(i != 2)).await.unwrap();
        if i != 2 {
            running.push(job.id);
        }
    }

    let active: Vec<_> = registry.list_active().await.unwrap().into_iter().map(|j| j.id).collect();

    assert_eq!(active, running);
}

#[tokio::test]
async fn start_issues_fresh_create_time() {
    let (_, clock, registry) = registry();
    let job = registry.create(NewJob::default()).await.unwrap();
    clock.advance(Duration::from_secs(30));

    let started = registry.start(&job.id).await.unwrap();

    assert_eq!(started.state, JobState::Running);
    assert_eq!(started.create_time_ms, job.create_time_ms + 30_000);
}

#[tokio::test]
async fn stopped_job_restarts_as_fresh_epoch() {
    let (_, clock, registry) = registry();
    let job = registry.create(NewJob::default().start(true)).await.unwrap();
    registry.stop(&job.id).await.unwrap();
    clock.advance(Duration::from_secs(5));

    let restarted = registry.start(&job.id).await.unwrap();

    assert_eq!(restarted.state, JobState::Running);
    assert!(restarted.create_time_ms > job.create_time_ms);
}

#[tokio::test]
async fn pausing_a_paused_job_is_rejected() {
    let (_, _, registry) = registry();
    let job = registry.create(NewJob::default()).await.unwrap();

    let err = registry.pause(&job.id).await.unwrap_err();

    assert!(matches!(
        err,
        RegistryError::InvalidTransition(TransitionError { from: JobState::Paused, to: JobState::Paused, .. })
    ));
}

#[tokio::test]
async fn starting_a_running_job_is_rejected() {
    let (_, _, registry) = registry();
    let job = registry.create(NewJob::default().start(true)).await.unwrap();

    assert!(matches!(registry.start(&job.id).await, Err(RegistryError::InvalidTransition(_))));
    assert_eq!(registry.get(&job.id).await.unwrap().unwrap().create_time_ms, job.create_time_ms);
}

#[tokio::test]
async fn stop_is_idempotent_and_reports_missing_jobs() {
    let (_, _, registry) = registry();
    let job = registry.create(NewJob::default().start(true)).await.unwrap();

    registry.stop(&job.id).await.unwrap();
    registry.stop(&job.id).await.unwrap();

    assert_eq!(registry.get(&job.id).await.unwrap().unwrap().state, JobState::Stopped);
    assert!(matches!(
        registry.stop(&JobId::new("job-missing")).await,
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn stop_surfaces_store_errors() {
    let (store, _, registry) = registry();
    let job = registry.create(NewJob::default().start(true)).await.unwrap();
    store.fail_next(StoreOp::Update);

    assert!(matches!(registry.stop(&job.id).await, Err(RegistryError::Store(_))));
    assert_eq!(registry.list_active().await.unwrap().len(), 1);
}

#[tokio::test]
async fn record_scheduled_accumulates() {
    let (_, _, registry) = registry();
    let job = registry.create(NewJob::default().start(true)).await.unwrap();

    registry.record_scheduled(&job.id, 3).await.unwrap();
    registry.record_scheduled(&job.id, 2).await.unwrap();

    assert_eq!(registry.get(&job.id).await.unwrap().unwrap().stats.scheduled, 5);
}
