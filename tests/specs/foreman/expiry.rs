// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Expiry specs

use crate::prelude::*;

async fn job_expiring_in(world: &World, secs: u64) -> Job {
    let deadline = world.clock.epoch_ms() + secs * 1000;
    world.registry.create(NewJob::default().start(true).expires_at_ms(deadline)).await.unwrap()
}

#[tokio::test]
async fn job_runs_until_its_deadline() {
    let world = World::new();
    world.agent("agt-1", &[]).await;
    let job = job_expiring_in(&world, 60).await;

    let report = world.tick().await;

    assert!(report.expired.is_empty());
    assert_eq!(report.scheduled, [(job.id.clone(), 1)]);
}

#[tokio::test]
async fn expired_job_is_stopped_after_one_tick() {
    let world = World::new();
    let job = job_expiring_in(&world, 60).await;

    let report = world.tick_after(61).await;

    assert_eq!(report.expired, [job.id.clone()]);
    assert_eq!(world.registry.get(&job.id).await.unwrap().unwrap().state, JobState::Stopped);
}

#[tokio::test]
async fn no_agent_receives_an_expired_job() {
    let world = World::new();
    let job = job_expiring_in(&world, 60).await;
    world.clock.advance(Duration::from_secs(61));
    world.agent("agt-1", &[]).await;

    world.tick().await;
    world.agent("agt-2", &[]).await;
    let later = world.tick_after(5).await;

    assert!(later.plan.agent_to_jobs.is_empty());
    assert!(later.expired.is_empty());
    assert!(world.launcher.calls().is_empty());
    assert!(!world.record("agt-1").await.has_applied(&job.id));
}

#[tokio::test]
async fn default_expiry_is_a_week() {
    let world = World::new();
    let job = world.job(vec![]).await;

    assert_eq!(job.expires_at_ms - job.create_time_ms, 7 * 24 * HOUR_MS);
}
