// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job assignment specs

use crate::prelude::*;

#[tokio::test]
async fn every_matching_online_agent_gets_the_job_once() {
    let world = World::new();
    for i in 0..5 {
        world.agent(&format!("agt-{i}"), &["web"]).await;
    }
    world.agent("agt-db", &["db"]).await;
    let job = world.job(vec![Condition::include(["web"])]).await;

    for _ in 0..3 {
        world.tick_after(5).await;
    }

    let pairs = world.launcher.scheduled_pairs();
    assert_eq!(pairs.len(), 5);
    assert!(pairs.iter().all(|(id, _)| *id == job.id));
    assert!(!world.record("agt-db").await.has_applied(&job.id));
}

#[tokio::test]
async fn offline_agents_never_appear_in_a_plan() {
    let world = World::new();
    world
        .directory
        .upsert(&online_agent("agt-old", world.clock.epoch_ms() - 2 * HOUR_MS, &["L1"]))
        .await
        .unwrap();
    world.policy.set_policy(two_label_policy().global, two_label_policy().per_label).await.unwrap();
    world.job(vec![]).await;

    let report = world.tick().await;

    assert!(report.plan.is_empty());
}

#[tokio::test]
async fn agent_coming_back_online_is_scheduled() {
    let world = World::new();
    let seen = world.clock.epoch_ms();
    world.directory.upsert(&online_agent("agt-1", seen, &[])).await.unwrap();
    world.clock.advance(Duration::from_millis(2 * HOUR_MS));
    let job = world.job(vec![]).await;

    assert!(world.tick().await.plan.agent_to_jobs.is_empty());

    world.agent("agt-1", &[]).await;
    let report = world.tick_after(5).await;

    assert_eq!(report.scheduled, [(job.id.clone(), 1)]);
}

#[tokio::test]
async fn lost_commit_duplicates_rather_than_drops() {
    let world = World::new();
    world.agent("agt-1", &[]).await;
    let job = world.job(vec![]).await;
    world.store.fail_next(StoreOp::Update);

    let first = world.tick().await;
    let second = world.tick_after(5).await;

    assert_eq!(first.errors, 1);
    assert_eq!(second.scheduled, [(job.id.clone(), 1)]);
    assert_eq!(world.launcher.scheduled_pairs().len(), 2);
    assert_eq!(world.record("agt-1").await.applied_job_ids.len(), 1);
}

#[tokio::test]
async fn resurrected_job_is_treated_as_new() {
    let world = World::new();
    world.agent("agt-1", &[]).await;
    let job = world.job(vec![]).await;
    world.registry.stop(&job.id).await.unwrap();
    world.tick().await;
    assert!(world.launcher.calls().is_empty());

    world.clock.advance(Duration::from_secs(60));
    world.registry.start(&job.id).await.unwrap();
    let report = world.tick_after(5).await;

    assert_eq!(report.scheduled, [(job.id.clone(), 1)]);
}

#[tokio::test]
async fn paused_jobs_are_left_alone() {
    let world = World::new();
    world.agent("agt-1", &[]).await;
    let job = world.registry.create(NewJob::default()).await.unwrap();

    let report = world.tick().await;

    assert!(report.plan.agent_to_jobs.is_empty());
    assert_eq!(world.registry.get(&job.id).await.unwrap().unwrap().state, JobState::Paused);
}
