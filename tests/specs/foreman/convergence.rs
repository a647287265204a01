// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Convergence specs
//!
//! A tick over unchanged state does nothing; a change touches only what
//! changed.

use crate::prelude::*;
use std::collections::BTreeMap;

async fn four_label_groups() -> World {
    let world = World::new();
    world.policy.set_policy(two_label_policy().global, two_label_policy().per_label).await.unwrap();
    world.agent("agt-1", &[]).await;
    world.agent("agt-2", &["L1"]).await;
    world.agent("agt-3", &["L2"]).await;
    world.agent("agt-4", &["L1", "L2"]).await;
    world
}

#[tokio::test]
async fn each_label_set_gets_its_own_group() {
    let world = four_label_groups().await;

    let report = world.tick().await;

    let groups = &report.plan.agents_by_group_key;
    assert_eq!(groups.keys().map(String::as_str).collect::<Vec<_>>(), ["", "L1", "L1|L2", "L2"]);
    assert!(groups.values().all(|agents| agents.len() == 1));
    assert_eq!(groups["L1|L2"], [AgentId::new("agt-4")]);
}

#[tokio::test]
async fn rerun_without_changes_is_empty() {
    let world = four_label_groups().await;
    world.job(vec![]).await;
    world.tick().await;

    let again = world.tick_after(5).await;

    assert!(again.plan.is_empty(), "second plan should be empty: {:?}", again.plan);
    assert_eq!(world.launcher.calls().len(), 1);
    assert_eq!(world.messenger.calls().len(), 4);
}

#[tokio::test]
async fn label_change_touches_only_that_agent() {
    let world = four_label_groups().await;
    world.tick().await;

    world.directory.set_labels(&AgentId::new("agt-1"), labels(["L1"])).await.unwrap();
    let report = world.tick_after(5).await;

    similar_asserts::assert_eq!(
        report.plan.agents_by_group_key,
        BTreeMap::from([("L1".to_string(), vec![AgentId::new("agt-1")])])
    );
    assert_eq!(world.record("agt-1").await.last_monitoring_version, 1);
}

fn artifact_names<'a>(report: &'a TickReport, key: &str) -> Vec<&'a str> {
    report.plan.monitoring_message_by_group_key[key].requests.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn larger_label_sets_get_superset_messages() {
    let world = four_label_groups().await;

    let report = world.tick().await;

    similar_asserts::assert_eq!(artifact_names(&report, ""), vec!["Global.Events"]);
    similar_asserts::assert_eq!(artifact_names(&report, "L1"), vec!["Global.Events", "L1.Events"]);
    similar_asserts::assert_eq!(artifact_names(&report, "L2"), vec!["Global.Events", "L2.Events"]);
    similar_asserts::assert_eq!(
        artifact_names(&report, "L1|L2"),
        vec!["Global.Events", "L1.Events", "L2.Events"]
    );
}

#[tokio::test]
async fn new_agent_catches_up_on_everything() {
    let world = four_label_groups().await;
    let job = world.job(vec![]).await;
    world.tick().await;

    world.agent("agt-5", &["L2"]).await;
    let report = world.tick_after(5).await;

    assert_eq!(report.plan.agent_to_jobs.keys().collect::<Vec<_>>(), [&AgentId::new("agt-5")]);
    assert_eq!(report.plan.agents_by_group_key["L2"], [AgentId::new("agt-5")]);
    assert!(world.record("agt-5").await.has_applied(&job.id));
}
