// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitoring table specs

use crate::prelude::*;

#[tokio::test]
async fn every_group_receives_its_message_once() {
    let world = World::new();
    world.policy.set_policy(two_label_policy().global, two_label_policy().per_label).await.unwrap();
    world.agent("agt-1", &["L2", "L1"]).await;
    world.agent("agt-2", &["L1", "L2", "unrelated"]).await;

    world.tick().await;

    let deliveries = world.messenger.deliveries();
    assert_eq!(
        deliveries,
        [("L1|L2".to_string(), AgentId::new("agt-1")), ("L1|L2".to_string(), AgentId::new("agt-2"))]
    );
    assert_eq!(world.messenger.calls().len(), 1);
}

#[tokio::test]
async fn policy_update_reaches_every_online_agent() {
    let world = World::new();
    world.policy.set_policy(two_label_policy().global, two_label_policy().per_label).await.unwrap();
    world.agent("agt-1", &[]).await;
    world.agent("agt-2", &["L2"]).await;
    world.tick().await;

    let policy = two_label_policy();
    let updated = world.policy.set_policy(Vec::new(), policy.per_label).await.unwrap();
    let report = world.tick_after(5).await;

    assert_eq!(report.plan.monitoring_version, updated.version);
    assert_eq!(report.agents_pushed(), 2);
    assert!(report.plan.monitoring_message_by_group_key[""].requests.is_empty());
    assert_eq!(world.record("agt-1").await.last_monitoring_version, updated.version);
}

#[tokio::test]
async fn versions_only_move_forward() {
    let world = World::new();
    world.policy.set_policy(two_label_policy().global, two_label_policy().per_label).await.unwrap();
    world.agent("agt-1", &["L1"]).await;

    let mut versions = Vec::new();
    for _ in 0..3 {
        world.tick_after(5).await;
        versions.push(world.record("agt-1").await.last_monitoring_version);
    }

    assert_eq!(versions, [1, 1, 1]);
}
