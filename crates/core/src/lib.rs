// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fm-core: Domain types for the fleet-management control plane

pub mod macros;

pub mod agent;
pub mod clock;
pub mod id;
pub mod job;
pub mod org;
pub mod policy;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use agent::{AgentId, AgentRecord, OsKind};
pub use clock::{Clock, FakeClock, SystemClock};
pub use job::{Condition, Job, JobId, JobState, JobStats, StartRequest, TransitionError};
pub use org::OrgId;
pub use policy::{
    group_key, ArtifactSpec, CollectorRequest, MonitoringMessage, MonitoringPolicy, Timeout,
    GROUP_KEY_SEPARATOR,
};
