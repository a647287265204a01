// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch dispatch: the launcher that schedules jobs on agents and the
//! messenger that delivers monitoring tables.
//!
//! Both expose an optional batch capability. Callers ask `supports_batch()`
//! once and otherwise use the single-agent path; implementations without a
//! batch path keep the default `*_many` methods, which refuse.

use async_trait::async_trait;
use fm_core::{AgentId, MonitoringMessage, StartRequest};
use thiserror::Error;

/// Errors from dispatch operations
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0} is not supported by this dispatcher")]
    Unsupported(&'static str),

    #[error("dispatch failed: {0}")]
    Failed(String),
}

/// Adapter that schedules flow work on agents.
#[async_trait]
pub trait Launcher: Clone + Send + Sync + 'static {
    fn supports_batch(&self) -> bool {
        false
    }

    /// Schedule `request` on every agent in `agents` in one call.
    async fn schedule_on_many(
        &self,
        _request: &StartRequest,
        _agents: &[AgentId],
    ) -> Result<(), DispatchError> {
        Err(DispatchError::Unsupported("schedule_on_many"))
    }

    /// Schedule a request already addressed to a single agent.
    async fn schedule(&self, request: StartRequest) -> Result<(), DispatchError>;
}

/// Adapter that queues messages for agents.
///
/// Delivery is fire-and-forget: success means queued, not acknowledged.
#[async_trait]
pub trait Messenger: Clone + Send + Sync + 'static {
    fn supports_batch(&self) -> bool {
        false
    }

    async fn send_to_many(
        &self,
        _message: &MonitoringMessage,
        _agents: &[AgentId],
    ) -> Result<(), DispatchError> {
        Err(DispatchError::Unsupported("send_to_many"))
    }

    async fn send(&self, message: &MonitoringMessage, agent: &AgentId) -> Result<(), DispatchError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{DispatchError, Launcher, Messenger};
    use async_trait::async_trait;
    use fm_core::{AgentId, JobId, MonitoringMessage, StartRequest};
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// Shared failure switches for the fakes.
    #[derive(Default)]
    struct Faults {
        /// Fail this many upcoming calls
        fail_calls: usize,
        /// Fail any call that targets one of these agents
        fail_agents: HashSet<AgentId>,
    }

    impl Faults {
        fn check(&mut self, agents: &[&AgentId]) -> Result<(), DispatchError> {
            if self.fail_calls > 0 {
                self.fail_calls -= 1;
                return Err(DispatchError::Failed("injected failure".into()));
            }
            if let Some(agent) = agents.iter().find(|a| self.fail_agents.contains(**a)) {
                return Err(DispatchError::Failed(format!("agent {agent} unreachable")));
            }
            Ok(())
        }
    }

    /// Recorded successful launcher call
    #[derive(Debug, Clone, PartialEq)]
    pub enum LaunchCall {
        Batch { request: StartRequest, agents: Vec<AgentId> },
        Single { request: StartRequest },
    }

    struct FakeLauncherState {
        batch: bool,
        calls: Vec<LaunchCall>,
        faults: Faults,
    }

    /// Fake launcher recording every successful call
    #[derive(Clone)]
    pub struct FakeLauncher {
        inner: Arc<Mutex<FakeLauncherState>>,
    }

    impl FakeLauncher {
        /// Launcher with a batch path
        pub fn batch() -> Self {
            Self::with_batch(true)
        }

        /// Launcher that only schedules one agent at a time
        pub fn single() -> Self {
            Self::with_batch(false)
        }

        fn with_batch(batch: bool) -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeLauncherState {
                    batch,
                    calls: Vec::new(),
                    faults: Faults::default(),
                })),
            }
        }

        pub fn calls(&self) -> Vec<LaunchCall> {
            self.inner.lock().calls.clone()
        }

        /// Fail the next `n` calls
        pub fn fail_next(&self, n: usize) {
            self.inner.lock().faults.fail_calls = n;
        }

        /// Fail every call that targets `agent`
        pub fn fail_agent(&self, agent: impl Into<AgentId>) {
            self.inner.lock().faults.fail_agents.insert(agent.into());
        }

        /// Every (job, agent) pair scheduled so far, in call order
        pub fn scheduled_pairs(&self) -> Vec<(JobId, AgentId)> {
            let calls = self.inner.lock().calls.clone();
            let mut pairs = Vec::new();
            for call in calls {
                match call {
                    LaunchCall::Batch { request, agents } => {
                        if let Some(job_id) = request.job_id {
                            pairs.extend(agents.into_iter().map(|a| (job_id.clone(), a)));
                        }
                    }
                    LaunchCall::Single { request } => {
                        if let (Some(job_id), Some(agent)) = (request.job_id, request.agent_id) {
                            pairs.push((job_id, agent));
                        }
                    }
                }
            }
            pairs
        }
    }

    #[async_trait]
    impl Launcher for FakeLauncher {
        fn supports_batch(&self) -> bool {
            self.inner.lock().batch
        }

        async fn schedule_on_many(
            &self,
            request: &StartRequest,
            agents: &[AgentId],
        ) -> Result<(), DispatchError> {
            let mut state = self.inner.lock();
            if !state.batch {
                return Err(DispatchError::Unsupported("schedule_on_many"));
            }
            state.faults.check(&agents.iter().collect::<Vec<_>>())?;
            state.calls.push(LaunchCall::Batch { request: request.clone(), agents: agents.to_vec() });
            Ok(())
        }

        async fn schedule(&self, request: StartRequest) -> Result<(), DispatchError> {
            let mut state = self.inner.lock();
            let target: Vec<&AgentId> = request.agent_id.iter().collect();
            state.faults.check(&target)?;
            state.calls.push(LaunchCall::Single { request });
            Ok(())
        }
    }

    /// Recorded successful messenger call
    #[derive(Debug, Clone, PartialEq)]
    pub enum MessageCall {
        Batch { message: MonitoringMessage, agents: Vec<AgentId> },
        Single { message: MonitoringMessage, agent: AgentId },
    }

    struct FakeMessengerState {
        batch: bool,
        calls: Vec<MessageCall>,
        faults: Faults,
    }

    /// Fake messenger recording every successful call
    #[derive(Clone)]
    pub struct FakeMessenger {
        inner: Arc<Mutex<FakeMessengerState>>,
    }

    impl FakeMessenger {
        pub fn batch() -> Self {
            Self::with_batch(true)
        }

        pub fn single() -> Self {
            Self::with_batch(false)
        }

        fn with_batch(batch: bool) -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeMessengerState {
                    batch,
                    calls: Vec::new(),
                    faults: Faults::default(),
                })),
            }
        }

        pub fn calls(&self) -> Vec<MessageCall> {
            self.inner.lock().calls.clone()
        }

        pub fn fail_next(&self, n: usize) {
            self.inner.lock().faults.fail_calls = n;
        }

        pub fn fail_agent(&self, agent: impl Into<AgentId>) {
            self.inner.lock().faults.fail_agents.insert(agent.into());
        }

        /// Every (group key, agent) delivery so far, in call order
        pub fn deliveries(&self) -> Vec<(String, AgentId)> {
            let calls = self.inner.lock().calls.clone();
            let mut deliveries = Vec::new();
            for call in calls {
                match call {
                    MessageCall::Batch { message, agents } => {
                        deliveries.extend(agents.into_iter().map(|a| (message.group_key.clone(), a)));
                    }
                    MessageCall::Single { message, agent } => deliveries.push((message.group_key, agent)),
                }
            }
            deliveries
        }
    }

    #[async_trait]
    impl Messenger for FakeMessenger {
        fn supports_batch(&self) -> bool {
            self.inner.lock().batch
        }

        async fn send_to_many(
            &self,
            message: &MonitoringMessage,
            agents: &[AgentId],
        ) -> Result<(), DispatchError> {
            let mut state = self.inner.lock();
            if !state.batch {
                return Err(DispatchError::Unsupported("send_to_many"));
            }
            state.faults.check(&agents.iter().collect::<Vec<_>>())?;
            state.calls.push(MessageCall::Batch { message: message.clone(), agents: agents.to_vec() });
            Ok(())
        }

        async fn send(&self, message: &MonitoringMessage, agent: &AgentId) -> Result<(), DispatchError> {
            let mut state = self.inner.lock();
            state.faults.check(&[agent])?;
            state.calls.push(MessageCall::Single { message: message.clone(), agent: agent.clone() });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLauncher, FakeMessenger, LaunchCall, MessageCall};

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
