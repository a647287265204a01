// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one Foreman loop per organization.

use crate::foreman::Foreman;
use fm_adapters::{AgentDirectory, JobRegistry, Launcher, Messenger, PolicySource};
use fm_core::{Clock, OrgId};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Owns the per-organization loops and their shared shutdown signal.
pub struct ForemanSupervisor {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    orgs: Vec<OrgId>,
}

impl Default for ForemanSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl ForemanSupervisor {
    pub fn new() -> Self {
        Self { cancel: CancellationToken::new(), tasks: JoinSet::new(), orgs: Vec::new() }
    }

    /// Start `foreman`'s loop. Returns false if its organization already has one.
    pub fn spawn<D, R, P, L, M, C>(&mut self, foreman: Foreman<D, R, P, L, M, C>) -> bool
    where
        D: AgentDirectory,
        R: JobRegistry,
        P: PolicySource,
        L: Launcher,
        M: Messenger,
        C: Clock,
    {
        if self.orgs.contains(foreman.org()) {
            warn!(org = %foreman.org(), "foreman already running for organization");
            return false;
        }
        self.orgs.push(foreman.org().clone());
        self.tasks.spawn(foreman.run(self.cancel.child_token()));
        true
    }

    /// Organizations with a running loop.
    pub fn orgs(&self) -> &[OrgId] {
        &self.orgs
    }

    /// Cancel every loop and wait for all of them to exit.
    pub async fn shutdown(mut self) {
        info!(orgs = self.orgs.len(), "stopping foreman loops");
        self.cancel.cancel();
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "foreman task failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
