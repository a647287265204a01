// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job membership: which online agents are missing which running jobs.

use crate::error::ForemanError;
use crate::foreman::{Foreman, TickReport};
use crate::plan::Plan;
use fm_adapters::{AgentDirectory, DispatchError, JobRegistry, Launcher, Messenger, PolicySource};
use fm_core::agent::fields;
use fm_core::{AgentId, Clock, Condition, Job};
use fm_storage::{Filter, RangeBound};
use futures_util::TryStreamExt;
use std::collections::{HashMap, HashSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Directory filter for agents that should receive `job` and have not.
///
/// An agent whose last job sync is later than the job's creation time was
/// already evaluated against this job, even if the applied marker is not
/// yet visible to queries.
pub(crate) fn membership_filter(job: &Job, online_cutoff_ms: u64) -> Filter {
    let mut clauses = vec![
        Filter::range(fields::LAST_SEEN_AT, RangeBound::AtLeast(online_cutoff_ms)),
        Filter::range_or_missing(fields::LAST_JOB_SYNC_AT, RangeBound::AtMost(job.create_time_ms)),
        Filter::not(Filter::term(fields::APPLIED_JOB_IDS, job.id.as_str())),
    ];
    for condition in &job.conditions {
        match condition {
            Condition::LabelInclude(labels) if labels.is_empty() => {}
            Condition::LabelInclude(labels) => {
                clauses.push(Filter::any_of(fields::LABELS, labels.iter().map(String::as_str)));
            }
            Condition::LabelExclude(labels) if labels.is_empty() => {}
            Condition::LabelExclude(labels) => {
                clauses.push(Filter::not(Filter::any_of(
                    fields::LABELS,
                    labels.iter().map(String::as_str),
                )));
            }
            Condition::Os(os) => clauses.push(Filter::term(fields::OS, os.to_string())),
            Condition::None => {}
        }
    }
    Filter::And(clauses)
}

impl<D, R, P, L, M, C> Foreman<D, R, P, L, M, C>
where
    D: AgentDirectory,
    R: JobRegistry,
    P: PolicySource,
    L: Launcher,
    M: Messenger,
    C: Clock,
{
    /// Stop expired jobs and collect the agents missing each remaining one.
    ///
    /// `now` must be read before the job list so that any job started while
    /// the tick runs has a creation time at or after it.
    pub(crate) async fn compute_job_membership(
        &self,
        plan: &mut Plan,
        report: &mut TickReport,
        now: u64,
        cancel: &CancellationToken,
    ) -> Result<(), ForemanError> {
        let jobs = self.registry.list_active().await?;
        let cutoff = self.config.online_cutoff_ms(now);

        for job in jobs {
            if job.is_expired(now) {
                match self.registry.stop(&job.id).await {
                    Ok(()) => {
                        info!(org = %self.org, job_id = %job.id, expires_at_ms = job.expires_at_ms, "stopped expired job");
                        report.expired.push(job.id);
                    }
                    Err(e) => {
                        warn!(org = %self.org, job_id = %job.id, error = %e, "failed to stop expired job");
                        report.errors += 1;
                    }
                }
                continue;
            }

            let mut pages = self.directory.scan(membership_filter(&job, cutoff));
            loop {
                let page = match pages.try_next().await {
                    Ok(Some(page)) => page,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(org = %self.org, job_id = %job.id, error = %e, "membership query failed");
                        report.errors += 1;
                        plan.unscanned_jobs.push(job.id.clone());
                        break;
                    }
                };
                if cancel.is_cancelled() {
                    return Err(ForemanError::Cancelled);
                }
                for agent in page {
                    plan.assign(agent.agent_id, &job);
                }
            }
        }
        Ok(())
    }

    /// Schedule each planned job on its agents, then commit the assignments.
    ///
    /// Every job is dispatched before anything is committed. An agent's sync
    /// time moves to `synced_at_ms` only with the commit of its last job in
    /// the plan, and only when none of its jobs failed and every job was
    /// scanned, so it never passes the creation time of a job it still
    /// lacks. Uncommitted agents are picked up next tick, possibly receiving
    /// a job twice; they are never skipped.
    pub(crate) async fn execute_job_updates(&self, plan: &Plan, synced_at_ms: u64, report: &mut TickReport) {
        let mut held: HashSet<AgentId> = HashSet::new();
        let mut dispatched = Vec::new();
        for (job_id, agents) in plan.job_to_agents() {
            let Some(job) = plan.jobs_by_id.get(&job_id) else {
                continue;
            };
            match self.schedule(job, &agents).await {
                Ok(()) => dispatched.push((job, agents)),
                Err(e) => {
                    warn!(org = %self.org, job_id = %job.id, agents = agents.len(), error = %e, "scheduling failed");
                    report.errors += 1;
                    held.extend(agents);
                }
            }
        }

        let hold_all = !plan.unscanned_jobs.is_empty();
        if hold_all {
            debug!(org = %self.org, unscanned = plan.unscanned_jobs.len(), "holding job sync times this tick");
        }
        let mut last_job: HashMap<&AgentId, usize> = HashMap::new();
        for (i, (_, agents)) in dispatched.iter().enumerate() {
            for agent in agents {
                last_job.insert(agent, i);
            }
        }

        for (i, (job, agents)) in dispatched.iter().enumerate() {
            let (syncing, holding): (Vec<AgentId>, Vec<AgentId>) = agents.iter().cloned().partition(|a| {
                !hold_all && !held.contains(a) && last_job.get(a) == Some(&i)
            });

            let mut committed = 0;
            for (batch, synced_at) in [(syncing, Some(synced_at_ms)), (holding, None)] {
                if batch.is_empty() {
                    continue;
                }
                match self.directory.mark_job_applied(&batch, &job.id, synced_at).await {
                    Ok(_) => committed += batch.len(),
                    Err(e) => {
                        warn!(org = %self.org, job_id = %job.id, agents = batch.len(), error = %e, "failed to mark job applied");
                        report.errors += 1;
                        held.extend(batch);
                    }
                }
            }
            if committed == 0 {
                continue;
            }

            info!(org = %self.org, job_id = %job.id, agents = committed, "scheduled job");
            report.scheduled.push((job.id.clone(), committed));

            if let Err(e) = self.registry.record_scheduled(&job.id, committed as u64).await {
                warn!(org = %self.org, job_id = %job.id, error = %e, "failed to record job stats");
                report.errors += 1;
            }
        }
    }

    async fn schedule(&self, job: &Job, agents: &[AgentId]) -> Result<(), DispatchError> {
        if self.batch_launch {
            return self.launcher.schedule_on_many(&job.start_request, agents).await;
        }
        debug!(job_id = %job.id, agents = agents.len(), "launcher has no batch path, scheduling per agent");
        for agent in agents {
            self.launcher.schedule(job.start_request.for_agent(agent)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "membership_tests.rs"]
mod tests;
