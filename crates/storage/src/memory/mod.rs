// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory reference implementation of [`JobStore`].
//!
//! One mutex over the whole state; every trait method takes the lock once,
//! which makes each operation a transaction. Mutating operations validate
//! fully before touching any table so a failed call leaves no partial writes.

mod executions;
mod jobs;
mod serial_alloc;

use crate::error::StoreError;
use crate::store::{
    BranchOutcome, ExecutionPlan, ExecutionRef, GetOptions, JobDetail, JobRef, JobStore,
    JobSummary, JobTarget, NewActionResult, NewExecutionLog,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use muster_core::{
    Action, ActionResult, Branch, Clock, ExecuteSpec, Execution, ExecutionLog, ExecutionStatus,
    Job, JobFilter, JobSort, JobSpec, Page, ScheduleSpec, Target, TargetCounts,
};
use parking_lot::Mutex;
use serial_alloc::SerialAllocator;
use std::collections::BTreeMap;

/// Monotonic surrogate-id counters, one per table.
#[derive(Default)]
struct IdCounters {
    job: i64,
    action: i64,
    execution: i64,
    branch: i64,
    action_result: i64,
    log: i64,
}

impl IdCounters {
    fn next_job(&mut self) -> i64 {
        self.job += 1;
        self.job
    }

    fn next_action(&mut self) -> i64 {
        self.action += 1;
        self.action
    }

    fn next_execution(&mut self) -> i64 {
        self.execution += 1;
        self.execution
    }

    fn next_branch(&mut self) -> i64 {
        self.branch += 1;
        self.branch
    }

    fn next_action_result(&mut self) -> i64 {
        self.action_result += 1;
        self.action_result
    }

    fn next_log(&mut self) -> i64 {
        self.log += 1;
        self.log
    }
}

/// All tables plus the serial allocator.
#[derive(Default)]
pub(crate) struct State {
    pub(crate) targets: BTreeMap<i64, Target>,
    pub(crate) jobs: BTreeMap<i64, Job>,
    pub(crate) actions: BTreeMap<i64, Action>,
    pub(crate) job_targets: Vec<JobTarget>,
    pub(crate) executions: BTreeMap<i64, Execution>,
    pub(crate) branches: BTreeMap<i64, Branch>,
    pub(crate) action_results: BTreeMap<i64, ActionResult>,
    pub(crate) execution_logs: Vec<ExecutionLog>,
    pub(crate) serials: SerialAllocator,
    ids: IdCounters,
}

/// The in-memory store. Cheap to clone handles are not provided; share it
/// behind an `Arc` like any other [`JobStore`].
pub struct MemoryStore<C: Clock> {
    state: Mutex<State>,
    clock: C,
}

impl<C: Clock> MemoryStore<C> {
    pub fn new(clock: C) -> Self {
        Self { state: Mutex::new(State::default()), clock }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[async_trait]
impl<C: Clock> JobStore for MemoryStore<C> {
    async fn put_target(&self, target: Target) -> Result<(), StoreError> {
        self.state.lock().targets.insert(target.id, target);
        Ok(())
    }

    async fn get_target(&self, id: i64) -> Result<Target, StoreError> {
        self.state
            .lock()
            .targets
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("target", id))
    }

    async fn create_job(&self, spec: JobSpec, created_by: &str) -> Result<JobDetail, StoreError> {
        let now = self.now();
        let detail = self.state.lock().create_job(spec, created_by, now)?;
        tracing::info!(job = %detail.job.serial, name = %detail.job.name, "job created");
        Ok(detail)
    }

    async fn get_job(&self, job: JobRef, options: GetOptions) -> Result<JobDetail, StoreError> {
        self.state.lock().get_job(&job, options)
    }

    async fn list_jobs(
        &self,
        filter: JobFilter,
        page: Page,
        sort: JobSort,
    ) -> Result<(Vec<JobSummary>, usize), StoreError> {
        Ok(self.state.lock().list_jobs(&filter, page, sort))
    }

    async fn update_job(&self, id: i64, spec: JobSpec) -> Result<JobDetail, StoreError> {
        let now = self.now();
        let detail = self.state.lock().update_job(id, spec, now)?;
        tracing::info!(job = %detail.job.serial, "job updated");
        Ok(detail)
    }

    async fn schedule_job(&self, id: i64, spec: ScheduleSpec) -> Result<Job, StoreError> {
        let now = self.now();
        let job = self.state.lock().schedule_job(id, &spec, now)?;
        tracing::info!(job = %job.serial, scheduled_at = %spec.scheduled_at, "job scheduled");
        Ok(job)
    }

    async fn delete_job(&self, id: i64, force: bool) -> Result<(), StoreError> {
        let now = self.now();
        self.state.lock().delete_job(id, force, now)?;
        tracing::info!(job_id = id, force, "job deleted");
        Ok(())
    }

    async fn begin_execution(
        &self,
        job_id: i64,
        spec: ExecuteSpec,
    ) -> Result<Execution, StoreError> {
        let now = self.now();
        let execution = self.state.lock().begin_execution(job_id, spec, now)?;
        tracing::info!(
            execution = %execution.serial,
            targets = execution.total_targets,
            "execution created"
        );
        Ok(execution)
    }

    async fn load_execution_plan(&self, execution_id: i64) -> Result<ExecutionPlan, StoreError> {
        self.state.lock().load_execution_plan(execution_id)
    }

    async fn start_execution(&self, execution_id: i64) -> Result<Execution, StoreError> {
        let now = self.now();
        self.state.lock().start_execution(execution_id, now)
    }

    async fn get_execution(&self, execution: ExecutionRef) -> Result<Execution, StoreError> {
        self.state.lock().get_execution(&execution)
    }

    async fn list_job_executions(&self, job_id: i64) -> Result<Vec<Execution>, StoreError> {
        Ok(self.state.lock().list_job_executions(job_id))
    }

    async fn get_branches(&self, execution_id: i64) -> Result<Vec<Branch>, StoreError> {
        self.state.lock().get_branches(execution_id)
    }

    async fn get_action_results(
        &self,
        execution_id: i64,
    ) -> Result<Vec<ActionResult>, StoreError> {
        self.state.lock().get_action_results(execution_id)
    }

    async fn record_action_result(
        &self,
        branch_id: i64,
        result: NewActionResult,
    ) -> Result<ActionResult, StoreError> {
        let now = self.now();
        self.state.lock().record_action_result(branch_id, result, now)
    }

    async fn complete_branch(
        &self,
        branch_id: i64,
        outcome: BranchOutcome,
    ) -> Result<Branch, StoreError> {
        let now = self.now();
        self.state.lock().complete_branch(branch_id, outcome, now)
    }

    async fn finalize_execution(
        &self,
        execution_id: i64,
        counts: TargetCounts,
        status: ExecutionStatus,
    ) -> Result<Execution, StoreError> {
        let now = self.now();
        let execution = self.state.lock().finalize_execution(execution_id, counts, status, now)?;
        tracing::info!(execution = %execution.serial, status = %execution.status, "execution finalized");
        Ok(execution)
    }

    async fn roll_up_job(&self, job_id: i64) -> Result<Job, StoreError> {
        let now = self.now();
        self.state.lock().roll_up_job(job_id, now)
    }

    async fn append_execution_log(&self, entry: NewExecutionLog) -> Result<(), StoreError> {
        let now = self.now();
        self.state.lock().append_execution_log(entry, now)
    }

    async fn get_execution_logs(
        &self,
        execution_id: i64,
    ) -> Result<Vec<ExecutionLog>, StoreError> {
        Ok(self.state.lock().get_execution_logs(execution_id))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
