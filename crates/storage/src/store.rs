// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transactional store interface consumed by the engine.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use muster_core::{
    Action, ActionResult, ActionStatus, Branch, ExecuteSpec, Execution, ExecutionLog,
    ExecutionStatus, Job, JobFilter, JobSort, JobSpec, LogCategory, LogLevel, LogPhase, Page,
    ScheduleSpec, Serial, Target, TargetCounts,
};
use uuid::Uuid;

/// Ways to address a job.
#[derive(Debug, Clone)]
pub enum JobRef {
    Id(i64),
    Uuid(Uuid),
    Serial(Serial),
}

impl From<i64> for JobRef {
    fn from(id: i64) -> Self {
        JobRef::Id(id)
    }
}

impl From<Uuid> for JobRef {
    fn from(uuid: Uuid) -> Self {
        JobRef::Uuid(uuid)
    }
}

impl From<Serial> for JobRef {
    fn from(serial: Serial) -> Self {
        JobRef::Serial(serial)
    }
}

/// Ways to address an execution.
#[derive(Debug, Clone)]
pub enum ExecutionRef {
    Id(i64),
    Serial(Serial),
}

impl From<i64> for ExecutionRef {
    fn from(id: i64) -> Self {
        ExecutionRef::Id(id)
    }
}

impl From<Serial> for ExecutionRef {
    fn from(serial: Serial) -> Self {
        ExecutionRef::Serial(serial)
    }
}

/// Read options. Soft-deleted jobs are invisible unless requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    pub include_deleted: bool,
}

/// The job ↔ target association record. Replaced atomically on update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTarget {
    pub job_id: i64,
    pub target_id: i64,
}

/// A job with its owned children resolved.
#[derive(Debug, Clone)]
pub struct JobDetail {
    pub job: Job,
    /// Ordered by `action_order`.
    pub actions: Vec<Action>,
    pub target_ids: Vec<i64>,
}

/// Listing row: the job plus cheap aggregates for dashboards.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub job: Job,
    pub action_count: usize,
    pub target_count: usize,
    pub last_execution: Option<LastExecution>,
}

#[derive(Debug, Clone)]
pub struct LastExecution {
    pub serial: Serial,
    pub execution_number: u32,
    pub status: ExecutionStatus,
}

/// Everything the orchestrator needs to run one execution.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub execution: Execution,
    /// Ordered by branch index.
    pub branches: Vec<Branch>,
    /// The owning job's actions, ordered by `action_order`.
    pub actions: Vec<Action>,
    /// The targets referenced by the branches that still exist.
    pub targets: Vec<Target>,
}

impl ExecutionPlan {
    pub fn target(&self, target_id: i64) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == target_id)
    }
}

/// A terminal action result to persist. The store assigns id, uuid, and the
/// serial (next position within the branch).
#[derive(Debug, Clone)]
pub struct NewActionResult {
    pub action_id: i64,
    pub action_order: u32,
    pub action_name: String,
    pub action_type: String,
    pub status: ActionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub execution_time_ms: Option<u64>,
    pub result_output: Option<String>,
    pub result_error: Option<String>,
    pub exit_code: Option<i32>,
    pub command_executed: Option<String>,
}

/// Terminal outcome applied to a branch.
#[derive(Debug, Clone)]
pub struct BranchOutcome {
    pub status: ExecutionStatus,
    pub result_output: Option<String>,
    pub result_error: Option<String>,
    pub exit_code: Option<i32>,
}

impl BranchOutcome {
    pub fn completed(summary: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Completed,
            result_output: Some(summary.into()),
            result_error: None,
            exit_code: Some(0),
        }
    }

    pub fn failed(error: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            status: ExecutionStatus::Failed,
            result_output: None,
            result_error: Some(error.into()),
            exit_code,
        }
    }

    pub fn cancelled(error: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Cancelled,
            result_output: None,
            result_error: Some(error.into()),
            exit_code: None,
        }
    }
}

/// An execution log row to append. The store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewExecutionLog {
    pub execution_id: i64,
    pub branch_id: Option<i64>,
    pub phase: LogPhase,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

/// Transactional persistence for jobs and their execution records.
///
/// Each method is one transaction; partial writes are not permitted.
/// Concurrent `begin_execution` calls on the same job must serialise so that
/// `execution_number` is strictly increasing without reuse.
#[async_trait]
pub trait JobStore: Send + Sync {
    // ── Target registry (owned by the external inventory) ──────────────

    async fn put_target(&self, target: Target) -> Result<(), StoreError>;
    async fn get_target(&self, id: i64) -> Result<Target, StoreError>;

    // ── Job definition lifecycle ────────────────────────────────────────

    /// Insert a job with its actions (dense 1..N order) and target links.
    /// Fails `Validation` when `target_ids` is empty or references a target
    /// that does not exist.
    async fn create_job(&self, spec: JobSpec, created_by: &str) -> Result<JobDetail, StoreError>;

    async fn get_job(&self, job: JobRef, options: GetOptions) -> Result<JobDetail, StoreError>;

    /// Returns the requested page and the total number of matching jobs.
    async fn list_jobs(
        &self,
        filter: JobFilter,
        page: Page,
        sort: JobSort,
    ) -> Result<(Vec<JobSummary>, usize), StoreError>;

    /// Replace the job's definition. Refused while the job is running.
    /// Actions and target links are replaced atomically; action results that
    /// reference the old action rows are deleted first.
    async fn update_job(&self, id: i64, spec: JobSpec) -> Result<JobDetail, StoreError>;

    /// Set `scheduled_at` and move the job to `scheduled`.
    async fn schedule_job(&self, id: i64, spec: ScheduleSpec) -> Result<Job, StoreError>;

    /// Soft delete by default; `force` hard-deletes the job and its children
    /// in cascade order (results → branches → logs → executions → actions →
    /// target links → job).
    async fn delete_job(&self, id: i64, force: bool) -> Result<(), StoreError>;

    // ── Execution records ───────────────────────────────────────────────

    /// In one transaction: allocate the next `execution_number` and serial,
    /// insert the execution and one running branch per target (snapshotting
    /// the target serial), and move the job to `running`.
    async fn begin_execution(
        &self,
        job_id: i64,
        spec: ExecuteSpec,
    ) -> Result<Execution, StoreError>;

    async fn load_execution_plan(&self, execution_id: i64) -> Result<ExecutionPlan, StoreError>;

    /// Idempotently confirm the running state, stamping `started_at` if a
    /// scheduled execution is being picked up. Fails on terminal executions.
    async fn start_execution(&self, execution_id: i64) -> Result<Execution, StoreError>;

    async fn get_execution(&self, execution: ExecutionRef) -> Result<Execution, StoreError>;

    /// All executions of a job, newest first.
    async fn list_job_executions(&self, job_id: i64) -> Result<Vec<Execution>, StoreError>;

    /// Branches of an execution ordered by branch index.
    async fn get_branches(&self, execution_id: i64) -> Result<Vec<Branch>, StoreError>;

    /// Action results of an execution ordered by `(branch_id, action_order)`.
    async fn get_action_results(
        &self,
        execution_id: i64,
    ) -> Result<Vec<ActionResult>, StoreError>;

    // ── Engine write path ───────────────────────────────────────────────

    async fn record_action_result(
        &self,
        branch_id: i64,
        result: NewActionResult,
    ) -> Result<ActionResult, StoreError>;

    /// Apply a terminal outcome to a branch. A branch that is already
    /// terminal is left unchanged (first writer wins) and returned as-is.
    async fn complete_branch(
        &self,
        branch_id: i64,
        outcome: BranchOutcome,
    ) -> Result<Branch, StoreError>;

    /// Persist the terminal status and target counts. Idempotent on an
    /// already-terminal execution.
    async fn finalize_execution(
        &self,
        execution_id: i64,
        counts: TargetCounts,
        status: ExecutionStatus,
    ) -> Result<Execution, StoreError>;

    /// Mirror the latest execution's terminal status onto the job.
    async fn roll_up_job(&self, job_id: i64) -> Result<Job, StoreError>;

    // ── Execution log ───────────────────────────────────────────────────

    async fn append_execution_log(&self, entry: NewExecutionLog) -> Result<(), StoreError>;
    async fn get_execution_logs(
        &self,
        execution_id: i64,
    ) -> Result<Vec<ExecutionLog>, StoreError>;
}
