// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job lifecycle service: the façade the transport layer calls.
//!
//! Adds access control and audit/notification emission on top of the store
//! operations, and hands freshly created executions to the orchestrator.
//! Access policy is injected; the default allows the job's creator and
//! administrators.

use crate::deps::EngineDeps;
use crate::error::EngineError;
use crate::orchestrator::{ExecutionSummary, Orchestrator};
use muster_core::{
    ActionResult, AuditEvent, AuditEventType, Branch, Clock, ExecuteSpec, Execution, ExecutionLog,
    Job, JobFilter, JobSort, JobSpec, Page, ScheduleSpec,
};
use muster_storage::{
    ExecutionRef, GetOptions, JobDetail, JobRef, JobSummary, NewExecutionLog,
};
use std::sync::Arc;

/// The authenticated caller of a lifecycle operation.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub administrator: bool,
}

impl Caller {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), administrator: false }
    }

    pub fn administrator(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), administrator: true }
    }
}

/// Decides whether a caller may mutate a job. Injected so the surrounding
/// system owns the actual policy.
pub trait AccessPolicy: Send + Sync {
    fn can_modify(&self, caller: &Caller, job: &Job) -> bool;
}

/// Default policy: the job's creator, or an administrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOrAdmin;

impl AccessPolicy for OwnerOrAdmin {
    fn can_modify(&self, caller: &Caller, job: &Job) -> bool {
        caller.administrator || caller.user_id == job.created_by
    }
}

pub struct JobService<C: Clock> {
    deps: Arc<EngineDeps<C>>,
    orchestrator: Arc<Orchestrator<C>>,
    policy: Arc<dyn AccessPolicy>,
}

impl<C: Clock> JobService<C> {
    pub fn new(deps: Arc<EngineDeps<C>>) -> Self {
        Self::with_policy(deps, Arc::new(OwnerOrAdmin))
    }

    pub fn with_policy(deps: Arc<EngineDeps<C>>, policy: Arc<dyn AccessPolicy>) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(Arc::clone(&deps)));
        Self { deps, orchestrator, policy }
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator<C>> {
        Arc::clone(&self.orchestrator)
    }

    // ── Job definition operations ───────────────────────────────────────

    pub async fn create_job(
        &self,
        spec: JobSpec,
        caller: &Caller,
    ) -> Result<JobDetail, EngineError> {
        let detail = self.deps.store.create_job(spec, &caller.user_id).await?;
        self.audit_job(AuditEventType::JobCreated, &detail.job, "create", caller, || {
            serde_json::json!({
                "action_count": detail.actions.len(),
                "target_count": detail.target_ids.len(),
            })
        })
        .await;
        Ok(detail)
    }

    pub async fn get_job(&self, job: impl Into<JobRef>) -> Result<JobDetail, EngineError> {
        Ok(self.deps.store.get_job(job.into(), GetOptions::default()).await?)
    }

    pub async fn list_jobs(
        &self,
        filter: JobFilter,
        page: Page,
        sort: JobSort,
    ) -> Result<(Vec<JobSummary>, usize), EngineError> {
        Ok(self.deps.store.list_jobs(filter, page, sort).await?)
    }

    pub async fn update_job(
        &self,
        id: i64,
        spec: JobSpec,
        caller: &Caller,
    ) -> Result<JobDetail, EngineError> {
        self.authorize(id, caller, GetOptions::default()).await?;
        let detail = self.deps.store.update_job(id, spec).await?;
        self.audit_job(AuditEventType::JobUpdated, &detail.job, "update", caller, || {
            serde_json::json!({
                "action_count": detail.actions.len(),
                "target_count": detail.target_ids.len(),
            })
        })
        .await;
        Ok(detail)
    }

    pub async fn schedule_job(
        &self,
        id: i64,
        spec: ScheduleSpec,
        caller: &Caller,
    ) -> Result<Job, EngineError> {
        self.authorize(id, caller, GetOptions::default()).await?;
        let job = self.deps.store.schedule_job(id, spec).await?;
        self.audit_job(AuditEventType::JobUpdated, &job, "schedule", caller, || {
            serde_json::json!({ "scheduled_at": job.scheduled_at })
        })
        .await;
        Ok(job)
    }

    pub async fn delete_job(
        &self,
        id: i64,
        force: bool,
        caller: &Caller,
    ) -> Result<(), EngineError> {
        // A force delete may purge an already-tombstoned job.
        let job = self.authorize(id, caller, GetOptions { include_deleted: force }).await?.job;
        self.deps.store.delete_job(id, force).await?;
        self.audit_job(AuditEventType::JobDeleted, &job, "delete", caller, || {
            serde_json::json!({ "force": force })
        })
        .await;
        Ok(())
    }

    // ── Execution operations ────────────────────────────────────────────

    /// Persist a new execution (branches included) and announce it. The
    /// caller hands the returned execution to [`Self::run_execution`], or
    /// uses [`Self::execute_job`] to do both.
    pub async fn start_execution(
        &self,
        id: i64,
        mut spec: ExecuteSpec,
        caller: &Caller,
    ) -> Result<Execution, EngineError> {
        let job = self.authorize(id, caller, GetOptions::default()).await?.job;
        spec.triggered_by_user.get_or_insert_with(|| caller.user_id.clone());
        let execution = self.deps.store.begin_execution(id, spec).await?;
        self.audit_job(AuditEventType::JobExecuted, &job, "execute", caller, || {
            serde_json::json!({
                "execution_serial": execution.serial.as_str(),
                "execution_number": execution.execution_number,
                "target_count": execution.total_targets,
            })
        })
        .await;
        self.deps
            .send_notification(
                "Job execution started",
                &format!(
                    "Job '{}' execution {} started on {} target(s)",
                    job.name, execution.serial, execution.total_targets
                ),
            )
            .await;
        Ok(execution)
    }

    /// Run a persisted execution to completion.
    pub async fn run_execution(
        &self,
        execution_id: i64,
    ) -> Result<ExecutionSummary, EngineError> {
        self.orchestrator.run(execution_id).await
    }

    /// Create and run an execution, returning its terminal summary.
    pub async fn execute_job(
        &self,
        id: i64,
        spec: ExecuteSpec,
        caller: &Caller,
    ) -> Result<ExecutionSummary, EngineError> {
        let execution = self.start_execution(id, spec, caller).await?;
        self.run_execution(execution.id).await
    }

    /// Request cancellation of an execution. Idempotent.
    pub async fn cancel_execution(&self, execution_id: i64) -> Result<(), EngineError> {
        self.orchestrator.cancel(execution_id).await
    }

    // ── Read paths ──────────────────────────────────────────────────────

    pub async fn get_execution(
        &self,
        execution: impl Into<ExecutionRef>,
    ) -> Result<Execution, EngineError> {
        Ok(self.deps.store.get_execution(execution.into()).await?)
    }

    pub async fn list_job_executions(&self, job_id: i64) -> Result<Vec<Execution>, EngineError> {
        Ok(self.deps.store.list_job_executions(job_id).await?)
    }

    pub async fn get_branches(&self, execution_id: i64) -> Result<Vec<Branch>, EngineError> {
        Ok(self.deps.store.get_branches(execution_id).await?)
    }

    pub async fn get_action_results(
        &self,
        execution_id: i64,
    ) -> Result<Vec<ActionResult>, EngineError> {
        Ok(self.deps.store.get_action_results(execution_id).await?)
    }

    pub async fn get_execution_logs(
        &self,
        execution_id: i64,
    ) -> Result<Vec<ExecutionLog>, EngineError> {
        Ok(self.deps.store.get_execution_logs(execution_id).await?)
    }

    /// Append an external log entry to an execution's forensic record.
    pub async fn append_execution_log(&self, entry: NewExecutionLog) -> Result<(), EngineError> {
        Ok(self.deps.store.append_execution_log(entry).await?)
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    async fn authorize(
        &self,
        id: i64,
        caller: &Caller,
        options: GetOptions,
    ) -> Result<JobDetail, EngineError> {
        let detail = self.deps.store.get_job(JobRef::Id(id), options).await?;
        if !self.policy.can_modify(caller, &detail.job) {
            return Err(EngineError::AccessDenied {
                user_id: caller.user_id.clone(),
                job: detail.job.serial.to_string(),
            });
        }
        Ok(detail)
    }

    async fn audit_job<F>(
        &self,
        event_type: AuditEventType,
        job: &Job,
        action: &str,
        caller: &Caller,
        details: F,
    ) where
        F: FnOnce() -> serde_json::Value,
    {
        let event =
            AuditEvent::new(event_type, "job", job.serial.as_str(), action, self.deps.clock.now())
                .user_id(caller.user_id.clone())
                .details(details());
        self.deps.emit_audit(event).await;
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
