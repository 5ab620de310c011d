// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fans one execution out across its branches under a concurrency cap, then
//! rolls terminal status up to the execution and its job.

use crate::branch::run_branch;
use crate::deps::EngineDeps;
use crate::error::EngineError;
use crate::retry::RetryPolicy;
use muster_core::{
    roll_up, AuditEvent, AuditEventType, AuditSeverity, Clock, Execution, ExecutionStatus, Serial,
    TargetCounts,
};
use muster_storage::{BranchOutcome, ExecutionRef, GetOptions, JobRef, StoreError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Terminal summary of one execution run.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    pub execution_id: i64,
    pub serial: Serial,
    pub status: ExecutionStatus,
    pub counts: TargetCounts,
}

/// Runs executions and owns their cancellation tokens.
///
/// `run` never propagates branch failures: every branch ends in a terminal
/// status and the rollup is computed from those, so one bad target cannot
/// abort its peers.
pub struct Orchestrator<C: Clock> {
    deps: Arc<EngineDeps<C>>,
    policy: RetryPolicy,
    active: Mutex<HashMap<i64, CancellationToken>>,
}

impl<C: Clock> Orchestrator<C> {
    pub fn new(deps: Arc<EngineDeps<C>>) -> Self {
        let policy = RetryPolicy::from_config(&deps.config);
        Self { deps, policy, active: Mutex::new(HashMap::new()) }
    }

    /// Run a persisted execution to completion and return the summary.
    pub async fn run(&self, execution_id: i64) -> Result<ExecutionSummary, EngineError> {
        let plan = self.deps.store.load_execution_plan(execution_id).await?;
        let execution = self.deps.store.start_execution(execution_id).await?;
        let token = {
            let mut active = self.active.lock();
            if active.contains_key(&execution_id) {
                return Err(EngineError::Store(StoreError::StateConflict(format!(
                    "execution {} is already being run",
                    execution.serial
                ))));
            }
            let token = CancellationToken::new();
            active.insert(execution_id, token.clone());
            token
        };

        let (statuses, internal_errors) = self
            .run_branches(&execution, plan.branches, plan.actions, &plan.targets, &token)
            .await;
        self.active.lock().remove(&execution_id);

        let counts = TargetCounts::tally(statuses.iter().copied());
        let status = roll_up(statuses);
        let finalized = self.deps.store.finalize_execution(execution_id, counts, status).await?;
        self.deps.store.roll_up_job(finalized.job_id).await?;
        self.emit_terminal_events(&finalized, internal_errors).await;

        Ok(ExecutionSummary {
            execution_id,
            serial: finalized.serial.clone(),
            status: finalized.status,
            counts,
        })
    }

    /// Request cancellation of an execution. Idempotent; cancelling an
    /// already-terminal execution is a no-op.
    pub async fn cancel(&self, execution_id: i64) -> Result<(), EngineError> {
        let token = self.active.lock().get(&execution_id).cloned();
        if let Some(token) = token {
            tracing::info!(execution_id, "cancellation requested");
            token.cancel();
            return Ok(());
        }

        // Not in flight: terminalize a pending execution, ignore a finished one.
        let execution = self.deps.store.get_execution(ExecutionRef::Id(execution_id)).await?;
        if execution.status.is_terminal() {
            return Ok(());
        }
        tracing::info!(execution_id, "cancelling execution that never started running");
        let mut statuses = Vec::new();
        for branch in self.deps.store.get_branches(execution_id).await? {
            let branch = if branch.status.is_terminal() {
                branch
            } else {
                self.deps
                    .store
                    .complete_branch(branch.id, BranchOutcome::cancelled("cancelled"))
                    .await?
            };
            statuses.push(branch.status);
        }
        let counts = TargetCounts::tally(statuses.iter().copied());
        let status = roll_up(statuses);
        let finalized = self.deps.store.finalize_execution(execution_id, counts, status).await?;
        self.deps.store.roll_up_job(finalized.job_id).await?;
        self.emit_terminal_events(&finalized, false).await;
        Ok(())
    }

    /// Launch one branch task per open branch, bounded by the semaphore, and
    /// collect every branch's terminal status. Panics and internal errors in
    /// a branch task are converted into a failed branch; the returned flag
    /// reports whether any branch died that way.
    async fn run_branches(
        &self,
        execution: &Execution,
        branches: Vec<muster_core::Branch>,
        actions: Vec<muster_core::Action>,
        targets: &[muster_core::Target],
        token: &CancellationToken,
    ) -> (Vec<ExecutionStatus>, bool) {
        let semaphore = Arc::new(Semaphore::new(self.deps.config.max_concurrent_targets));
        let actions = Arc::new(actions);
        let mut statuses: Vec<ExecutionStatus> = Vec::with_capacity(branches.len());
        let mut tasks: JoinSet<(i64, Result<ExecutionStatus, EngineError>)> = JoinSet::new();
        let mut task_branches: HashMap<tokio::task::Id, i64> = HashMap::new();

        for branch in branches {
            if branch.status.is_terminal() {
                statuses.push(branch.status);
                continue;
            }
            let deps = Arc::clone(&self.deps);
            let semaphore = Arc::clone(&semaphore);
            let actions = Arc::clone(&actions);
            let policy = self.policy.clone();
            let token = token.clone();
            let execution = execution.clone();
            let target = targets.iter().find(|t| t.id == branch.target_id).cloned();
            let branch_id = branch.id;
            let handle = tasks.spawn(async move {
                // Slot held for the task's full duration, released on drop
                // even when the branch panics.
                let _permit = semaphore.acquire_owned().await;
                let status = run_branch(
                    &deps,
                    &execution,
                    &branch,
                    target.as_ref(),
                    &actions,
                    &policy,
                    &token,
                )
                .await;
                (branch.id, status)
            });
            task_branches.insert(handle.id(), branch_id);
        }

        let mut internal_errors = false;
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((task_id, (_branch_id, Ok(status)))) => {
                    task_branches.remove(&task_id);
                    statuses.push(status);
                }
                Ok((task_id, (branch_id, Err(error)))) => {
                    task_branches.remove(&task_id);
                    internal_errors = true;
                    tracing::error!(branch_id, %error, "branch task hit an internal error");
                    let status = self.fail_branch(branch_id, format!("internal error: {error}")).await;
                    statuses.push(status);
                }
                Err(join_error) => {
                    let branch_id = task_branches.remove(&join_error.id());
                    internal_errors = true;
                    tracing::error!(?branch_id, %join_error, "branch task aborted");
                    let status = match branch_id {
                        Some(branch_id) => {
                            self.fail_branch(branch_id, format!("branch task panicked: {join_error}"))
                                .await
                        }
                        None => ExecutionStatus::Failed,
                    };
                    statuses.push(status);
                }
            }
        }
        (statuses, internal_errors)
    }

    /// Best-effort terminal failure for a branch whose task died.
    async fn fail_branch(&self, branch_id: i64, error: String) -> ExecutionStatus {
        match self
            .deps
            .store
            .complete_branch(branch_id, BranchOutcome::failed(error, None))
            .await
        {
            Ok(branch) => branch.status,
            Err(store_error) => {
                tracing::error!(branch_id, %store_error, "failed to record branch failure");
                ExecutionStatus::Failed
            }
        }
    }

    async fn emit_terminal_events(&self, execution: &Execution, internal_errors: bool) {
        let event_type = match execution.status {
            ExecutionStatus::Completed => AuditEventType::ExecutionCompleted,
            ExecutionStatus::Failed => AuditEventType::ExecutionFailed,
            ExecutionStatus::Cancelled => AuditEventType::ExecutionCancelled,
            ExecutionStatus::Scheduled | ExecutionStatus::Running => return,
        };
        let severity = if internal_errors {
            AuditSeverity::High
        } else if execution.status == ExecutionStatus::Failed {
            AuditSeverity::Warning
        } else {
            AuditSeverity::Info
        };
        let mut event = AuditEvent::new(
            event_type,
            "execution",
            execution.serial.as_str(),
            "execute",
            self.deps.clock.now(),
        )
        .severity(severity)
        .details(serde_json::json!({
            "total_targets": execution.total_targets,
            "successful_targets": execution.successful_targets,
            "failed_targets": execution.failed_targets,
            "cancelled_targets": execution.cancelled_targets,
        }));
        event.user_id = execution.triggered_by_user.clone();
        self.deps.emit_audit(event).await;

        let job_name = self
            .deps
            .store
            .get_job(JobRef::Id(execution.job_id), GetOptions { include_deleted: true })
            .await
            .map(|detail| detail.job.name)
            .unwrap_or_else(|_| format!("job {}", execution.job_id));
        let title = match execution.status {
            ExecutionStatus::Completed => "Job execution completed",
            ExecutionStatus::Cancelled => "Job execution cancelled",
            _ => "Job execution failed",
        };
        let message = format!(
            "Job '{job_name}' execution {}: {} succeeded, {} failed, {} cancelled",
            execution.serial,
            execution.successful_targets,
            execution.failed_targets,
            execution.cancelled_targets,
        );
        self.deps.send_notification(title, &message).await;
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
