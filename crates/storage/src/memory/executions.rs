// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution-record operations on the in-memory state.

use super::State;
use crate::error::StoreError;
use crate::store::{
    BranchOutcome, ExecutionPlan, ExecutionRef, NewActionResult, NewExecutionLog,
};
use chrono::{DateTime, Utc};
use muster_core::{
    serial, ActionResult, Branch, ExecuteSpec, Execution, ExecutionLog, ExecutionStatus, Job,
    JobStatus, Serial, SerialKind, TargetCounts,
};
use uuid::Uuid;

impl State {
    pub(crate) fn begin_execution(
        &mut self,
        job_id: i64,
        spec: ExecuteSpec,
        now: DateTime<Utc>,
    ) -> Result<Execution, StoreError> {
        let (job_serial, job_status) = {
            let job = self
                .jobs
                .get(&job_id)
                .filter(|j| !j.is_deleted)
                .ok_or_else(|| StoreError::not_found("job", job_id))?;
            (job.serial.clone(), job.status)
        };
        if job_status.is_running() {
            return Err(StoreError::StateConflict(format!(
                "job {job_serial} already has a running execution"
            )));
        }

        let target_ids = match spec.target_ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => self.job_target_ids(job_id),
        };
        if target_ids.is_empty() {
            return Err(StoreError::Validation(
                "execution requires at least one target".to_owned(),
            ));
        }
        for target_id in &target_ids {
            if !self.targets.contains_key(target_id) {
                return Err(StoreError::Validation(format!("target {target_id} not found")));
            }
        }

        let n = self.serials.next(SerialKind::Execution, &job_serial)?;
        let execution_serial = Serial::execution(&job_serial, n);
        let execution_id = self.ids.next_execution();
        let execution = Execution {
            id: execution_id,
            uuid: Uuid::new_v4(),
            serial: execution_serial.clone(),
            job_id,
            execution_number: n,
            status: ExecutionStatus::Running,
            scheduled_at: None,
            started_at: Some(now),
            completed_at: None,
            triggered_by: spec.triggered_by,
            triggered_by_user: spec.triggered_by_user,
            total_targets: target_ids.len() as u32,
            successful_targets: 0,
            failed_targets: 0,
            cancelled_targets: 0,
            created_at: now,
            updated_at: now,
        };

        for (index, target_id) in target_ids.iter().enumerate() {
            let index = index as u32 + 1;
            let id = self.ids.next_branch();
            let target_serial_ref =
                self.targets.get(target_id).map(|t| t.serial.clone());
            self.branches.insert(
                id,
                Branch {
                    id,
                    uuid: Uuid::new_v4(),
                    serial: Serial::branch(&execution_serial, index),
                    execution_id,
                    branch_id: serial::branch_index(index),
                    target_id: *target_id,
                    target_serial_ref,
                    status: ExecutionStatus::Running,
                    started_at: Some(now),
                    completed_at: None,
                    result_output: None,
                    result_error: None,
                    exit_code: None,
                    created_at: now,
                    updated_at: now,
                },
            );
        }

        self.executions.insert(execution_id, execution.clone());
        if let Some(job) = self.jobs.get_mut(&job_id) {
            job.status = JobStatus::Running;
            job.started_at = Some(now);
            job.updated_at = now;
        }
        Ok(execution)
    }

    pub(crate) fn load_execution_plan(
        &self,
        execution_id: i64,
    ) -> Result<ExecutionPlan, StoreError> {
        let execution = self
            .executions
            .get(&execution_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("execution", execution_id))?;
        let branches = self.sorted_branches(execution_id);
        let actions = self.job_detail(execution.job_id)?.actions;
        let targets = branches
            .iter()
            .filter_map(|b| self.targets.get(&b.target_id).cloned())
            .collect();
        Ok(ExecutionPlan { execution, branches, actions, targets })
    }

    pub(crate) fn start_execution(
        &mut self,
        execution_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Execution, StoreError> {
        let execution = self
            .executions
            .get_mut(&execution_id)
            .ok_or_else(|| StoreError::not_found("execution", execution_id))?;
        if execution.status.is_terminal() {
            return Err(StoreError::StateConflict(format!(
                "execution {} is already {}",
                execution.serial, execution.status
            )));
        }
        execution.status = ExecutionStatus::Running;
        execution.started_at.get_or_insert(now);
        execution.updated_at = now;
        Ok(execution.clone())
    }

    pub(crate) fn get_execution(
        &self,
        execution: &ExecutionRef,
    ) -> Result<Execution, StoreError> {
        match execution {
            ExecutionRef::Id(id) => self.executions.get(id).cloned(),
            ExecutionRef::Serial(serial) => {
                self.executions.values().find(|e| e.serial == *serial).cloned()
            }
        }
        .ok_or_else(|| StoreError::not_found("execution", format!("{execution:?}")))
    }

    pub(crate) fn list_job_executions(&self, job_id: i64) -> Vec<Execution> {
        let mut executions: Vec<Execution> = self
            .executions
            .values()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect();
        executions.sort_by(|a, b| b.execution_number.cmp(&a.execution_number));
        executions
    }

    pub(crate) fn get_branches(&self, execution_id: i64) -> Result<Vec<Branch>, StoreError> {
        if !self.executions.contains_key(&execution_id) {
            return Err(StoreError::not_found("execution", execution_id));
        }
        Ok(self.sorted_branches(execution_id))
    }

    pub(crate) fn get_action_results(
        &self,
        execution_id: i64,
    ) -> Result<Vec<ActionResult>, StoreError> {
        if !self.executions.contains_key(&execution_id) {
            return Err(StoreError::not_found("execution", execution_id));
        }
        let mut rows: Vec<_> = self
            .action_results
            .values()
            .filter_map(|r| {
                let branch = self.branches.get(&r.branch_id)?;
                (branch.execution_id == execution_id)
                    .then(|| (branch.branch_id.clone(), r.clone()))
            })
            .collect();
        rows.sort_by(|(a_branch, a), (b_branch, b)| {
            a_branch.cmp(b_branch).then(a.action_order.cmp(&b.action_order))
        });
        Ok(rows.into_iter().map(|(_, r)| r).collect())
    }

    pub(crate) fn record_action_result(
        &mut self,
        branch_id: i64,
        result: NewActionResult,
        now: DateTime<Utc>,
    ) -> Result<ActionResult, StoreError> {
        let branch_serial = self
            .branches
            .get(&branch_id)
            .map(|b| b.serial.clone())
            .ok_or_else(|| StoreError::not_found("branch", branch_id))?;
        let n = self.serials.next(SerialKind::ActionResult, &branch_serial)?;
        let id = self.ids.next_action_result();
        let row = ActionResult {
            id,
            uuid: Uuid::new_v4(),
            serial: Serial::action_result(&branch_serial, n),
            branch_id,
            action_id: result.action_id,
            action_order: result.action_order,
            action_name: result.action_name,
            action_type: result.action_type,
            status: result.status,
            started_at: result.started_at,
            completed_at: result.completed_at,
            execution_time_ms: result.execution_time_ms,
            result_output: result.result_output,
            result_error: result.result_error,
            exit_code: result.exit_code,
            command_executed: result.command_executed,
            created_at: now,
            updated_at: now,
        };
        self.action_results.insert(id, row.clone());
        Ok(row)
    }

    pub(crate) fn complete_branch(
        &mut self,
        branch_id: i64,
        outcome: BranchOutcome,
        now: DateTime<Utc>,
    ) -> Result<Branch, StoreError> {
        if !outcome.status.is_terminal() {
            return Err(StoreError::Validation(format!(
                "branch outcome must be terminal, got {}",
                outcome.status
            )));
        }
        let branch = self
            .branches
            .get_mut(&branch_id)
            .ok_or_else(|| StoreError::not_found("branch", branch_id))?;
        // First writer wins; a branch never leaves a terminal state.
        if branch.status.is_terminal() {
            return Ok(branch.clone());
        }
        branch.status = outcome.status;
        branch.result_output = outcome.result_output;
        branch.result_error = outcome.result_error;
        branch.exit_code = outcome.exit_code;
        branch.completed_at = Some(now);
        branch.updated_at = now;
        Ok(branch.clone())
    }

    pub(crate) fn finalize_execution(
        &mut self,
        execution_id: i64,
        counts: TargetCounts,
        status: ExecutionStatus,
        now: DateTime<Utc>,
    ) -> Result<Execution, StoreError> {
        if !status.is_terminal() {
            return Err(StoreError::Validation(format!(
                "execution rollup must be terminal, got {status}"
            )));
        }
        let execution = self
            .executions
            .get_mut(&execution_id)
            .ok_or_else(|| StoreError::not_found("execution", execution_id))?;
        if execution.status.is_terminal() {
            return Ok(execution.clone());
        }
        execution.status = status;
        execution.total_targets = counts.total;
        execution.successful_targets = counts.successful;
        execution.failed_targets = counts.failed;
        execution.cancelled_targets = counts.cancelled;
        execution.completed_at = Some(now);
        execution.updated_at = now;
        Ok(execution.clone())
    }

    pub(crate) fn roll_up_job(
        &mut self,
        job_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Job, StoreError> {
        let latest = self
            .executions
            .values()
            .filter(|e| e.job_id == job_id)
            .max_by_key(|e| e.execution_number)
            .map(|e| e.status);
        let job = self
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| StoreError::not_found("job", job_id))?;
        let status = match latest {
            Some(ExecutionStatus::Completed) => Some(JobStatus::Completed),
            Some(ExecutionStatus::Failed) => Some(JobStatus::Failed),
            Some(ExecutionStatus::Cancelled) => Some(JobStatus::Cancelled),
            _ => None,
        };
        if let Some(status) = status {
            // The tombstone outlives any in-flight execution's rollup.
            if !job.is_deleted {
                job.status = status;
            }
            job.completed_at = Some(now);
            job.updated_at = now;
        }
        Ok(job.clone())
    }

    pub(crate) fn append_execution_log(
        &mut self,
        entry: NewExecutionLog,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if !self.executions.contains_key(&entry.execution_id) {
            return Err(StoreError::not_found("execution", entry.execution_id));
        }
        let id = self.ids.next_log();
        self.execution_logs.push(ExecutionLog {
            id,
            execution_id: entry.execution_id,
            branch_id: entry.branch_id,
            phase: entry.phase,
            level: entry.level,
            category: entry.category,
            message: entry.message,
            details: entry.details,
            timestamp: now,
        });
        Ok(())
    }

    pub(crate) fn get_execution_logs(&self, execution_id: i64) -> Vec<ExecutionLog> {
        self.execution_logs
            .iter()
            .filter(|l| l.execution_id == execution_id)
            .cloned()
            .collect()
    }

    fn sorted_branches(&self, execution_id: i64) -> Vec<Branch> {
        let mut branches: Vec<Branch> = self
            .branches
            .values()
            .filter(|b| b.execution_id == execution_id)
            .cloned()
            .collect();
        branches.sort_by(|a, b| a.branch_id.cmp(&b.branch_id));
        branches
    }
}
