// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-definition operations on the in-memory state.

use super::State;
use crate::error::StoreError;
use crate::store::{
    GetOptions, JobDetail, JobRef, JobSummary, JobTarget, LastExecution,
};
use chrono::{DateTime, Utc};
use muster_core::{
    Action, ActionKind, Job, JobFilter, JobSort, JobSpec, JobStatus, Page, ScheduleSpec, Serial,
    SerialKind, SortField,
};
use uuid::Uuid;

use super::serial_alloc::SerialAllocator;

impl State {
    pub(crate) fn create_job(
        &mut self,
        spec: JobSpec,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<JobDetail, StoreError> {
        let (kinds, target_ids) = self.validate_spec(&spec)?;

        let n = self.serials.next(SerialKind::Job, &SerialAllocator::root())?;
        let serial = Serial::job(n);
        let id = self.ids.next_job();
        let status =
            if spec.scheduled_at.is_some() { JobStatus::Scheduled } else { JobStatus::Draft };
        let job = Job {
            id,
            uuid: Uuid::new_v4(),
            serial,
            name: spec.name,
            description: spec.description,
            job_type: spec.job_type,
            status,
            created_by: created_by.to_owned(),
            scheduled_at: spec.scheduled_at,
            started_at: None,
            completed_at: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.insert(id, job);
        self.insert_actions(id, &spec.actions, kinds, now);
        self.replace_job_targets(id, &target_ids);
        self.job_detail(id)
    }

    pub(crate) fn get_job(
        &self,
        job: &JobRef,
        options: GetOptions,
    ) -> Result<JobDetail, StoreError> {
        let id = self.resolve_job(job, options)?;
        self.job_detail(id)
    }

    pub(crate) fn list_jobs(
        &self,
        filter: &JobFilter,
        page: Page,
        sort: JobSort,
    ) -> (Vec<JobSummary>, usize) {
        let include_deleted =
            filter.include_deleted || filter.status == Some(JobStatus::Deleted);
        let search = filter.search.as_deref().map(str::to_lowercase);
        let mut jobs: Vec<&Job> = self
            .jobs
            .values()
            .filter(|j| include_deleted || !j.is_deleted)
            .filter(|j| filter.status.is_none_or(|s| j.status == s))
            .filter(|j| filter.created_by.as_deref().is_none_or(|u| j.created_by == u))
            .filter(|j| {
                search.as_deref().is_none_or(|needle| {
                    j.name.to_lowercase().contains(needle)
                        || j.description.to_lowercase().contains(needle)
                })
            })
            .collect();

        jobs.sort_by(|a, b| {
            let ordering = match sort.field {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::Name => a.name.cmp(&b.name),
            }
            .then(a.id.cmp(&b.id));
            if sort.ascending { ordering } else { ordering.reverse() }
        });

        let total = jobs.len();
        let rows = jobs
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .map(|job| self.job_summary(job))
            .collect();
        (rows, total)
    }

    pub(crate) fn update_job(
        &mut self,
        id: i64,
        spec: JobSpec,
        now: DateTime<Utc>,
    ) -> Result<JobDetail, StoreError> {
        {
            let job = self.visible_job(id)?;
            if job.status.is_running() {
                return Err(StoreError::StateConflict(format!(
                    "job {} is running and cannot be updated",
                    job.serial
                )));
            }
        }
        let (kinds, target_ids) = self.validate_spec(&spec)?;

        // Replace actions, first clearing results that reference the old
        // rows (they are foreign keys into the action table).
        let old_action_ids: Vec<i64> = self
            .actions
            .values()
            .filter(|a| a.job_id == id)
            .map(|a| a.id)
            .collect();
        self.action_results.retain(|_, r| !old_action_ids.contains(&r.action_id));
        self.actions.retain(|_, a| a.job_id != id);
        self.insert_actions(id, &spec.actions, kinds, now);
        self.replace_job_targets(id, &target_ids);

        if let Some(job) = self.jobs.get_mut(&id) {
            job.name = spec.name;
            job.description = spec.description;
            job.job_type = spec.job_type;
            job.scheduled_at = spec.scheduled_at;
            job.status = if spec.scheduled_at.is_some() {
                JobStatus::Scheduled
            } else {
                JobStatus::Draft
            };
            job.updated_at = now;
        }
        self.job_detail(id)
    }

    pub(crate) fn schedule_job(
        &mut self,
        id: i64,
        spec: &ScheduleSpec,
        now: DateTime<Utc>,
    ) -> Result<Job, StoreError> {
        let serial = {
            let job = self.visible_job(id)?;
            if job.status.is_running() {
                return Err(StoreError::StateConflict(format!(
                    "job {} is running and cannot be scheduled",
                    job.serial
                )));
            }
            job.serial.clone()
        };
        let job = self
            .jobs
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("job", serial))?;
        job.scheduled_at = Some(spec.scheduled_at);
        job.status = JobStatus::Scheduled;
        job.updated_at = now;
        Ok(job.clone())
    }

    pub(crate) fn delete_job(
        &mut self,
        id: i64,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if force {
            // Hard delete in cascade order: results → branches → logs →
            // executions → actions → target links → job.
            if !self.jobs.contains_key(&id) {
                return Err(StoreError::not_found("job", id));
            }
            let execution_ids: Vec<i64> = self
                .executions
                .values()
                .filter(|e| e.job_id == id)
                .map(|e| e.id)
                .collect();
            let branch_ids: Vec<i64> = self
                .branches
                .values()
                .filter(|b| execution_ids.contains(&b.execution_id))
                .map(|b| b.id)
                .collect();
            self.action_results.retain(|_, r| !branch_ids.contains(&r.branch_id));
            self.branches.retain(|_, b| !execution_ids.contains(&b.execution_id));
            self.execution_logs.retain(|l| !execution_ids.contains(&l.execution_id));
            self.executions.retain(|_, e| e.job_id != id);
            self.actions.retain(|_, a| a.job_id != id);
            self.job_targets.retain(|jt| jt.job_id != id);
            self.jobs.remove(&id);
            return Ok(());
        }

        let job_status = self.visible_job(id)?.status;
        if !job_status.deletable(false) {
            return Err(StoreError::StateConflict(
                "running job requires force to delete".to_owned(),
            ));
        }
        if let Some(job) = self.jobs.get_mut(&id) {
            job.is_deleted = true;
            job.deleted_at = Some(now);
            job.status = JobStatus::Deleted;
            job.updated_at = now;
        }
        Ok(())
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    /// Validate a spec: non-empty name, non-empty existing targets, and
    /// well-formed actions. Returns the typed kinds and deduped target ids.
    fn validate_spec(
        &self,
        spec: &JobSpec,
    ) -> Result<(Vec<ActionKind>, Vec<i64>), StoreError> {
        if spec.name.trim().is_empty() {
            return Err(StoreError::Validation("job name must not be empty".to_owned()));
        }
        if spec.target_ids.is_empty() {
            return Err(StoreError::Validation("target_ids must not be empty".to_owned()));
        }
        let mut target_ids = Vec::with_capacity(spec.target_ids.len());
        for &target_id in &spec.target_ids {
            if !self.targets.contains_key(&target_id) {
                return Err(StoreError::Validation(format!("target {target_id} not found")));
            }
            if !target_ids.contains(&target_id) {
                target_ids.push(target_id);
            }
        }
        let kinds = spec
            .actions
            .iter()
            .map(|a| a.to_kind())
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Validation)?;
        Ok((kinds, target_ids))
    }

    fn insert_actions(
        &mut self,
        job_id: i64,
        specs: &[muster_core::ActionSpec],
        kinds: Vec<ActionKind>,
        now: DateTime<Utc>,
    ) {
        for (index, (spec, kind)) in specs.iter().zip(kinds).enumerate() {
            let id = self.ids.next_action();
            self.actions.insert(
                id,
                Action {
                    id,
                    uuid: Uuid::new_v4(),
                    job_id,
                    action_order: index as u32 + 1,
                    name: spec.action_name.clone(),
                    kind,
                    created_at: now,
                    updated_at: now,
                },
            );
        }
    }

    fn replace_job_targets(&mut self, job_id: i64, target_ids: &[i64]) {
        self.job_targets.retain(|jt| jt.job_id != job_id);
        self.job_targets
            .extend(target_ids.iter().map(|&target_id| JobTarget { job_id, target_id }));
    }

    /// Look up a non-tombstoned job.
    fn visible_job(&self, id: i64) -> Result<&Job, StoreError> {
        self.jobs
            .get(&id)
            .filter(|j| !j.is_deleted)
            .ok_or_else(|| StoreError::not_found("job", id))
    }

    fn resolve_job(&self, job: &JobRef, options: GetOptions) -> Result<i64, StoreError> {
        let found = match job {
            JobRef::Id(id) => self.jobs.get(id),
            JobRef::Uuid(uuid) => self.jobs.values().find(|j| j.uuid == *uuid),
            JobRef::Serial(serial) => self.jobs.values().find(|j| j.serial == *serial),
        };
        found
            .filter(|j| options.include_deleted || !j.is_deleted)
            .map(|j| j.id)
            .ok_or_else(|| StoreError::not_found("job", format!("{job:?}")))
    }

    pub(super) fn job_detail(&self, id: i64) -> Result<JobDetail, StoreError> {
        let job = self
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("job", id))?;
        let mut actions: Vec<Action> =
            self.actions.values().filter(|a| a.job_id == id).cloned().collect();
        actions.sort_by_key(|a| a.action_order);
        let target_ids = self.job_target_ids(id);
        Ok(JobDetail { job, actions, target_ids })
    }

    pub(super) fn job_target_ids(&self, job_id: i64) -> Vec<i64> {
        self.job_targets
            .iter()
            .filter(|jt| jt.job_id == job_id)
            .map(|jt| jt.target_id)
            .collect()
    }

    fn job_summary(&self, job: &Job) -> JobSummary {
        let last_execution = self
            .executions
            .values()
            .filter(|e| e.job_id == job.id)
            .max_by_key(|e| e.execution_number)
            .map(|e| LastExecution {
                serial: e.serial.clone(),
                execution_number: e.execution_number,
                status: e.status,
            });
        JobSummary {
            job: job.clone(),
            action_count: self.actions.values().filter(|a| a.job_id == job.id).count(),
            target_count: self.job_target_ids(job.id).len(),
            last_execution,
        }
    }
}
