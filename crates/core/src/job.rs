// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job entity, its status state machine, and the caller-supplied specs.

use crate::action::ActionSpec;
use crate::execution::TriggerSource;
use crate::serial::Serial;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a job's actions are made of. Only shell-style commands today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    Command,
}

crate::simple_display! {
    JobType {
        Command => "command",
    }
}

/// Lifecycle state of a job.
///
/// `draft → scheduled → running → {completed, failed, cancelled}`, with
/// `deleted` as a sink reachable by soft-delete from any non-running state
/// (running requires force).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Draft,
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
    Deleted,
}

crate::simple_display! {
    JobStatus {
        Draft => "draft",
        Scheduled => "scheduled",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Deleted => "deleted",
    }
}

impl JobStatus {
    /// Terminal states of a single run; a job can still be re-executed from
    /// any of these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }

    /// Whether a delete is allowed from this state. A running job can only be
    /// deleted with `force`.
    pub fn deletable(&self, force: bool) -> bool {
        force || !self.is_running()
    }
}

/// A reusable job definition: an ordered list of actions and a target set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub uuid: Uuid,
    pub serial: Serial,
    pub name: String,
    pub description: String,
    pub job_type: JobType,
    pub status: JobStatus,
    /// Opaque user id of the creator.
    pub created_by: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Soft-delete tombstone. Tombstoned jobs are invisible to read paths
    /// unless explicitly requested; their execution history stays intact.
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied definition for creating or replacing a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub job_type: JobType,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub actions: Vec<ActionSpec>,
    pub target_ids: Vec<i64>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    crate::setters! {
        into {
            description: String,
        }
        set {
            actions: Vec<ActionSpec>,
            target_ids: Vec<i64>,
        }
        option {
            scheduled_at: DateTime<Utc>,
        }
    }
}

/// Caller-supplied request to schedule a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSpec {
    pub scheduled_at: DateTime<Utc>,
}

/// Caller-supplied request to execute a job now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSpec {
    /// Overrides the job's stored target set when present and non-empty.
    #[serde(default)]
    pub target_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub triggered_by: TriggerSource,
    #[serde(default)]
    pub triggered_by_user: Option<String>,
}

/// Filters for job listing.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub created_by: Option<String>,
    /// Case-insensitive substring over name and description.
    pub search: Option<String>,
    /// Include soft-deleted jobs.
    pub include_deleted: bool,
}

/// Pagination window for listings.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { offset: 0, limit: 100 }
    }
}

/// Sortable job fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
}

/// Sort order for job listings. Defaults to newest first.
#[derive(Debug, Clone, Copy)]
pub struct JobSort {
    pub field: SortField,
    pub ascending: bool,
}

impl Default for JobSort {
    fn default() -> Self {
        Self { field: SortField::CreatedAt, ascending: false }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
