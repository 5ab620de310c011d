// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution record hierarchy: Execution → Branch → ActionResult.

use crate::serial::Serial;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use uuid::Uuid;

/// Lifecycle state of an execution or branch.
///
/// `scheduled → running → {completed, failed, cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    ExecutionStatus {
        Scheduled => "scheduled",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

/// Terminal-status rollup over a set of branch statuses.
///
/// Any failed branch fails the execution; all completed completes it; if
/// every non-completed branch was cancelled the execution is cancelled. With
/// a non-terminal branch in the set the rollup is still `Running`.
pub fn roll_up(branches: impl IntoIterator<Item = ExecutionStatus>) -> ExecutionStatus {
    let mut any_failed = false;
    let mut any_cancelled = false;
    let mut any_open = false;
    for status in branches {
        match status {
            ExecutionStatus::Failed => any_failed = true,
            ExecutionStatus::Cancelled => any_cancelled = true,
            ExecutionStatus::Completed => {}
            ExecutionStatus::Scheduled | ExecutionStatus::Running => any_open = true,
        }
    }
    if any_failed {
        ExecutionStatus::Failed
    } else if any_open {
        ExecutionStatus::Running
    } else if any_cancelled {
        ExecutionStatus::Cancelled
    } else {
        ExecutionStatus::Completed
    }
}

/// Terminal state of a single action result. Once set it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    ActionStatus {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

impl ActionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Failed)
    }
}

/// What started an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    #[default]
    Manual,
    Schedule,
}

crate::simple_display! {
    TriggerSource {
        Manual => "manual",
        Schedule => "schedule",
    }
}

/// Per-terminal-state branch tallies rolled onto the execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCounts {
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    pub cancelled: u32,
}

impl TargetCounts {
    /// Tally branch terminal statuses; non-terminal statuses count only
    /// toward the total.
    pub fn tally(statuses: impl IntoIterator<Item = ExecutionStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.total += 1;
            match status {
                ExecutionStatus::Completed => counts.successful += 1,
                ExecutionStatus::Failed => counts.failed += 1,
                ExecutionStatus::Cancelled => counts.cancelled += 1,
                ExecutionStatus::Scheduled | ExecutionStatus::Running => {}
            }
        }
        counts
    }
}

/// One invocation of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: i64,
    pub uuid: Uuid,
    pub serial: Serial,
    pub job_id: i64,
    /// 1-based, strictly monotonic per job, never reused.
    pub execution_number: u32,
    pub status: ExecutionStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub triggered_by: TriggerSource,
    pub triggered_by_user: Option<String>,
    pub total_targets: u32,
    pub successful_targets: u32,
    pub failed_targets: u32,
    pub cancelled_targets: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The execution record for one (execution, target) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub uuid: Uuid,
    pub serial: Serial,
    pub execution_id: i64,
    /// Zero-padded index within the execution (`001`, `002`, …).
    pub branch_id: SmolStr,
    pub target_id: i64,
    /// Snapshot of the target's public serial at execution time.
    pub target_serial_ref: Option<Serial>,
    pub status: ExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result_output: Option<String>,
    pub result_error: Option<String>,
    pub exit_code: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The outcome of one action on one branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub id: i64,
    pub uuid: Uuid,
    pub serial: Serial,
    pub branch_id: i64,
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
    /// The resolved command string, recorded for forensics.
    pub command_executed: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
