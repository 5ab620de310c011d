// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-execution log rows recording lifecycle phases for forensics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which stage of a branch's life produced the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogPhase {
    TargetSelection,
    Authentication,
    Communication,
    ActionExecution,
    Completion,
}

crate::simple_display! {
    LogPhase {
        TargetSelection => "target_selection",
        Authentication => "authentication",
        Communication => "communication",
        ActionExecution => "action_execution",
        Completion => "completion",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

crate::simple_display! {
    LogLevel {
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    System,
    Authentication,
    Communication,
    CommandExecution,
}

crate::simple_display! {
    LogCategory {
        System => "system",
        Authentication => "authentication",
        Communication => "communication",
        CommandExecution => "command_execution",
    }
}

/// One execution log row. Branch-scoped entries carry `branch_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: i64,
    pub execution_id: i64,
    pub branch_id: Option<i64>,
    pub phase: LogPhase,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}
