// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit events emitted on job mutations and execution lifecycle transitions.
//!
//! Delivery is best-effort through an injected sink; a failed emit never
//! fails the operation that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    JobCreated,
    JobUpdated,
    JobDeleted,
    JobExecuted,
    ExecutionCompleted,
    ExecutionFailed,
    ExecutionCancelled,
}

crate::simple_display! {
    AuditEventType {
        JobCreated => "JOB_CREATED",
        JobUpdated => "JOB_UPDATED",
        JobDeleted => "JOB_DELETED",
        JobExecuted => "JOB_EXECUTED",
        ExecutionCompleted => "EXECUTION_COMPLETED",
        ExecutionFailed => "EXECUTION_FAILED",
        ExecutionCancelled => "EXECUTION_CANCELLED",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    #[default]
    Info,
    Warning,
    High,
}

crate::simple_display! {
    AuditSeverity {
        Info => "info",
        Warning => "warning",
        High => "high",
    }
}

/// One audit event. `resource_id` is the resource's public serial, the
/// permanent cross-component key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    pub user_id: Option<String>,
    pub resource_kind: String,
    pub resource_id: String,
    pub action: String,
    pub details: serde_json::Value,
    pub severity: AuditSeverity,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventType,
        resource_kind: impl Into<String>,
        resource_id: impl Into<String>,
        action: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type,
            user_id: None,
            resource_kind: resource_kind.into(),
            resource_id: resource_id.into(),
            action: action.into(),
            details: serde_json::Value::Null,
            severity: AuditSeverity::Info,
            timestamp,
        }
    }

    crate::setters! {
        set {
            severity: AuditSeverity,
            details: serde_json::Value,
        }
        option {
            user_id: String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_wire_format_is_screaming_snake() {
        let json = serde_json::to_string(&AuditEventType::ExecutionCancelled).unwrap();
        assert_eq!(json, "\"EXECUTION_CANCELLED\"");
        assert_eq!(AuditEventType::JobCreated.to_string(), "JOB_CREATED");
    }

    #[test]
    fn builder_style_setters() {
        let event = AuditEvent::new(
            AuditEventType::JobCreated,
            "job",
            "J-000001",
            "create",
            chrono::Utc::now(),
        )
        .user_id("u-12")
        .severity(AuditSeverity::Info);
        assert_eq!(event.user_id.as_deref(), Some("u-12"));
        assert_eq!(event.resource_id, "J-000001");
    }
}
