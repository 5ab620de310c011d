// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit event sink.
//!
//! Delivery is best-effort: the engine logs a failed emit and moves on, so a
//! slow or broken audit backend can never fail a job operation.

use async_trait::async_trait;
use muster_core::AuditEvent;
use thiserror::Error;

/// Errors from audit delivery.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Sink for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Default sink: structured tracing output.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            event_type = %event.event_type,
            resource_kind = %event.resource_kind,
            resource_id = %event.resource_id,
            action = %event.action,
            severity = %event.severity,
            user_id = event.user_id.as_deref().unwrap_or("-"),
            "audit event"
        );
        Ok(())
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Sink that records every event for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingAuditSink {
        events: Arc<Mutex<Vec<AuditEvent>>>,
    }

    impl RecordingAuditSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<AuditEvent> {
            self.events.lock().clone()
        }
    }

    #[async_trait]
    impl AuditSink for RecordingAuditSink {
        async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
            self.events.lock().push(event);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::RecordingAuditSink;
