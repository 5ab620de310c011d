// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared engine dependencies.

use muster_adapters::{AuditSink, Decryptor, ExecutorRegistry, NotifySink};
use muster_core::{AuditEvent, Clock, EngineConfig};
use muster_storage::{JobStore, NewExecutionLog};
use std::sync::Arc;

/// Everything the engine needs to run: the store, the transport registry,
/// the decryptor, and the two outbound sinks. Shared behind an `Arc` across
/// branch tasks.
pub struct EngineDeps<C: Clock> {
    pub store: Arc<dyn JobStore>,
    pub executors: Arc<ExecutorRegistry>,
    pub decryptor: Arc<dyn Decryptor>,
    pub audit: Arc<dyn AuditSink>,
    pub notifier: Arc<dyn NotifySink>,
    pub config: EngineConfig,
    pub clock: C,
}

impl<C: Clock> EngineDeps<C> {
    /// Fire-and-forget audit emission; failures are logged, never surfaced.
    pub(crate) async fn emit_audit(&self, event: AuditEvent) {
        let event_type = event.event_type;
        if let Err(error) = self.audit.record(event).await {
            tracing::warn!(%event_type, %error, "audit event delivery failed");
        }
    }

    /// Fire-and-forget notification; failures are logged, never surfaced.
    pub(crate) async fn send_notification(&self, title: &str, message: &str) {
        if let Err(error) = self.notifier.notify(title, message).await {
            tracing::warn!(%title, %error, "notification send failed");
        }
    }

    /// Best-effort execution log append.
    pub(crate) async fn log_execution(&self, entry: NewExecutionLog) {
        let execution_id = entry.execution_id;
        if let Err(error) = self.store.append_execution_log(entry).await {
            tracing::warn!(execution_id, %error, "execution log append failed");
        }
    }
}
