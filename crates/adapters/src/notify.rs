// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification sink for execution lifecycle messages.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from notify operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Sink for human-facing execution notifications (start, completion,
/// cancellation). Best-effort; failures are logged by the caller.
#[async_trait]
pub trait NotifySink: Send + Sync {
    /// Send a notification with a title and message body
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

/// Default sink: structured tracing output.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifySink;

#[async_trait]
impl NotifySink for LogNotifySink {
    async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        tracing::info!(%title, %message, "notification");
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

    /// Recorded notification
    #[derive(Debug, Clone)]
    pub struct NotifyCall {
        pub title: String,
        pub message: String,
    }

    /// Sink that records every notification for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingNotifySink {
        calls: Arc<Mutex<Vec<NotifyCall>>>,
    }

    impl RecordingNotifySink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Get all recorded notifications
        pub fn calls(&self) -> Vec<NotifyCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl NotifySink for RecordingNotifySink {
        async fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
            self.calls
                .lock()
                .push(NotifyCall { title: title.to_owned(), message: message.to_owned() });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{NotifyCall, RecordingNotifySink};
