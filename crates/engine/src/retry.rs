// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt classification and back-off.

use muster_adapters::{CommandOutput, TransportError};
use muster_core::EngineConfig;
use std::time::Duration;

/// What one attempt means for the retry loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Exit code 0 and no transport error.
    Success(CommandOutput),
    /// The command ran and failed. Never retried.
    CommandFailed(CommandOutput),
    /// A transport failure a retry could fix.
    Retriable(TransportError),
    /// A transport failure retrying cannot fix (or retries are disabled).
    Fatal(TransportError),
}

/// Per-action retry policy: classification plus exponential back-off.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    enable_retry: bool,
    max_retries: u32,
    backoff_base: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            enable_retry: config.enable_retry,
            max_retries: config.max_retries,
            backoff_base: config.retry_backoff_base,
        }
    }

    /// Retriable failures allowed per action. Zero when retries are disabled,
    /// so the transport is invoked at most `max_retries + 1` times.
    pub fn max_retries(&self) -> u32 {
        if self.enable_retry { self.max_retries } else { 0 }
    }

    /// Classify one attempt.
    pub fn classify(&self, attempt: Result<CommandOutput, TransportError>) -> Classification {
        match attempt {
            Ok(output) if output.success() => Classification::Success(output),
            Ok(output) => Classification::CommandFailed(output),
            Err(error) if self.enable_retry && error.is_retriable() => {
                Classification::Retriable(error)
            }
            Err(error) => Classification::Fatal(error),
        }
    }

    /// Delay before retry `retry_index` (0-indexed after the initial
    /// attempt): `base ** retry_index` seconds.
    pub fn backoff(&self, retry_index: u32) -> Duration {
        let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
        Duration::from_secs_f64(self.backoff_base.powi(exponent))
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
