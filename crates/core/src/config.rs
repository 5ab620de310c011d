// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration, read from the environment.

use std::time::Duration;

/// Tunables for the execution engine. Environment variables are read once by
/// [`EngineConfig::from_env`]; unparseable values fall back to the defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Capacity of the per-execution branch semaphore (`MAX_CONCURRENT_TARGETS`).
    pub max_concurrent_targets: usize,
    /// Bounds transport session setup (`CONNECTION_TIMEOUT`, seconds).
    pub connection_timeout: Duration,
    /// Bounds one action attempt (`COMMAND_TIMEOUT`, seconds).
    pub command_timeout: Duration,
    /// When false, every transport failure is fatal (`ENABLE_RETRY`).
    pub enable_retry: bool,
    /// Caps retriable attempts per action (`MAX_RETRIES`).
    pub max_retries: u32,
    /// Back-off base in seconds; attempt k sleeps `base ** k` (`RETRY_BACKOFF_BASE`).
    pub retry_backoff_base: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_targets: 50,
            connection_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(300),
            enable_retry: true,
            max_retries: 3,
            retry_backoff_base: 2.0,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_targets: env_parse("MAX_CONCURRENT_TARGETS")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_concurrent_targets),
            connection_timeout: env_parse("CONNECTION_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.connection_timeout),
            command_timeout: env_parse("COMMAND_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.command_timeout),
            enable_retry: env_bool("ENABLE_RETRY").unwrap_or(defaults.enable_retry),
            max_retries: env_parse("MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_backoff_base: env_parse("RETRY_BACKOFF_BASE")
                .filter(|b: &f64| b.is_finite() && *b >= 1.0)
                .unwrap_or(defaults.retry_backoff_base),
        }
    }

    crate::setters! {
        set {
            max_concurrent_targets: usize,
            connection_timeout: Duration,
            command_timeout: Duration,
            enable_retry: bool,
            max_retries: u32,
            retry_backoff_base: f64,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_bool(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
