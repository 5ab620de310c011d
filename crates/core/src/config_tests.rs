// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_engine_env() {
    for name in [
        "MAX_CONCURRENT_TARGETS",
        "CONNECTION_TIMEOUT",
        "COMMAND_TIMEOUT",
        "ENABLE_RETRY",
        "MAX_RETRIES",
        "RETRY_BACKOFF_BASE",
    ] {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn defaults_match_documented_values() {
    clear_engine_env();
    let config = EngineConfig::from_env();
    assert_eq!(config.max_concurrent_targets, 50);
    assert_eq!(config.connection_timeout, Duration::from_secs(30));
    assert_eq!(config.command_timeout, Duration::from_secs(300));
    assert!(config.enable_retry);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.retry_backoff_base, 2.0);
}

#[test]
#[serial]
fn env_overrides_are_read() {
    clear_engine_env();
    std::env::set_var("MAX_CONCURRENT_TARGETS", "8");
    std::env::set_var("CONNECTION_TIMEOUT", "5");
    std::env::set_var("COMMAND_TIMEOUT", "60");
    std::env::set_var("ENABLE_RETRY", "false");
    std::env::set_var("MAX_RETRIES", "1");
    std::env::set_var("RETRY_BACKOFF_BASE", "1.5");

    let config = EngineConfig::from_env();
    assert_eq!(config.max_concurrent_targets, 8);
    assert_eq!(config.connection_timeout, Duration::from_secs(5));
    assert_eq!(config.command_timeout, Duration::from_secs(60));
    assert!(!config.enable_retry);
    assert_eq!(config.max_retries, 1);
    assert_eq!(config.retry_backoff_base, 1.5);
    clear_engine_env();
}

#[test]
#[serial]
fn garbage_values_fall_back_to_defaults() {
    clear_engine_env();
    std::env::set_var("MAX_CONCURRENT_TARGETS", "0");
    std::env::set_var("CONNECTION_TIMEOUT", "soon");
    std::env::set_var("ENABLE_RETRY", "maybe");
    std::env::set_var("RETRY_BACKOFF_BASE", "0.1");

    let config = EngineConfig::from_env();
    assert_eq!(config.max_concurrent_targets, 50);
    assert_eq!(config.connection_timeout, Duration::from_secs(30));
    assert!(config.enable_retry);
    assert_eq!(config.retry_backoff_base, 2.0);
    clear_engine_env();
}

#[test]
fn setters_chain() {
    let config = EngineConfig::default()
        .max_concurrent_targets(2)
        .command_timeout(Duration::from_secs(10))
        .enable_retry(false);
    assert_eq!(config.max_concurrent_targets, 2);
    assert_eq!(config.command_timeout, Duration::from_secs(10));
    assert!(!config.enable_retry);
}
