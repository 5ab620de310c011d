// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn policy() -> RetryPolicy {
    RetryPolicy::from_config(&EngineConfig::default())
}

fn no_retry_policy() -> RetryPolicy {
    RetryPolicy::from_config(&EngineConfig::default().enable_retry(false))
}

fn output(exit_code: i32) -> CommandOutput {
    CommandOutput { stdout: "out".into(), stderr: String::new(), exit_code }
}

#[test]
fn zero_exit_is_success() {
    let classified = policy().classify(Ok(output(0)));
    assert!(matches!(classified, Classification::Success(_)), "got {classified:?}");
}

#[test]
fn nonzero_exit_is_command_failure_never_retried() {
    let classified = policy().classify(Ok(output(1)));
    assert!(matches!(classified, Classification::CommandFailed(_)), "got {classified:?}");
}

#[parameterized(
    refused = { TransportError::ConnectionRefused("22".into()) },
    timeout = { TransportError::Timeout("30s".into()) },
    reset = { TransportError::ConnectionReset("peer".into()) },
)]
fn retriable_transport_errors(error: TransportError) {
    let classified = policy().classify(Err(error));
    assert!(matches!(classified, Classification::Retriable(_)), "got {classified:?}");
}

#[parameterized(
    auth = { TransportError::AuthenticationFailed("denied".into()) },
    unsupported = { TransportError::UnsupportedMethod("telnet".into()) },
    malformed = { TransportError::MalformedHost("".into()) },
    unclassified = { TransportError::Other("exec format error".into()) },
)]
fn fatal_transport_errors(error: TransportError) {
    let classified = policy().classify(Err(error));
    assert!(matches!(classified, Classification::Fatal(_)), "got {classified:?}");
}

#[test]
fn disabling_retry_turns_retriable_into_fatal() {
    let classified =
        no_retry_policy().classify(Err(TransportError::ConnectionRefused("22".into())));
    assert!(matches!(classified, Classification::Fatal(_)), "got {classified:?}");
    assert_eq!(no_retry_policy().max_retries(), 0);
}

#[test]
fn backoff_is_exponential_in_base() {
    let policy = RetryPolicy::from_config(&EngineConfig::default().retry_backoff_base(2.0));
    assert_eq!(policy.backoff(0), Duration::from_secs(1));
    assert_eq!(policy.backoff(1), Duration::from_secs(2));
    assert_eq!(policy.backoff(2), Duration::from_secs(4));
    assert_eq!(policy.backoff(3), Duration::from_secs(8));
}

#[test]
fn backoff_with_fractional_base() {
    let policy = RetryPolicy::from_config(&EngineConfig::default().retry_backoff_base(1.5));
    assert_eq!(policy.backoff(2), Duration::from_secs_f64(2.25));
}
