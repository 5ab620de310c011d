// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! muster-adapters: capability traits for external I/O.
//!
//! The engine reaches the outside world only through these seams: remote
//! command transports, credential decryption, and the audit/notification
//! sinks. Real transports (ssh, winrm) plug into the registry; the fakes
//! behind `test-support` script every failure mode the engine must handle.

pub mod audit;
pub mod credential;
pub mod executor;
pub mod notify;

pub use audit::{AuditError, AuditSink, TracingAuditSink};
pub use credential::{resolve, DecryptError, Decryptor, ResolveError, ResolvedCredential};
pub use executor::{
    CommandOutput, ExecutorRegistry, RemoteExecutor, RemoteSession, TransportError,
};
pub use notify::{LogNotifySink, NotifyError, NotifySink};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use audit::RecordingAuditSink;
#[cfg(any(test, feature = "test-support"))]
pub use credential::FakeDecryptor;
#[cfg(any(test, feature = "test-support"))]
pub use executor::{ExecCall, FakeExecutor, ScriptedOutcome};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{NotifyCall, RecordingNotifySink};
