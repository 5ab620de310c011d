// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote command execution capability.
//!
//! A [`RemoteExecutor`] knows how to open a session to a host over one named
//! protocol; a [`RemoteSession`] runs commands over that session. The engine
//! picks the executor from an [`ExecutorRegistry`] keyed by the communication
//! method's `method_type`, so new protocols plug in without touching the
//! engine.

use crate::credential::ResolvedCredential;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error text markers treated as retriable when the transport reports an
/// unclassified [`TransportError::Other`].
const RETRIABLE_MARKERS: &[&str] = &[
    "timeout",
    "connection refused",
    "network",
    "unreachable",
    "temporary failure",
    "reset by peer",
    "broken pipe",
];

/// Transport-level failure, classified at the source where possible.
///
/// The structured variants drive retry decisions directly; `Other` falls back
/// to substring matching over the message text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("connection refused: {0}")]
    ConnectionRefused(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("host unreachable: {0}")]
    Unreachable(String),
    #[error("temporary failure: {0}")]
    TemporaryFailure(String),
    #[error("connection reset by peer: {0}")]
    ConnectionReset(String),
    #[error("broken pipe: {0}")]
    BrokenPipe(String),
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("unsupported method type: {0}")]
    UnsupportedMethod(String),
    #[error("malformed host: {0}")]
    MalformedHost(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether a retry could plausibly succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            TransportError::Timeout(_)
            | TransportError::ConnectionRefused(_)
            | TransportError::Network(_)
            | TransportError::Unreachable(_)
            | TransportError::TemporaryFailure(_)
            | TransportError::ConnectionReset(_)
            | TransportError::BrokenPipe(_) => true,
            TransportError::AuthenticationFailed(_)
            | TransportError::UnsupportedMethod(_)
            | TransportError::MalformedHost(_) => false,
            TransportError::Other(message) => {
                let message = message.to_lowercase();
                RETRIABLE_MARKERS.iter().any(|marker| message.contains(marker))
            }
        }
    }

    /// Credential rejections short-circuit the branch with an authentication
    /// failure instead of a generic transport failure.
    pub fn is_authentication(&self) -> bool {
        matches!(self, TransportError::AuthenticationFailed(_))
    }
}

/// Captured output of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// An open session to one target. Dropped or closed at branch end; sessions
/// are not shared across branches.
#[async_trait]
pub trait RemoteSession: Send {
    /// Run one command, enforcing `command_timeout`. A timeout is reported
    /// as [`TransportError::Timeout`] so the retry policy can act on it.
    async fn execute(
        &mut self,
        command: &str,
        command_timeout: Duration,
    ) -> Result<CommandOutput, TransportError>;

    async fn close(&mut self);
}

/// One named protocol (`ssh`, `winrm`, …).
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Registry key this executor serves.
    fn method_type(&self) -> &str;

    /// Port used when the communication method config has none.
    fn default_port(&self) -> u16;

    async fn connect(
        &self,
        host: &str,
        port: u16,
        credential: &ResolvedCredential,
        connect_timeout: Duration,
    ) -> Result<Box<dyn RemoteSession>, TransportError>;
}

/// Protocol registry, populated at startup.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn RemoteExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under its own `method_type`, replacing any
    /// previous registration for that protocol.
    pub fn register(&mut self, executor: Arc<dyn RemoteExecutor>) {
        self.executors.insert(executor.method_type().to_owned(), executor);
    }

    pub fn with(mut self, executor: Arc<dyn RemoteExecutor>) -> Self {
        self.register(executor);
        self
    }

    pub fn get(&self, method_type: &str) -> Result<Arc<dyn RemoteExecutor>, TransportError> {
        self.executors
            .get(method_type)
            .cloned()
            .ok_or_else(|| TransportError::UnsupportedMethod(method_type.to_owned()))
    }

    pub fn method_types(&self) -> Vec<&str> {
        self.executors.keys().map(String::as_str).collect()
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// A scripted reaction to one `execute` call on a host.
    #[derive(Debug, Clone)]
    pub enum ScriptedOutcome {
        /// Return this output.
        Output(CommandOutput),
        /// Fail with this transport error.
        Error(TransportError),
        /// Sleep for the duration, then return the output. Lets paused-time
        /// tests observe concurrency and cancellation windows.
        Delay(Duration, CommandOutput),
        /// Never return. Only a cancellation or timeout gets past this.
        Hang,
    }

    /// One recorded `execute` call.
    #[derive(Debug, Clone)]
    pub struct ExecCall {
        pub host: String,
        pub command: String,
    }

    #[derive(Default)]
    struct FakeExecutorState {
        /// Per-host queues of scripted outcomes; an empty queue means success.
        scripts: HashMap<String, VecDeque<ScriptedOutcome>>,
        /// Per-host queues of connect failures consumed before any session
        /// is handed out.
        connect_errors: HashMap<String, VecDeque<TransportError>>,
        calls: Vec<ExecCall>,
        connects: Vec<String>,
        active: usize,
        max_active: usize,
    }

    /// Scriptable in-memory transport shared by every test tier.
    ///
    /// Unscripted commands succeed with a canned stdout echoing the command,
    /// so happy paths need no setup.
    #[derive(Clone)]
    pub struct FakeExecutor {
        method: String,
        port: u16,
        inner: Arc<Mutex<FakeExecutorState>>,
    }

    impl FakeExecutor {
        pub fn new(method: impl Into<String>, port: u16) -> Self {
            Self {
                method: method.into(),
                port,
                inner: Arc::new(Mutex::new(FakeExecutorState::default())),
            }
        }

        /// An SSH-flavoured fake with the conventional default port.
        pub fn ssh() -> Self {
            Self::new("ssh", 22)
        }

        pub fn script(&self, host: &str, outcome: ScriptedOutcome) {
            self.inner.lock().scripts.entry(host.to_owned()).or_default().push_back(outcome);
        }

        pub fn script_output(&self, host: &str, stdout: &str, exit_code: i32) {
            self.script(
                host,
                ScriptedOutcome::Output(CommandOutput {
                    stdout: stdout.to_owned(),
                    stderr: String::new(),
                    exit_code,
                }),
            );
        }

        pub fn script_error(&self, host: &str, error: TransportError) {
            self.script(host, ScriptedOutcome::Error(error));
        }

        pub fn script_hang(&self, host: &str) {
            self.script(host, ScriptedOutcome::Hang);
        }

        pub fn script_connect_error(&self, host: &str, error: TransportError) {
            self.inner
                .lock()
                .connect_errors
                .entry(host.to_owned())
                .or_default()
                .push_back(error);
        }

        /// All recorded `execute` calls, in order.
        pub fn calls(&self) -> Vec<ExecCall> {
            self.inner.lock().calls.clone()
        }

        /// Number of `execute` calls against one host.
        pub fn executions(&self, host: &str) -> usize {
            self.inner.lock().calls.iter().filter(|c| c.host == host).count()
        }

        /// Hosts connected to, in order.
        pub fn connects(&self) -> Vec<String> {
            self.inner.lock().connects.clone()
        }

        /// High-water mark of concurrently executing commands.
        pub fn max_concurrent(&self) -> usize {
            self.inner.lock().max_active
        }
    }

    #[async_trait]
    impl RemoteExecutor for FakeExecutor {
        fn method_type(&self) -> &str {
            &self.method
        }

        fn default_port(&self) -> u16 {
            self.port
        }

        async fn connect(
            &self,
            host: &str,
            _port: u16,
            _credential: &ResolvedCredential,
            _connect_timeout: Duration,
        ) -> Result<Box<dyn RemoteSession>, TransportError> {
            let mut state = self.inner.lock();
            state.connects.push(host.to_owned());
            if let Some(error) =
                state.connect_errors.get_mut(host).and_then(VecDeque::pop_front)
            {
                return Err(error);
            }
            drop(state);
            Ok(Box::new(FakeSession { host: host.to_owned(), inner: Arc::clone(&self.inner) }))
        }
    }

    struct FakeSession {
        host: String,
        inner: Arc<Mutex<FakeExecutorState>>,
    }

    #[async_trait]
    impl RemoteSession for FakeSession {
        async fn execute(
            &mut self,
            command: &str,
            _command_timeout: Duration,
        ) -> Result<CommandOutput, TransportError> {
            let outcome = {
                let mut state = self.inner.lock();
                state.calls.push(ExecCall {
                    host: self.host.clone(),
                    command: command.to_owned(),
                });
                state.active += 1;
                state.max_active = state.max_active.max(state.active);
                state
                    .scripts
                    .get_mut(&self.host)
                    .and_then(VecDeque::pop_front)
                    .unwrap_or_else(|| {
                        ScriptedOutcome::Output(CommandOutput {
                            stdout: format!("ran: {command}"),
                            stderr: String::new(),
                            exit_code: 0,
                        })
                    })
            };

            let result = match outcome {
                ScriptedOutcome::Output(output) => Ok(output),
                ScriptedOutcome::Error(error) => Err(error),
                ScriptedOutcome::Delay(duration, output) => {
                    tokio::time::sleep(duration).await;
                    Ok(output)
                }
                ScriptedOutcome::Hang => {
                    std::future::pending::<()>().await;
                    Ok(CommandOutput::default())
                }
            };
            self.inner.lock().active -= 1;
            result
        }

        async fn close(&mut self) {}
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecCall, FakeExecutor, ScriptedOutcome};

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
