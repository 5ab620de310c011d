// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! muster-core: entities, state machines, and the serial scheme for the
//! Muster fleet automation engine.

pub mod macros;

pub mod action;
pub mod clock;
pub mod config;
pub mod event;
pub mod execution;
pub mod job;
pub mod log;
pub mod serial;
pub mod target;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use action::{Action, ActionKind, ActionSpec, CAPTURE_OUTPUT_KEY, COMMAND_KEY};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::EngineConfig;
pub use event::{AuditEvent, AuditEventType, AuditSeverity};
pub use execution::{
    roll_up, ActionResult, ActionStatus, Branch, Execution, ExecutionStatus, TargetCounts,
    TriggerSource,
};
pub use job::{
    ExecuteSpec, Job, JobFilter, JobSort, JobSpec, JobStatus, JobType, Page, ScheduleSpec,
    SortField,
};
pub use log::{ExecutionLog, LogCategory, LogLevel, LogPhase};
pub use serial::{Serial, SerialKind};
pub use target::{CommunicationMethod, Credential, CredentialType, OsType, Target};
