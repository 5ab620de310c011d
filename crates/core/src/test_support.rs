// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::execution::ExecutionStatus;
use crate::job::JobStatus;
use crate::serial::Serial;
use crate::target::{CommunicationMethod, Credential, CredentialType, OsType, Target};
use chrono::{TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::json;
use uuid::Uuid;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Draft),
            Just(JobStatus::Scheduled),
            Just(JobStatus::Running),
            Just(JobStatus::Completed),
            Just(JobStatus::Failed),
            Just(JobStatus::Cancelled),
            Just(JobStatus::Deleted),
        ]
    }

    pub fn arb_execution_status() -> impl Strategy<Value = ExecutionStatus> {
        prop_oneof![
            Just(ExecutionStatus::Scheduled),
            Just(ExecutionStatus::Running),
            Just(ExecutionStatus::Completed),
            Just(ExecutionStatus::Failed),
            Just(ExecutionStatus::Cancelled),
        ]
    }

    pub fn arb_terminal_execution_status() -> impl Strategy<Value = ExecutionStatus> {
        prop_oneof![
            Just(ExecutionStatus::Completed),
            Just(ExecutionStatus::Failed),
            Just(ExecutionStatus::Cancelled),
        ]
    }
}

// ── Fixture factories ───────────────────────────────────────────────────

/// Credential blob in the shape the fake decryptor understands (plain JSON).
pub fn password_blob(username: &str, password: &str) -> Vec<u8> {
    json!({ "username": username, "password": password }).to_string().into_bytes()
}

/// SSH-key credential blob for the fake decryptor.
pub fn ssh_key_blob(username: &str, private_key: &str, passphrase: Option<&str>) -> Vec<u8> {
    let mut value = json!({ "username": username, "private_key": private_key });
    if let Some(phrase) = passphrase {
        value["passphrase"] = json!(phrase);
    }
    value.to_string().into_bytes()
}

pub fn password_credential(id: i64, username: &str, password: &str) -> Credential {
    Credential {
        id,
        credential_type: CredentialType::Password,
        encrypted_credentials: password_blob(username, password),
        is_primary: true,
    }
}

/// A communication method with empty config and no credentials.
pub fn method(id: i64, method_type: &str, is_primary: bool, is_active: bool) -> CommunicationMethod {
    CommunicationMethod {
        id,
        method_type: method_type.to_owned(),
        is_primary,
        is_active,
        priority: 1,
        config: IndexMap::new(),
        credentials: Vec::new(),
    }
}

/// An SSH method pointed at `host` with a valid password credential.
pub fn ssh_method(id: i64, host: &str) -> CommunicationMethod {
    let mut m = method(id, "ssh", true, true);
    m.config.insert("host".to_owned(), json!(host));
    m.credentials.push(password_credential(id, "ops", "hunter2-fixture"));
    m
}

pub fn target_with_methods(methods: Vec<CommunicationMethod>) -> Target {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
    Target {
        id: 1,
        uuid: Uuid::new_v4(),
        serial: Serial::from_string("T-000001"),
        name: "test-target".to_owned(),
        os_type: OsType::Linux,
        communication_methods: methods,
        created_at: at,
        updated_at: at,
    }
}

/// A Linux target reachable over SSH with a valid password credential.
pub fn linux_target(id: i64, name: &str, host: &str) -> Target {
    let mut target = target_with_methods(vec![ssh_method(id, host)]);
    target.id = id;
    target.serial = Serial::from_string(format!("T-{id:06}"));
    target.name = name.to_owned();
    target
}
