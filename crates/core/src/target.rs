// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target, communication method, and credential records.
//!
//! Targets are owned by an external inventory; the engine only reads the
//! fields it needs to reach a machine and authenticate.

use crate::serial::Serial;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Operating system family of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Linux,
    Windows,
    #[default]
    Unknown,
}

crate::simple_display! {
    OsType {
        Linux => "linux",
        Windows => "windows",
        Unknown => "unknown",
    }
}

/// A remote system addressable via one or more communication methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    pub uuid: Uuid,
    pub serial: Serial,
    pub name: String,
    pub os_type: OsType,
    /// Ordered; selection prefers the primary active method.
    pub communication_methods: Vec<CommunicationMethod>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Target {
    /// The method used to reach this target: the first method that is both
    /// primary and active, falling back to the first active method.
    pub fn primary_method(&self) -> Option<&CommunicationMethod> {
        self.communication_methods
            .iter()
            .find(|m| m.is_primary && m.is_active)
            .or_else(|| self.communication_methods.iter().find(|m| m.is_active))
    }
}

/// A protocol binding (`ssh`, `winrm`, …) plus the config and credentials
/// used to reach a target through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationMethod {
    pub id: i64,
    /// Registry key for the transport (`ssh`, `winrm`, …).
    pub method_type: String,
    pub is_primary: bool,
    pub is_active: bool,
    pub priority: u32,
    /// Free-form transport config; `host` and `port` are the recognised keys.
    pub config: IndexMap<String, Value>,
    /// Attached credentials in stored order.
    pub credentials: Vec<Credential>,
}

impl CommunicationMethod {
    pub fn host(&self) -> Option<&str> {
        self.config.get("host").and_then(Value::as_str).filter(|h| !h.is_empty())
    }

    /// Explicit port override; transports supply their own default otherwise.
    pub fn port(&self) -> Option<u16> {
        self.config.get("port").and_then(Value::as_u64).and_then(|p| u16::try_from(p).ok())
    }
}

/// Credential shape attached to a communication method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    Password,
    SshKey,
}

crate::simple_display! {
    CredentialType {
        Password => "password",
        SshKey => "ssh_key",
    }
}

/// An encrypted credential record. The blob is opaque to the engine; only the
/// decryptor capability can open it, and the plaintext is never persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    pub credential_type: CredentialType,
    pub encrypted_credentials: Vec<u8>,
    pub is_primary: bool,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("credential_type", &self.credential_type)
            .field("encrypted_credentials", &format_args!("<{} bytes>", self.encrypted_credentials.len()))
            .field("is_primary", &self.is_primary)
            .finish()
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
