// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action entity: a single unit of work inside a job.
//!
//! Externally an action is `action_type` plus two free-form maps
//! (`action_parameters`, `action_config`). Internally the known types are a
//! tagged sum, with a raw-map fallback so unknown types survive a round trip.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// `action_parameters` key holding the command string of a `command` action.
pub const COMMAND_KEY: &str = "command";
/// `action_config` key gating stdout/stderr capture. Defaults to true.
pub const CAPTURE_OUTPUT_KEY: &str = "captureOutput";

/// The typed contents of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    /// A shell-style command run on the target.
    Command { command: String, capture_output: bool },
    /// Forward-compatible fallback: an action type this build does not know,
    /// carried as the raw maps it arrived with.
    Other {
        action_type: String,
        parameters: IndexMap<String, Value>,
        config: IndexMap<String, Value>,
    },
}

impl ActionKind {
    /// Build from the external `(action_type, parameters, config)` shape.
    ///
    /// A `command` action must carry a non-empty `command` parameter; anything
    /// else is preserved as [`ActionKind::Other`].
    pub fn from_parts(
        action_type: &str,
        parameters: IndexMap<String, Value>,
        config: IndexMap<String, Value>,
    ) -> Result<Self, String> {
        if action_type == "command" {
            let command = parameters
                .get(COMMAND_KEY)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    format!("command action requires a non-empty '{COMMAND_KEY}' parameter")
                })?;
            let capture_output =
                config.get(CAPTURE_OUTPUT_KEY).and_then(Value::as_bool).unwrap_or(true);
            Ok(ActionKind::Command { command, capture_output })
        } else {
            Ok(ActionKind::Other { action_type: action_type.to_owned(), parameters, config })
        }
    }

    pub fn action_type(&self) -> &str {
        match self {
            ActionKind::Command { .. } => "command",
            ActionKind::Other { action_type, .. } => action_type,
        }
    }

    /// The command string, for kinds that carry one.
    pub fn command(&self) -> Option<&str> {
        match self {
            ActionKind::Command { command, .. } => Some(command),
            ActionKind::Other { .. } => None,
        }
    }

    /// Whether stdout/stderr should be recorded on the result. Errors are
    /// recorded regardless.
    pub fn capture_output(&self) -> bool {
        match self {
            ActionKind::Command { capture_output, .. } => *capture_output,
            ActionKind::Other { config, .. } => {
                config.get(CAPTURE_OUTPUT_KEY).and_then(Value::as_bool).unwrap_or(true)
            }
        }
    }

    fn to_raw(&self) -> RawActionKind {
        match self {
            ActionKind::Command { command, capture_output } => {
                let mut parameters = IndexMap::new();
                parameters.insert(COMMAND_KEY.to_owned(), Value::String(command.clone()));
                let mut config = IndexMap::new();
                if !capture_output {
                    config.insert(CAPTURE_OUTPUT_KEY.to_owned(), Value::Bool(false));
                }
                RawActionKind { action_type: "command".to_owned(), parameters, config }
            }
            ActionKind::Other { action_type, parameters, config } => RawActionKind {
                action_type: action_type.clone(),
                parameters: parameters.clone(),
                config: config.clone(),
            },
        }
    }
}

/// The external wire shape of an action's typed contents.
#[derive(Serialize, Deserialize)]
struct RawActionKind {
    action_type: String,
    #[serde(default)]
    parameters: IndexMap<String, Value>,
    #[serde(default)]
    config: IndexMap<String, Value>,
}

impl Serialize for ActionKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_raw().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawActionKind::deserialize(deserializer)?;
        ActionKind::from_parts(&raw.action_type, raw.parameters, raw.config)
            .map_err(serde::de::Error::custom)
    }
}

/// An action row owned by exactly one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: i64,
    pub uuid: Uuid,
    pub job_id: i64,
    /// 1-based, dense, unique within the job.
    pub action_order: u32,
    pub name: String,
    #[serde(flatten)]
    pub kind: ActionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied action definition inside a [`crate::JobSpec`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    #[serde(default = "default_action_type")]
    pub action_type: String,
    pub action_name: String,
    #[serde(default)]
    pub action_parameters: IndexMap<String, Value>,
    #[serde(default)]
    pub action_config: IndexMap<String, Value>,
}

fn default_action_type() -> String {
    "command".to_owned()
}

impl ActionSpec {
    /// A `command` action.
    pub fn command(name: impl Into<String>, command: impl Into<String>) -> Self {
        let mut action_parameters = IndexMap::new();
        action_parameters.insert(COMMAND_KEY.to_owned(), Value::String(command.into()));
        Self {
            action_type: default_action_type(),
            action_name: name.into(),
            action_parameters,
            action_config: IndexMap::new(),
        }
    }

    /// Disable stdout/stderr capture for this action.
    pub fn without_output_capture(mut self) -> Self {
        self.action_config.insert(CAPTURE_OUTPUT_KEY.to_owned(), Value::Bool(false));
        self
    }

    /// Validate and convert to the typed sum.
    pub fn to_kind(&self) -> Result<ActionKind, String> {
        ActionKind::from_parts(
            &self.action_type,
            self.action_parameters.clone(),
            self.action_config.clone(),
        )
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
