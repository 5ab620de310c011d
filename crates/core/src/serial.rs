// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The serial scheme: dotted, human-readable, permanent identifiers.
//!
//! Serials are paths rooted at the job: a job is `J-000042`, its seventh
//! execution `J-000042.E-007`, that execution's first branch
//! `J-000042.E-007.001`, and the branch's third action result
//! `J-000042.E-007.001.A-003`. Counters are allocated by the store and are
//! strictly increasing within their parent scope; formatting widths saturate,
//! so a job number past six digits stays parseable (`J-1234567`).

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Zero-padded width of the job sequence number.
pub const JOB_WIDTH: usize = 6;
/// Zero-padded width of the execution sequence number.
pub const EXECUTION_WIDTH: usize = 3;
/// Zero-padded width of the branch index.
pub const BRANCH_WIDTH: usize = 3;
/// Zero-padded width of the action result sequence number.
pub const ACTION_WIDTH: usize = 3;

/// The entity kinds that own a serial counter scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialKind {
    Job,
    Execution,
    Branch,
    ActionResult,
}

crate::simple_display! {
    SerialKind {
        Job => "job",
        Execution => "execution",
        Branch => "branch",
        ActionResult => "action_result",
    }
}

/// A public, permanent, hierarchical identifier.
///
/// Opaque-but-stable for callers; the only structure the engine itself relies
/// on is the parent prefix (everything before the last `.`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Serial(SmolStr);

impl Serial {
    /// Serial of the k-th job: `J-000042`.
    pub fn job(n: u32) -> Self {
        Self(smol_str::format_smolstr!("J-{:0width$}", n, width = JOB_WIDTH))
    }

    /// Serial of a job's n-th execution: `J-000042.E-007`.
    pub fn execution(job: &Serial, n: u32) -> Self {
        Self(smol_str::format_smolstr!("{}.E-{:0width$}", job, n, width = EXECUTION_WIDTH))
    }

    /// Serial of an execution's branch at 1-based `index`: `J-000042.E-007.003`.
    pub fn branch(execution: &Serial, index: u32) -> Self {
        Self(smol_str::format_smolstr!("{}.{:0width$}", execution, index, width = BRANCH_WIDTH))
    }

    /// Serial of a branch's n-th action result: `J-000042.E-007.003.A-001`.
    pub fn action_result(branch: &Serial, n: u32) -> Self {
        Self(smol_str::format_smolstr!("{}.A-{:0width$}", branch, n, width = ACTION_WIDTH))
    }

    /// Wrap an existing serial string (parsing/deserialization).
    pub fn from_string(s: impl AsRef<str>) -> Self {
        Self(SmolStr::new(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The serial of the owning entity, if any (`J-000042.E-007` → `J-000042`).
    pub fn parent(&self) -> Option<Serial> {
        let (parent, _) = self.0.rsplit_once('.')?;
        Some(Self(SmolStr::new(parent)))
    }

    /// The last path segment (`J-000042.E-007.003` → `003`).
    pub fn leaf(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, leaf)| leaf)
    }
}

/// The zero-padded branch index string stored on a branch (`001`, `002`, …).
pub fn branch_index(index: u32) -> SmolStr {
    smol_str::format_smolstr!("{:0width$}", index, width = BRANCH_WIDTH)
}

impl std::fmt::Display for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for Serial {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl std::ops::Deref for Serial {
    type Target = str;

    fn deref(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq<str> for Serial {
    fn eq(&self, other: &str) -> bool {
        self.0.as_str() == other
    }
}

impl PartialEq<&str> for Serial {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_str() == *other
    }
}

impl From<&str> for Serial {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl From<String> for Serial {
    fn from(s: String) -> Self {
        Self(SmolStr::new(s))
    }
}

#[cfg(test)]
#[path = "serial_tests.rs"]
mod tests;
