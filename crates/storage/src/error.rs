// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store error taxonomy.

use thiserror::Error;

/// Errors surfaced by [`crate::JobStore`] operations.
///
/// `Validation`, `NotFound`, and `StateConflict` are caller errors and leave
/// the store unchanged. `SerialExhausted` and `Internal` indicate the
/// operation could not be carried out at all.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    #[error("conflicting state: {0}")]
    StateConflict(String),
    #[error("serial counter exhausted for scope {0}")]
    SerialExhausted(String),
    #[error("internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, key: impl std::fmt::Display) -> Self {
        StoreError::NotFound { kind, key: key.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
