// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.

use muster_storage::StoreError;
use thiserror::Error;

/// Errors surfaced at the engine boundary. Store errors pass through with
/// their taxonomy intact (validation and state conflicts map to client
/// errors at the transport layer, everything else to server errors).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("access denied: user {user_id} cannot modify job {job}")]
    AccessDenied { user_id: String, job: String },
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_not_found())
    }

    pub fn is_state_conflict(&self) -> bool {
        matches!(self, EngineError::Store(StoreError::StateConflict(_)))
    }
}
