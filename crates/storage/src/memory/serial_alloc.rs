// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-scope serial counters.
//!
//! A scope is `(entity kind, parent serial)`; the job scope uses the empty
//! root serial. Counters only ever move forward, so sequence numbers are
//! never reused even when earlier children are hard-deleted.

use crate::error::StoreError;
use muster_core::{Serial, SerialKind};
use std::collections::HashMap;

/// Practical cap for a sequence number within one scope.
const MAX_SEQUENCE: u32 = i32::MAX as u32;

#[derive(Default)]
pub(crate) struct SerialAllocator {
    counters: HashMap<(SerialKind, Serial), u32>,
}

impl SerialAllocator {
    /// The parent scope of job serials.
    pub(crate) fn root() -> Serial {
        Serial::from_string("")
    }

    /// Increment and return the next sequence number for the scope.
    pub(crate) fn next(&mut self, kind: SerialKind, parent: &Serial) -> Result<u32, StoreError> {
        let counter = self.counters.entry((kind, parent.clone())).or_insert(0);
        if *counter >= MAX_SEQUENCE {
            return Err(StoreError::SerialExhausted(format!("{kind}:{parent}")));
        }
        *counter += 1;
        Ok(*counter)
    }

    /// Pin a scope's counter to at least `floor` (tests only).
    #[cfg(test)]
    pub(crate) fn pin(&mut self, kind: SerialKind, parent: &Serial, floor: u32) {
        let counter = self.counters.entry((kind, parent.clone())).or_insert(0);
        *counter = (*counter).max(floor);
    }
}

#[cfg(test)]
#[path = "serial_alloc_tests.rs"]
mod tests;
