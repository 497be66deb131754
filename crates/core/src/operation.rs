// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations persisted to the write-ahead log

use crate::{Event, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single state change. A commit is a list of operations applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert or overwrite a resource
    ResourcePut { resource: Resource },

    /// Soft-delete a resource
    ResourceDelete {
        kind: String,
        id: String,
        at: DateTime<Utc>,
    },

    /// Append a new event
    EventAppend { event: Event },

    /// Set an event's reconciliation timestamp
    EventReconciled { id: String, at: DateTime<Utc> },
}

impl Operation {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ResourcePut { .. } => "resource:put",
            Operation::ResourceDelete { .. } => "resource:delete",
            Operation::EventAppend { .. } => "event:append",
            Operation::EventReconciled { .. } => "event:reconciled",
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
