// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event records describing domain mutations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of mutation an event records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    Create,
    Update,
    Delete,
}

impl EventType {
    pub const ALL: [EventType; 3] = [EventType::Create, EventType::Update, EventType::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Create => "Create",
            EventType::Update => "Update",
            EventType::Delete => "Delete",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(EventType::Create),
            "update" => Ok(EventType::Update),
            "delete" => Ok(EventType::Delete),
            _ => Err(UnknownEventType(s.to_string())),
        }
    }
}

/// An event that has not been persisted yet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEvent {
    pub source: String,
    pub source_id: String,
    pub event_type: EventType,
}

impl NewEvent {
    pub fn new(source: impl Into<String>, source_id: impl Into<String>, event_type: EventType) -> Self {
        Self {
            source: source.into(),
            source_id: source_id.into(),
            event_type,
        }
    }
}

/// Persisted record of a single domain mutation.
///
/// Only `reconciled_at` changes after creation, once, from `None` to a
/// timestamp no earlier than `created_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub source: String,
    pub source_id: String,
    pub event_type: EventType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reconciled_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Materialize a pending event with its assigned id and creation time
    pub fn from_new(id: String, new: NewEvent, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            source: new.source,
            source_id: new.source_id,
            event_type: new.event_type,
            created_at,
            updated_at: created_at,
            deleted_at: None,
            reconciled_at: None,
        }
    }

    pub fn is_reconciled(&self) -> bool {
        self.reconciled_at.is_some()
    }

    /// Mark the event reconciled. Returns false if it already was.
    pub fn reconcile(&mut self, at: DateTime<Utc>) -> bool {
        if self.reconciled_at.is_some() {
            return false;
        }
        let at = at.max(self.created_at);
        self.reconciled_at = Some(at);
        self.updated_at = at;
        true
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
