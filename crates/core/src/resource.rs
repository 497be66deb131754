// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guarded domain resources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A domain record whose mutations are recorded as events.
///
/// `kind` is the stable tag chosen by the domain (e.g. `"Widgets"`). It is
/// used as the event source and as the advisory lock namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub kind: String,
    pub spec: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Resource {
    pub fn new(
        id: impl Into<String>,
        kind: impl Into<String>,
        spec: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            spec,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Copy of this resource carrying a new spec
    pub fn with_spec(&self, spec: serde_json::Value, now: DateTime<Utc>) -> Self {
        Self {
            spec,
            updated_at: now,
            ..self.clone()
        }
    }
}
