// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guarded resource writes
//!
//! Mutations of an existing resource take the same lock key the manager uses
//! for its events, `(id, kind)`, and re-read the resource inside the lock.
//! Each state change commits together with its event.

use crate::error::ServiceError;
use crate::lock::{LockFactory, LockGuard};
use evr_core::{EventType, NewEvent, Resource};
use evr_storage::{Store, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How writers wait for the resource lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockMode {
    /// Wait for the lock
    #[default]
    Blocking,
    /// Fail with [`ServiceError::Conflict`] when the lock is held
    NonBlocking,
    /// No locking; lost updates become possible
    Disabled,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LockMode::Blocking => "blocking",
            LockMode::NonBlocking => "non-blocking",
            LockMode::Disabled => "disabled",
        })
    }
}

impl FromStr for LockMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blocking" => Ok(LockMode::Blocking),
            "non-blocking" | "nonblocking" => Ok(LockMode::NonBlocking),
            "disabled" | "off" => Ok(LockMode::Disabled),
            other => Err(format!("unknown lock mode: {other}")),
        }
    }
}

#[derive(Clone)]
pub struct ResourceService<S, L> {
    store: S,
    locks: L,
    mode: LockMode,
}

impl<S: Store, L: LockFactory> ResourceService<S, L> {
    pub fn new(store: S, locks: L) -> Self {
        Self {
            store,
            locks,
            mode: LockMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: LockMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Create a resource with a fresh id and emit a Create event
    pub fn create(&self, kind: &str, spec: serde_json::Value) -> Result<Resource, ServiceError> {
        let resource = Resource::new(self.store.next_id(), kind, spec, self.store.now());
        self.store.commit(
            Transaction::new()
                .put_resource(resource.clone())
                .append_event(NewEvent::new(kind, &resource.id, EventType::Create)),
        )?;
        tracing::info!(kind, id = %resource.id, "resource created");
        Ok(resource)
    }

    /// Replace the spec of a resource.
    ///
    /// An unchanged spec returns the stored resource and emits nothing.
    /// Otherwise the new state and an Update event commit atomically.
    pub async fn replace(
        &self,
        kind: &str,
        id: &str,
        desired: serde_json::Value,
    ) -> Result<Resource, ServiceError> {
        let _guard = self.guard(kind, id).await?;

        let current = self.get(kind, id)?;
        if current.spec == desired {
            tracing::debug!(kind, id, "replace is a no-op");
            return Ok(current);
        }

        let updated = current.with_spec(desired, self.store.now());
        self.store.commit(
            Transaction::new()
                .put_resource(updated.clone())
                .append_event(NewEvent::new(kind, id, EventType::Update)),
        )?;
        tracing::info!(kind, id, "resource replaced");
        Ok(updated)
    }

    /// Soft-delete a resource and emit a Delete event
    pub async fn delete(&self, kind: &str, id: &str) -> Result<(), ServiceError> {
        let _guard = self.guard(kind, id).await?;

        self.store.commit(
            Transaction::new()
                .delete_resource(kind, id)
                .append_event(NewEvent::new(kind, id, EventType::Delete)),
        )?;
        tracing::info!(kind, id, "resource deleted");
        Ok(())
    }

    pub fn get(&self, kind: &str, id: &str) -> Result<Resource, ServiceError> {
        self.store
            .get_resource(kind, id)?
            .ok_or_else(|| ServiceError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            })
    }

    pub fn list(&self, kind: &str) -> Result<Vec<Resource>, ServiceError> {
        Ok(self.store.list_resources(kind)?)
    }

    async fn guard(&self, kind: &str, id: &str) -> Result<Option<LockGuard<L>>, ServiceError> {
        match self.mode {
            LockMode::Disabled => Ok(None),
            LockMode::Blocking => Ok(Some(self.locks.lock(id, kind).await?)),
            LockMode::NonBlocking => match self.locks.try_lock(id, kind).await? {
                Some(guard) => Ok(Some(guard)),
                None => {
                    tracing::debug!(kind, id, "resource locked, rejecting write");
                    Err(ServiceError::Conflict {
                        kind: kind.to_string(),
                        id: id.to_string(),
                    })
                }
            },
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
