// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use crate::lock::LockError;
use evr_storage::StoreError;
use thiserror::Error;

/// Errors that abort a whole dispatch pass.
///
/// Handler failures never show up here; they are logged and the event stays
/// pending.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("lock error: {0}")]
    Lock(#[from] LockError),
}

/// Errors returned by the guarded resource service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },
    /// Another writer holds the resource lock (non-blocking mode only)
    #[error("{kind} {id} is locked by another writer")]
    Conflict { kind: String, id: String },
    #[error("advisory lock failed: {0}")]
    Lock(#[from] LockError),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => ServiceError::NotFound { kind, id },
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    /// True for lock contention in non-blocking mode
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict { .. })
    }
}
