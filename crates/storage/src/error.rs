// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store error types

use crate::wal::WalError;
use thiserror::Error;

/// Errors surfaced by event store backends.
///
/// `Unavailable` and `Wal(Io)` are transient by convention; the engine does
/// not retry them itself beyond the next dispatch pass.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("WAL watch failed: {0}")]
    Watch(#[from] notify::Error),
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },
}

impl StoreError {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Whether retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Wal(WalError::Io(_)))
    }
}
