// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use evr_engine::ServiceError;
use evr_storage::{StoreError, WalError};
use std::fmt;

/// Exit code for lock contention in non-blocking mode; the write can be retried
pub const EXIT_CONFLICT: u8 = 2;
/// Exit code for a missing resource
pub const EXIT_NOT_FOUND: u8 = 3;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    pub exit_code: u8,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            exit_code: 1,
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_exit_code(mut self, code: u8) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Another writer holds the resource lock
    pub fn conflict(kind: &str, id: &str) -> Self {
        CliError::new(format!("{} '{}' is locked by another writer", kind, id))
            .with_context("Non-blocking mode rejects writes instead of waiting")
            .with_suggestion("Retry the command")
            .with_suggestion("Wait for the lock instead: --lock-mode blocking")
            .with_exit_code(EXIT_CONFLICT)
    }

    pub fn not_found(kind: &str, id: &str) -> Self {
        CliError::new(format!("{} '{}' not found", kind, id))
            .with_context("The resource may never have existed or was deleted")
            .with_suggestion(format!("List live resources: evr resource list {}", kind))
            .with_exit_code(EXIT_NOT_FOUND)
    }

    pub fn wal_corruption(offset: u64) -> Self {
        CliError::new("WAL checksum mismatch detected")
            .with_context(format!("Corruption detected at byte offset {}", offset))
            .with_context("This may be caused by disk corruption or a foreign writer")
    }
}

impl From<ServiceError> for CliError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Conflict { kind, id } => CliError::conflict(&kind, &id),
            ServiceError::NotFound { kind, id } => CliError::not_found(&kind, &id),
            ServiceError::Store(StoreError::Wal(WalError::Corrupted { offset, reason })) => {
                CliError::wal_corruption(offset).with_context(reason)
            }
            other => CliError::new(other.to_string()).with_source(other),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
