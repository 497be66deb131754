// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory locks
//!
//! A lock is identified by `(lock_type, resource_id)`. At most one owner holds
//! a given key at a time across everything sharing the backend. Callers
//! normally go through [`LockFactory::lock`] / [`LockFactory::try_lock`],
//! which hand back a [`LockGuard`] that releases on every exit path.

mod file;
mod memory;
mod traced;

pub use file::FileLockFactory;
pub use memory::MemoryLockFactory;
pub use traced::TracedLockFactory;

use async_trait::async_trait;
use evr_core::{LockKey, OwnerId};
use thiserror::Error;

/// Errors from the lock backend. Contention is not an error.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock backend unavailable: {0}")]
    Unavailable(String),
    #[error("lock I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Factory for session-scoped exclusive locks
#[async_trait]
pub trait LockFactory: Clone + Send + Sync + 'static {
    /// Wait until the lock is granted. No timeout is imposed; dropping the
    /// future gives up the wait without leaving the lock held.
    async fn acquire_blocking(&self, resource_id: &str, lock_type: &str)
        -> Result<OwnerId, LockError>;

    /// Try once. `Ok(None)` means someone else holds the lock.
    async fn acquire_non_blocking(
        &self,
        resource_id: &str,
        lock_type: &str,
    ) -> Result<Option<OwnerId>, LockError>;

    /// Release a lock. Returns false if `owner` holds nothing.
    fn release(&self, owner: &OwnerId) -> bool;

    /// Number of locks currently held through this factory
    fn outstanding(&self) -> usize;

    /// Acquire (blocking) and wrap the owner in a guard
    async fn lock(&self, resource_id: &str, lock_type: &str) -> Result<LockGuard<Self>, LockError>
    where
        Self: Sized,
    {
        let owner = self.acquire_blocking(resource_id, lock_type).await?;
        Ok(LockGuard::new(
            self.clone(),
            owner,
            LockKey::new(resource_id, lock_type),
        ))
    }

    /// Acquire (non-blocking) and wrap the owner in a guard
    async fn try_lock(
        &self,
        resource_id: &str,
        lock_type: &str,
    ) -> Result<Option<LockGuard<Self>>, LockError>
    where
        Self: Sized,
    {
        let owner = self.acquire_non_blocking(resource_id, lock_type).await?;
        Ok(owner.map(|owner| LockGuard::new(self.clone(), owner, LockKey::new(resource_id, lock_type))))
    }
}

/// Holds an acquired lock and releases it when dropped, including during
/// unwinding.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<L: LockFactory> {
    factory: L,
    owner: Option<OwnerId>,
    key: LockKey,
}

impl<L: LockFactory> LockGuard<L> {
    pub fn new(factory: L, owner: OwnerId, key: LockKey) -> Self {
        Self {
            factory,
            owner: Some(owner),
            key,
        }
    }

    pub fn key(&self) -> &LockKey {
        &self.key
    }

    pub fn owner(&self) -> Option<&OwnerId> {
        self.owner.as_ref()
    }

    /// Release now instead of at end of scope
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(owner) = self.owner.take() {
            if !self.factory.release(&owner) {
                tracing::warn!(key = %self.key, owner = %owner, "lock was not held at release");
            }
        }
    }
}

impl<L: LockFactory> Drop for LockGuard<L> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl<L: LockFactory> std::fmt::Debug for LockGuard<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("key", &self.key)
            .field("owner", &self.owner)
            .finish()
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
