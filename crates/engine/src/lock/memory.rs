// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lock table

use super::{LockError, LockFactory};
use async_trait::async_trait;
use evr_core::{IdGen, LockKey, OwnerId, SequentialIdGen};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct Table {
    held: HashMap<LockKey, OwnerId>,
    owners: HashMap<OwnerId, LockKey>,
}

struct Shared {
    table: Mutex<Table>,
    /// Woken on every release so blocked acquirers retry
    released: Notify,
    available: AtomicBool,
    owner_ids: SequentialIdGen,
}

/// Lock factory shared by every clone; locks are scoped to this process
#[derive(Clone)]
pub struct MemoryLockFactory {
    shared: Arc<Shared>,
}

impl MemoryLockFactory {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                table: Mutex::new(Table::default()),
                released: Notify::new(),
                available: AtomicBool::new(true),
                owner_ids: SequentialIdGen::new("owner"),
            }),
        }
    }

    /// Simulate backend loss; acquisitions fail with `Unavailable`
    pub fn set_available(&self, available: bool) {
        self.shared.available.store(available, Ordering::SeqCst);
    }

    /// Current owner of a key, if any
    pub fn holder(&self, resource_id: &str, lock_type: &str) -> Option<OwnerId> {
        let table = self.shared.table.lock().unwrap_or_else(|e| e.into_inner());
        table.held.get(&LockKey::new(resource_id, lock_type)).cloned()
    }

    fn try_acquire(&self, key: &LockKey) -> Result<Option<OwnerId>, LockError> {
        if !self.shared.available.load(Ordering::SeqCst) {
            return Err(LockError::Unavailable("memory lock table offline".to_string()));
        }

        let mut table = self.shared.table.lock().unwrap_or_else(|e| e.into_inner());
        if table.held.contains_key(key) {
            return Ok(None);
        }

        let owner = OwnerId::new(self.shared.owner_ids.next());
        table.held.insert(key.clone(), owner.clone());
        table.owners.insert(owner.clone(), key.clone());
        Ok(Some(owner))
    }
}

impl Default for MemoryLockFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockFactory for MemoryLockFactory {
    async fn acquire_blocking(
        &self,
        resource_id: &str,
        lock_type: &str,
    ) -> Result<OwnerId, LockError> {
        let key = LockKey::new(resource_id, lock_type);
        loop {
            // Register interest before checking so a release in between is not missed
            let notified = self.shared.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(owner) = self.try_acquire(&key)? {
                return Ok(owner);
            }
            notified.await;
        }
    }

    async fn acquire_non_blocking(
        &self,
        resource_id: &str,
        lock_type: &str,
    ) -> Result<Option<OwnerId>, LockError> {
        self.try_acquire(&LockKey::new(resource_id, lock_type))
    }

    fn release(&self, owner: &OwnerId) -> bool {
        let released = {
            let mut table = self.shared.table.lock().unwrap_or_else(|e| e.into_inner());
            match table.owners.remove(owner) {
                Some(key) => {
                    table.held.remove(&key);
                    true
                }
                None => false,
            }
        };
        if released {
            self.shared.released.notify_waiters();
        }
        released
    }

    fn outstanding(&self) -> usize {
        self.shared
            .table
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .owners
            .len()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
