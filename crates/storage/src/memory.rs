// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store shared by every clone of the handle

use crate::{MaterializedState, Store, StoreError};
use chrono::{DateTime, Utc};
use evr_core::{ChangeNotifier, Clock, IdGen, Operation, SystemClock, UuidIdGen};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Volatile store; all clones see the same state
#[derive(Clone)]
pub struct MemoryStore<C: Clock = SystemClock, I: IdGen = UuidIdGen> {
    state: Arc<Mutex<MaterializedState>>,
    available: Arc<AtomicBool>,
    notifier: ChangeNotifier,
    clock: C,
    ids: I,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock_and_ids(SystemClock, UuidIdGen)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock, I: IdGen> MemoryStore<C, I> {
    pub fn with_clock_and_ids(clock: C, ids: I) -> Self {
        Self {
            state: Arc::new(Mutex::new(MaterializedState::default())),
            available: Arc::new(AtomicBool::new(true)),
            notifier: ChangeNotifier::new(),
            clock,
            ids,
        }
    }

    /// Publish through the given notifier instead of a private one
    pub fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Simulate the backend going away; every call fails with `Unavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        }
    }
}

impl<C: Clock, I: IdGen> Store for MemoryStore<C, I> {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn next_id(&self) -> String {
        self.ids.next()
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    fn apply<R>(
        &self,
        f: impl FnOnce(&MaterializedState) -> Result<(Vec<Operation>, R), StoreError>,
    ) -> Result<R, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (ops, result) = f(&state)?;
        for op in &ops {
            state.apply(op);
        }
        Ok(result)
    }

    fn read<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> Result<R, StoreError> {
        self.check_available()?;
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(f(&state))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
