// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed store over a shared write-ahead log
//!
//! Every process that opens the same directory sees one coherent log: reads
//! tail the WAL before answering, and writes catch up under the WAL's
//! exclusive lock before appending.
//!
//! Whenever a handle catches up on events appended by someone else it
//! publishes on [`EVENTS_CHANNEL`], and [`FileStore::watch`] makes that happen
//! as soon as the WAL file changes on disk.

use crate::wal::Wal;
use crate::{MaterializedState, Store, StoreError};
use chrono::{DateTime, Utc};
use evr_core::{ChangeNotifier, Clock, IdGen, Operation, SystemClock, UuidIdGen, EVENTS_CHANNEL};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Name of the log file inside the store directory
pub const WAL_FILE: &str = "events.wal";

struct Inner {
    wal: Wal,
    state: MaterializedState,
}

impl Inner {
    /// Apply entries written by other handles. Returns how many events they appended.
    fn catch_up(&mut self) -> Result<usize, StoreError> {
        let mut appended = 0;
        for entry in self.wal.read_new()? {
            for op in &entry.ops {
                if matches!(op, Operation::EventAppend { .. }) {
                    appended += 1;
                }
                self.state.apply(op);
            }
        }
        Ok(appended)
    }

    /// Catch up, waking listeners if foreign events showed up
    fn catch_up_and_publish(&mut self, notifier: &ChangeNotifier) -> Result<(), StoreError> {
        let appended = self.catch_up()?;
        if appended > 0 {
            tracing::debug!(appended, seq = self.wal.sequence(), "caught up on foreign events");
            notifier.publish(EVENTS_CHANNEL);
        }
        Ok(())
    }
}

/// Keeps a [`FileStore`] watching its WAL; dropping it stops the watch
pub struct WalWatcher {
    _watcher: RecommendedWatcher,
}

impl std::fmt::Debug for WalWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalWatcher").finish_non_exhaustive()
    }
}

/// Durable store rooted at a directory
#[derive(Clone)]
pub struct FileStore<C: Clock = SystemClock, I: IdGen = UuidIdGen> {
    dir: PathBuf,
    inner: Arc<Mutex<Inner>>,
    notifier: ChangeNotifier,
    clock: C,
    ids: I,
}

impl FileStore {
    /// Open or create a store in `dir`
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        Self::open_with(dir, SystemClock, UuidIdGen)
    }
}

impl<C: Clock, I: IdGen> FileStore<C, I> {
    pub fn open_with(dir: &Path, clock: C, ids: I) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(crate::WalError::from)?;
        let mut inner = Inner {
            wal: Wal::open(&dir.join(WAL_FILE))?,
            state: MaterializedState::default(),
        };
        inner.catch_up()?;

        tracing::debug!(
            dir = %dir.display(),
            sequence = inner.wal.sequence(),
            events = inner.state.events().len(),
            "opened file store"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            inner: Arc::new(Mutex::new(inner)),
            notifier: ChangeNotifier::new(),
            clock,
            ids,
        })
    }

    /// Publish through the given notifier instead of a private one
    pub fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Watch the WAL for appends made through other handles or processes.
    ///
    /// Each change is caught up immediately and wakes this store's
    /// subscribers if it contained events. Call after [`Self::with_notifier`].
    pub fn watch(&self) -> Result<WalWatcher, StoreError> {
        let inner = Arc::clone(&self.inner);
        let notifier = self.notifier.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                    if let Err(e) = inner.catch_up_and_publish(&notifier) {
                        tracing::warn!(error = %e, "failed to catch up after WAL change");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "WAL watch error"),
            }
        })?;

        let path = self.dir.join(WAL_FILE);
        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %path.display(), "watching WAL");

        Ok(WalWatcher { _watcher: watcher })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Last WAL sequence applied by this handle
    pub fn sequence(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .wal
            .sequence()
    }
}

impl<C: Clock, I: IdGen> Store for FileStore<C, I> {
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
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let _wal_lock = inner.wal.lock()?;
        inner.catch_up_and_publish(&self.notifier)?;

        let (ops, result) = f(&inner.state)?;
        if ops.is_empty() {
            return Ok(result);
        }

        let entry = inner.wal.append(ops)?;
        for op in &entry.ops {
            inner.state.apply(op);
        }
        tracing::trace!(
            seq = entry.seq,
            ops = ?entry.ops.iter().map(Operation::name).collect::<Vec<_>>(),
            "committed"
        );
        Ok(result)
    }

    fn read<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> Result<R, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.catch_up_and_publish(&self.notifier)?;
        Ok(f(&inner.state))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
