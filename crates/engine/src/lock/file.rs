// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process locks backed by `flock`-style file locks
//!
//! Each key maps to `<dir>/<digest>.lock`. The OS drops the lock when the
//! holding process exits, so a crashed holder never wedges a key. Lock files
//! are left in place after release.

use super::{LockError, LockFactory};
use async_trait::async_trait;
use evr_core::{IdGen, LockKey, OwnerId, UuidIdGen};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const POLL_MIN: Duration = Duration::from_millis(5);
const POLL_MAX: Duration = Duration::from_millis(100);

struct Held {
    key: LockKey,
    file: File,
}

#[derive(Clone)]
pub struct FileLockFactory {
    dir: PathBuf,
    held: Arc<Mutex<HashMap<OwnerId, Held>>>,
    owner_ids: UuidIdGen,
}

impl FileLockFactory {
    /// Use `dir` for lock files, creating it if needed
    pub fn open(dir: &Path) -> Result<Self, LockError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            held: Arc::new(Mutex::new(HashMap::new())),
            owner_ids: UuidIdGen,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &LockKey) -> PathBuf {
        self.dir.join(format!("{}.lock", key.digest()))
    }

    fn try_acquire(&self, key: &LockKey) -> Result<Option<OwnerId>, LockError> {
        let path = self.path_for(key);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| LockError::Unavailable(format!("{}: {}", path.display(), e)))?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => return Ok(None),
            Err(e) => return Err(LockError::Io(e)),
        }

        let owner = OwnerId::new(self.owner_ids.next());
        self.held.lock().unwrap_or_else(|e| e.into_inner()).insert(
            owner.clone(),
            Held {
                key: key.clone(),
                file,
            },
        );
        Ok(Some(owner))
    }
}

#[async_trait]
impl LockFactory for FileLockFactory {
    async fn acquire_blocking(
        &self,
        resource_id: &str,
        lock_type: &str,
    ) -> Result<OwnerId, LockError> {
        let key = LockKey::new(resource_id, lock_type);
        let mut delay = POLL_MIN;
        loop {
            if let Some(owner) = self.try_acquire(&key)? {
                return Ok(owner);
            }
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(POLL_MAX);
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
        let held = self
            .held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(owner);
        match held {
            Some(held) => {
                if let Err(e) = held.file.unlock() {
                    // Closing the file below drops the lock anyway
                    tracing::warn!(key = %held.key, error = %e, "unlock failed");
                }
                true
            }
            None => false,
        }
    }

    fn outstanding(&self) -> usize {
        self.held.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
