// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Location of the shared store and lock directory

use anyhow::{Context, Result};
use evr_core::paths;
use evr_engine::{FileLockFactory, LockMode, ResourceService, TracedLockFactory};
use evr_storage::FileStore;
use std::path::{Path, PathBuf};

pub type CliLocks = TracedLockFactory<FileLockFactory>;

/// Resolved state directory; the layout matches evrd's
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Explicit path (flag or `EVR_STATE_DIR`), then `XDG_STATE_HOME/evr`,
    /// then `~/.local/state/evr`
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let root = paths::resolve_state_dir(explicit)
            .context("cannot determine state directory: set --state-dir or EVR_STATE_DIR")?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn open_store(&self) -> Result<FileStore> {
        let dir = self.root.join(paths::DATA_DIR);
        FileStore::open(&dir).with_context(|| format!("cannot open store in {}", dir.display()))
    }

    pub fn open_locks(&self) -> Result<CliLocks> {
        let dir = self.root.join(paths::LOCKS_DIR);
        let locks = FileLockFactory::open(&dir)
            .with_context(|| format!("cannot open lock directory {}", dir.display()))?;
        Ok(TracedLockFactory::new(locks))
    }

    pub fn service(&self, mode: LockMode) -> Result<ResourceService<FileStore, CliLocks>> {
        Ok(ResourceService::new(self.open_store()?, self.open_locks()?).with_mode(mode))
    }
}
