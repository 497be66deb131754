// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use evr_core::{paths, EVENTS_CHANNEL};
use evr_engine::{
    shutdown_channel, ControllerManager, FileLockFactory, LockError, LockFactory, ManagerConfig,
    TracedLockFactory,
};
use evr_storage::{FileStore, Store, StoreError, WalWatcher};
use fs2::FileExt;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::controllers;

/// Name of the optional settings file inside the state directory
pub const SETTINGS_FILE: &str = "evrd.toml";

/// Lock factory used by the daemon (wrapped with tracing)
pub type DaemonLocks = TracedLockFactory<FileLockFactory>;

/// Tunables read from `evrd.toml`. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Number of manager instances racing over the same store
    pub managers: usize,
    /// Backstop pass interval, e.g. `"30s"`
    #[serde(with = "humantime_serde")]
    pub rescan_interval: Duration,
    /// Used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            managers: 3,
            rescan_interval: Duration::from_secs(30),
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn parse(content: &str) -> Result<Self, LifecycleError> {
        let settings: Settings = toml::from_str(content)?;
        if settings.managers == 0 {
            return Err(LifecycleError::InvalidSettings(
                "managers must be at least 1".to_string(),
            ));
        }
        Ok(settings)
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of all daemon state
    pub state_dir: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Event store directory (shared with the CLI)
    pub data_dir: PathBuf,
    /// Advisory lock files (shared with the CLI)
    pub locks_dir: PathBuf,
    /// Where the demo widget controller mirrors live widgets
    pub mirror_dir: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Resolve the state directory and load settings.
    ///
    /// Order: explicit argument, `EVR_STATE_DIR`, `XDG_STATE_HOME/evr`,
    /// `~/.local/state/evr`.
    pub fn load(state_dir: Option<PathBuf>) -> Result<Self, LifecycleError> {
        let state_dir = paths::resolve_state_dir(state_dir).ok_or(LifecycleError::NoStateDir)?;
        Self::for_state_dir(&state_dir)
    }

    /// Create config for a state directory, reading `evrd.toml` if present
    pub fn for_state_dir(state_dir: &Path) -> Result<Self, LifecycleError> {
        let settings_path = state_dir.join(SETTINGS_FILE);
        let settings = if settings_path.exists() {
            Settings::parse(&std::fs::read_to_string(&settings_path)?)?
        } else {
            Settings::default()
        };

        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            lock_path: state_dir.join("evrd.pid"),
            log_path: state_dir.join("evrd.log"),
            data_dir: state_dir.join(paths::DATA_DIR),
            locks_dir: state_dir.join(paths::LOCKS_DIR),
            mirror_dir: state_dir.join(controllers::MIRROR_DIR),
            settings,
        })
    }
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub store: FileStore,
    // NOTE(lifetime): Wakes managers on appends from other processes
    #[allow(dead_code)]
    wal_watcher: WalWatcher,
    pub locks: DaemonLocks,
    managers: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    /// When daemon started
    pub start_time: Instant,
}

impl DaemonState {
    /// Number of manager tasks still running
    pub fn running_managers(&self) -> usize {
        self.managers.iter().filter(|h| !h.is_finished()).count()
    }

    /// Signal managers, wait for in-flight handlers, then remove the PID file
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        let _ = self.shutdown_tx.send(true);
        for handle in self.managers.drain(..) {
            if let Err(e) = handle.await {
                warn!("Manager task ended abnormally: {}", e);
            }
        }

        let outstanding = self.locks.outstanding();
        if outstanding > 0 {
            warn!(outstanding, "locks still held at shutdown");
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "Daemon shutdown complete"
        );
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Settings parse error: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lock backend error: {0}")]
    Lock(#[from] LockError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            cleanup_on_failure(config, &e);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    let lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Open the shared store and lock namespace
    let store = FileStore::open(&config.data_dir)?;
    let wal_watcher = store.watch()?;
    let locks = TracedLockFactory::new(FileLockFactory::open(&config.locks_dir)?);

    // 4. Report leftovers from previous runs
    let pending = store.list_unreconciled(None)?;
    if !pending.is_empty() {
        warn!(
            "Found {} pending events from previous session, they will be retried",
            pending.len()
        );
    }
    info!(
        "Loaded store: {} events, wal sequence {}",
        store.list_events()?.len(),
        store.sequence()
    );

    // 5. Register controllers and start managers
    let registry = Arc::new(controllers::registry(store.clone(), &config.mirror_dir)?);
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let managers = (0..config.settings.managers)
        .map(|i| {
            let manager = ControllerManager::new(
                ManagerConfig::new(format!("evrd-{i}"))
                    .with_rescan_interval(config.settings.rescan_interval),
                Arc::clone(&registry),
                store.clone(),
                locks.clone(),
            );
            manager.spawn(store.notifier().subscribe(EVENTS_CHANNEL), shutdown_rx.clone())
        })
        .collect();

    info!(
        "Daemon started: {} managers over {}",
        config.settings.managers,
        config.state_dir.display()
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        store,
        wal_watcher,
        locks,
        managers,
        shutdown_tx,
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config, error: &LifecycleError) {
    // Another daemon owns the PID file
    if matches!(error, LifecycleError::LockFailed(_)) {
        return;
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
