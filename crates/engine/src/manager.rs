// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller manager
//!
//! Drains pending events. For each one the manager takes the resource lock
//! `(source_id, source)`, re-reads the event, runs the handler chain, and marks
//! the event reconciled only if every handler succeeded. Any number of
//! managers may run against the same store and lock backend; the lock plus the
//! re-read guarantees each successful reconciliation happens once.

use crate::controller::{ControllerRegistry, HandlerContext, HandlerError};
use crate::error::ManagerError;
use crate::lock::LockFactory;
use evr_core::{Event, WakeSubscription};
use evr_storage::Store;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Create the shutdown signal shared by managers. Send `true` to stop them.
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Shows up in logs and in [`HandlerContext::manager`]
    pub name: String,
    /// Backstop pass interval for wakes that were missed
    pub rescan_interval: Duration,
}

impl ManagerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rescan_interval: DEFAULT_RESCAN_INTERVAL,
        }
    }

    pub fn with_rescan_interval(mut self, interval: Duration) -> Self {
        self.rescan_interval = interval;
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new("manager")
    }
}

/// Tally of one dispatch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub reconciled: usize,
    /// Already reconciled by someone else, or nothing registered for it
    pub skipped: usize,
    /// A handler failed or panicked; the event stays pending
    pub failed: usize,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.reconciled + self.skipped + self.failed
    }
}

enum Outcome {
    Reconciled,
    Skipped,
    Failed,
    Interrupted,
}

enum WakeReason {
    Notification(bool),
    Rescan,
    Shutdown,
}

pub struct ControllerManager<S, L> {
    config: ManagerConfig,
    registry: Arc<ControllerRegistry>,
    store: S,
    locks: L,
    /// Failed attempts per event id, for logging only
    attempts: Arc<Mutex<HashMap<String, u32>>>,
}

impl<S: Clone, L: Clone> Clone for ControllerManager<S, L> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            registry: Arc::clone(&self.registry),
            store: self.store.clone(),
            locks: self.locks.clone(),
            attempts: Arc::clone(&self.attempts),
        }
    }
}

impl<S: Store, L: LockFactory> ControllerManager<S, L> {
    pub fn new(config: ManagerConfig, registry: Arc<ControllerRegistry>, store: S, locks: L) -> Self {
        Self {
            config,
            registry,
            store,
            locks,
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locks(&self) -> &L {
        &self.locks
    }

    /// Failed attempts recorded for an event by this manager
    pub fn attempts(&self, event_id: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(event_id)
            .copied()
            .unwrap_or(0)
    }

    /// Event ids with a recorded failure, for leak checks
    pub fn tracked_attempts(&self) -> usize {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Run one pass over every pending event of the registered sources
    pub async fn dispatch_pending(&self) -> Result<DispatchReport, ManagerError> {
        let (_tx, mut shutdown) = shutdown_channel();
        self.dispatch(&mut shutdown).await
    }

    /// One pass that stops claiming new events once `shutdown` fires. An
    /// event whose handlers already started is finished first.
    pub async fn dispatch(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<DispatchReport, ManagerError> {
        let mut report = DispatchReport::default();
        let pending = self.pending_events()?;
        self.prune_attempts(&pending);

        for event in pending {
            if is_shutdown(shutdown) {
                tracing::debug!(manager = %self.config.name, "shutdown observed, pass cut short");
                break;
            }

            match self.process(&event, shutdown).await? {
                Outcome::Reconciled => report.reconciled += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Interrupted => break,
            }
        }

        Ok(report)
    }

    /// Loop until shutdown: an initial pass, then one pass per wake or rescan tick
    pub async fn run(&self, mut wakes: WakeSubscription, mut shutdown: watch::Receiver<bool>) {
        let span = tracing::info_span!("manager", name = %self.config.name);
        async {
            tracing::info!(
                sources = ?self.registry.sources(),
                rescan_secs = self.config.rescan_interval.as_secs(),
                "manager started"
            );

            let mut rescan = tokio::time::interval(self.config.rescan_interval);
            rescan.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            rescan.tick().await;
            let mut notifier_open = true;

            loop {
                if is_shutdown(&shutdown) {
                    break;
                }
                self.pass(&mut shutdown).await;

                let reason = tokio::select! {
                    _ = shutdown_requested(&mut shutdown) => WakeReason::Shutdown,
                    wake = wakes.recv(), if notifier_open => WakeReason::Notification(wake.is_some()),
                    _ = rescan.tick() => WakeReason::Rescan,
                };

                match reason {
                    WakeReason::Shutdown => break,
                    WakeReason::Notification(true) => tracing::trace!("woken by notification"),
                    WakeReason::Notification(false) => {
                        tracing::warn!("notifier closed, falling back to periodic rescans");
                        notifier_open = false;
                    }
                    WakeReason::Rescan => tracing::trace!("periodic rescan"),
                }
            }

            tracing::info!("manager stopped");
        }
        .instrument(span)
        .await
    }

    /// Run [`Self::run`] on a new task
    pub fn spawn(&self, wakes: WakeSubscription, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move { manager.run(wakes, shutdown).await })
    }

    async fn pass(&self, shutdown: &mut watch::Receiver<bool>) {
        let start = std::time::Instant::now();
        match self.dispatch(shutdown).await {
            Ok(report) if report.total() == 0 => {}
            Ok(report) => tracing::info!(
                reconciled = report.reconciled,
                skipped = report.skipped,
                failed = report.failed,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "dispatch pass complete"
            ),
            Err(e) => tracing::error!(error = %e, "dispatch pass failed"),
        }
    }

    fn forget_attempts(&self, event_id: &str) {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(event_id);
    }

    /// Drop counts for events that are no longer pending, e.g. because a
    /// sibling manager reconciled them
    fn prune_attempts(&self, pending: &[Event]) {
        let live: HashSet<&str> = pending.iter().map(|e| e.id.as_str()).collect();
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|id, _| live.contains(id.as_str()));
    }

    fn pending_events(&self) -> Result<Vec<Event>, ManagerError> {
        let mut events = Vec::new();
        for source in self.registry.sources() {
            events.extend(self.store.list_unreconciled(Some(source))?);
        }
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(events)
    }

    async fn process(
        &self,
        event: &Event,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<Outcome, ManagerError> {
        let guard = tokio::select! {
            biased;
            _ = shutdown_requested(shutdown) => return Ok(Outcome::Interrupted),
            guard = self.locks.lock(&event.source_id, &event.source) => guard?,
        };

        // Another manager may have finished it while we waited for the lock
        let current = match self.store.get_event(&event.id)? {
            Some(current) if !current.is_reconciled() => current,
            _ => {
                tracing::debug!(event_id = %event.id, "already reconciled");
                self.forget_attempts(&event.id);
                return Ok(Outcome::Skipped);
            }
        };

        let chain = self.registry.chain(&current.source, current.event_type);
        if chain.is_empty() {
            tracing::debug!(
                event_id = %current.id,
                source = %current.source,
                event_type = %current.event_type,
                "no handlers registered"
            );
            return Ok(Outcome::Skipped);
        }

        let ctx = HandlerContext {
            event: current.clone(),
            manager: self.config.name.clone(),
        };
        let result = AssertUnwindSafe(async {
            for handler in chain {
                handler.handle(&ctx, &current.source_id).await?;
            }
            Ok::<(), HandlerError>(())
        })
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(HandlerError::new(panic_message(panic.as_ref()))));

        let outcome = match result {
            Ok(()) => {
                let marked = self.store.mark_reconciled(&current.id, self.store.now())?;
                self.forget_attempts(&current.id);
                if !marked {
                    // Reconciled by a writer that does not share our lock namespace
                    tracing::warn!(
                        event_id = %current.id,
                        source = %current.source,
                        source_id = %current.source_id,
                        "event was reconciled concurrently"
                    );
                    guard.release();
                    return Ok(Outcome::Skipped);
                }
                tracing::info!(
                    event_id = %current.id,
                    source = %current.source,
                    source_id = %current.source_id,
                    event_type = %current.event_type,
                    "event reconciled"
                );
                Outcome::Reconciled
            }
            Err(e) => {
                let attempt = {
                    let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
                    let count = attempts.entry(current.id.clone()).or_insert(0);
                    *count += 1;
                    *count
                };
                tracing::warn!(
                    event_id = %current.id,
                    source = %current.source,
                    source_id = %current.source_id,
                    event_type = %current.event_type,
                    attempt,
                    error = %e,
                    "handler failed, event left pending"
                );
                Outcome::Failed
            }
        };

        guard.release();
        Ok(outcome)
    }
}

/// True once `true` was sent or the sender is gone
fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("handler panicked: {detail}")
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
