// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change notifier: best-effort wake signals on named channels
//!
//! A wake carries no payload. Receivers re-query the store after waking, so
//! coalesced or missed notifications only cost latency, never correctness.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

/// Channel the stores publish on whenever events are appended
pub const EVENTS_CHANNEL: &str = "events";

/// A "something changed" signal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wake {
    /// Number of publishes seen on the channel so far
    pub seq: u64,
}

/// Publish/subscribe hub for wake signals
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    channels: Arc<RwLock<HashMap<String, watch::Sender<u64>>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a channel. Only publishes after this call are observed.
    pub fn subscribe(&self, channel: &str) -> WakeSubscription {
        {
            let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
            if let Some(tx) = channels.get(channel) {
                return WakeSubscription { rx: tx.subscribe() };
            }
        }

        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let tx = channels
            .entry(channel.to_string())
            .or_insert_with(|| watch::channel(0).0);
        WakeSubscription { rx: tx.subscribe() }
    }

    /// Wake every subscriber of `channel`
    pub fn publish(&self, channel: &str) {
        {
            let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
            if let Some(tx) = channels.get(channel) {
                tx.send_modify(|seq| *seq = seq.wrapping_add(1));
                tracing::trace!(channel, subscribers = tx.receiver_count(), "published");
                return;
            }
        }

        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let tx = channels
            .entry(channel.to_string())
            .or_insert_with(|| watch::channel(0).0);
        tx.send_modify(|seq| *seq = seq.wrapping_add(1));
    }

    /// Number of live subscriptions on a channel
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(channel)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("ChangeNotifier")
            .field("channels", &channels.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Infinite sequence of wake signals for one channel
pub struct WakeSubscription {
    rx: watch::Receiver<u64>,
}

impl WakeSubscription {
    /// Wait for the next wake. Several publishes since the last call
    /// collapse into one wake. Returns `None` once the notifier is gone.
    pub async fn recv(&mut self) -> Option<Wake> {
        self.rx.changed().await.ok()?;
        let seq = *self.rx.borrow_and_update();
        Some(Wake { seq })
    }

    /// Whether a publish happened since the last receive
    pub fn has_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
