// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing wrapper for any lock factory

use super::{LockError, LockFactory};
use async_trait::async_trait;
use evr_core::OwnerId;
use tracing::Instrument;

/// Wrapper that logs acquisition latency and outcomes
#[derive(Clone)]
pub struct TracedLockFactory<L> {
    inner: L,
}

impl<L> TracedLockFactory<L> {
    pub fn new(inner: L) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LockFactory> LockFactory for TracedLockFactory<L> {
    async fn acquire_blocking(
        &self,
        resource_id: &str,
        lock_type: &str,
    ) -> Result<OwnerId, LockError> {
        let span = tracing::info_span!("lock.acquire", resource_id, lock_type, blocking = true);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.acquire_blocking(resource_id, lock_type).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(owner) => tracing::debug!(owner = %owner, elapsed_ms, "acquired"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "acquire failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn acquire_non_blocking(
        &self,
        resource_id: &str,
        lock_type: &str,
    ) -> Result<Option<OwnerId>, LockError> {
        let span = tracing::info_span!("lock.acquire", resource_id, lock_type, blocking = false);
        async {
            let result = self.inner.acquire_non_blocking(resource_id, lock_type).await;
            match &result {
                Ok(Some(owner)) => tracing::debug!(owner = %owner, "acquired"),
                Ok(None) => tracing::debug!("contended"),
                Err(e) => tracing::error!(error = %e, "acquire failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn release(&self, owner: &OwnerId) -> bool {
        let released = self.inner.release(owner);
        if released {
            tracing::debug!(owner = %owner, "lock released");
        } else {
            tracing::warn!(owner = %owner, "release of unknown owner");
        }
        released
    }

    fn outstanding(&self) -> usize {
        self.inner.outstanding()
    }
}
