// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller registration
//!
//! A controller binds handler chains to one event source. Chains are looked
//! up by `(source, event type)` and run in registration order. The registry is
//! built once at startup and shared read-only between managers.

use async_trait::async_trait;
use evr_core::{Event, EventType};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// What a handler sees while its event is claimed
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// The event as re-read under the resource lock
    pub event: Event,
    /// Name of the manager running the chain
    pub manager: String,
}

/// Business failure reported by a handler. The event stays pending.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A reconciliation step for one resource.
///
/// Handlers may run more than once for the same event (after a failure or a
/// crash before the event was marked), so they must be idempotent.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &HandlerContext, resource_id: &str) -> Result<(), HandlerError>;
}

/// Adapts an async closure into a [`Handler`]
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(HandlerContext, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, ctx: &HandlerContext, resource_id: &str) -> Result<(), HandlerError> {
        (self.f)(ctx.clone(), resource_id.to_string()).await
    }
}

/// Wrap an async closure as a shareable handler
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(HandlerContext, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

type Chains = HashMap<EventType, Vec<Arc<dyn Handler>>>;

/// Handler chains for one source
pub struct ControllerConfig {
    source: String,
    chains: Chains,
}

impl ControllerConfig {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            chains: HashMap::new(),
        }
    }

    /// Append `handler` to the chain for `event_type`
    pub fn on(mut self, event_type: EventType, handler: Arc<dyn Handler>) -> Self {
        self.chains.entry(event_type).or_default().push(handler);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Immutable table of `source -> event type -> handler chain`
#[derive(Default)]
pub struct ControllerRegistry {
    sources: HashMap<String, Chains>,
}

impl ControllerRegistry {
    pub fn builder() -> ControllerRegistryBuilder {
        ControllerRegistryBuilder::default()
    }

    /// Registered sources, sorted
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        sources.sort_unstable();
        sources
    }

    /// Handlers for `(source, event_type)`; empty when nothing is registered
    pub fn chain(&self, source: &str, event_type: EventType) -> &[Arc<dyn Handler>] {
        self.sources
            .get(source)
            .and_then(|chains| chains.get(&event_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for source in self.sources() {
            let counts: Vec<(EventType, usize)> = EventType::ALL
                .iter()
                .map(|t| (*t, self.chain(source, *t).len()))
                .filter(|(_, n)| *n > 0)
                .collect();
            map.entry(&source, &counts);
        }
        map.finish()
    }
}

#[derive(Default)]
pub struct ControllerRegistryBuilder {
    sources: HashMap<String, Chains>,
}

impl ControllerRegistryBuilder {
    /// Add a controller. Registering the same source twice appends to its
    /// existing chains.
    pub fn register(mut self, config: ControllerConfig) -> Self {
        let chains = self.sources.entry(config.source).or_default();
        for (event_type, handlers) in config.chains {
            chains.entry(event_type).or_default().extend(handlers);
        }
        self
    }

    pub fn build(self) -> ControllerRegistry {
        ControllerRegistry {
            sources: self.sources,
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
