// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controllers registered by the daemon
//!
//! The demo `Widgets` controller mirrors every live widget to
//! `<mirror_dir>/<id>.json` and removes the file once the widget is deleted.
//! Both handlers converge on the current store state, so re-running them is
//! harmless.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use evr_core::EventType;
use evr_engine::{ControllerConfig, ControllerRegistry, Handler, HandlerContext, HandlerError};
use evr_storage::Store;
use tracing::{debug, info};

pub const WIDGETS: &str = "Widgets";

/// Mirror directory, relative to the state directory
pub const MIRROR_DIR: &str = "widgets";

/// Build the registry shared by every manager in the daemon
pub fn registry<S: Store>(store: S, mirror_dir: &Path) -> io::Result<ControllerRegistry> {
    let mirror = Mirror::new(mirror_dir)?;
    let upsert: Arc<dyn Handler> = Arc::new(UpsertWidget {
        store,
        mirror: mirror.clone(),
    });
    let remove: Arc<dyn Handler> = Arc::new(RemoveWidget { mirror });

    Ok(ControllerRegistry::builder()
        .register(
            ControllerConfig::new(WIDGETS)
                .on(EventType::Create, Arc::clone(&upsert))
                .on(EventType::Update, upsert)
                .on(EventType::Delete, remove),
        )
        .build())
}

#[derive(Clone)]
struct Mirror {
    dir: PathBuf,
}

impl Mirror {
    fn new(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write via a temp file so readers never see a partial document
    fn write(&self, id: &str, body: &[u8]) -> io::Result<()> {
        let tmp = self.dir.join(format!(".{id}.json.tmp"));
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, self.path(id))
    }

    fn remove(&self, id: &str) -> io::Result<bool> {
        match std::fs::remove_file(self.path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

struct UpsertWidget<S> {
    store: S,
    mirror: Mirror,
}

#[async_trait]
impl<S: Store> Handler for UpsertWidget<S> {
    async fn handle(&self, ctx: &HandlerContext, resource_id: &str) -> Result<(), HandlerError> {
        let widget = self
            .store
            .get_resource(WIDGETS, resource_id)
            .map_err(|e| HandlerError::with_source("widget lookup failed", e))?;

        // Deleted since the event was written; the Delete event cleans up
        let Some(widget) = widget else {
            debug!(id = resource_id, "widget gone, nothing to mirror");
            return Ok(());
        };

        let body = serde_json::to_vec_pretty(&widget)
            .map_err(|e| HandlerError::with_source("widget encode failed", e))?;
        self.mirror
            .write(resource_id, &body)
            .map_err(|e| HandlerError::with_source("mirror write failed", e))?;

        info!(
            id = resource_id,
            event_type = %ctx.event.event_type,
            manager = %ctx.manager,
            "widget mirrored"
        );
        Ok(())
    }
}

struct RemoveWidget {
    mirror: Mirror,
}

#[async_trait]
impl Handler for RemoveWidget {
    async fn handle(&self, ctx: &HandlerContext, resource_id: &str) -> Result<(), HandlerError> {
        let removed = self
            .mirror
            .remove(resource_id)
            .map_err(|e| HandlerError::with_source("mirror remove failed", e))?;
        info!(id = resource_id, removed, manager = %ctx.manager, "widget retired");
        Ok(())
    }
}

#[cfg(test)]
#[path = "controllers_tests.rs"]
mod tests;
