// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Event reconciliation engine
//!
//! - `lock` - advisory lock factories and the scoped `LockGuard`
//! - `controller` - handler chains keyed by (source, event type)
//! - `manager` - the dispatch loop that claims and reconciles events
//! - `service` - guarded read-modify-write of resources

pub mod controller;
mod error;
pub mod lock;
pub mod manager;
pub mod service;

pub use controller::{
    handler_fn, ControllerConfig, ControllerRegistry, ControllerRegistryBuilder, Handler,
    HandlerContext, HandlerError,
};
pub use error::{ManagerError, ServiceError};
pub use lock::{
    FileLockFactory, LockError, LockFactory, LockGuard, MemoryLockFactory, TracedLockFactory,
};
pub use manager::{shutdown_channel, ControllerManager, DispatchReport, ManagerConfig};
pub use service::{LockMode, ResourceService};
