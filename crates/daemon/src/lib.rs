// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! evr-daemon: the controllers evrd runs and its lifecycle
//!
//! The CLI links the same [`controllers::registry`] so a one-shot
//! `evr reconcile` runs exactly the handlers the daemon would.

pub mod controllers;
pub mod lifecycle;

pub use controllers::{registry, MIRROR_DIR, WIDGETS};
pub use lifecycle::{Config, DaemonState, LifecycleError, Settings};
