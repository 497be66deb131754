// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! evr-core: domain types for the event reconciliation engine
//!
//! This crate provides:
//! - `Event`, `EventType`, and `Resource` records
//! - `Operation`, the unit persisted to the write-ahead log
//! - `LockKey` and `OwnerId` advisory lock identities
//! - `ChangeNotifier` wake channels
//! - state directory resolution shared by the binaries
//! - `Clock` and `IdGen` abstractions for deterministic tests

pub mod clock;
pub mod event;
pub mod id;
pub mod lock_key;
pub mod notify;
pub mod operation;
pub mod paths;
pub mod resource;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{Event, EventType, NewEvent, UnknownEventType};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use lock_key::{LockKey, OwnerId};
pub use notify::{ChangeNotifier, Wake, WakeSubscription, EVENTS_CHANNEL};
pub use operation::Operation;
pub use resource::Resource;
