// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Event store: durable log of resource mutations and their events

mod error;
mod file;
mod memory;
mod state;
mod store;
mod wal;

pub use error::StoreError;
pub use file::{FileStore, WalWatcher};
pub use memory::MemoryStore;
pub use state::MaterializedState;
pub use store::{Committed, Store, Transaction};
pub use wal::{Wal, WalEntry, WalError};
