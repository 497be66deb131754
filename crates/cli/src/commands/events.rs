// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event log commands

use clap::Subcommand;
use evr_storage::Store;

use crate::output::{print_list, EventRow, OutputFormat};
use crate::state::StateDir;

#[derive(Subcommand)]
pub enum EventsCommand {
    /// List events in append order
    List {
        /// Only events not yet reconciled, oldest first
        #[arg(long)]
        pending: bool,
        /// Only events from this source
        #[arg(long)]
        source: Option<String>,
    },
}

pub fn handle(command: EventsCommand, state: &StateDir, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        EventsCommand::List { pending, source } => {
            let store = state.open_store()?;
            let events = if pending {
                store.list_unreconciled(source.as_deref())?
            } else {
                store
                    .list_events()?
                    .into_iter()
                    .filter(|e| source.as_deref().map_or(true, |s| e.source == s))
                    .collect()
            };

            if events.is_empty() && matches!(format, OutputFormat::Text) {
                println!("No events found.");
                return Ok(());
            }
            let rows: Vec<EventRow> = events.into_iter().map(EventRow).collect();
            print_list(&rows, format);
            Ok(())
        }
    }
}
