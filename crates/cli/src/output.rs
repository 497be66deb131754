// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use evr_core::{Event, Resource};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + fmt::Display>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct ResourceRow(pub Resource);

impl fmt::Display for ResourceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<38} {:<12} {}", self.0.id, self.0.kind, self.0.spec)
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct EventRow(pub Event);

impl fmt::Display for EventRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.0.is_reconciled() {
            "reconciled"
        } else {
            "pending"
        };
        write!(
            f,
            "{:<38} {:<12} {:<38} {:<7} {}",
            self.0.id,
            self.0.source,
            self.0.source_id,
            self.0.event_type.as_str(),
            status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evr_core::{EventType, NewEvent};

    #[test]
    fn event_row_shows_status() {
        let mut event = Event::from_new(
            "evt-1".to_string(),
            NewEvent::new("Widgets", "w-1", EventType::Create),
            Default::default(),
        );
        assert!(EventRow(event.clone()).to_string().ends_with("pending"));

        event.reconcile(event.created_at);
        assert!(EventRow(event).to_string().ends_with("reconciled"));
    }
}
