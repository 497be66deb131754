// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource commands

use anyhow::Context;
use clap::Subcommand;
use evr_engine::LockMode;

use crate::error::CliError;
use crate::output::{print, print_list, OutputFormat, ResourceRow};
use crate::state::StateDir;

#[derive(Subcommand)]
pub enum ResourceCommand {
    /// Create a resource and emit a Create event
    Create {
        /// Resource kind, also the event source (e.g. Widgets)
        kind: String,
        /// Spec as a JSON document
        spec: String,
    },
    /// Replace a resource's spec under its lock and emit an Update event
    Replace {
        kind: String,
        id: String,
        /// Spec as a JSON document
        spec: String,
    },
    /// Soft-delete a resource and emit a Delete event
    Delete { kind: String, id: String },
    /// Show one live resource
    Get { kind: String, id: String },
    /// List live resources of a kind
    List { kind: String },
}

pub async fn handle(
    command: ResourceCommand,
    state: &StateDir,
    mode: LockMode,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let service = state.service(mode)?;

    match command {
        ResourceCommand::Create { kind, spec } => {
            let resource = service.create(&kind, parse_spec(&spec)?).map_err(CliError::from)?;
            print(&ResourceRow(resource), format);
        }
        ResourceCommand::Replace { kind, id, spec } => {
            let resource = service
                .replace(&kind, &id, parse_spec(&spec)?)
                .await
                .map_err(CliError::from)?;
            print(&ResourceRow(resource), format);
        }
        ResourceCommand::Delete { kind, id } => {
            service.delete(&kind, &id).await.map_err(CliError::from)?;
            println!("deleted {} {}", kind, id);
        }
        ResourceCommand::Get { kind, id } => {
            let resource = service.get(&kind, &id).map_err(CliError::from)?;
            print(&ResourceRow(resource), format);
        }
        ResourceCommand::List { kind } => {
            let rows: Vec<ResourceRow> = service
                .list(&kind)
                .map_err(CliError::from)?
                .into_iter()
                .map(ResourceRow)
                .collect();
            if rows.is_empty() && matches!(format, OutputFormat::Text) {
                println!("No {} found.", kind);
                return Ok(());
            }
            print_list(&rows, format);
        }
    }

    Ok(())
}

fn parse_spec(spec: &str) -> anyhow::Result<serde_json::Value> {
    serde_json::from_str(spec).with_context(|| format!("spec is not valid JSON: {}", spec))
}
