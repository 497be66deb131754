// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot dispatch pass
//!
//! Runs evrd's own controllers once over the pending backlog, so clearing it
//! without a daemon has the same effects the daemon would. Events of sources
//! evrd has no controller for are left pending. `--dry-run` only reports.

use anyhow::Context;
use clap::Args;
use evr_engine::{ControllerManager, ControllerRegistry, ManagerConfig};
use evr_storage::Store;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::output::{print, OutputFormat};
use crate::state::StateDir;

#[derive(Args)]
pub struct ReconcileArgs {
    /// Report what would be dispatched without running any handler
    #[arg(long)]
    dry_run: bool,
}

#[derive(Serialize)]
struct Summary {
    sources: Vec<String>,
    reconciled: usize,
    skipped: usize,
    failed: usize,
    /// Pending events no controller is registered for
    unhandled: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reconciled {} skipped {} failed {}",
            self.reconciled, self.skipped, self.failed
        )?;
        if self.unhandled > 0 {
            write!(f, " (unhandled {})", self.unhandled)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct Plan {
    sources: Vec<String>,
    dispatchable: usize,
    unhandled: usize,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "would dispatch {} (unhandled {})",
            self.dispatchable, self.unhandled
        )
    }
}

pub async fn handle(args: ReconcileArgs, state: &StateDir, format: OutputFormat) -> anyhow::Result<()> {
    let store = state.open_store()?;
    let mirror_dir = state.root().join(evr_daemon::MIRROR_DIR);
    let registry = evr_daemon::registry(store.clone(), &mirror_dir)
        .with_context(|| format!("cannot prepare {}", mirror_dir.display()))?;

    let pending = store.list_unreconciled(None)?;
    let (dispatchable, unhandled) = split_pending(&registry, &pending);
    let sources: Vec<String> = registry.sources().into_iter().map(String::from).collect();
    tracing::debug!(?sources, dispatchable, unhandled, dry_run = args.dry_run, "reconcile");

    if args.dry_run {
        print(
            &Plan {
                sources,
                dispatchable,
                unhandled,
            },
            format,
        );
        return Ok(());
    }

    let manager = ControllerManager::new(
        ManagerConfig::new("evr-cli"),
        Arc::new(registry),
        store,
        state.open_locks()?,
    );
    let report = manager.dispatch_pending().await?;

    print(
        &Summary {
            sources,
            reconciled: report.reconciled,
            skipped: report.skipped,
            failed: report.failed,
            unhandled,
        },
        format,
    );
    Ok(())
}

/// Count pending events with and without a handler chain
fn split_pending(registry: &ControllerRegistry, pending: &[evr_core::Event]) -> (usize, usize) {
    let dispatchable = pending
        .iter()
        .filter(|e| !registry.chain(&e.source, e.event_type).is_empty())
        .count();
    (dispatchable, pending.len() - dispatchable)
}
