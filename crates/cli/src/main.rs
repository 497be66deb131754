// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! evr - event reconciliation CLI
//!
//! Reads and writes the same file store and lock directory as `evrd`, so
//! writes made here are picked up by a running daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod error;
mod output;
mod state;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{events, reconcile, resource};
use evr_engine::LockMode;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::error::CliError;
use crate::output::OutputFormat;
use crate::state::StateDir;

#[derive(Parser)]
#[command(name = "evr", version, about = "Event reconciliation - resources, events, controllers")]
struct Cli {
    /// State directory shared with evrd
    #[arg(long, global = true, env = "EVR_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,

    /// How writes wait for the resource lock: blocking, non-blocking, disabled
    #[arg(long, global = true, default_value = "blocking")]
    lock_mode: LockMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resource management
    Resource {
        #[command(subcommand)]
        command: resource::ResourceCommand,
    },
    /// Event log inspection
    Events {
        #[command(subcommand)]
        command: events::EventsCommand,
    },
    /// Run evrd's controllers once over pending events
    Reconcile(reconcile::ReconcileArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<CliError>() {
                Some(cli_err) => {
                    eprint!("{}", cli_err);
                    ExitCode::from(cli_err.exit_code)
                }
                None => {
                    eprintln!("error: {:#}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let state = StateDir::resolve(cli.state_dir)?;

    match cli.command {
        Commands::Resource { command } => {
            resource::handle(command, &state, cli.lock_mode, cli.output).await
        }
        Commands::Events { command } => events::handle(command, &state, cli.output),
        Commands::Reconcile(args) => reconcile::handle(args, &state, cli.output).await,
    }
}

/// Diagnostics go to stderr so stdout stays parseable
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
