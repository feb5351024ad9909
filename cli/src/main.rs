//! procyon binary
//!
//! Command-line interface for supervising a single long-running program
//! through a PID record file. `start`, `stop`, `restart`, and `status` are
//! independent short-lived invocations.

#![allow(unused_crate_dependencies)]

use clap::{Parser, Subcommand};
use cli::{load_supervisor, run_restart, run_start, run_status, run_stop};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "procyon")]
#[command(about = "Supervise a long-running program via a PID record")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Program configuration file
    #[arg(long, default_value = "procyon.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the program detached and record its PID
    Start,
    /// Request a graceful stop and wait for the program to exit
    Stop {
        /// Seconds to wait before escalating to SIGKILL (default: wait indefinitely)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Stop the program (if running), pause, then start it again
    Restart {
        /// Seconds to wait for the old instance before escalating to SIGKILL
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Report the externally observable program state
    Status {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> cli::Result<()> {
    // Initialize logging
    procyon_core::utils::init_tracing("info")?;

    let args = Cli::parse();

    let supervisor = match load_supervisor(&args.config) {
        Ok(supervisor) => supervisor,
        Err(e) => {
            error!("Failed to load config {}: {}", args.config.display(), e);
            std::process::exit(1);
        }
    };

    let result = match &args.command {
        Commands::Start => run_start(&supervisor).await,
        Commands::Stop { timeout } => run_stop(&supervisor, *timeout).await,
        Commands::Restart { timeout } => run_restart(&supervisor, *timeout).await,
        Commands::Status { json } => run_status(&supervisor, *json).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
