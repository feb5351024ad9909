//! Command runners for the procyon binary
//!
//! Each runner drives one supervisor operation, prints a human or JSON
//! summary, and folds the informational outcomes (`NotRunning`,
//! `StaleRecord`) into a normal completion so the binary exits 0 for them.

pub mod error;

pub use error::{CliError, Result};

use procyon_core::{load_program_from_toml_path, StopOptions, Supervisor};
use std::path::Path;
use std::time::Duration;

/// Build a supervisor from a TOML config file path
pub fn load_supervisor(config: impl AsRef<Path>) -> Result<Supervisor> {
    let spec = load_program_from_toml_path(config)?;
    Ok(Supervisor::new(spec))
}

fn stop_options(timeout_secs: Option<u64>) -> StopOptions {
    StopOptions {
        timeout: timeout_secs.map(Duration::from_secs),
    }
}

/// Launch the program and report where it runs
pub async fn run_start(sup: &Supervisor) -> Result<()> {
    let report = sup.start().await?;
    println!("✓ Started '{}' (PID {})", sup.spec().name, report.pid);
    println!("  Command: {}", report.command);
    println!("  Logs: {}", report.log_file.display());
    Ok(())
}

/// Stop the program, tolerating a missing or stale record
pub async fn run_stop(sup: &Supervisor, timeout_secs: Option<u64>) -> Result<()> {
    match sup.stop(stop_options(timeout_secs)).await {
        Ok(report) if report.forced => {
            println!(
                "✓ Stopped '{}' (PID {}, forced after timeout)",
                sup.spec().name,
                report.pid
            );
            Ok(())
        }
        Ok(report) => {
            println!("✓ Stopped '{}' (PID {})", sup.spec().name, report.pid);
            Ok(())
        }
        Err(e) if e.is_informational() => {
            println!("{}", e);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Restart the program; a missing record only skips the stop phase
pub async fn run_restart(sup: &Supervisor, timeout_secs: Option<u64>) -> Result<()> {
    let report = sup.restart(stop_options(timeout_secs)).await?;
    println!("✓ Restarted '{}' (PID {})", sup.spec().name, report.pid);
    println!("  Logs: {}", report.log_file.display());
    Ok(())
}

/// Report the externally observable program state
pub async fn run_status(sup: &Supervisor, json: bool) -> Result<()> {
    let status = sup.status()?;

    if json {
        let rendered = serde_json::to_string_pretty(&status)
            .map_err(|e| CliError::CommandFailed(format!("failed to render status: {}", e)))?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("Program Status:");
    println!("  Name: {}", sup.spec().name);
    println!("  State: {:?}", status.state);
    if let Some(pid) = status.pid {
        println!("  PID: {}", pid);
    }
    if status.stale {
        println!("  Note: PID record is stale (process is gone)");
    }
    Ok(())
}
