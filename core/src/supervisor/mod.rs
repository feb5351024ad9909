//! Supervisor operations driving a single program's lifecycle
//!
//! Each operation runs as its own short-lived invocation; the PID record is
//! the only state carried between them, so every operation re-verifies
//! liveness before acting on a recorded pid. State transitions:
//!
//! ```text
//! NotRunning → Starting → Running → Stopping → NotRunning
//! ```
//!
//! ## Operations
//!
//! - [`Supervisor::start`]: launch detached, persist the pid
//! - [`Supervisor::stop`]: request a graceful stop, drain until exit
//! - [`Supervisor::restart`]: stop (if anything runs), pause, start
//! - [`Supervisor::status`]: read-only view of the recorded state

use crate::pidfile::PidFile;
use crate::process::unix::{self, WaitOutcome};
use crate::utilities::current_timestamp;
use crate::{CoreError, ProgramSpec, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};


/// Grace period for a SIGKILL to take effect after escalation
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Poll interval while waiting for a SIGKILL to take effect
const KILL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Externally observable state of the supervised program
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProgramState {
    /// No live process is associated with the PID record
    NotRunning,
    /// The program is being launched
    Starting,
    /// The program is running
    Running,
    /// A graceful stop has been requested and the drain is in progress
    Stopping,
}

impl ProgramState {
    /// Check if the program is in the running state
    pub fn is_running(&self) -> bool {
        matches!(self, ProgramState::Running)
    }

    /// Check if the program is transitioning between states
    pub fn is_transitional(&self) -> bool {
        matches!(self, ProgramState::Starting | ProgramState::Stopping)
    }
}

/// Bounds for the stop drain
#[derive(Debug, Clone, Copy, Default)]
pub struct StopOptions {
    /// Escalate to SIGKILL after this long; `None` drains indefinitely
    pub timeout: Option<Duration>,
}

/// Details of a successfully started program
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartReport {
    /// Process identifier of the new instance
    pub pid: u32,
    /// Command that was launched
    pub command: String,
    /// Where the program's combined output is collected
    pub log_file: PathBuf,
    /// RFC3339 launch timestamp
    pub started_at: String,
}

/// Details of a completed stop
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopReport {
    /// Process identifier that was stopped
    pub pid: u32,
    /// Liveness polls that elapsed before exit was observed
    pub polls: u32,
    /// Whether the stop escalated to SIGKILL
    pub forced: bool,
}

/// Snapshot produced by [`Supervisor::status`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Externally observable state
    pub state: ProgramState,
    /// Recorded pid, if a record exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// True when a record exists but its process is gone
    pub stale: bool,
}

/// Supervisor for a single configured program
pub struct Supervisor {
    spec: ProgramSpec,
    pid_file: PidFile,
}

impl Supervisor {
    /// Create a supervisor for `spec`
    pub fn new(spec: ProgramSpec) -> Self {
        let pid_file = PidFile::new(spec.pid_file_path());
        Self { spec, pid_file }
    }

    /// The program specification this supervisor drives
    pub fn spec(&self) -> &ProgramSpec {
        &self.spec
    }

    /// Launch the program detached and persist its pid.
    ///
    /// Refuses with `AlreadyRunning` when the record references a live
    /// process; a stale record is cleared with a warning first. If the pid
    /// cannot be persisted the fresh process is killed rather than leaked.
    pub async fn start(&self) -> Result<StartReport> {
        match self.pid_file.load()? {
            Some(pid) if unix::is_alive(pid) => return Err(CoreError::AlreadyRunning(pid)),
            Some(pid) => {
                warn!(pid, "Clearing stale PID record before start");
                self.pid_file.clear()?;
            }
            None => {}
        }

        info!(
            state = ?ProgramState::Starting,
            program = %self.spec.name,
            "Launching '{}'",
            self.spec.command
        );
        let child = unix::spawn(&self.spec)?;
        let pid = child.pid();

        if let Err(e) = self.pid_file.store(pid) {
            // A process nothing can address later must not be left behind
            warn!(pid, "Failed to persist PID record, killing fresh process");
            let _ = unix::signal_kill_group(pid);
            return Err(e);
        }
        child.detach();

        info!(state = ?ProgramState::Running, pid, program = %self.spec.name, "Program started");
        Ok(StartReport {
            pid,
            command: self.spec.command.clone(),
            log_file: self.spec.log_file_path(),
            started_at: current_timestamp(),
        })
    }

    /// Request a graceful stop and drain until the program has exited.
    ///
    /// Reports `NotRunning` when no record exists and `StaleRecord` (after
    /// removing the record) when the recorded process is already gone; both
    /// are informational. The drain polls at the spec's interval and is
    /// unbounded unless `opts.timeout` is set, in which case expiry
    /// escalates to SIGKILL with a bounded grace period. The record is
    /// removed only once the process is confirmed gone.
    pub async fn stop(&self, opts: StopOptions) -> Result<StopReport> {
        let pid = self.pid_file.load()?.ok_or(CoreError::NotRunning)?;

        if !unix::is_alive(pid) {
            self.pid_file.clear()?;
            return Err(CoreError::StaleRecord(pid));
        }

        info!(state = ?ProgramState::Stopping, pid, "Requesting graceful stop");
        unix::signal_int_group(pid)?;

        let mut forced = false;
        let polls = match unix::wait_for_exit(pid, self.spec.poll_interval(), opts.timeout).await {
            WaitOutcome::Exited { polls } => polls,
            WaitOutcome::DeadlineElapsed => {
                warn!(pid, "Graceful stop timed out, escalating to SIGKILL");
                unix::signal_kill_group(pid)?;
                forced = true;
                match unix::wait_for_exit(pid, KILL_POLL_INTERVAL, Some(KILL_GRACE)).await {
                    WaitOutcome::Exited { polls } => polls,
                    WaitOutcome::DeadlineElapsed => {
                        return Err(CoreError::ProcessWait(format!(
                            "Process {} did not exit even after SIGKILL within {:?}",
                            pid, KILL_GRACE
                        )));
                    }
                }
            }
        };

        self.pid_file.clear()?;
        info!(state = ?ProgramState::NotRunning, pid, forced, "Program stopped");
        Ok(StopReport { pid, polls, forced })
    }

    /// Stop the program if anything is running, pause, then start it again.
    ///
    /// `NotRunning` and `StaleRecord` outcomes from the stop phase are
    /// tolerated; the restart proceeds to start either way.
    pub async fn restart(&self, opts: StopOptions) -> Result<StartReport> {
        match self.stop(opts).await {
            Ok(report) => info!(pid = report.pid, "Stopped previous instance"),
            Err(CoreError::NotRunning) => info!("Nothing running; proceeding to start"),
            Err(CoreError::StaleRecord(pid)) => {
                info!(pid, "Cleared stale record; proceeding to start")
            }
            Err(e) => return Err(e),
        }

        tokio::time::sleep(self.spec.restart_delay()).await;
        self.start().await
    }

    /// Read-only view of the recorded state.
    ///
    /// A stale record is reported but not mutated; only stop and start
    /// clean records up.
    pub fn status(&self) -> Result<StatusReport> {
        Ok(match self.pid_file.load()? {
            None => StatusReport {
                state: ProgramState::NotRunning,
                pid: None,
                stale: false,
            },
            Some(pid) if unix::is_alive(pid) => StatusReport {
                state: ProgramState::Running,
                pid: Some(pid),
                stale: false,
            },
            Some(pid) => StatusReport {
                state: ProgramState::NotRunning,
                pid: Some(pid),
                stale: true,
            },
        })
    }
}
