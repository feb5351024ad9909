//! Unix process management for detached supervised programs
//!
//! ## Detachment
//!
//! Spawned programs are placed in their own session and process group via
//! `setsid()`, so they:
//! - survive the short-lived supervisor invocation that launched them
//! - have no controlling terminal
//! - can be signaled as a whole tree through the process group
//!
//! ## Signaling
//!
//! SIGINT requests a graceful stop and SIGKILL forces one. Delivery is
//! fire-and-forget: the invocation that stops a program is usually not the
//! one that spawned it, so there is no child handle to wait on. Liveness is
//! re-checked by polling with signal 0 instead.

// Allow unsafe code for this module since detachment requires libc::setsid() calls
#![allow(unsafe_code)]

use crate::utilities::prepend_search_path;
use crate::{CoreError, ProgramSpec, Result};
use nix::errno::Errno;
use nix::sys::signal::{self, killpg, Signal};
use nix::unistd::Pid;
use std::fs::{self, OpenOptions};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{debug, error, warn};

/// A freshly spawned supervised program
///
/// The wrapper keeps the underlying `Child` handle only long enough to hand
/// it to a reaper task; after `detach` the program is tracked exclusively
/// through its pid and the PID record.
#[derive(Debug)]
pub struct ChildProcess {
    pid: Pid,
    child: Child,
}

impl ChildProcess {
    /// Get the process ID of the spawned program
    pub fn pid(&self) -> u32 {
        self.pid.as_raw() as u32
    }

    /// Release the handle, leaving the program running on its own.
    ///
    /// A background task holds the `Child` and collects its exit status so
    /// that, if this invocation outlives the program, no zombie lingers to
    /// fool the signal-0 liveness probe. When the invocation exits first
    /// the program is reparented to init, which reaps it as usual.
    pub fn detach(self) {
        let pid = self.pid;
        let mut child = self.child;
        tokio::spawn(async move {
            let status = child.wait().await;
            debug!("Detached process {} exited: {:?}", pid, status);
        });
    }
}

/// Spawn the configured program detached from the invoking session.
///
/// The program's combined stdout and stderr are appended to the spec's log
/// file, its environment is the inherited one overlaid with the spec's
/// variables, and `bin_dir` (when set) is prepended to PATH.
pub fn spawn(spec: &ProgramSpec) -> Result<ChildProcess> {
    debug!("Spawning program: {} {:?}", spec.command, spec.args);

    let log_path = spec.log_file_path();
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                CoreError::ProcessSpawn(format!(
                    "Failed to create log dir {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| {
            CoreError::ProcessSpawn(format!("Failed to open log {}: {}", log_path.display(), e))
        })?;
    let log_stderr = log.try_clone().map_err(|e| {
        CoreError::ProcessSpawn(format!(
            "Failed to clone log handle {}: {}",
            log_path.display(),
            e
        ))
    })?;

    let mut command = Command::new(&spec.command);
    command.args(&spec.args);
    command.stdin(Stdio::null());
    command.stdout(Stdio::from(log));
    command.stderr(Stdio::from(log_stderr));
    command.envs(&spec.environment);
    if let Some(bin_dir) = &spec.bin_dir {
        let path = prepend_search_path(bin_dir, std::env::var_os("PATH").as_deref())?;
        command.env("PATH", path);
    }
    if let Some(dir) = &spec.working_directory {
        command.current_dir(dir);
    }

    // Use pre_exec to call setsid() in the child process
    // Safety: setsid() is async-signal-safe and appropriate for use in pre_exec
    unsafe {
        command.pre_exec(|| {
            // Create a new session and process group
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let child = command.spawn().map_err(|e| {
        error!("Failed to spawn program '{}': {}", spec.command, e);
        CoreError::ProcessSpawn(format!("Failed to spawn '{}': {}", spec.command, e))
    })?;

    let raw_pid = child.id().ok_or_else(|| {
        CoreError::ProcessSpawn("Spawned program did not have a PID".to_string())
    })?;
    let pid = Pid::from_raw(raw_pid as i32);
    debug!("Successfully spawned process {} in new process group", pid);

    Ok(ChildProcess { pid, child })
}

/// Probe whether `pid` is alive, without delivering a signal.
///
/// EPERM means the process exists but belongs to someone else; it is
/// reported as alive.
// TODO: persist the child's start time next to the pid so a recycled pid is
// not mistaken for the supervised program.
pub fn is_alive(pid: u32) -> bool {
    match signal::kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Send SIGINT to the process group for a graceful stop request
///
/// `ESRCH` (no such process) and `EPERM` are treated as success since they
/// mean the process group has already exited or changed ownership.
pub fn signal_int_group(pid: u32) -> Result<()> {
    send_group_signal(pid, Signal::SIGINT)
}

/// Send SIGKILL to the process group for forceful termination
pub fn signal_kill_group(pid: u32) -> Result<()> {
    send_group_signal(pid, Signal::SIGKILL)
}

fn send_group_signal(pid: u32, sig: Signal) -> Result<()> {
    debug!("Sending {} to process group {}", sig, pid);

    match killpg(Pid::from_raw(pid as i32), sig) {
        Ok(()) => {
            debug!("Successfully sent {} to process group {}", sig, pid);
            Ok(())
        }
        Err(Errno::ESRCH) => {
            // Process group doesn't exist, which means it already exited
            debug!("Process group {} already exited", pid);
            Ok(())
        }
        Err(Errno::EPERM) => {
            debug!(
                "Permission denied signaling process group {} (likely already exited)",
                pid
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to send {} to process group {}: {}", sig, pid, e);
            Err(CoreError::ProcessSignal(format!(
                "Failed to send {} to process group {}: {}",
                sig, pid, e
            )))
        }
    }
}

/// Outcome of a liveness-poll wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The process is no longer alive; `polls` sleep iterations were needed
    Exited { polls: u32 },
    /// The deadline elapsed while the process was still alive
    DeadlineElapsed,
}

/// Sleep-poll until `pid` is no longer alive.
///
/// With `deadline: None` the wait is unbounded, deliberately allowing an
/// in-flight unit of work in the program to finish before exit. Callers
/// that need a bounded stop pass a deadline and decide what to do when it
/// elapses.
pub async fn wait_for_exit(pid: u32, interval: Duration, deadline: Option<Duration>) -> WaitOutcome {
    let started = Instant::now();
    let mut polls = 0u32;
    loop {
        if !is_alive(pid) {
            return WaitOutcome::Exited { polls };
        }
        if let Some(limit) = deadline {
            if started.elapsed() >= limit {
                warn!("Process {} still alive after {:?}", pid, limit);
                return WaitOutcome::DeadlineElapsed;
            }
        }
        tokio::time::sleep(interval).await;
        polls += 1;
    }
}
