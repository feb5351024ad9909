//! Integration tests for Unix process management
//!
//! These tests verify that the process primitives correctly:
//! - Create detached processes in their own process groups (via setsid)
//! - Redirect combined output to the configured log file
//! - Deliver group signals and probe liveness across process exits

#![cfg(unix)]
#![allow(unsafe_code)] // Required for libc calls in tests

use procyon_core::process::unix::{
    is_alive, signal_int_group, signal_kill_group, spawn, wait_for_exit, WaitOutcome,
};
use procyon_core::ProgramSpec;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

fn spec_for(dir: &Path, command: &str, args: &[&str]) -> ProgramSpec {
    ProgramSpec {
        name: "itest".to_string(),
        command: command.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        environment: HashMap::new(),
        working_directory: None,
        bin_dir: None,
        log_file: Some(dir.join("itest.log")),
        pid_file: Some(dir.join("itest.pid")),
        poll_interval_secs: 1,
        restart_delay_secs: 0,
    }
}

/// Test that spawned processes are in their own process group
#[tokio::test]
async fn test_process_group_isolation() {
    let dir = tempdir().unwrap();
    let child = spawn(&spec_for(dir.path(), "sleep", &["2"])).expect("Failed to spawn sleep");
    let pid = child.pid();

    // Get parent process group ID (us)
    let parent_pgid = unsafe { libc::getpgrp() };

    // Child PGID should equal its PID (it is the group leader) and differ from ours
    let child_pgid = unsafe { libc::getpgid(pid as i32) };
    assert_eq!(child_pgid, pid as i32);
    assert_ne!(child_pgid, parent_pgid);

    // Clean up the sleep process
    let _ = signal_kill_group(pid);
    child.detach();
}

/// SIGINT terminates a default-disposition child and the probe observes it
#[tokio::test]
async fn test_sigint_termination() {
    let dir = tempdir().unwrap();
    let child = spawn(&spec_for(dir.path(), "sleep", &["30"])).expect("Failed to spawn sleep");
    let pid = child.pid();
    child.detach();
    assert!(is_alive(pid));

    signal_int_group(pid).expect("Failed to send SIGINT");

    match wait_for_exit(pid, Duration::from_millis(50), Some(Duration::from_secs(5))).await {
        WaitOutcome::Exited { .. } => {}
        WaitOutcome::DeadlineElapsed => panic!("Process {} did not exit after SIGINT", pid),
    }
    assert!(!is_alive(pid));
}

/// A SIGINT-immune child keeps the drain polling until it exits on its own
#[tokio::test]
async fn test_drain_counts_poll_iterations() {
    let dir = tempdir().unwrap();
    let spec = spec_for(dir.path(), "sh", &["-c", "trap '' INT; sleep 2"]);
    let child = spawn(&spec).expect("Failed to spawn sh");
    let pid = child.pid();
    child.detach();

    signal_int_group(pid).expect("Failed to send SIGINT");

    // The child ignores the signal and finishes its work ~2s later
    match wait_for_exit(pid, Duration::from_millis(500), Some(Duration::from_secs(10))).await {
        WaitOutcome::Exited { polls } => assert!(polls >= 1, "expected at least one poll"),
        WaitOutcome::DeadlineElapsed => panic!("Process {} never exited", pid),
    }
}

/// Deadline expiry is reported rather than waiting forever
#[tokio::test]
async fn test_wait_deadline_elapses() {
    let dir = tempdir().unwrap();
    let child = spawn(&spec_for(dir.path(), "sleep", &["30"])).expect("Failed to spawn sleep");
    let pid = child.pid();

    let outcome = wait_for_exit(pid, Duration::from_millis(50), Some(Duration::from_millis(200))).await;
    assert_eq!(outcome, WaitOutcome::DeadlineElapsed);

    let _ = signal_kill_group(pid);
    child.detach();
}

/// Working directory and environment overlay reach the child
#[tokio::test]
async fn test_spawn_environment_and_cwd() {
    let dir = tempdir().unwrap();
    let mut spec = spec_for(dir.path(), "sh", &["-c", "echo \"$GREETING @ $(pwd)\""]);
    spec.working_directory = Some(dir.path().to_path_buf());
    spec.environment
        .insert("GREETING".to_string(), "hello".to_string());

    let child = spawn(&spec).expect("Failed to spawn sh");
    let pid = child.pid();
    child.detach();

    match wait_for_exit(pid, Duration::from_millis(50), Some(Duration::from_secs(5))).await {
        WaitOutcome::Exited { .. } => {}
        WaitOutcome::DeadlineElapsed => panic!("child never exited"),
    }

    let log = std::fs::read_to_string(spec.log_file_path()).expect("log exists");
    assert!(log.contains("hello @"), "unexpected log contents: {log}");
}

/// Log output accumulates across launches instead of being truncated
#[tokio::test]
async fn test_log_file_is_appended() {
    let dir = tempdir().unwrap();
    let spec = spec_for(dir.path(), "sh", &["-c", "echo run-marker"]);

    for _ in 0..2 {
        let child = spawn(&spec).expect("Failed to spawn sh");
        let pid = child.pid();
        child.detach();
        match wait_for_exit(pid, Duration::from_millis(50), Some(Duration::from_secs(5))).await {
            WaitOutcome::Exited { .. } => {}
            WaitOutcome::DeadlineElapsed => panic!("child never exited"),
        }
    }

    let log = std::fs::read_to_string(spec.log_file_path()).expect("log exists");
    assert_eq!(log.matches("run-marker").count(), 2);
}
