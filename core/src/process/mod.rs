//! Process management primitives
//!
//! Platform-specific process control lives in submodules. Only Unix is
//! supported: the supervisor relies on sessions, process groups, and
//! signal-0 liveness probes.

#[cfg(unix)]
pub mod unix;
