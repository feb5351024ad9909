//! Configuration loading and validation for the supervised program
//!
//! This module parses a TOML configuration into a `ProgramSpec`, applies
//! sane defaults (via serde defaults), and performs strict validation with
//! field-path error messages.

use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Specification of the single program the supervisor manages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSpec {
    /// Short identifier, used for default PID record and log file names
    pub name: String,

    /// Command to execute
    pub command: String,

    /// Command-line arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment variables overlaid on the inherited environment
    #[serde(default)]
    pub environment: HashMap<String, String>,

    /// Working directory for the process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,

    /// Local binary directory prepended to PATH so an activated runtime
    /// environment is found before system defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,

    /// Combined stdout/stderr destination (appended)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// PID record path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid_file: Option<PathBuf>,

    /// Seconds between liveness polls while waiting for the program to exit
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds to pause between stop and start during a restart
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,
}

impl ProgramSpec {
    /// Get the stop poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get the restart delay as a Duration
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }

    /// Resolved PID record path, falling back to the default state cascade
    pub fn pid_file_path(&self) -> PathBuf {
        self.pid_file
            .clone()
            .unwrap_or_else(|| default_state_path(&self.name, "pid"))
    }

    /// Resolved log file path, falling back to the default state cascade
    pub fn log_file_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| default_state_path(&self.name, "log"))
    }

    /// Validate the specification and return `Result<()>` with field-path errors
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "name: cannot be empty".to_string(),
            ));
        }
        if self.name.contains(['/', '\\']) || self.name.contains(char::is_whitespace) {
            return Err(CoreError::ValidationError(format!(
                "name: '{}' must not contain path separators or whitespace",
                self.name
            )));
        }
        if self.command.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "command: cannot be empty".to_string(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(CoreError::ValidationError(
                "pollIntervalSecs: must be at least 1".to_string(),
            ));
        }
        for key in self.environment.keys() {
            if key.trim().is_empty() || key.contains('=') {
                return Err(CoreError::ValidationError(format!(
                    "environment: invalid variable name '{}'",
                    key
                )));
            }
        }
        Ok(())
    }
}

const fn default_poll_interval_secs() -> u64 {
    5
}

const fn default_restart_delay_secs() -> u64 {
    2
}

/// Return a default state file path for `<name>.<ext>`.
///
/// Order:
/// - `$PROCYON_STATE_DIR/<name>.<ext>` if provided
/// - `$HOME/.procyon/<name>.<ext>` if HOME exists
/// - `./<name>.<ext>` otherwise
pub fn default_state_path(name: &str, ext: &str) -> PathBuf {
    let file = format!("{}.{}", name, ext);
    if let Ok(dir) = std::env::var("PROCYON_STATE_DIR") {
        return PathBuf::from(dir).join(file);
    }
    if let Some(home) = dirs_next::home_dir() {
        return home.join(".procyon").join(file);
    }
    PathBuf::from(file)
}

/// Load a program spec from a TOML file path
pub fn load_program_from_toml_path(path: impl AsRef<Path>) -> Result<ProgramSpec> {
    let data = fs::read_to_string(&path).map_err(|e| {
        CoreError::ConfigurationError(format!("Failed to read config {:?}: {}", path.as_ref(), e))
    })?;
    load_program_from_toml_str(&data)
}

/// Load a program spec from a TOML string
pub fn load_program_from_toml_str(input: &str) -> Result<ProgramSpec> {
    let spec: ProgramSpec = toml::from_str(input)
        .map_err(|e| CoreError::ConfigurationError(format!("TOML parse error: {}", e)))?;
    spec.validate()?;
    Ok(spec)
}
