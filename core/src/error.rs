//! Core error types and utilities

use thiserror::Error;

/// Core-specific error types
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Process spawn error: {0}")]
    ProcessSpawn(String),

    #[error("Process signal error: {0}")]
    ProcessSignal(String),

    #[error("Process wait error: {0}")]
    ProcessWait(String),

    #[error("PID record error: {0}")]
    PidRecord(String),

    #[error("No PID record found; the program is not running")]
    NotRunning,

    #[error("PID record names process {0}, which is no longer alive")]
    StaleRecord(u32),

    #[error("Program is already running with PID {0}")]
    AlreadyRunning(u32),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CoreError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::ConfigurationError(_) => "CORE001",
            CoreError::ValidationError(_) => "CORE002",
            CoreError::InitializationError(_) => "CORE003",
            CoreError::ProcessSpawn(_) => "CORE004",
            CoreError::ProcessSignal(_) => "CORE005",
            CoreError::ProcessWait(_) => "CORE006",
            CoreError::PidRecord(_) => "CORE007",
            CoreError::NotRunning => "CORE008",
            CoreError::StaleRecord(_) => "CORE009",
            CoreError::AlreadyRunning(_) => "CORE010",
            CoreError::IoError(_) => "CORE011",
        }
    }

    /// Whether this condition is informational rather than a failure.
    ///
    /// Stopping a program that is not running (or whose record went stale)
    /// is reported but still counts as a normal completion.
    pub fn is_informational(&self) -> bool {
        matches!(self, CoreError::NotRunning | CoreError::StaleRecord(_))
    }
}

/// Core-specific result type
pub type Result<T> = std::result::Result<T, CoreError>;
