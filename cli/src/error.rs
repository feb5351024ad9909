//! CLI error types

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("{0}")]
    Core(#[from] procyon_core::CoreError),
}

impl CliError {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            CliError::CommandFailed(_) => "CLI001",
            CliError::Core(e) => e.code(),
        }
    }
}

/// CLI-specific result type
pub type Result<T> = std::result::Result<T, CliError>;
