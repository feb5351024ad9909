//! Core functionality for the procyon supervisor
//!
//! This crate contains the configuration model, PID record storage, Unix
//! process primitives, and the supervisor operations shared by the CLI.

pub mod config;
pub mod error;
pub mod pidfile;
#[cfg(unix)]
pub mod process;
#[cfg(unix)]
pub mod supervisor;
pub mod utilities;

pub use config::{load_program_from_toml_path, load_program_from_toml_str, ProgramSpec};
pub use error::{CoreError, Result};
pub use pidfile::PidFile;
#[cfg(unix)]
pub use supervisor::{ProgramState, StartReport, StatusReport, StopOptions, StopReport, Supervisor};

/// Core utilities and helper functions
pub mod utils {
    use tracing::info;

    /// Initialize tracing for the application
    pub fn init_tracing(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| crate::CoreError::InitializationError(e.to_string()))?;

        info!("Tracing initialized with level: {}", level);
        Ok(())
    }
}
