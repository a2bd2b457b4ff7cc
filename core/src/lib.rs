//! Core functionality for the Rigel job launcher
//!
//! This crate contains the process supervision core: a concurrent
//! registry of live child processes, launch and graceful-then-forceful
//! stop operations, a periodic reconciler for organic exits, and an
//! exactly-once shutdown coordinator. The UI shell lives in the `cli`
//! crate and talks to this core only through the `Supervisor` surface.

pub mod config;
pub mod error;
#[cfg(unix)]
pub mod process;
pub mod registry;
pub mod supervisor;

// Re-export schema types for convenience
pub use schema::*;

pub use error::{CoreError, Result};
pub use registry::{Job, JobRegistry, JobTable};
pub use supervisor::{
    spawn_reconciler, ManagedProcess, ProcessAdapter, ShutdownCoordinator, StopOutcome, Supervisor,
};

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
