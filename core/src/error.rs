//! Core error types and utilities

use schema::JobId;
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

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    #[error("No such job: {0}")]
    JobNotFound(JobId),

    #[error("Duplicate job id: {0}")]
    DuplicateJob(JobId),

    #[error("Signal delivery failed: {0}")]
    ProcessSignal(String),

    #[error("Process wait failed: {0}")]
    ProcessWait(String),

    #[error("Job {0} did not exit within the kill timeout")]
    StopTimeout(JobId),

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
            CoreError::InvalidCommand(_) => "CORE004",
            CoreError::SpawnFailed(_) => "CORE005",
            CoreError::JobNotFound(_) => "CORE006",
            CoreError::DuplicateJob(_) => "CORE007",
            CoreError::ProcessSignal(_) => "CORE008",
            CoreError::ProcessWait(_) => "CORE009",
            CoreError::StopTimeout(_) => "CORE010",
            CoreError::IoError(_) => "CORE011",
        }
    }
}

/// Core-specific result type
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CoreError::ConfigurationError("test".to_string()).code(),
            "CORE001"
        );
        assert_eq!(CoreError::SpawnFailed("test".to_string()).code(), "CORE005");
        assert_eq!(CoreError::JobNotFound(JobId::new(1)).code(), "CORE006");
        assert_eq!(CoreError::DuplicateJob(JobId::new(1)).code(), "CORE007");
        assert_eq!(CoreError::StopTimeout(JobId::new(1)).code(), "CORE010");
    }

    #[test]
    fn test_error_display() {
        let error = CoreError::JobNotFound(JobId::new(9));
        assert_eq!(error.to_string(), "No such job: 9");

        let error = CoreError::SpawnFailed("permission denied".to_string());
        assert_eq!(
            error.to_string(),
            "Failed to spawn process: permission denied"
        );
    }
}
