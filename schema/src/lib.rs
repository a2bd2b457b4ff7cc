//! Schema definitions for Rigel
//!
//! This crate contains the shared data structures used across the Rigel
//! job supervisor: job identity and state, display snapshots, lifecycle
//! events, and supervisor configuration. All types here implement JSON
//! Schema generation for external consumption.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

pub mod events;
pub mod job;

pub use events::{EventSeverity, JobEvent};
pub use job::{JobExit, JobId, JobSnapshot, JobState};

/// Configuration for the job supervisor
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorConfig {
    /// Maximum time to wait for a job to exit after SIGTERM before
    /// escalating to SIGKILL
    #[serde(default = "default_graceful_timeout_secs")]
    pub graceful_timeout_secs: u64,

    /// Maximum time to wait for a job to exit after SIGKILL
    #[serde(default = "default_kill_timeout_secs")]
    pub kill_timeout_secs: u64,

    /// Interval between reconciliation passes in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Buffer size of the job event broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Overall budget for stopping every job at application exit
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl SupervisorConfig {
    /// Get the graceful timeout as a Duration
    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout_secs)
    }

    /// Get the kill timeout as a Duration
    pub fn kill_timeout(&self) -> Duration {
        Duration::from_secs(self.kill_timeout_secs)
    }

    /// Get the reconciliation interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get the shutdown budget as a Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            graceful_timeout_secs: default_graceful_timeout_secs(),
            kill_timeout_secs: default_kill_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            event_capacity: default_event_capacity(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

const fn default_graceful_timeout_secs() -> u64 {
    5
}

const fn default_kill_timeout_secs() -> u64 {
    5
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_event_capacity() -> usize {
    1024
}

const fn default_shutdown_timeout_secs() -> u64 {
    30
}

/// Format a wall-clock time as an RFC3339 string with seconds precision
#[must_use]
pub fn format_timestamp(time: SystemTime) -> String {
    humantime::format_rfc3339_seconds(time).to_string()
}
