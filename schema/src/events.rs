//! Event system for the Rigel supervisor
//!
//! This module defines the events emitted by the supervision core to
//! provide observability into job lifecycle transitions. Events are
//! serializable and can be logged, rendered by a UI, or broadcast to
//! multiple subscribers via event channels.

use crate::job::{JobExit, JobId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Events emitted by the supervision core
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum JobEvent {
    /// A job process has been spawned and registered
    Launched {
        /// Job identifier
        id: JobId,
        /// OS process id of the spawned shell
        pid: u32,
        /// Command line the job was launched with
        command: String,
        /// Event timestamp in RFC3339 format
        timestamp: String,
    },

    /// A job exited on its own and was reaped by the reconciler
    Exited {
        /// Job identifier
        id: JobId,
        /// Exit information
        exit_info: JobExit,
    },

    /// A job was terminated on request
    Stopped {
        /// Job identifier
        id: JobId,
        /// Whether SIGKILL was required after the graceful timeout
        forced: bool,
        /// Event timestamp in RFC3339 format
        timestamp: String,
    },

    /// A warning condition occurred for a job
    Warning {
        /// Job identifier
        id: JobId,
        /// Warning message
        message: String,
        /// Event timestamp in RFC3339 format
        timestamp: String,
    },
}

/// Event severity level for filtering and log routing
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord,
)]
#[serde(rename_all = "camelCase")]
pub enum EventSeverity {
    /// Debug information
    Debug,
    /// Informational events
    Info,
    /// Warning conditions
    Warning,
    /// Error conditions
    Error,
}

impl JobEvent {
    /// Get the job id for this event
    #[must_use]
    pub fn job_id(&self) -> JobId {
        match self {
            Self::Launched { id, .. }
            | Self::Exited { id, .. }
            | Self::Stopped { id, .. }
            | Self::Warning { id, .. } => *id,
        }
    }

    /// Get the timestamp for this event
    #[must_use]
    pub fn timestamp(&self) -> &str {
        match self {
            Self::Exited { exit_info, .. } => &exit_info.timestamp,
            Self::Launched { timestamp, .. }
            | Self::Stopped { timestamp, .. }
            | Self::Warning { timestamp, .. } => timestamp,
        }
    }

    /// Get the severity level for this event
    #[must_use]
    pub fn severity(&self) -> EventSeverity {
        match self {
            Self::Launched { .. } => EventSeverity::Info,
            Self::Exited { exit_info, .. } => {
                if exit_info.is_success() {
                    EventSeverity::Info
                } else {
                    EventSeverity::Warning
                }
            }
            Self::Stopped { forced, .. } => {
                if *forced {
                    EventSeverity::Warning
                } else {
                    EventSeverity::Info
                }
            }
            Self::Warning { .. } => EventSeverity::Warning,
        }
    }

    /// Create a current timestamp string in RFC3339 format
    #[must_use]
    pub fn current_timestamp() -> String {
        crate::format_timestamp(SystemTime::now())
    }

    /// Create a launched event
    #[must_use]
    pub fn launched(id: JobId, pid: u32, command: String) -> Self {
        Self::Launched {
            id,
            pid,
            command,
            timestamp: Self::current_timestamp(),
        }
    }

    /// Create an exited event
    #[must_use]
    pub fn exited(id: JobId, exit_info: JobExit) -> Self {
        Self::Exited { id, exit_info }
    }

    /// Create a stopped event
    #[must_use]
    pub fn stopped(id: JobId, forced: bool) -> Self {
        Self::Stopped {
            id,
            forced,
            timestamp: Self::current_timestamp(),
        }
    }

    /// Create a warning event
    #[must_use]
    pub fn warning(id: JobId, message: String) -> Self {
        Self::Warning {
            id,
            message,
            timestamp: Self::current_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_job_id() {
        let event = JobEvent::launched(JobId::new(3), 1234, "sleep 10".to_string());
        assert_eq!(event.job_id(), JobId::new(3));
    }

    #[test]
    fn test_event_severity() {
        let launched = JobEvent::launched(JobId::new(1), 1, "true".to_string());
        assert_eq!(launched.severity(), EventSeverity::Info);

        let forced = JobEvent::stopped(JobId::new(1), true);
        assert_eq!(forced.severity(), EventSeverity::Warning);

        let graceful = JobEvent::stopped(JobId::new(1), false);
        assert_eq!(graceful.severity(), EventSeverity::Info);

        let crashed = JobEvent::exited(
            JobId::new(1),
            JobExit {
                pid: 1,
                exit_code: Some(1),
                signal: None,
                timestamp: JobEvent::current_timestamp(),
            },
        );
        assert_eq!(crashed.severity(), EventSeverity::Warning);
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = JobEvent::stopped(JobId::new(5), false);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "stopped");
        assert_eq!(json["id"], 5);
        assert_eq!(json["forced"], false);
    }

    #[test]
    fn test_current_timestamp_format() {
        let timestamp = JobEvent::current_timestamp();
        assert!(timestamp.contains('T'));
        assert!(timestamp.ends_with('Z'));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(EventSeverity::Debug < EventSeverity::Info);
        assert!(EventSeverity::Info < EventSeverity::Warning);
        assert!(EventSeverity::Warning < EventSeverity::Error);
    }
}
