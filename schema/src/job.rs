//! Job identity, state, and snapshot types for the Rigel supervisor
//!
//! A *job* is one shell command line spawned as a supervised OS process.
//! Jobs progress through exactly two recorded states:
//! - `Running`: the process is alive (or not yet observed dead)
//! - `Stopping`: termination has been requested and is in progress
//!
//! A terminated job has no state: its record is removed from the registry
//! as soon as the exit is confirmed.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Opaque handle identifying one supervised job
///
/// Ids are issued by the supervisor from a monotonic counter rather than
/// taken from the OS, since pids can be recycled while a registry entry
/// for the old pid still exists.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    JsonSchema,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Create a job id from its raw counter value
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw counter value
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

/// Current state of a supervised job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    /// The process is alive
    Running,
    /// Termination has been requested and is in progress
    Stopping,
}

impl JobState {
    /// Check whether termination has been requested for this job
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        matches!(self, JobState::Stopping)
    }
}

/// Immutable display copy of one job record
///
/// Snapshots are detached from registry storage: mutating or holding one
/// never affects the live record, and repeated snapshotting is free of
/// side effects.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    /// Job identifier
    pub id: JobId,
    /// The literal command line the job was launched with
    pub command: String,
    /// OS process id of the spawned shell
    pub pid: u32,
    /// Current lifecycle state
    pub state: JobState,
    /// Launch time in RFC3339 format
    pub started_at: String,
    /// Seconds elapsed since launch, recomputed at snapshot time
    pub elapsed_secs: u64,
}

/// Exit information for a terminated job process
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobExit {
    /// OS process id of the exited shell
    pub pid: u32,
    /// Exit code, if the process exited normally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Terminating signal number, if the process was killed by a signal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    /// Exit timestamp in RFC3339 format
    pub timestamp: String,
}

impl JobExit {
    /// Check whether the process exited normally with code zero
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
