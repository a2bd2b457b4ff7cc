//! Registry of live job records
//!
//! The registry is the single shared mutable resource of the supervision
//! core. [`JobTable`] implements the record-keeping contract as a plain
//! map wrapper; [`JobRegistry`] wraps it in one mutex through which every
//! caller (launch path, stop path, reconciler, shutdown) is serialized.
//! Lock hold times are bounded: nothing awaits or sleeps while holding
//! the table.
//!
//! Invariants:
//! - a record exists iff its process is Running or Stopping
//! - ids are unique among present records
//! - removal is idempotent, because the stop path and the reconciler may
//!   race to remove the same record

use crate::supervisor::ManagedProcess;
use crate::{CoreError, Result};
use schema::{format_timestamp, JobId, JobSnapshot, JobState};
use std::collections::HashMap;
use std::time::{Instant, SystemTime};
use tokio::sync::{Mutex, MutexGuard};

/// One live job record: identity, command line, timing, and the process
/// handle used for signaling and exit polling
pub struct Job {
    id: JobId,
    command: String,
    state: JobState,
    started_at: Instant,
    launched_at: SystemTime,
    process: Box<dyn ManagedProcess>,
}

impl Job {
    /// Create a Running record for a freshly spawned process
    pub fn new(id: JobId, command: impl Into<String>, process: Box<dyn ManagedProcess>) -> Self {
        Self {
            id,
            command: command.into(),
            state: JobState::Running,
            started_at: Instant::now(),
            launched_at: SystemTime::now(),
            process,
        }
    }

    /// Job identifier
    pub fn id(&self) -> JobId {
        self.id
    }

    /// OS process id of the spawned shell
    pub fn pid(&self) -> u32 {
        self.process.pid()
    }

    /// Current lifecycle state
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Mark the record as Stopping
    pub(crate) fn set_stopping(&mut self) {
        self.state = JobState::Stopping;
    }

    /// Mutable access to the process handle for signaling and polling
    pub(crate) fn process_mut(&mut self) -> &mut dyn ManagedProcess {
        self.process.as_mut()
    }

    /// Produce a detached display copy with elapsed time recomputed now
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id,
            command: self.command.clone(),
            pid: self.process.pid(),
            state: self.state,
            started_at: format_timestamp(self.launched_at),
            elapsed_secs: self.started_at.elapsed().as_secs(),
        }
    }
}

/// The record-keeping contract over live jobs
///
/// A plain map wrapper with no synchronization of its own; concurrency is
/// the job of [`JobRegistry`].
#[derive(Default)]
pub struct JobTable {
    jobs: HashMap<JobId, Job>,
}

impl JobTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record, failing if the id is already present
    pub fn add(&mut self, job: Job) -> Result<()> {
        let id = job.id();
        if self.jobs.contains_key(&id) {
            return Err(CoreError::DuplicateJob(id));
        }
        self.jobs.insert(id, job);
        Ok(())
    }

    /// Remove a record if present; absent ids are a no-op, not an error
    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        self.jobs.remove(&id)
    }

    /// Get a detached snapshot of one record
    pub fn get(&self, id: JobId) -> Result<JobSnapshot> {
        self.jobs
            .get(&id)
            .map(Job::snapshot)
            .ok_or(CoreError::JobNotFound(id))
    }

    /// Mutable access to one record
    pub(crate) fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    /// Detached snapshots of all records, sorted by id
    pub fn snapshot(&self) -> Vec<JobSnapshot> {
        let mut snapshots: Vec<JobSnapshot> = self.jobs.values().map(Job::snapshot).collect();
        snapshots.sort_by_key(|s| s.id);
        snapshots
    }

    /// Ids of all records, sorted
    pub fn ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.jobs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Thread-safe owner of the job table
#[derive(Default)]
pub struct JobRegistry {
    table: Mutex<JobTable>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the table for a bounded sequence of operations
    pub(crate) async fn lock(&self) -> MutexGuard<'_, JobTable> {
        self.table.lock().await
    }

    /// Insert a new record
    pub async fn add(&self, job: Job) -> Result<()> {
        self.table.lock().await.add(job)
    }

    /// Remove a record if present
    pub async fn remove(&self, id: JobId) -> Option<Job> {
        self.table.lock().await.remove(id)
    }

    /// Get a detached snapshot of one record
    pub async fn get(&self, id: JobId) -> Result<JobSnapshot> {
        self.table.lock().await.get(id)
    }

    /// Detached snapshots of all records, sorted by id
    pub async fn snapshot(&self) -> Vec<JobSnapshot> {
        self.table.lock().await.snapshot()
    }

    /// Ids of all records, sorted
    pub async fn ids(&self) -> Vec<JobId> {
        self.table.lock().await.ids()
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    /// Whether the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }
}
