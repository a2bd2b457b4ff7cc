//! Job supervisor implementation
//!
//! This module provides the core supervision functionality: spawning shell
//! commands as registered jobs, terminating them with graceful-then-forceful
//! escalation, reconciling organic exits, and publishing display snapshots
//! and lifecycle events.
//!
//! ## Architecture
//!
//! The supervisor is a shared object over a single mutex-guarded registry.
//! Jobs progress through two recorded states:
//!
//! ```text
//! Running → Stopping → (removed)
//! ```
//!
//! `Terminated` is implicit: confirmed exits remove the record. The stop
//! path's bounded waits poll the registry in short lock-release cycles, so
//! concurrent launches, stops, and reconciler ticks never block each other
//! beyond a map operation.
//!
//! ## Components
//!
//! - [`Supervisor`]: launch / stop / stop_all / snapshot operations
//! - [`ProcessAdapter`] / [`ManagedProcess`]: platform seam for process ops
//! - [`spawn_reconciler`]: periodic organic-exit detection
//! - [`ShutdownCoordinator`]: exactly-once stop_all on application exit

use crate::registry::{Job, JobRegistry};
use crate::{CoreError, Result};
use schema::{JobEvent, JobExit, JobId, JobSnapshot, SupervisorConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub mod adapters;
pub mod reconciler;
pub mod shutdown;

pub use adapters::{ManagedProcess, MockInstruction, MockProcessAdapter, ProcessAdapter};
#[cfg(unix)]
pub use adapters::UnixProcessAdapter;
pub use reconciler::spawn_reconciler;
pub use shutdown::ShutdownCoordinator;

/// Cadence of the stop path's non-blocking exit polls
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a stop request concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The job exited within the graceful timeout after SIGTERM
    Graceful,
    /// The job ignored SIGTERM and was killed with SIGKILL
    Forced,
    /// The job had already exited and was reaped by the reconciler
    AlreadyExited,
}

/// Result of one bounded wait for a job to exit
enum AwaitOutcome {
    Exited,
    Gone,
    TimedOut,
}

/// The job supervisor: a concurrent registry of live child processes with
/// lifecycle operations and snapshot/event publication
pub struct Supervisor {
    config: SupervisorConfig,
    adapter: Arc<dyn ProcessAdapter>,
    registry: JobRegistry,
    next_id: AtomicU64,
    event_tx: broadcast::Sender<JobEvent>,
    snapshot_tx: watch::Sender<Vec<JobSnapshot>>,
}

impl Supervisor {
    /// Create a supervisor using the given process adapter
    pub fn new(config: SupervisorConfig, adapter: Arc<dyn ProcessAdapter>) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let (snapshot_tx, _) = watch::channel(Vec::new());

        Arc::new(Self {
            config,
            adapter,
            registry: JobRegistry::new(),
            next_id: AtomicU64::new(1),
            event_tx,
            snapshot_tx,
        })
    }

    /// Create a supervisor backed by real Unix processes
    #[cfg(unix)]
    pub fn unix(config: SupervisorConfig) -> Arc<Self> {
        Self::new(config, Arc::new(UnixProcessAdapter::new()))
    }

    /// The supervisor's configuration
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Subscribe to lifecycle events
    pub fn subscribe_events(&self) -> broadcast::Receiver<JobEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to display snapshots
    ///
    /// The watch value is republished on every launch, stop transition,
    /// and reconciler tick, so subscribers see membership changes and
    /// refreshed elapsed times without polling.
    pub fn subscribe_snapshots(&self) -> watch::Receiver<Vec<JobSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Spawn a shell command as a new supervised job
    ///
    /// On success the job is registered as Running and its id returned.
    /// If the OS refuses to create the process, `SpawnFailed` is returned
    /// and the registry is left unchanged.
    pub async fn launch(&self, command: &str) -> Result<JobId> {
        let command = command.trim();
        if command.is_empty() {
            return Err(CoreError::InvalidCommand(
                "command line is empty".to_string(),
            ));
        }

        let process = self.adapter.spawn(command).await?;
        let pid = process.pid();
        let id = JobId::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        // The id counter is monotonic, so a collision here is an invariant
        // violation rather than a recoverable condition.
        self.registry.add(Job::new(id, command, process)).await?;

        info!("Launched job {} (pid {}): {}", id, pid, command);
        self.emit_event(JobEvent::launched(id, pid, command.to_string()));
        self.publish_snapshot().await;

        Ok(id)
    }

    /// Terminate a job: SIGTERM to its process group, bounded wait, then
    /// SIGKILL if it has not exited
    ///
    /// Returns `JobNotFound` if the id is not registered. Once the exit is
    /// confirmed the record is removed; if the reconciler races this call
    /// and reaps the job first, `StopOutcome::AlreadyExited` is returned.
    /// The bounded waits hold no locks, so other launches and stops
    /// proceed concurrently.
    pub async fn stop(&self, id: JobId) -> Result<StopOutcome> {
        let pid = {
            let mut table = self.registry.lock().await;
            let job = table.get_mut(id).ok_or(CoreError::JobNotFound(id))?;
            job.set_stopping();
            job.pid()
        };
        self.publish_snapshot().await;

        info!("Stopping job {} (pid {})", id, pid);
        {
            let mut table = self.registry.lock().await;
            match table.get_mut(id) {
                None => return Ok(StopOutcome::AlreadyExited),
                Some(job) => job.process_mut().signal_term()?,
            }
        }

        let forced = match self.await_exit(id, self.config.graceful_timeout()).await {
            AwaitOutcome::Exited => false,
            AwaitOutcome::Gone => return Ok(StopOutcome::AlreadyExited),
            AwaitOutcome::TimedOut => {
                warn!(
                    "Job {} did not exit within {:?}; sending SIGKILL to its process group",
                    id,
                    self.config.graceful_timeout()
                );
                {
                    let mut table = self.registry.lock().await;
                    match table.get_mut(id) {
                        None => return Ok(StopOutcome::AlreadyExited),
                        Some(job) => job.process_mut().signal_kill()?,
                    }
                }
                match self.await_exit(id, self.config.kill_timeout()).await {
                    AwaitOutcome::Exited => true,
                    AwaitOutcome::Gone => return Ok(StopOutcome::AlreadyExited),
                    AwaitOutcome::TimedOut => {
                        // Leave the record in place: the reconciler will reap
                        // the job whenever the kernel finally releases it.
                        return Err(CoreError::StopTimeout(id));
                    }
                }
            }
        };

        self.registry.remove(id).await;
        info!(
            "Job {} stopped ({})",
            id,
            if forced { "forced" } else { "graceful" }
        );
        self.emit_event(JobEvent::stopped(id, forced));
        self.publish_snapshot().await;

        Ok(if forced {
            StopOutcome::Forced
        } else {
            StopOutcome::Graceful
        })
    }

    /// Stop every registered job
    ///
    /// Snapshots the id list first, then stops each id on its own task so
    /// one slow job cannot serialize the rest. Jobs that raced to exit
    /// naturally (`JobNotFound`) are ignored; other per-job failures are
    /// logged and swallowed. Idempotent: with an empty registry this is a
    /// no-op, so repeated calls are safe.
    pub async fn stop_all(self: &Arc<Self>) {
        let ids = self.registry.ids().await;
        if ids.is_empty() {
            return;
        }

        info!("Stopping all jobs ({})", ids.len());
        let mut tasks = JoinSet::new();
        for id in ids {
            let supervisor = Arc::clone(self);
            tasks.spawn(async move {
                match supervisor.stop(id).await {
                    Ok(_) => {}
                    Err(CoreError::JobNotFound(_)) => {
                        debug!("Job {} already gone during stop_all", id);
                    }
                    Err(e) => warn!("Failed to stop job {}: {}", id, e),
                }
            });
        }
        while tasks.join_next().await.is_some() {}
    }

    /// Detached snapshots of all jobs, sorted by id
    ///
    /// Side-effect free: repeated rendering never mutates supervisor state.
    pub async fn snapshot(&self) -> Vec<JobSnapshot> {
        self.registry.snapshot().await
    }

    /// Detached snapshot of one job
    pub async fn get(&self, id: JobId) -> Result<JobSnapshot> {
        self.registry.get(id).await
    }

    /// Run one reconciliation pass: reap every job whose process has
    /// exited, then republish the display snapshot
    ///
    /// This is the only path that detects organic termination (a command
    /// finishing normally or crashing). Normally driven by
    /// [`spawn_reconciler`]; exposed for deterministic testing. A poll
    /// failure on one record is logged and skipped, never fatal.
    pub async fn reconcile(&self) {
        let exited: Vec<(JobId, JobExit)> = {
            let mut table = self.registry.lock().await;
            let mut exited = Vec::new();
            for id in table.ids() {
                let Some(job) = table.get_mut(id) else {
                    continue;
                };
                match job.process_mut().poll_exit() {
                    Ok(Some(exit)) => exited.push((id, exit)),
                    Ok(None) => {}
                    Err(e) => warn!("Liveness poll failed for job {}: {}", id, e),
                }
            }
            for (id, _) in &exited {
                table.remove(*id);
            }
            exited
        };

        for (id, exit) in exited {
            info!(
                "Job {} exited on its own (code {:?}, signal {:?})",
                id, exit.exit_code, exit.signal
            );
            self.emit_event(JobEvent::exited(id, exit));
        }

        // Republish every pass so elapsed times refresh for subscribers
        self.publish_snapshot().await;
    }

    /// Wait up to `budget` for the job's process to exit, polling without
    /// blocking and releasing the registry lock between polls
    async fn await_exit(&self, id: JobId, budget: Duration) -> AwaitOutcome {
        let deadline = Instant::now() + budget;
        loop {
            let polled = {
                let mut table = self.registry.lock().await;
                match table.get_mut(id) {
                    None => return AwaitOutcome::Gone,
                    Some(job) => job.process_mut().poll_exit(),
                }
            };
            match polled {
                Ok(Some(_)) => return AwaitOutcome::Exited,
                Ok(None) => {}
                Err(e) => warn!("Exit poll failed for job {}: {}", id, e),
            }
            if Instant::now() >= deadline {
                return AwaitOutcome::TimedOut;
            }
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }
    }

    async fn publish_snapshot(&self) {
        let snapshot = self.registry.snapshot().await;
        if self.snapshot_tx.send(snapshot).is_err() {
            debug!("No snapshot subscribers");
        }
    }

    fn emit_event(&self, event: JobEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("No event subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::JobState;
    use tokio::sync::broadcast::error::TryRecvError;

    fn test_config() -> SupervisorConfig {
        SupervisorConfig {
            // Short graceful timeout so escalation tests stay fast
            graceful_timeout_secs: 1,
            kill_timeout_secs: 2,
            ..SupervisorConfig::default()
        }
    }

    async fn mock_supervisor(instructions: Vec<MockInstruction>) -> Arc<Supervisor> {
        let adapter = MockProcessAdapter::new();
        for instruction in instructions {
            adapter.add_instruction(instruction).await;
        }
        Supervisor::new(test_config(), Arc::new(adapter))
    }

    fn drain_events(rx: &mut broadcast::Receiver<JobEvent>) -> Vec<JobEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        events
    }

    #[tokio::test]
    async fn test_launch_assigns_distinct_ids() {
        let supervisor =
            mock_supervisor(vec![MockInstruction::long_running(); 3]).await;

        let a = supervisor.launch("sleep 100").await.unwrap();
        let b = supervisor.launch("sleep 200").await.unwrap();
        let c = supervisor.launch("sleep 300").await.unwrap();

        assert_ne!(a, b);
        assert_ne!(b, c);

        let snapshot = supervisor.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|s| s.state == JobState::Running));
        // Ordered by id
        assert_eq!(snapshot[0].id, a);
        assert_eq!(snapshot[2].id, c);
    }

    #[tokio::test]
    async fn test_launch_rejects_blank_command() {
        let supervisor = mock_supervisor(vec![]).await;
        assert!(matches!(
            supervisor.launch("   ").await,
            Err(CoreError::InvalidCommand(_))
        ));
        assert!(supervisor.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_stop_graceful() {
        let supervisor = mock_supervisor(vec![MockInstruction::long_running()]).await;
        let id = supervisor.launch("sleep 600").await.unwrap();

        let outcome = supervisor.stop(id).await.unwrap();
        assert_eq!(outcome, StopOutcome::Graceful);
        assert!(supervisor.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_stop_escalates_to_kill() {
        let supervisor = mock_supervisor(vec![MockInstruction::ignores_term()]).await;
        let id = supervisor.launch("stubborn").await.unwrap();

        let started = Instant::now();
        let outcome = supervisor.stop(id).await.unwrap();
        assert_eq!(outcome, StopOutcome::Forced);
        // Escalation happens after the 1s graceful budget, well before
        // graceful + kill budgets are exhausted
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(supervisor.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_stop_unknown_id() {
        let supervisor = mock_supervisor(vec![]).await;
        assert!(matches!(
            supervisor.stop(JobId::new(42)).await,
            Err(CoreError::JobNotFound(id)) if id == JobId::new(42)
        ));
    }

    #[tokio::test]
    async fn test_reconcile_reaps_organic_exit() {
        let supervisor = mock_supervisor(vec![
            MockInstruction::exits_after(Duration::from_millis(20), 0),
            MockInstruction::long_running(),
        ])
        .await;
        let mut events = supervisor.subscribe_events();

        let short = supervisor.launch("true").await.unwrap();
        let long = supervisor.launch("sleep 600").await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        supervisor.reconcile().await;

        let snapshot = supervisor.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, long);

        let exited: Vec<JobEvent> = drain_events(&mut events)
            .into_iter()
            .filter(|e| matches!(e, JobEvent::Exited { .. }))
            .collect();
        assert_eq!(exited.len(), 1);
        assert_eq!(exited[0].job_id(), short);
    }

    #[tokio::test]
    async fn test_stop_all_is_idempotent() {
        let supervisor =
            mock_supervisor(vec![MockInstruction::long_running(); 2]).await;
        let mut events = supervisor.subscribe_events();

        supervisor.launch("sleep 100").await.unwrap();
        supervisor.launch("sleep 200").await.unwrap();

        supervisor.stop_all().await;
        assert!(supervisor.snapshot().await.is_empty());

        // Second call must produce no additional signals and no errors
        supervisor.stop_all().await;

        let stopped: Vec<JobEvent> = drain_events(&mut events)
            .into_iter()
            .filter(|e| matches!(e, JobEvent::Stopped { .. }))
            .collect();
        assert_eq!(stopped.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_launch_and_stop_disjoint_ids() {
        let supervisor =
            mock_supervisor(vec![MockInstruction::long_running(); 8]).await;

        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(supervisor.launch(&format!("keep {}", i)).await.unwrap());
        }

        let mut tasks = JoinSet::new();
        for i in 0..4 {
            let supervisor = Arc::clone(&supervisor);
            tasks.spawn(async move {
                let id = supervisor.launch(&format!("doomed {}", i)).await.unwrap();
                supervisor.stop(id).await.unwrap();
            });
        }
        while tasks.join_next().await.is_some() {}

        let snapshot = supervisor.snapshot().await;
        let live: Vec<JobId> = snapshot.iter().map(|s| s.id).collect();
        assert_eq!(live, ids);
    }

    #[tokio::test]
    async fn test_snapshot_watch_publishes() {
        let supervisor = mock_supervisor(vec![MockInstruction::long_running()]).await;
        let mut snapshots = supervisor.subscribe_snapshots();

        let id = supervisor.launch("sleep 600").await.unwrap();
        snapshots.changed().await.unwrap();
        {
            let value = snapshots.borrow_and_update();
            assert_eq!(value.len(), 1);
            assert_eq!(value[0].id, id);
        }

        supervisor.stop(id).await.unwrap();
        // The final publication after removal leaves an empty list
        let value = snapshots.borrow_and_update();
        assert!(value.is_empty());
    }

    #[tokio::test]
    async fn test_get_returns_snapshot() {
        let supervisor = mock_supervisor(vec![MockInstruction::long_running()]).await;
        let id = supervisor.launch("ffmpeg -i a.mkv b.mp4").await.unwrap();

        let snapshot = supervisor.get(id).await.unwrap();
        assert_eq!(snapshot.command, "ffmpeg -i a.mkv b.mp4");
        assert!(matches!(
            supervisor.get(JobId::new(999)).await,
            Err(CoreError::JobNotFound(_))
        ));
    }
}
