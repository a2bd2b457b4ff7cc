//! Process adapters for abstracting process management
//!
//! This module provides traits and implementations for abstracting the
//! OS-level process operations the supervisor depends on, enabling
//! testing with mock implementations and isolating the platform-specific
//! surface to a single seam.

use crate::Result;
use async_trait::async_trait;
use schema::{JobEvent, JobExit};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Trait for spawning supervised processes in a platform-agnostic way
#[async_trait]
pub trait ProcessAdapter: Send + Sync {
    /// Spawn a shell command as a new managed process in its own group
    async fn spawn(&self, command: &str) -> Result<Box<dyn ManagedProcess>>;
}

/// Trait representing a spawned process that can be signaled and polled
pub trait ManagedProcess: Send + Sync {
    /// Get the process ID
    fn pid(&self) -> u32;

    /// Check for exit without blocking
    ///
    /// Returns `Ok(None)` while the process is alive, `Ok(Some(exit))`
    /// once it has terminated. A terminated process is also reaped by
    /// this call, so the result is returned at most once.
    fn poll_exit(&mut self) -> Result<Option<JobExit>>;

    /// Send the graceful termination signal to the whole process group
    fn signal_term(&mut self) -> Result<()>;

    /// Send the forceful kill signal to the whole process group
    fn signal_kill(&mut self) -> Result<()>;
}

/// Unix process adapter backed by [`crate::process::unix`]
#[cfg(unix)]
#[derive(Copy, Clone, Debug, Default)]
pub struct UnixProcessAdapter;

#[cfg(unix)]
impl UnixProcessAdapter {
    /// Create a new Unix process adapter
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
#[async_trait]
impl ProcessAdapter for UnixProcessAdapter {
    async fn spawn(&self, command: &str) -> Result<Box<dyn ManagedProcess>> {
        let child = crate::process::unix::spawn_shell(command)?;
        Ok(Box::new(UnixManagedProcess { child }))
    }
}

/// Unix managed process implementation
#[cfg(unix)]
struct UnixManagedProcess {
    child: crate::process::unix::ChildProcess,
}

#[cfg(unix)]
impl ManagedProcess for UnixManagedProcess {
    fn pid(&self) -> u32 {
        self.child.pid()
    }

    fn poll_exit(&mut self) -> Result<Option<JobExit>> {
        let Some(exit_status) = self.child.try_wait()? else {
            return Ok(None);
        };

        let (exit_code, signal) = if let Some(code) = exit_status.code() {
            (Some(code), None)
        } else {
            // No exit code on Unix means the process was killed by a signal
            use std::os::unix::process::ExitStatusExt;
            (None, exit_status.signal())
        };

        Ok(Some(JobExit {
            pid: self.pid(),
            exit_code,
            signal,
            timestamp: JobEvent::current_timestamp(),
        }))
    }

    fn signal_term(&mut self) -> Result<()> {
        crate::process::unix::signal_term_group(self.child.pgid())
    }

    fn signal_kill(&mut self) -> Result<()> {
        crate::process::unix::signal_kill_group(self.child.pgid())
    }
}

/// Mock process adapter for testing
#[derive(Debug, Clone, Default)]
pub struct MockProcessAdapter {
    /// Instructions for mock processes, consumed front-first by spawn
    instructions: Arc<tokio::sync::Mutex<Vec<MockInstruction>>>,
}

/// Instructions for mock process behavior
#[derive(Debug, Clone, Copy)]
pub struct MockInstruction {
    /// How long the process "runs" before exiting on its own
    pub exit_delay: Duration,
    /// Exit code to report on organic exit
    pub exit_code: Option<i32>,
    /// Signal to report on organic exit
    pub signal: Option<i32>,
    /// Whether SIGTERM terminates the process (SIGKILL always does)
    pub responds_to_term: bool,
}

impl Default for MockInstruction {
    fn default() -> Self {
        Self {
            exit_delay: Duration::from_millis(100),
            exit_code: Some(0),
            signal: None,
            responds_to_term: true,
        }
    }
}

impl MockInstruction {
    /// A process that runs for a long time and honors SIGTERM
    pub fn long_running() -> Self {
        Self {
            exit_delay: Duration::from_secs(600),
            ..Self::default()
        }
    }

    /// A process that runs for a long time and ignores SIGTERM
    pub fn ignores_term() -> Self {
        Self {
            exit_delay: Duration::from_secs(600),
            responds_to_term: false,
            ..Self::default()
        }
    }

    /// A process that exits on its own after `delay` with the given code
    pub fn exits_after(delay: Duration, exit_code: i32) -> Self {
        Self {
            exit_delay: delay,
            exit_code: Some(exit_code),
            ..Self::default()
        }
    }
}

impl MockProcessAdapter {
    /// Create a new mock adapter with no pre-configured instructions
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instruction for the next spawned process
    pub async fn add_instruction(&self, instruction: MockInstruction) {
        self.instructions.lock().await.push(instruction);
    }
}

#[async_trait]
impl ProcessAdapter for MockProcessAdapter {
    async fn spawn(&self, command: &str) -> Result<Box<dyn ManagedProcess>> {
        debug!("Spawning mock process for: {}", command);

        let mut instructions = self.instructions.lock().await;
        let instruction = if instructions.is_empty() {
            MockInstruction::default()
        } else {
            instructions.remove(0)
        };

        Ok(Box::new(MockManagedProcess::new(instruction)))
    }
}

static NEXT_MOCK_PID: AtomicU32 = AtomicU32::new(10_000);

/// Mock managed process for testing
struct MockManagedProcess {
    pid: u32,
    instruction: MockInstruction,
    started_at: Instant,
    terminated: bool,
    killed: bool,
}

impl MockManagedProcess {
    fn new(instruction: MockInstruction) -> Self {
        Self {
            pid: NEXT_MOCK_PID.fetch_add(1, Ordering::Relaxed),
            instruction,
            started_at: Instant::now(),
            terminated: false,
            killed: false,
        }
    }

    fn exit_info(&self) -> JobExit {
        let (exit_code, signal) = if self.killed {
            (None, Some(9))
        } else if self.terminated {
            (None, Some(15))
        } else {
            (self.instruction.exit_code, self.instruction.signal)
        };

        JobExit {
            pid: self.pid,
            exit_code,
            signal,
            timestamp: JobEvent::current_timestamp(),
        }
    }
}

impl ManagedProcess for MockManagedProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn poll_exit(&mut self) -> Result<Option<JobExit>> {
        let exited = self.killed
            || self.terminated
            || self.started_at.elapsed() >= self.instruction.exit_delay;

        if exited {
            Ok(Some(self.exit_info()))
        } else {
            Ok(None)
        }
    }

    fn signal_term(&mut self) -> Result<()> {
        debug!("Mock SIGTERM to process {}", self.pid);
        if self.instruction.responds_to_term {
            self.terminated = true;
        }
        Ok(())
    }

    fn signal_kill(&mut self) -> Result<()> {
        debug!("Mock SIGKILL to process {}", self.pid);
        self.killed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_adapter_spawn() {
        let adapter = MockProcessAdapter::new();
        let mut process = adapter.spawn("echo hello").await.unwrap();
        assert!(process.pid() >= 10_000);
        // Default instruction has not exited yet
        assert!(process.poll_exit().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_organic_exit() {
        let adapter = MockProcessAdapter::new();
        adapter
            .add_instruction(MockInstruction::exits_after(Duration::from_millis(20), 3))
            .await;

        let mut process = adapter.spawn("false").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let exit = process.poll_exit().unwrap().expect("should have exited");
        assert_eq!(exit.exit_code, Some(3));
        assert_eq!(exit.signal, None);
    }

    #[tokio::test]
    async fn test_mock_term_honored() {
        let adapter = MockProcessAdapter::new();
        adapter.add_instruction(MockInstruction::long_running()).await;

        let mut process = adapter.spawn("sleep 600").await.unwrap();
        process.signal_term().unwrap();

        let exit = process.poll_exit().unwrap().expect("should have exited");
        assert_eq!(exit.exit_code, None);
        assert_eq!(exit.signal, Some(15));
    }

    #[tokio::test]
    async fn test_mock_term_ignored_until_kill() {
        let adapter = MockProcessAdapter::new();
        adapter.add_instruction(MockInstruction::ignores_term()).await;

        let mut process = adapter.spawn("sleep 600").await.unwrap();
        process.signal_term().unwrap();
        assert!(process.poll_exit().unwrap().is_none());

        process.signal_kill().unwrap();
        let exit = process.poll_exit().unwrap().expect("should have exited");
        assert_eq!(exit.signal, Some(9));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unix_adapter_spawn_and_poll() {
        let adapter = UnixProcessAdapter::new();
        let mut process = adapter.spawn("true").await.unwrap();

        // The process exits almost immediately; poll until reaped
        let mut exit = None;
        for _ in 0..50 {
            if let Some(info) = process.poll_exit().unwrap() {
                exit = Some(info);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let exit = exit.expect("true should exit quickly");
        assert_eq!(exit.exit_code, Some(0));
        assert!(exit.is_success());
    }
}
