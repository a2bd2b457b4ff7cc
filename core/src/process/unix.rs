//! Unix process management with safe spawn/kill using process groups
//!
//! Every job is spawned through `/bin/sh -c` so the user's command line is
//! interpreted exactly as it would be in a terminal (pipelines, redirects,
//! quoting). The shell is placed in its own session and process group via
//! `setsid()`, so the job and every descendant it forks (an encoder and its
//! helper tools, a pipeline's stages) can be signaled as a unit by sending
//! to the negative process group id.
//!
//! Standard input, output, and error are all attached to `/dev/null`: job
//! output is deliberately not captured, and a null descriptor guarantees a
//! chatty job can never block on a pipe nobody drains.

// Process group setup requires libc::setsid() in pre_exec
#![allow(unsafe_code)]

use crate::{CoreError, Result};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, error};

/// A child process running in its own Unix process group
///
/// The process is guaranteed to be a session leader, so its pid doubles as
/// the process group id for group-wide signaling.
#[derive(Debug)]
pub struct ChildProcess {
    /// The process ID of the spawned shell
    pid: Pid,
    /// The underlying Child handle for waiting and status checking
    child: Child,
}

impl ChildProcess {
    /// Get the process ID
    pub fn pid(&self) -> u32 {
        self.pid.as_raw() as u32
    }

    /// Get the process group ID (same as the PID for session leaders)
    pub fn pgid(&self) -> u32 {
        self.pid.as_raw() as u32
    }

    /// Wait for the process to exit and return its exit status (async)
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        self.child.wait().await.map_err(|e| {
            CoreError::ProcessWait(format!("Failed to wait for process {}: {}", self.pid, e))
        })
    }

    /// Check for exit without blocking; also reaps the zombie if it exited
    pub fn try_wait(&mut self) -> Result<Option<std::process::ExitStatus>> {
        self.child.try_wait().map_err(|e| {
            CoreError::ProcessWait(format!(
                "Failed to try_wait for process {}: {}",
                self.pid, e
            ))
        })
    }
}

/// Spawn a shell command in its own process group
///
/// The command string is handed to `/bin/sh -c` verbatim. `setsid()` runs
/// in the child before `exec()`, creating a new session and process group
/// with the shell as leader and detaching it from the controlling
/// terminal. All three standard streams are redirected to `/dev/null`.
///
/// Note that the shell itself almost always spawns successfully: a
/// misspelled program name does not fail here, it makes the shell exit
/// with status 127, which the reconciler observes like any other exit.
/// `SpawnFailed` is returned only when the OS refuses to create the shell
/// process (missing `/bin/sh`, fork failure, resource exhaustion).
pub fn spawn_shell(command: &str) -> Result<ChildProcess> {
    debug!("Spawning shell command: {}", command);

    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c").arg(command);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    // Safety: setsid() is async-signal-safe and appropriate for use in
    // pre_exec; it runs in the child between fork() and exec().
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let child = cmd.spawn().map_err(|e| {
        error!("Failed to spawn shell for command '{}': {}", command, e);
        CoreError::SpawnFailed(format!("'{}': {}", command, e))
    })?;

    let raw_pid = child
        .id()
        .ok_or_else(|| CoreError::SpawnFailed("Spawned child did not have a PID".to_string()))?;
    let pid = Pid::from_raw(raw_pid as i32);
    debug!("Spawned process {} in new process group", pid);

    Ok(ChildProcess { pid, child })
}

/// Send SIGTERM to a process group for graceful termination
///
/// `ESRCH` (no such process group) and `EPERM` are treated as success:
/// both mean the group has already exited or been reaped, which is the
/// outcome the caller wanted.
pub fn signal_term_group(pgid: u32) -> Result<()> {
    signal_group(pgid, Signal::SIGTERM)
}

/// Send SIGKILL to a process group for forceful termination
///
/// As with [`signal_term_group`], an already-gone group is success.
pub fn signal_kill_group(pgid: u32) -> Result<()> {
    signal_group(pgid, Signal::SIGKILL)
}

fn signal_group(pgid: u32, signal: Signal) -> Result<()> {
    let pgid = Pid::from_raw(pgid as i32);
    debug!("Sending {} to process group {}", signal, pgid);

    match killpg(pgid, signal) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::ESRCH) => {
            debug!("Process group {} already exited", pgid);
            Ok(())
        }
        Err(nix::errno::Errno::EPERM) => {
            debug!(
                "Permission denied signaling process group {} (likely already exited)",
                pgid
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to send {} to process group {}: {}", signal, pgid, e);
            Err(CoreError::ProcessSignal(format!(
                "Failed to send {} to process group {}: {}",
                signal, pgid, e
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_simple_command() {
        let child = spawn_shell("echo hello world").expect("Failed to spawn echo");
        assert!(child.pid() > 0);
        // The shell should be its own group leader
        assert_eq!(child.pid(), child.pgid());
    }

    #[tokio::test]
    async fn test_spawn_and_wait() {
        let mut child = spawn_shell("true").expect("Failed to spawn true");
        let status = child.wait().await.expect("Failed to wait for process");
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_missing_program_exits_127() {
        // The shell spawns fine; the command-not-found failure surfaces as
        // the conventional 127 exit status.
        let mut child =
            spawn_shell("nonexistent_command_12345").expect("Shell spawn should succeed");
        let status = child.wait().await.expect("Failed to wait for process");
        assert_eq!(status.code(), Some(127));
    }

    #[tokio::test]
    async fn test_shell_pipeline_spawns() {
        let mut child = spawn_shell("echo data | cat > /dev/null").expect("Failed to spawn");
        let status = child.wait().await.expect("Failed to wait for process");
        assert!(status.success());
    }

    #[tokio::test]
    async fn test_signal_term_nonexistent_group() {
        // ESRCH is treated as success
        assert!(signal_term_group(999_999).is_ok());
    }

    #[tokio::test]
    async fn test_signal_kill_nonexistent_group() {
        assert!(signal_kill_group(999_999).is_ok());
    }

    #[tokio::test]
    async fn test_try_wait_reports_running_then_exit() {
        let mut child = spawn_shell("sleep 5").expect("Failed to spawn sleep");
        assert!(child.try_wait().expect("try_wait failed").is_none());

        signal_kill_group(child.pgid()).expect("Failed to kill group");
        let status = child.wait().await.expect("Failed to wait");
        assert!(!status.success());
    }
}
