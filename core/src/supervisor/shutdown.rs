//! Exactly-once shutdown of every supervised job
//!
//! Two independent triggers must both route to one termination path: the
//! user closing the application, and the process being interrupted
//! (Ctrl+C). The coordinator latches the first call, runs `stop_all`
//! under an overall budget, and makes every later caller wait for that
//! same run to finish, so no trigger can exit the host while children
//! are still being stopped.

use super::Supervisor;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Coordinates the single stop-everything pass at application exit
pub struct ShutdownCoordinator {
    supervisor: Arc<Supervisor>,
    done: OnceCell<()>,
}

impl ShutdownCoordinator {
    /// Create a coordinator for the given supervisor
    pub fn new(supervisor: Arc<Supervisor>) -> Arc<Self> {
        Arc::new(Self {
            supervisor,
            done: OnceCell::new(),
        })
    }

    /// Stop every job, exactly once
    ///
    /// The first caller runs `stop_all` bounded by the configured
    /// shutdown timeout; concurrent and later callers await the same
    /// run instead of starting another. Always safe to call again.
    pub async fn shutdown(&self) {
        self.done
            .get_or_init(|| async {
                let budget = self.supervisor.config().shutdown_timeout();
                info!("Shutting down: stopping all jobs");
                if tokio::time::timeout(budget, self.supervisor.stop_all())
                    .await
                    .is_err()
                {
                    error!(
                        "Shutdown did not finish within {:?}; some processes may survive",
                        budget
                    );
                }
            })
            .await;
    }

    /// Install the Ctrl+C trigger
    ///
    /// On SIGINT the coordinator runs (or joins) the shutdown pass and
    /// then exits the process.
    pub fn install_ctrl_c_handler(self: &Arc<Self>) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                return;
            }
            info!("Received Ctrl+C, shutting down...");
            coordinator.shutdown().await;
            std::process::exit(0);
        })
    }
}
