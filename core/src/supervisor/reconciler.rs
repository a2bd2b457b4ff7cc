//! Periodic reconciliation of organic job exits
//!
//! Jobs that finish on their own (a command completing normally or
//! crashing) are not observed by any stop path; this background task is
//! what notices them. Each tick runs one [`Supervisor::reconcile`] pass:
//! a non-blocking liveness poll of every record, removal of the exited
//! ones, and a fresh display snapshot publication.

use super::Supervisor;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// Spawn the reconciliation loop for the lifetime of the application
///
/// Ticks at the configured poll interval. Ticks never pile up if a pass
/// runs long: missed ticks are delayed, not bursted. Launch and stop
/// operations share only the registry mutex with this loop, so they can
/// never delay it beyond a bounded map operation.
pub fn spawn_reconciler(supervisor: Arc<Supervisor>) -> JoinHandle<()> {
    let period = supervisor.config().poll_interval();

    tokio::spawn(async move {
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Reconciler running every {:?}", period);
        loop {
            tick.tick().await;
            supervisor.reconcile().await;
        }
    })
}
