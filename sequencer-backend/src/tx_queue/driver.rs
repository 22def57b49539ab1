//! Background driver for the transaction queue
//!
//! `execute_next` is caller-invoked and a no-op while busy. The driver is the
//! caller that re-invokes it whenever something changes: after each enqueue,
//! each settlement and each terminal status update.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::TxQueueManager;

/// Drain the queue until `shutdown` is cancelled.
///
/// Cancelling while an action is in flight drops that action; its record is
/// marked failed and the slot released.
pub async fn run_driver(queue: Arc<TxQueueManager>, shutdown: CancellationToken) {
    log::info!("[TxQueue] Driver started");
    loop {
        let ran = tokio::select! {
            _ = shutdown.cancelled() => break,
            ran = queue.execute_next() => ran,
        };
        if ran {
            continue;
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = queue.wait_for_change() => {}
        }
    }
    log::info!("[TxQueue] Driver stopped");
}

pub fn spawn_driver(queue: Arc<TxQueueManager>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(run_driver(queue, shutdown))
}
