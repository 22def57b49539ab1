//! Transaction Queue Subsystem
//!
//! Serializes wallet actions so that only one is in flight at a time, while
//! exposing the whole backlog and per-record status to observers.
//!
//! ## Flow
//! 1. A caller builds an action (see [`crate::actions`]) and `enqueue`s it (returns id)
//! 2. `execute_next` (or the background driver) runs the earliest pending record
//! 3. Observers read `snapshot()` and receive queued/succeeded/failed notifications
//!
//! Successful records disappear after a fixed delay; failed ones stay until removed.

mod driver;
mod manager;
mod types;

pub use driver::{run_driver, spawn_driver};
pub use manager::{create_tx_queue_manager, TxQueueManager, EXECUTION_DROPPED_MESSAGE};
pub use types::{QueuedTransaction, StatusTransition, TransitionError};
pub use tx_queue_types::{QueueNotification, QueueSnapshot, TxKind, TxRecordSummary, TxStatus};
