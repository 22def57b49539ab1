//! Transaction queue manager
//!
//! Ordered backlog plus a single global execution slot. All bookkeeping
//! happens under one lock that is never held across an await, so a snapshot
//! never shows a record halfway between two statuses.

use futures_util::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tx_queue_types::{QueueNotification, QueueSnapshot, TxKind, TxRecordSummary, TxStatus};
use uuid::Uuid;

use super::types::{QueuedTransaction, StatusTransition, TransitionError};
use crate::actions::{ActionError, ActionResult};
use crate::config::DEFAULT_SUCCESS_EXPIRY_SECS;
use crate::events::QueueEventBroadcaster;

/// Stored on a record whose execution future was dropped mid-flight
pub const EXECUTION_DROPPED_MESSAGE: &str = "Execution dropped before the action settled";

#[derive(Default)]
struct QueueState {
    /// Insertion order
    backlog: Vec<QueuedTransaction>,
    /// Id of the record whose action `execute_next` is awaiting. Stays set
    /// when that record is removed, since removal does not cancel the work.
    in_flight: Option<String>,
}

impl QueueState {
    fn is_busy(&self) -> bool {
        self.in_flight.is_some()
            || self
                .backlog
                .iter()
                .any(|tx| tx.status == TxStatus::Processing)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut QueuedTransaction> {
        self.backlog.iter_mut().find(|tx| tx.id == id)
    }
}

/// What `execute_next` remembers about the record it started, so the outcome
/// can still be reported after the record is removed.
struct Selected {
    id: String,
    kind: TxKind,
    description: String,
}

/// Releases the execution slot if `execute_next` is dropped before the action settles.
struct InFlightGuard<'a> {
    manager: &'a TxQueueManager,
    selected: &'a Selected,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let selected = self.selected;
        log::warn!("[TxQueue] Execution of {} dropped before its action settled", selected.id);
        {
            let mut state = self.manager.state.lock();
            state.in_flight = None;
            if let Some(tx) = state.find_mut(&selected.id) {
                let _ = tx.apply(StatusTransition::Failed(EXECUTION_DROPPED_MESSAGE.to_string()));
            }
        }
        self.manager.notify(QueueNotification::Failed {
            id: selected.id.clone(),
            kind: selected.kind,
            description: selected.description.clone(),
            error: EXECUTION_DROPPED_MESSAGE.to_string(),
        });
        self.manager.wake.notify_one();
    }
}

/// Manager for the transaction queue
pub struct TxQueueManager {
    state: Mutex<QueueState>,
    broadcaster: Option<Arc<QueueEventBroadcaster>>,
    /// How long a successful record stays in the backlog
    success_expiry: Duration,
    /// Signalled whenever new work may be eligible
    wake: Notify,
}

impl TxQueueManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            broadcaster: None,
            success_expiry: Duration::from_secs(DEFAULT_SUCCESS_EXPIRY_SECS),
            wake: Notify::new(),
        }
    }

    /// Create a queue that reports queued/succeeded/failed through `broadcaster`
    pub fn with_broadcaster(broadcaster: Arc<QueueEventBroadcaster>) -> Self {
        Self {
            broadcaster: Some(broadcaster),
            ..Self::new()
        }
    }

    pub fn with_success_expiry(mut self, expiry: Duration) -> Self {
        self.success_expiry = expiry;
        self
    }

    /// Append a pending record and return its id. Never fails.
    pub fn enqueue<F>(&self, action: F, description: impl Into<String>, kind: TxKind) -> String
    where
        F: Future<Output = ActionResult> + Send + 'static,
    {
        let id = Uuid::new_v4().to_string();
        let description = description.into();
        let tx = QueuedTransaction::new(id.clone(), kind, description.clone(), action.boxed());

        self.state.lock().backlog.push(tx);

        log::info!("[TxQueue] Queued {} ({}): {}", id, kind, description);
        self.notify(QueueNotification::Queued {
            id: id.clone(),
            kind,
            description,
        });
        self.wake.notify_one();
        id
    }

    /// Remove a record in any status. Does not cancel an in-flight action.
    pub fn remove(&self, id: &str) -> Option<TxRecordSummary> {
        let mut state = self.state.lock();
        let pos = state.backlog.iter().position(|tx| tx.id == id)?;
        let tx = state.backlog.remove(pos);
        log::info!("[TxQueue] Removed {} ({})", id, tx.status);
        Some(TxRecordSummary::from(&tx))
    }

    /// Drop every record. Does not cancel an in-flight action.
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.backlog.len();
        state.backlog.clear();
        if count > 0 {
            log::info!("[TxQueue] Cleared {} transactions", count);
        }
        count
    }

    /// Apply an explicit status transition.
    ///
    /// Returns `Ok(false)` when the id is unknown. Illegal moves are rejected
    /// and leave the record unchanged; moving a record to processing also
    /// requires the execution slot to be free. A record being executed by
    /// `execute_next` is settled by its action only.
    pub fn update_status(&self, id: &str, transition: StatusTransition) -> Result<bool, TransitionError> {
        let mut state = self.state.lock();
        if state.in_flight.as_deref() == Some(id) {
            return Err(TransitionError::InFlight { id: id.to_string() });
        }
        let busy = state.is_busy();
        let Some(tx) = state.find_mut(id) else {
            return Ok(false);
        };

        if transition == StatusTransition::Processing && tx.status == TxStatus::Pending && busy {
            return Err(TransitionError::SlotBusy { id: id.to_string() });
        }

        let to = transition.target();
        tx.apply(transition)?;
        drop(state);

        log::info!("[TxQueue] Updated {} status to {}", id, to);
        if to.is_terminal() {
            self.wake.notify_one();
        }
        Ok(true)
    }

    /// Run the earliest pending record if the execution slot is free.
    ///
    /// Returns `false` without touching any state when the slot is busy or
    /// nothing is pending. Otherwise awaits the action, records the outcome,
    /// releases the slot and returns `true`. Action failures never propagate.
    pub async fn execute_next(self: &Arc<Self>) -> bool {
        let (selected, action) = {
            let mut state = self.state.lock();
            if state.is_busy() {
                log::debug!("[TxQueue] Execution slot busy, skipping");
                return false;
            }
            let Some(tx) = state
                .backlog
                .iter_mut()
                .find(|tx| tx.status == TxStatus::Pending)
            else {
                return false;
            };
            if let Err(e) = tx.apply(StatusTransition::Processing) {
                log::error!("[TxQueue] {}", e);
                return false;
            }
            let action = tx.take_action();
            let selected = Selected {
                id: tx.id.clone(),
                kind: tx.kind,
                description: tx.description.clone(),
            };
            state.in_flight = Some(selected.id.clone());
            (selected, action)
        };

        log::info!(
            "[TxQueue] Executing {} ({}): {}",
            selected.id, selected.kind, selected.description
        );

        let outcome = {
            let mut guard = InFlightGuard {
                manager: self.as_ref(),
                selected: &selected,
                armed: true,
            };

            let outcome = match action {
                Some(action) => match AssertUnwindSafe(action).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => Err(ActionError::from_panic(panic)),
                },
                None => Err(ActionError::new("Transaction has no action to execute")),
            };

            guard.armed = false;
            outcome
        };

        self.settle(selected, outcome);
        true
    }

    fn settle(self: &Arc<Self>, selected: Selected, outcome: ActionResult) {
        let transition = match &outcome {
            Ok(output) => StatusTransition::Success(output.clone()),
            Err(e) => StatusTransition::Failed(e.display_message()),
        };

        let tracked = {
            let mut state = self.state.lock();
            state.in_flight = None;
            match state.find_mut(&selected.id) {
                Some(tx) => match tx.apply(transition) {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("[TxQueue] Outcome of {} not recorded: {}", selected.id, e);
                        false
                    }
                },
                None => {
                    log::debug!("[TxQueue] {} settled after removal", selected.id);
                    false
                }
            }
        };

        match outcome {
            Ok(result) => {
                log::info!("[TxQueue] Transaction {} succeeded: {}", selected.id, result);
                if tracked {
                    self.schedule_expiry(&selected.id);
                }
                self.notify(QueueNotification::Succeeded {
                    id: selected.id,
                    kind: selected.kind,
                    description: selected.description,
                    result,
                });
            }
            Err(e) => {
                let error = e.display_message();
                log::warn!("[TxQueue] Transaction {} failed: {}", selected.id, error);
                self.notify(QueueNotification::Failed {
                    id: selected.id,
                    kind: selected.kind,
                    description: selected.description,
                    error,
                });
            }
        }

        self.wake.notify_one();
    }

    fn schedule_expiry(self: &Arc<Self>, id: &str) {
        let queue = Arc::downgrade(self);
        let id = id.to_string();
        let delay = self.success_expiry;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(queue) = queue.upgrade() {
                if queue.remove(&id).is_some() {
                    log::debug!("[TxQueue] Expired {}", id);
                }
            }
        });
    }

    fn notify(&self, notification: QueueNotification) {
        if let Some(ref broadcaster) = self.broadcaster {
            broadcaster.broadcast(notification);
        }
    }

    /// Resolves after the next enqueue, settlement or terminal status update
    pub async fn wait_for_change(&self) {
        self.wake.notified().await;
    }

    /// Ordered backlog plus the busy flag, read under one lock
    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock();
        QueueSnapshot {
            transactions: state.backlog.iter().map(TxRecordSummary::from).collect(),
            is_processing: state.is_busy(),
        }
    }

    pub fn get(&self, id: &str) -> Option<TxRecordSummary> {
        self.state
            .lock()
            .backlog
            .iter()
            .find(|tx| tx.id == id)
            .map(TxRecordSummary::from)
    }

    pub fn is_processing(&self) -> bool {
        self.state.lock().is_busy()
    }

    pub fn count_by_status(&self, status: TxStatus) -> usize {
        self.state
            .lock()
            .backlog
            .iter()
            .filter(|tx| tx.status == status)
            .count()
    }

    pub fn len(&self) -> usize {
        self.state.lock().backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TxQueueManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the application's queue. Built once at startup and handed to
/// callers as an `Arc`.
pub fn create_tx_queue_manager(
    broadcaster: Option<Arc<QueueEventBroadcaster>>,
    success_expiry: Duration,
) -> Arc<TxQueueManager> {
    let manager = match broadcaster {
        Some(b) => TxQueueManager::with_broadcaster(b),
        None => TxQueueManager::new(),
    };
    Arc::new(manager.with_success_expiry(success_expiry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::demo::{reject_after, resolve_after};
    use crate::actions::ActionOutput;
    use std::future::pending;

    fn hash(s: &str) -> ActionOutput {
        ActionOutput::TxHash(s.to_string())
    }

    fn statuses(queue: &TxQueueManager) -> Vec<TxStatus> {
        queue.snapshot().transactions.iter().map(|t| t.status).collect()
    }

    async fn wait_until_processing(queue: &TxQueueManager) {
        while !queue.is_processing() {
            tokio::task::yield_now().await;
        }
    }

    async fn exploding() -> ActionResult {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn test_enqueue_preserves_insertion_order() {
        let queue = TxQueueManager::new();
        let ids: Vec<String> = (0..5)
            .map(|i| {
                queue.enqueue(
                    resolve_after(Duration::ZERO, hash("0x")),
                    format!("tx {}", i),
                    TxKind::Transfer,
                )
            })
            .collect();

        let snapshot = queue.snapshot();
        assert_eq!(snapshot.ids(), ids.iter().map(String::as_str).collect::<Vec<_>>());
        assert!(snapshot.transactions.iter().all(|t| t.status == TxStatus::Pending));
        assert!(!snapshot.is_processing);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let queue = TxQueueManager::new();
        let mut ids: Vec<String> = (0..50)
            .map(|_| queue.enqueue(resolve_after(Duration::ZERO, hash("0x")), "t", TxKind::Transfer))
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn test_execute_next_selects_earliest() {
        let queue = Arc::new(TxQueueManager::new());
        let a = queue.enqueue(resolve_after(Duration::ZERO, hash("0xa")), "A", TxKind::Transfer);
        let b = queue.enqueue(resolve_after(Duration::ZERO, hash("0xb")), "B", TxKind::Swap);

        assert!(queue.execute_next().await);

        assert_eq!(queue.get(&a).unwrap().status, TxStatus::Success);
        assert_eq!(queue.get(&b).unwrap().status, TxStatus::Pending);
    }

    #[tokio::test]
    async fn test_execute_next_with_nothing_pending() {
        let queue = Arc::new(TxQueueManager::new());
        assert!(!queue.execute_next().await);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_stores_result_and_expires() {
        let queue = Arc::new(TxQueueManager::new());
        let id = queue.enqueue(resolve_after(Duration::from_millis(5), hash("0xfeed")), "R", TxKind::Transfer);

        assert!(queue.execute_next().await);
        let record = queue.get(&id).unwrap();
        assert_eq!(record.status, TxStatus::Success);
        assert_eq!(record.result, Some(hash("0xfeed")));
        assert!(record.error.is_none());
        assert!(!queue.is_processing());

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(queue.get(&id).is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(queue.get(&id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_expiry() {
        let queue = create_tx_queue_manager(None, Duration::from_secs(5));
        let id = queue.enqueue(resolve_after(Duration::ZERO, hash("0x1")), "R", TxKind::Approve);
        queue.execute_next().await;

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(queue.get(&id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_record() {
        let queue = Arc::new(TxQueueManager::new());
        let id = queue.enqueue(reject_after(Duration::ZERO, "boom"), "F", TxKind::Swap);

        assert!(queue.execute_next().await);
        let record = queue.get(&id).unwrap();
        assert_eq!(record.status, TxStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.result.is_none());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(queue.get(&id).unwrap().status, TxStatus::Failed);
    }

    #[tokio::test]
    async fn test_failure_without_message_uses_fallback() {
        let queue = Arc::new(TxQueueManager::new());
        let id = queue.enqueue(reject_after(Duration::ZERO, ""), "F", TxKind::Transfer);
        queue.execute_next().await;
        assert_eq!(queue.get(&id).unwrap().error.as_deref(), Some("Transaction failed"));
    }

    #[tokio::test]
    async fn test_panicking_action_fails_and_frees_slot() {
        let queue = Arc::new(TxQueueManager::new());
        let bad = queue.enqueue(exploding(), "panics", TxKind::ContractCall);
        let good = queue.enqueue(resolve_after(Duration::ZERO, hash("0x2")), "ok", TxKind::Transfer);

        assert!(queue.execute_next().await);
        let record = queue.get(&bad).unwrap();
        assert_eq!(record.status, TxStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("kaboom"));
        assert!(!queue.is_processing());

        assert!(queue.execute_next().await);
        assert_eq!(queue.get(&good).unwrap().status, TxStatus::Success);
    }

    #[tokio::test]
    async fn test_remove_missing_id_is_noop() {
        let queue = TxQueueManager::new();
        queue.enqueue(resolve_after(Duration::ZERO, hash("0x")), "A", TxKind::Transfer);
        let before = queue.snapshot().ids().iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert!(queue.remove("does-not-exist").is_none());

        let after = queue.snapshot();
        assert_eq!(after.ids(), before.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_remove_any_status() {
        let queue = Arc::new(TxQueueManager::new());
        let done = queue.enqueue(reject_after(Duration::ZERO, "x"), "done", TxKind::Transfer);
        let waiting = queue.enqueue(resolve_after(Duration::ZERO, hash("0x")), "waiting", TxKind::Transfer);
        queue.execute_next().await;

        assert_eq!(queue.remove(&done).unwrap().status, TxStatus::Failed);
        assert_eq!(queue.remove(&waiting).unwrap().status, TxStatus::Pending);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_scenario_regardless_of_latency() {
        let queue = Arc::new(TxQueueManager::new());
        let started: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let step = |label: &'static str, delay_ms: u64, outcome: Result<&'static str, &'static str>| {
            let started = started.clone();
            let observer = queue.clone();
            async move {
                started.lock().push(label);
                assert_eq!(observer.count_by_status(TxStatus::Processing), 1);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                match outcome {
                    Ok(v) => Ok(ActionOutput::TxHash(v.to_string())),
                    Err(e) => Err(ActionError::new(e)),
                }
            }
        };

        let a = queue.enqueue(step("a", 10, Ok("a")), "a", TxKind::Transfer);
        let b = queue.enqueue(step("b", 5, Ok("b")), "b", TxKind::Transfer);
        let c = queue.enqueue(step("c", 0, Err("c-fail")), "c", TxKind::Transfer);

        while queue.execute_next().await {
            assert!(queue.count_by_status(TxStatus::Processing) <= 1);
        }

        assert_eq!(*started.lock(), vec!["a", "b", "c"]);
        assert_eq!(queue.get(&a).unwrap().result, Some(hash("a")));
        assert_eq!(queue.get(&b).unwrap().result, Some(hash("b")));
        let c = queue.get(&c).unwrap();
        assert_eq!(c.status, TxStatus::Failed);
        assert_eq!(c.error.as_deref(), Some("c-fail"));
        assert_eq!(
            statuses(&queue),
            vec![TxStatus::Success, TxStatus::Success, TxStatus::Failed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_while_busy_is_ignored() {
        let queue = Arc::new(TxQueueManager::new());
        let a = queue.enqueue(resolve_after(Duration::from_millis(10), hash("0xa")), "A", TxKind::Transfer);
        let b = queue.enqueue(resolve_after(Duration::ZERO, hash("0xb")), "B", TxKind::Transfer);

        let (first, second) = tokio::join!(queue.execute_next(), queue.execute_next());
        assert!(first);
        assert!(!second);
        assert_eq!(queue.get(&a).unwrap().status, TxStatus::Success);
        assert_eq!(queue.get(&b).unwrap().status, TxStatus::Pending);
    }

    #[tokio::test]
    async fn test_stuck_action_blocks_queue() {
        let queue = Arc::new(TxQueueManager::new());
        let stuck = queue.enqueue(pending::<ActionResult>(), "never settles", TxKind::Swap);

        let runner = queue.clone();
        let handle = tokio::spawn(async move { runner.execute_next().await });
        wait_until_processing(&queue).await;

        let second = queue.enqueue(resolve_after(Duration::ZERO, hash("0x2")), "second", TxKind::Transfer);
        for _ in 0..10 {
            assert!(!queue.execute_next().await);
            tokio::task::yield_now().await;
        }

        assert_eq!(queue.get(&stuck).unwrap().status, TxStatus::Processing);
        assert_eq!(queue.get(&second).unwrap().status, TxStatus::Pending);
        assert!(queue.snapshot().is_processing);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_while_processing_keeps_slot() {
        let queue = Arc::new(TxQueueManager::new());
        let a = queue.enqueue(resolve_after(Duration::from_secs(10), hash("0xa")), "A", TxKind::Transfer);
        let b = queue.enqueue(resolve_after(Duration::ZERO, hash("0xb")), "B", TxKind::Transfer);

        let runner = queue.clone();
        let handle = tokio::spawn(async move { runner.execute_next().await });
        wait_until_processing(&queue).await;

        assert!(queue.remove(&a).is_some());
        assert!(queue.snapshot().is_processing);
        assert!(!queue.execute_next().await);

        assert!(handle.await.unwrap());
        assert!(queue.get(&a).is_none());
        assert!(!queue.is_processing());

        assert!(queue.execute_next().await);
        assert_eq!(queue.get(&b).unwrap().status, TxStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_does_not_cancel_in_flight() {
        let queue = Arc::new(TxQueueManager::new());
        queue.enqueue(resolve_after(Duration::from_secs(1), hash("0xa")), "A", TxKind::Transfer);
        queue.enqueue(resolve_after(Duration::ZERO, hash("0xb")), "B", TxKind::Transfer);

        let runner = queue.clone();
        let handle = tokio::spawn(async move { runner.execute_next().await });
        wait_until_processing(&queue).await;

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert!(queue.is_processing());

        assert!(handle.await.unwrap());
        assert!(!queue.is_processing());
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_execution_releases_slot() {
        let broadcaster = Arc::new(QueueEventBroadcaster::new());
        let (_client, mut rx) = broadcaster.subscribe();
        let queue = Arc::new(TxQueueManager::with_broadcaster(broadcaster));
        let id = queue.enqueue(pending::<ActionResult>(), "stuck", TxKind::Transfer);

        let result = tokio::time::timeout(Duration::from_secs(1), queue.execute_next()).await;
        assert!(result.is_err());

        let record = queue.get(&id).unwrap();
        assert_eq!(record.status, TxStatus::Failed);
        assert_eq!(record.error.as_deref(), Some(EXECUTION_DROPPED_MESSAGE));
        assert!(!queue.is_processing());

        assert_eq!(rx.recv().await.unwrap().name(), "tx_queue.queued");
        assert_eq!(
            rx.recv().await.unwrap(),
            QueueNotification::Failed {
                id,
                kind: TxKind::Transfer,
                description: "stuck".to_string(),
                error: EXECUTION_DROPPED_MESSAGE.to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_status_cannot_settle_in_flight_record() {
        let broadcaster = Arc::new(QueueEventBroadcaster::new());
        let (_client, mut rx) = broadcaster.subscribe();
        let queue = Arc::new(TxQueueManager::with_broadcaster(broadcaster));
        let id = queue.enqueue(reject_after(Duration::from_secs(1), "real failure"), "R", TxKind::Transfer);

        let runner = queue.clone();
        let handle = tokio::spawn(async move { runner.execute_next().await });
        wait_until_processing(&queue).await;

        assert_eq!(
            queue.update_status(&id, StatusTransition::Success(hash("0xforged"))),
            Err(TransitionError::InFlight { id: id.clone() })
        );
        assert_eq!(
            queue.update_status(&id, StatusTransition::Failed("operator".to_string())),
            Err(TransitionError::InFlight { id: id.clone() })
        );
        assert_eq!(queue.get(&id).unwrap().status, TxStatus::Processing);

        assert!(handle.await.unwrap());
        let record = queue.get(&id).unwrap();
        assert_eq!(record.status, TxStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("real failure"));
        assert!(record.result.is_none());

        rx.recv().await.unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            QueueNotification::Failed {
                id,
                kind: TxKind::Transfer,
                description: "R".to_string(),
                error: "real failure".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_update_status_rejects_illegal_jump() {
        let queue = TxQueueManager::new();
        let id = queue.enqueue(resolve_after(Duration::ZERO, hash("0x")), "A", TxKind::Transfer);

        let err = queue
            .update_status(&id, StatusTransition::Success(hash("0xforged")))
            .unwrap_err();
        assert!(matches!(err, TransitionError::IllegalTransition { .. }));

        let record = queue.get(&id).unwrap();
        assert_eq!(record.status, TxStatus::Pending);
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn test_update_status_missing_id_is_noop() {
        let queue = TxQueueManager::new();
        assert_eq!(
            queue.update_status("nope", StatusTransition::Processing),
            Ok(false)
        );
    }

    #[tokio::test]
    async fn test_update_status_respects_slot() {
        let queue = Arc::new(TxQueueManager::new());
        let a = queue.enqueue(resolve_after(Duration::ZERO, hash("0xa")), "A", TxKind::Transfer);
        let b = queue.enqueue(resolve_after(Duration::ZERO, hash("0xb")), "B", TxKind::Transfer);

        assert_eq!(queue.update_status(&a, StatusTransition::Processing), Ok(true));
        assert_eq!(
            queue.update_status(&b, StatusTransition::Processing),
            Err(TransitionError::SlotBusy { id: b.clone() })
        );
        // a manually processing record also holds the slot for execute_next
        assert!(!queue.execute_next().await);

        assert_eq!(
            queue.update_status(&a, StatusTransition::Failed("cancelled by operator".to_string())),
            Ok(true)
        );
        assert!(queue.execute_next().await);
        assert_eq!(queue.get(&b).unwrap().status, TxStatus::Success);
    }

    #[tokio::test]
    async fn test_notifications_in_order() {
        let broadcaster = Arc::new(QueueEventBroadcaster::new());
        let (_client, mut rx) = broadcaster.subscribe();
        let queue = Arc::new(TxQueueManager::with_broadcaster(broadcaster));

        let a = queue.enqueue(resolve_after(Duration::ZERO, hash("0xa")), "Send 1 ETH", TxKind::Transfer);
        let b = queue.enqueue(reject_after(Duration::ZERO, "user rejected"), "Swap", TxKind::Swap);
        queue.execute_next().await;
        queue.execute_next().await;

        assert_eq!(
            rx.recv().await.unwrap(),
            QueueNotification::Queued {
                id: a.clone(),
                kind: TxKind::Transfer,
                description: "Send 1 ETH".to_string()
            }
        );
        assert_eq!(rx.recv().await.unwrap().id(), b);
        assert_eq!(
            rx.recv().await.unwrap(),
            QueueNotification::Succeeded {
                id: a,
                kind: TxKind::Transfer,
                description: "Send 1 ETH".to_string(),
                result: hash("0xa")
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            QueueNotification::Failed {
                id: b,
                kind: TxKind::Swap,
                description: "Swap".to_string(),
                error: "user rejected".to_string()
            }
        );
    }
}
