use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tx_queue_types::QueueNotification;
use uuid::Uuid;

/// Max number of recent notifications kept for replay to late subscribers
const EVENT_BUFFER_SIZE: usize = 200;

/// Per-subscriber channel capacity
const SUBSCRIBER_CAPACITY: usize = 1000;

/// Internal commands sent to the background broadcast task.
enum BroadcastCmd {
    /// Deliver a notification to all current subscribers and buffer it for replay.
    Send(QueueNotification),
}

/// Fans queue notifications out to toast/alert collaborators.
///
/// `broadcast()` never blocks: the notification goes onto an internal channel
/// and a background tokio task does the cloning and per-subscriber delivery,
/// so the queue's execution path is never stalled by a slow subscriber.
/// Delivery order matches broadcast order.
pub struct QueueEventBroadcaster {
    cmd_tx: mpsc::UnboundedSender<BroadcastCmd>,
    clients: Arc<DashMap<String, mpsc::Sender<QueueNotification>>>,
    recent_events: Arc<Mutex<VecDeque<QueueNotification>>>,
}

impl QueueEventBroadcaster {
    /// Must be called inside a tokio runtime.
    pub fn new() -> Self {
        let clients: Arc<DashMap<String, mpsc::Sender<QueueNotification>>> =
            Arc::new(DashMap::new());
        let recent_events = Arc::new(Mutex::new(VecDeque::with_capacity(EVENT_BUFFER_SIZE)));

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run_loop(cmd_rx, clients.clone(), recent_events.clone()));

        Self {
            cmd_tx,
            clients,
            recent_events,
        }
    }

    /// Subscribe a new client and return (client_id, receiver).
    pub fn subscribe(&self) -> (String, mpsc::Receiver<QueueNotification>) {
        let client_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);

        // Inserted directly so notifications broadcast after this call reach the client
        self.clients.insert(client_id.clone(), tx);

        log::debug!("[TxQueueEvents] Client {} subscribed", client_id);
        (client_id, rx)
    }

    pub fn unsubscribe(&self, client_id: &str) {
        self.clients.remove(client_id);
        log::debug!("[TxQueueEvents] Client {} unsubscribed", client_id);
    }

    /// Queue a notification for delivery. Returns immediately.
    pub fn broadcast(&self, notification: QueueNotification) {
        let _ = self.cmd_tx.send(BroadcastCmd::Send(notification));
    }

    /// Snapshot of recent notifications for replaying to newly connected clients.
    pub fn get_recent_events(&self) -> Vec<QueueNotification> {
        self.recent_events.lock().iter().cloned().collect()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    // ── background task ──────────────────────────────────────────────

    async fn run_loop(
        mut cmd_rx: mpsc::UnboundedReceiver<BroadcastCmd>,
        clients: Arc<DashMap<String, mpsc::Sender<QueueNotification>>>,
        recent_events: Arc<Mutex<VecDeque<QueueNotification>>>,
    ) {
        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                BroadcastCmd::Send(notification) => {
                    {
                        let mut buffer = recent_events.lock();
                        if buffer.len() >= EVENT_BUFFER_SIZE {
                            buffer.pop_front();
                        }
                        buffer.push_back(notification.clone());
                    }

                    let event_name = notification.name();

                    if log::log_enabled!(log::Level::Debug) {
                        if let Ok(json) = serde_json::to_string(&notification) {
                            log::debug!(
                                "[TxQueueEvents] '{}' to {} client(s): {}",
                                event_name,
                                clients.len(),
                                json
                            );
                        }
                    }

                    let mut closed_clients = Vec::new();

                    for entry in clients.iter() {
                        match entry.value().try_send(notification.clone()) {
                            Ok(()) => {}
                            Err(mpsc::error::TrySendError::Full(_)) => {
                                log::warn!(
                                    "[TxQueueEvents] Channel full for client {}, dropping '{}'",
                                    entry.key(),
                                    event_name
                                );
                            }
                            Err(mpsc::error::TrySendError::Closed(_)) => {
                                closed_clients.push(entry.key().clone());
                            }
                        }
                    }

                    for client_id in closed_clients {
                        clients.remove(&client_id);
                        log::debug!("[TxQueueEvents] Removed disconnected client {}", client_id);
                    }
                }
            }
        }

        log::info!("[TxQueueEvents] Background broadcast loop shutting down");
    }
}

impl Default for QueueEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
