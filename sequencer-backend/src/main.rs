use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use sequencer_backend::actions::{demo, ChainClient};
use sequencer_backend::config::Config;
use sequencer_backend::events::QueueEventBroadcaster;
use sequencer_backend::tx_queue::{self, QueueNotification, TxKind};
use sequencer_backend::wallet;

/// Upper bound on how long the demo waits for the queue to drain
const DRAIN_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    log::info!(
        "Starting sequencer on {} (chain {}) via {}",
        config.network, config.chain_id, config.rpc_url
    );

    let broadcaster = Arc::new(QueueEventBroadcaster::new());
    let queue = tx_queue::create_tx_queue_manager(Some(broadcaster.clone()), config.success_expiry);

    // Toast collaborator: log every notification
    let (_client_id, mut notifications) = broadcaster.subscribe();
    tokio::spawn(async move {
        while let Some(n) = notifications.recv().await {
            match &n {
                QueueNotification::Queued { description, .. } => {
                    log::info!("[toast] Queued: {}", description)
                }
                QueueNotification::Succeeded { description, result, .. } => {
                    log::info!("[toast] Done: {} ({})", description, result)
                }
                QueueNotification::Failed { description, error, .. } => {
                    log::warn!("[toast] Failed: {} ({})", description, error)
                }
            }
        }
    });

    let shutdown = CancellationToken::new();
    let driver = tx_queue::spawn_driver(queue.clone(), shutdown.clone());

    let wallet_provider = match wallet::create_wallet_provider() {
        Ok(provider) => provider,
        Err(e) => {
            log::error!("Wallet provider unavailable: {}", e);
            None
        }
    };

    match ChainClient::from_config(&config, wallet_provider) {
        Ok(client) => match client.wallet_address() {
            Some(owner) => {
                queue.enqueue(
                    async move { client.native_balance(owner).await },
                    format!("Read native balance of {:?}", owner),
                    TxKind::ContractRead,
                );
            }
            None => log::info!("No wallet configured, skipping on-chain read"),
        },
        Err(e) => log::warn!("Chain client unavailable: {}", e),
    }

    queue.enqueue(
        demo::mock_transfer(Duration::from_millis(400)),
        "Send 0.01 ETH to vitalik.eth",
        TxKind::Transfer,
    );
    queue.enqueue(
        demo::mock_transfer(Duration::from_millis(150)),
        "Approve USDC for router",
        TxKind::Approve,
    );
    queue.enqueue(
        demo::reject_after(Duration::from_millis(100), "User rejected the request"),
        "Swap 100 USDC for WETH",
        TxKind::Swap,
    );

    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        loop {
            let snapshot = queue.snapshot();
            if !snapshot.is_processing
                && snapshot.transactions.iter().all(|t| t.status.is_terminal())
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await;

    if drained.is_err() {
        log::warn!("Queue did not drain within {}s", DRAIN_TIMEOUT.as_secs());
    }

    match serde_json::to_string_pretty(&queue.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize snapshot: {}", e),
    }

    shutdown.cancel();
    if let Err(e) = driver.await {
        log::error!("Queue driver task failed: {}", e);
    }
}
