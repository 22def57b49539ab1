//! Demo actions that never touch a chain.
//!
//! They satisfy the same contract as [`ChainClient`](super::ChainClient)
//! methods and exist for the demo binary and tests only.

use std::time::Duration;

use super::{ActionError, ActionOutput, ActionResult};

/// Random 0x-prefixed 32-byte hash
pub fn random_tx_hash() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("0x{}", hex::encode(bytes))
}

/// Wait `delay`, then resolve with a random transaction hash
pub async fn mock_transfer(delay: Duration) -> ActionResult {
    tokio::time::sleep(delay).await;
    Ok(ActionOutput::TxHash(random_tx_hash()))
}

/// Wait `delay`, then resolve with `output`
pub async fn resolve_after(delay: Duration, output: ActionOutput) -> ActionResult {
    tokio::time::sleep(delay).await;
    Ok(output)
}

/// Wait `delay`, then reject with `message`
pub async fn reject_after(delay: Duration, message: impl Into<String>) -> ActionResult {
    let message = message.into();
    tokio::time::sleep(delay).await;
    Err(ActionError::new(message))
}
