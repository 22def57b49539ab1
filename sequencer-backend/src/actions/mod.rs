//! Blockchain action functions
//!
//! An action is a lazy future that performs one externally visible effect
//! (a signed submission, a read call, or a bundle such as approve-then-swap)
//! and settles with an [`ActionOutput`] or an [`ActionError`]. The queue only
//! sequences actions; everything chain-specific lives here.
//!
//! Actions are not assumed retryable: a bundle can fail after an earlier step
//! already changed on-chain state.

pub mod abi;
mod chain;
pub mod demo;
pub mod erc20;
pub mod router;

pub use chain::ChainClient;
pub use tx_queue_types::ActionOutput;

use futures_util::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Message used when an action fails without saying why
pub const GENERIC_FAILURE_MESSAGE: &str = "Transaction failed";

/// Failure of an action, carrying a human-readable message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        ActionError {
            message: message.into(),
        }
    }

    /// Build an error from a caught panic payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::new()
        };
        ActionError { message }
    }

    /// Message to store on a failed record; falls back to a generic one when empty
    pub fn display_message(&self) -> String {
        let trimmed = self.message.trim();
        if trimmed.is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_message())
    }
}

impl std::error::Error for ActionError {}

impl From<String> for ActionError {
    fn from(s: String) -> Self {
        ActionError::new(s)
    }
}

impl From<&str> for ActionError {
    fn from(s: &str) -> Self {
        ActionError::new(s)
    }
}

pub type ActionResult = Result<ActionOutput, ActionError>;

/// Boxed action as stored by the queue
pub type TxAction = BoxFuture<'static, ActionResult>;

/// Reject `action` if it has not settled within `deadline`.
///
/// The queue never applies a deadline itself; an action that never settles
/// holds the execution slot forever unless the caller wraps it here.
pub async fn with_deadline<F>(deadline: Duration, action: F) -> ActionResult
where
    F: Future<Output = ActionResult>,
{
    match tokio::time::timeout(deadline, action).await {
        Ok(result) => result,
        Err(_) => Err(ActionError::new(format!(
            "Action timed out after {}s",
            deadline.as_secs_f64()
        ))),
    }
}
