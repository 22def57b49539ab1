//! Shared types for the transaction queue and the clients that render it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =====================================================
// Domain Types
// =====================================================

/// Lifecycle status of a queued transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Waiting for the execution slot
    Pending,
    /// Holding the execution slot, action in flight
    Processing,
    /// Action resolved
    Success,
    /// Action rejected
    Failed,
}

impl TxStatus {
    /// Whether a record may move from `self` to `next`.
    ///
    /// Only `pending -> processing` and `processing -> {success, failed}` are legal.
    pub fn can_transition_to(self, next: TxStatus) -> bool {
        matches!(
            (self, next),
            (TxStatus::Pending, TxStatus::Processing)
                | (TxStatus::Processing, TxStatus::Success)
                | (TxStatus::Processing, TxStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Success | TxStatus::Failed)
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Processing => write!(f, "processing"),
            TxStatus::Success => write!(f, "success"),
            TxStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Operation category, used for display and grouping only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Transfer,
    Approve,
    Swap,
    AddLiquidity,
    RemoveLiquidity,
    ContractCall,
    ContractRead,
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxKind::Transfer => "transfer",
            TxKind::Approve => "approve",
            TxKind::Swap => "swap",
            TxKind::AddLiquidity => "add_liquidity",
            TxKind::RemoveLiquidity => "remove_liquidity",
            TxKind::ContractCall => "contract_call",
            TxKind::ContractRead => "contract_read",
        };
        write!(f, "{}", s)
    }
}

/// Value an action resolves with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ActionOutput {
    /// Hash of a submitted transaction
    TxHash(String),
    /// Decoded result of a read-only call
    Read(Value),
}

impl ActionOutput {
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            ActionOutput::TxHash(hash) => Some(hash),
            ActionOutput::Read(_) => None,
        }
    }
}

impl std::fmt::Display for ActionOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionOutput::TxHash(hash) => write!(f, "{}", hash),
            ActionOutput::Read(value) => write!(f, "{}", value),
        }
    }
}

// =====================================================
// Observation Types
// =====================================================

/// Display view of one queued transaction (the action itself is not exposed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecordSummary {
    pub id: String,
    pub kind: TxKind,
    pub description: String,
    pub status: TxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ActionOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Consistent read of the whole backlog, in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub transactions: Vec<TxRecordSummary>,
    /// True while a record holds the execution slot
    pub is_processing: bool,
}

impl QueueSnapshot {
    pub fn ids(&self) -> Vec<&str> {
        self.transactions.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn find(&self, id: &str) -> Option<&TxRecordSummary> {
        self.transactions.iter().find(|t| t.id == id)
    }
}

// =====================================================
// Notification Types
// =====================================================

/// Toast-style notification emitted by the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueNotification {
    Queued {
        id: String,
        kind: TxKind,
        description: String,
    },
    Succeeded {
        id: String,
        kind: TxKind,
        description: String,
        result: ActionOutput,
    },
    Failed {
        id: String,
        kind: TxKind,
        description: String,
        error: String,
    },
}

impl QueueNotification {
    pub fn id(&self) -> &str {
        match self {
            QueueNotification::Queued { id, .. }
            | QueueNotification::Succeeded { id, .. }
            | QueueNotification::Failed { id, .. } => id,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            QueueNotification::Queued { description, .. }
            | QueueNotification::Succeeded { description, .. }
            | QueueNotification::Failed { description, .. } => description,
        }
    }

    /// Event name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            QueueNotification::Queued { .. } => "tx_queue.queued",
            QueueNotification::Succeeded { .. } => "tx_queue.succeeded",
            QueueNotification::Failed { .. } => "tx_queue.failed",
        }
    }
}
