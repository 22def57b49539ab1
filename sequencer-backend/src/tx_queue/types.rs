//! Transaction queue data types

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use tx_queue_types::{ActionOutput, TxKind, TxRecordSummary, TxStatus};

use crate::actions::TxAction;

/// A requested status change. Only the legal moves can be expressed; the
/// record's current status decides whether the move is allowed.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusTransition {
    Processing,
    Success(ActionOutput),
    Failed(String),
}

impl StatusTransition {
    pub fn target(&self) -> TxStatus {
        match self {
            StatusTransition::Processing => TxStatus::Processing,
            StatusTransition::Success(_) => TxStatus::Success,
            StatusTransition::Failed(_) => TxStatus::Failed,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("illegal status transition for {id}: {from} -> {to}")]
    IllegalTransition {
        id: String,
        from: TxStatus,
        to: TxStatus,
    },

    #[error("cannot move {id} to processing: execution slot is busy")]
    SlotBusy { id: String },

    #[error("{id} is being executed; only its action can settle it")]
    InFlight { id: String },
}

/// A queued transaction. Owned by the queue from enqueue until removal.
pub struct QueuedTransaction {
    pub id: String,
    pub kind: TxKind,
    pub description: String,
    pub status: TxStatus,
    pub result: Option<ActionOutput>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Taken exactly once, when execution starts
    action: Option<TxAction>,
}

impl QueuedTransaction {
    pub fn new(id: String, kind: TxKind, description: String, action: TxAction) -> Self {
        Self {
            id,
            kind,
            description,
            status: TxStatus::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            action: Some(action),
        }
    }

    pub(crate) fn take_action(&mut self) -> Option<TxAction> {
        self.action.take()
    }

    /// Apply `transition` if it is legal from the current status; otherwise
    /// leave the record untouched.
    pub fn apply(&mut self, transition: StatusTransition) -> Result<(), TransitionError> {
        let to = transition.target();
        if !self.status.can_transition_to(to) {
            return Err(TransitionError::IllegalTransition {
                id: self.id.clone(),
                from: self.status,
                to,
            });
        }

        match transition {
            StatusTransition::Processing => {
                self.started_at = Some(Utc::now());
            }
            StatusTransition::Success(output) => {
                self.result = Some(output);
                self.completed_at = Some(Utc::now());
            }
            StatusTransition::Failed(error) => {
                self.error = Some(error);
                self.completed_at = Some(Utc::now());
            }
        }
        self.status = to;
        Ok(())
    }
}

impl fmt::Debug for QueuedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedTransaction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("status", &self.status)
            .field("result", &self.result)
            .field("error", &self.error)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

impl From<&QueuedTransaction> for TxRecordSummary {
    fn from(tx: &QueuedTransaction) -> Self {
        Self {
            id: tx.id.clone(),
            kind: tx.kind,
            description: tx.description.clone(),
            status: tx.status,
            result: tx.result.clone(),
            error: tx.error.clone(),
            created_at: tx.created_at,
            started_at: tx.started_at,
            completed_at: tx.completed_at,
        }
    }
}
