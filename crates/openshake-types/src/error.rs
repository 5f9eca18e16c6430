//! Error taxonomy for the OpenShake engine
//!
//! Every engine failure is a stable, enumerable tag; there are no free-form
//! error strings on the caller path. Timing violations carry the observed
//! clock reading and the relevant boundary.

use crate::{ShakeId, ShakeStatus, Units};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for OpenShake operations
pub type Result<T> = std::result::Result<T, ShakeError>;

/// OpenShake error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShakeError {
    // ========================================================================
    // Amount Errors
    // ========================================================================

    /// A shake cannot be created or funded with zero units
    #[error("Amount must be greater than zero")]
    AmountZero,

    /// A shake cannot be created with a zero deadline duration
    #[error("Deadline duration must be greater than zero")]
    DeadlineZero,

    /// Unit arithmetic overflow
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,

    /// Unit arithmetic underflow
    #[error("Amount underflow during arithmetic operation")]
    AmountUnderflow,

    // ========================================================================
    // Lookup Errors
    // ========================================================================

    /// Shake not found
    #[error("Shake {shake_id} not found")]
    ShakeNotFound { shake_id: ShakeId },

    // ========================================================================
    // Status Preconditions
    // ========================================================================

    /// Operation requires a Pending shake
    #[error("Shake {shake_id} is {status}, expected Pending")]
    NotPending { shake_id: ShakeId, status: ShakeStatus },

    /// Operation requires an Active shake
    #[error("Shake {shake_id} is {status}, expected Active")]
    NotActive { shake_id: ShakeId, status: ShakeStatus },

    /// Operation requires a Delivered shake
    #[error("Shake {shake_id} is {status}, expected Delivered")]
    NotDelivered { shake_id: ShakeId, status: ShakeStatus },

    /// Operation requires a Disputed shake
    #[error("Shake {shake_id} is {status}, expected Disputed")]
    NotDisputed { shake_id: ShakeId, status: ShakeStatus },

    /// Shake already has a worker
    #[error("Shake {shake_id} has already been accepted")]
    AlreadyAccepted { shake_id: ShakeId },

    /// Shake is not refundable in its current status
    #[error("Shake {shake_id} is {status} and cannot be refunded")]
    CannotRefund { shake_id: ShakeId, status: ShakeStatus },

    // ========================================================================
    // Authorization
    // ========================================================================

    /// Caller is not the shake's worker
    #[error("Caller is not the worker of shake {shake_id}")]
    NotWorker { shake_id: ShakeId },

    /// Caller is not the shake's requester
    #[error("Caller is not the requester of shake {shake_id}")]
    NotRequester { shake_id: ShakeId },

    /// Caller is not the treasury
    #[error("Caller is not the treasury")]
    NotTreasury,

    /// Caller is not the parent shake's worker
    #[error("Caller is not the worker of parent shake {parent_id}")]
    NotParentWorker { parent_id: ShakeId },

    // ========================================================================
    // Child-Shake Preconditions
    // ========================================================================

    /// Parent must be Active to hire children
    #[error("Parent shake {parent_id} is {status}, expected Active")]
    ParentNotActive { parent_id: ShakeId, status: ShakeStatus },

    /// Child amount exceeds the parent's unallocated budget
    #[error("Child amount {requested} exceeds remaining budget {remaining} of shake {parent_id}")]
    ExceedsParentBudget {
        parent_id: ShakeId,
        requested: Units,
        remaining: Units,
    },

    // ========================================================================
    // Timing Violations
    // ========================================================================

    /// Acceptance window has closed
    #[error("Deadline of shake {shake_id} passed at {deadline_at} (now {now})")]
    DeadlinePassed {
        shake_id: ShakeId,
        now: DateTime<Utc>,
        deadline_at: DateTime<Utc>,
    },

    /// Refund requested before the deadline
    #[error("Deadline of shake {shake_id} is {deadline_at}, not yet reached (now {now})")]
    DeadlineNotPassed {
        shake_id: ShakeId,
        now: DateTime<Utc>,
        deadline_at: DateTime<Utc>,
    },

    /// Third-party release attempted while the dispute window is open
    #[error("Dispute window of shake {shake_id} is open until {open_until} (now {now})")]
    DisputeWindowActive {
        shake_id: ShakeId,
        now: DateTime<Utc>,
        open_until: DateTime<Utc>,
    },

    /// Dispute attempted after the window closed
    #[error("Dispute window of shake {shake_id} closed at {closed_at} (now {now})")]
    DisputeWindowClosed {
        shake_id: ShakeId,
        now: DateTime<Utc>,
        closed_at: DateTime<Utc>,
    },

    // ========================================================================
    // Subtree Violations
    // ========================================================================

    /// A direct child has not reached a terminal state
    #[error("Child {child_id} of shake {shake_id} is not settled")]
    ChildrenNotSettled { shake_id: ShakeId, child_id: ShakeId },

    /// A descendant is under dispute
    #[error("Descendant {disputed_id} of shake {shake_id} is disputed")]
    SubtreeNotClean {
        shake_id: ShakeId,
        disputed_id: ShakeId,
    },

    // ========================================================================
    // Ledger Failures
    // ========================================================================

    /// Pulling funds into custody failed; no state was changed
    #[error("Ledger pull failed: {detail}")]
    LedgerPullFailed { detail: String },

    /// Paying out of custody failed; the operation was rolled back
    #[error("Ledger push failed: {detail}")]
    LedgerPushFailed { detail: String },
}

impl ShakeError {
    /// Get a stable error code for API surfaces and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AmountZero => "AMOUNT_ZERO",
            Self::DeadlineZero => "DEADLINE_ZERO",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::AmountUnderflow => "AMOUNT_UNDERFLOW",
            Self::ShakeNotFound { .. } => "SHAKE_NOT_FOUND",
            Self::NotPending { .. } => "NOT_PENDING",
            Self::NotActive { .. } => "NOT_ACTIVE",
            Self::NotDelivered { .. } => "NOT_DELIVERED",
            Self::NotDisputed { .. } => "NOT_DISPUTED",
            Self::AlreadyAccepted { .. } => "ALREADY_ACCEPTED",
            Self::CannotRefund { .. } => "CANNOT_REFUND",
            Self::NotWorker { .. } => "NOT_WORKER",
            Self::NotRequester { .. } => "NOT_REQUESTER",
            Self::NotTreasury => "NOT_TREASURY",
            Self::NotParentWorker { .. } => "NOT_PARENT_WORKER",
            Self::ParentNotActive { .. } => "PARENT_NOT_ACTIVE",
            Self::ExceedsParentBudget { .. } => "EXCEEDS_PARENT_BUDGET",
            Self::DeadlinePassed { .. } => "DEADLINE_PASSED",
            Self::DeadlineNotPassed { .. } => "DEADLINE_NOT_PASSED",
            Self::DisputeWindowActive { .. } => "DISPUTE_WINDOW_ACTIVE",
            Self::DisputeWindowClosed { .. } => "DISPUTE_WINDOW_CLOSED",
            Self::ChildrenNotSettled { .. } => "CHILDREN_NOT_SETTLED",
            Self::SubtreeNotClean { .. } => "SUBTREE_NOT_CLEAN",
            Self::LedgerPullFailed { .. } => "LEDGER_PULL_FAILED",
            Self::LedgerPushFailed { .. } => "LEDGER_PUSH_FAILED",
        }
    }

    /// Check if this failure was a caller error (retrying cannot help)
    pub fn is_precondition(&self) -> bool {
        !matches!(
            self,
            Self::LedgerPullFailed { .. } | Self::LedgerPushFailed { .. }
        )
    }
}
