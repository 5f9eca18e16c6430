//! The Shake record and its status machine
//!
//! A shake is the atomic escrowed agreement between a requester and a
//! worker. Child shakes are funded out of their parent's remaining budget
//! rather than a fresh deposit, so a child carries no custody of its own.

use crate::{Digest32, PrincipalId, ShakeId, Units};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The freeze sentinel: a time ceiling no real window ever reaches
///
/// Written into `dispute_frozen_until` on an ancestor when any descendant
/// disputes; cleared only once the ancestor's whole subtree is clean.
pub const FREEZE_CEILING: DateTime<Utc> = DateTime::<Utc>::MAX_UTC;

/// Lifecycle status of a shake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShakeStatus {
    /// Funded, awaiting a worker
    Pending,
    /// Accepted by a worker; budget opened for child shakes
    Active,
    /// Delivery fingerprint submitted; dispute window running
    Delivered,
    /// Paid out to the worker
    Released,
    /// Contested by the requester; awaiting the treasury's decision
    Disputed,
    /// Returned to the requester
    Refunded,
}

impl ShakeStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded)
    }

    /// Validates whether a status transition is allowed.
    ///
    /// Valid transitions:
    /// - Pending → Active (worker accepts)
    /// - Pending → Refunded (deadline passes unaccepted)
    /// - Active → Delivered (worker submits proof)
    /// - Active → Refunded (deadline passes undelivered)
    /// - Delivered → Released (requester accepts, or window closes clean)
    /// - Delivered → Disputed (requester contests inside the window)
    /// - Disputed → Released (treasury sides with the worker)
    /// - Disputed → Refunded (treasury sides with the requester)
    ///
    /// Released and Refunded are terminal.
    pub fn can_transition_to(&self, next: ShakeStatus) -> bool {
        use ShakeStatus::*;
        matches!(
            (self, next),
            (Pending, Active)
                | (Pending, Refunded)
                | (Active, Delivered)
                | (Active, Refunded)
                | (Delivered, Released)
                | (Delivered, Disputed)
                | (Disputed, Released)
                | (Disputed, Refunded)
        )
    }
}

impl fmt::Display for ShakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Delivered => "Delivered",
            Self::Released => "Released",
            Self::Disputed => "Disputed",
            Self::Refunded => "Refunded",
        };
        write!(f, "{s}")
    }
}

/// A shake: one escrowed task agreement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shake {
    /// Dense monotonic id assigned at creation
    pub id: ShakeId,
    /// Principal that funded this shake (for children, the parent's worker)
    pub requester: PrincipalId,
    /// Accepted worker; unset until Active
    pub worker: Option<PrincipalId>,
    /// Units committed at creation; immutable
    pub amount: Units,
    /// Parent shake when this is a child funded from a parent's budget
    pub parent: Option<ShakeId>,
    /// Current lifecycle status
    pub status: ShakeStatus,
    /// Digest of the task specification; immutable
    pub task_fingerprint: Digest32,
    /// Digest of the delivery proof; set at Delivered
    pub delivery_fingerprint: Option<Digest32>,
    /// When the shake was created
    pub created_at: DateTime<Utc>,
    /// Absolute time after which an unfulfilled shake may be refunded
    pub deadline_at: DateTime<Utc>,
    /// When delivery was submitted
    pub delivered_at: Option<DateTime<Utc>>,
    /// Freeze sentinel extending the effective dispute window while a
    /// descendant dispute is open
    pub dispute_frozen_until: Option<DateTime<Utc>>,
    /// Requester's public-key hash for confidential delivery; opaque
    pub requester_pubkey_hash: Option<Digest32>,
    /// Encrypted delivery-key digest; opaque, set at Delivered
    pub encrypted_delivery_key: Option<Digest32>,
}

impl Shake {
    /// Check if this shake was funded from a parent's budget
    pub fn is_child(&self) -> bool {
        self.parent.is_some()
    }

    /// Check if the shake has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check if a descendant dispute has frozen this shake
    pub fn is_frozen(&self) -> bool {
        self.dispute_frozen_until.is_some()
    }

    /// End of the window in which only the requester may settle this shake
    ///
    /// `None` before delivery. The freeze sentinel raises the end past any
    /// elapsed wall time until the subtree is clean again.
    pub fn effective_window_end(&self, dispute_window: Duration) -> Option<DateTime<Utc>> {
        let base = self.delivered_at? + dispute_window;
        Some(match self.dispute_frozen_until {
            Some(frozen_until) if frozen_until > base => frozen_until,
            _ => base,
        })
    }
}
