//! OpenShake Reputation - Post-settlement outcome ledger
//!
//! The engine reports every terminal outcome of a worked shake to a
//! reputation sink: how much the worker earned and whether the outcome was
//! a success. The sink is an advisory side channel - settlement never gates
//! on it - and must be idempotent per shake, so `record` carries the shake
//! id as its deduplication key.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use openshake_types::{PrincipalId, ShakeId, Units};

/// Errors a reputation sink may surface
///
/// The engine logs and swallows these; they never fail a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReputationError {
    #[error("outcome rejected: {reason}")]
    Rejected { reason: String },
}

pub type Result<T> = std::result::Result<T, ReputationError>;

/// One settled outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// The settled shake; the sink's idempotence key
    pub shake_id: ShakeId,
    /// Worker the outcome belongs to
    pub worker: PrincipalId,
    /// Units the worker actually received
    pub earned: Units,
    /// Whether the shake settled in the worker's favor
    pub success: bool,
    /// When the sink accepted the record
    pub recorded_at: DateTime<Utc>,
}

/// Receiver of post-settlement outcome records
#[async_trait]
pub trait ReputationSink: Send + Sync {
    /// Record a terminal outcome; repeated calls for the same shake are
    /// accepted and ignored
    async fn record(
        &self,
        shake_id: ShakeId,
        worker: &PrincipalId,
        earned: Units,
        success: bool,
    ) -> Result<()>;
}

/// In-memory reference sink with an append-only outcome log
#[derive(Debug, Default)]
pub struct InMemoryReputation {
    outcomes: RwLock<Vec<OutcomeRecord>>,
    seen: RwLock<HashSet<ShakeId>>,
}

impl InMemoryReputation {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All outcomes for a worker, oldest first
    pub async fn outcomes_for(&self, worker: &PrincipalId) -> Vec<OutcomeRecord> {
        self.outcomes
            .read()
            .await
            .iter()
            .filter(|o| &o.worker == worker)
            .cloned()
            .collect()
    }

    /// Total units a worker has earned across recorded outcomes
    pub async fn total_earned(&self, worker: &PrincipalId) -> Units {
        self.outcomes
            .read()
            .await
            .iter()
            .filter(|o| &o.worker == worker)
            .fold(Units::ZERO, |acc, o| acc.saturating_add(o.earned))
    }

    /// Fraction of a worker's outcomes that were successes
    pub async fn success_rate(&self, worker: &PrincipalId) -> Option<f64> {
        let outcomes = self.outcomes.read().await;
        let (successes, total) = outcomes
            .iter()
            .filter(|o| &o.worker == worker)
            .fold((0u64, 0u64), |(s, t), o| {
                (s + u64::from(o.success), t + 1)
            });
        (total > 0).then(|| successes as f64 / total as f64)
    }

    /// Per-worker earned totals across all recorded outcomes
    pub async fn leaderboard(&self) -> HashMap<PrincipalId, Units> {
        let outcomes = self.outcomes.read().await;
        let mut totals: HashMap<PrincipalId, Units> = HashMap::new();
        for outcome in outcomes.iter() {
            let entry = totals.entry(outcome.worker.clone()).or_insert(Units::ZERO);
            *entry = entry.saturating_add(outcome.earned);
        }
        totals
    }

    /// Number of recorded outcomes
    pub async fn len(&self) -> usize {
        self.outcomes.read().await.len()
    }

    /// Check if no outcomes have been recorded
    pub async fn is_empty(&self) -> bool {
        self.outcomes.read().await.is_empty()
    }
}

#[async_trait]
impl ReputationSink for InMemoryReputation {
    async fn record(
        &self,
        shake_id: ShakeId,
        worker: &PrincipalId,
        earned: Units,
        success: bool,
    ) -> Result<()> {
        let mut seen = self.seen.write().await;
        if !seen.insert(shake_id) {
            return Ok(());
        }

        self.outcomes.write().await.push(OutcomeRecord {
            shake_id,
            worker: worker.clone(),
            earned,
            success,
            recorded_at: Utc::now(),
        });
        Ok(())
    }
}
