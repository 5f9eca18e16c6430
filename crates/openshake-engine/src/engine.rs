//! The engine facade
//!
//! Every public operation runs as one serialized transaction: take the
//! store lock, validate, mutate, move funds, commit. Ledger pulls happen
//! before any state mutation; ledger pushes happen after the terminal
//! status write, and a push failure restores the prior record before the
//! error surfaces. The reputation sink is advisory and never fails a
//! settlement.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use openshake_fees::{FeePolicy, DEFAULT_BASE_BPS};
use openshake_ledger::LedgerAdapter;
use openshake_reputation::ReputationSink;
use openshake_types::{
    Clock, Digest32, PrincipalId, Result, Shake, ShakeError, ShakeId, ShakeStatus, Units,
};

use crate::store::ShakeStore;
use crate::subtree;

/// Engine configuration
///
/// The treasury principal receives fees and is the sole authority over
/// disputed shakes; it is fixed at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fee recipient and dispute resolver
    pub treasury: PrincipalId,
    /// Post-delivery window in which only the requester may settle
    pub dispute_window: Duration,
    /// Static fee rate used when no dynamic policy is bound
    pub protocol_fee_bps: u16,
}

impl EngineConfig {
    /// Defaults: 48 h dispute window, 250 bps static fee
    pub fn new(treasury: PrincipalId) -> Self {
        Self {
            treasury,
            dispute_window: Duration::hours(48),
            protocol_fee_bps: DEFAULT_BASE_BPS,
        }
    }

    /// Override the dispute window
    pub fn with_dispute_window(mut self, window: Duration) -> Self {
        self.dispute_window = window;
        self
    }

    /// Override the static fee rate
    pub fn with_protocol_fee_bps(mut self, bps: u16) -> Self {
        self.protocol_fee_bps = bps;
        self
    }
}

/// The OpenShake engine
///
/// Single-entry facade over the shake state machine and its recursive
/// composition. Operations on a given engine are serialized under one
/// store lock, so every transition observes a consistent tree.
pub struct ShakeEngine {
    store: RwLock<ShakeStore>,
    config: EngineConfig,
    ledger: Arc<dyn LedgerAdapter>,
    reputation: Arc<dyn ReputationSink>,
    fee_policy: Option<Arc<dyn FeePolicy>>,
    clock: Arc<dyn Clock>,
}

impl ShakeEngine {
    /// Create an engine with the static fee scalar
    pub fn new(
        config: EngineConfig,
        ledger: Arc<dyn LedgerAdapter>,
        reputation: Arc<dyn ReputationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: RwLock::new(ShakeStore::new()),
            config,
            ledger,
            reputation,
            fee_policy: None,
            clock,
        }
    }

    /// Bind a dynamic fee policy, replacing the static scalar
    pub fn with_fee_policy(mut self, policy: Arc<dyn FeePolicy>) -> Self {
        self.fee_policy = Some(policy);
        self
    }

    /// The configured treasury principal
    pub fn treasury(&self) -> &PrincipalId {
        &self.config.treasury
    }

    // ========================================================================
    // State-machine operations
    // ========================================================================

    /// Fund a new root shake from the caller's balance
    pub async fn create_shake(
        &self,
        caller: &PrincipalId,
        amount: Units,
        deadline_duration: Duration,
        task_fingerprint: Digest32,
        requester_pubkey_hash: Option<Digest32>,
    ) -> Result<Shake> {
        if amount.is_zero() {
            return Err(ShakeError::AmountZero);
        }
        if deadline_duration <= Duration::zero() {
            return Err(ShakeError::DeadlineZero);
        }

        let mut store = self.store.write().await;

        // pull before any state mutation; a failed pull leaves no trace
        self.ledger
            .pull(caller, amount)
            .await
            .map_err(|err| ShakeError::LedgerPullFailed {
                detail: err.to_string(),
            })?;

        let now = self.clock.now();
        let id = store.allocate_id();
        let shake = Shake {
            id,
            requester: caller.clone(),
            worker: None,
            amount,
            parent: None,
            status: ShakeStatus::Pending,
            task_fingerprint,
            delivery_fingerprint: None,
            created_at: now,
            deadline_at: now + deadline_duration,
            delivered_at: None,
            dispute_frozen_until: None,
            requester_pubkey_hash,
            encrypted_delivery_key: None,
        };
        store.insert(shake.clone());

        info!(%id, requester = %caller, %amount, "shake created");
        Ok(shake)
    }

    /// Accept a pending shake as its worker
    pub async fn accept_shake(&self, caller: &PrincipalId, id: ShakeId) -> Result<Shake> {
        let mut store = self.store.write().await;
        let now = self.clock.now();

        let accepted = {
            let shake = store.get_mut(id)?;
            if shake.status != ShakeStatus::Pending {
                if shake.worker.is_some() {
                    return Err(ShakeError::AlreadyAccepted { shake_id: id });
                }
                return Err(ShakeError::NotPending {
                    shake_id: id,
                    status: shake.status,
                });
            }
            if now >= shake.deadline_at {
                return Err(ShakeError::DeadlinePassed {
                    shake_id: id,
                    now,
                    deadline_at: shake.deadline_at,
                });
            }
            shake.worker = Some(caller.clone());
            shake.status = ShakeStatus::Active;
            shake.clone()
        };
        // the whole amount becomes hireable budget
        store.set_remaining(id, accepted.amount);

        info!(%id, worker = %caller, "shake accepted");
        Ok(accepted)
    }

    /// Submit the delivery fingerprint for an active shake
    pub async fn deliver_shake(
        &self,
        caller: &PrincipalId,
        id: ShakeId,
        delivery_fingerprint: Digest32,
        encrypted_key: Option<Digest32>,
    ) -> Result<Shake> {
        let mut store = self.store.write().await;
        let now = self.clock.now();

        let shake = store.get_mut(id)?;
        if shake.status != ShakeStatus::Active {
            return Err(ShakeError::NotActive {
                shake_id: id,
                status: shake.status,
            });
        }
        if shake.worker.as_ref() != Some(caller) {
            return Err(ShakeError::NotWorker { shake_id: id });
        }

        shake.delivery_fingerprint = Some(delivery_fingerprint);
        shake.encrypted_delivery_key = encrypted_key;
        shake.delivered_at = Some(now);
        shake.status = ShakeStatus::Delivered;
        let delivered = shake.clone();

        info!(%id, worker = %caller, "shake delivered");
        Ok(delivered)
    }

    /// Sub-contract part of an active shake's budget as a child shake
    ///
    /// No ledger movement happens here: the funds are already in custody
    /// under the parent's deposit, and only the parent's remaining-budget
    /// scalar shrinks.
    pub async fn create_child_shake(
        &self,
        caller: &PrincipalId,
        parent_id: ShakeId,
        amount: Units,
        deadline_duration: Duration,
        task_fingerprint: Digest32,
    ) -> Result<Shake> {
        if amount.is_zero() {
            return Err(ShakeError::AmountZero);
        }
        if deadline_duration <= Duration::zero() {
            return Err(ShakeError::DeadlineZero);
        }

        let mut store = self.store.write().await;
        let now = self.clock.now();

        let parent = store.get(parent_id)?;
        if parent.status != ShakeStatus::Active {
            return Err(ShakeError::ParentNotActive {
                parent_id,
                status: parent.status,
            });
        }
        if parent.worker.as_ref() != Some(caller) {
            return Err(ShakeError::NotParentWorker { parent_id });
        }
        let remaining = store.remaining(parent_id).unwrap_or(Units::ZERO);
        if amount > remaining {
            return Err(ShakeError::ExceedsParentBudget {
                parent_id,
                requested: amount,
                remaining,
            });
        }

        // budget shrinks synchronously at hire time, closing the race with
        // a parent release
        store.set_remaining(parent_id, remaining.checked_sub(amount)?);
        let id = store.allocate_id();
        let child = Shake {
            id,
            requester: caller.clone(),
            worker: None,
            amount,
            parent: Some(parent_id),
            status: ShakeStatus::Pending,
            task_fingerprint,
            delivery_fingerprint: None,
            created_at: now,
            deadline_at: now + deadline_duration,
            delivered_at: None,
            dispute_frozen_until: None,
            requester_pubkey_hash: None,
            encrypted_delivery_key: None,
        };
        store.insert(child.clone());
        store.add_child(parent_id, id);

        info!(%id, parent = %parent_id, requester = %caller, %amount, "child shake created");
        Ok(child)
    }

    /// Contest a delivered shake inside the dispute window
    ///
    /// Freezes every Active or Delivered ancestor so the dispute blocks
    /// third-party release all the way up the tree.
    pub async fn dispute_shake(&self, caller: &PrincipalId, id: ShakeId) -> Result<Shake> {
        let mut store = self.store.write().await;
        let now = self.clock.now();

        let shake = store.get(id)?;
        if shake.status != ShakeStatus::Delivered {
            return Err(ShakeError::NotDelivered {
                shake_id: id,
                status: shake.status,
            });
        }
        let Some(delivered_at) = shake.delivered_at else {
            return Err(ShakeError::NotDelivered {
                shake_id: id,
                status: shake.status,
            });
        };
        if caller != &shake.requester {
            return Err(ShakeError::NotRequester { shake_id: id });
        }
        let closed_at = delivered_at + self.config.dispute_window;
        if now >= closed_at {
            return Err(ShakeError::DisputeWindowClosed {
                shake_id: id,
                now,
                closed_at,
            });
        }

        store.get_mut(id)?.status = ShakeStatus::Disputed;
        subtree::freeze_ancestors(&mut store, id);

        info!(%id, requester = %caller, "shake disputed");
        store.get(id).map(Clone::clone)
    }

    /// Settle a delivered shake in the worker's favor
    ///
    /// The requester may release at any time; anyone may release once the
    /// effective dispute window has ended, so worker funds cannot be
    /// stranded. Requires the whole subtree clean and every direct child
    /// terminal.
    pub async fn release_shake(&self, caller: &PrincipalId, id: ShakeId) -> Result<Shake> {
        let mut store = self.store.write().await;
        let now = self.clock.now();

        let shake = store.get(id)?.clone();
        if shake.status != ShakeStatus::Delivered {
            return Err(ShakeError::NotDelivered {
                shake_id: id,
                status: shake.status,
            });
        }
        let Some(worker) = shake.worker.clone() else {
            return Err(ShakeError::NotDelivered {
                shake_id: id,
                status: shake.status,
            });
        };

        if let Some(disputed_id) = subtree::find_disputed(&store, id) {
            return Err(ShakeError::SubtreeNotClean {
                shake_id: id,
                disputed_id,
            });
        }
        for &child_id in store.children(id) {
            if !store.get(child_id)?.status.is_terminal() {
                return Err(ShakeError::ChildrenNotSettled {
                    shake_id: id,
                    child_id,
                });
            }
        }
        if caller != &shake.requester {
            if let Some(open_until) = shake.effective_window_end(self.config.dispute_window) {
                if now < open_until {
                    return Err(ShakeError::DisputeWindowActive {
                        shake_id: id,
                        now,
                        open_until,
                    });
                }
            }
        }

        self.pay_worker(&mut store, id, &worker).await
    }

    /// Decide a disputed shake; treasury only
    ///
    /// A win pays out exactly like a release. A loss refunds the shake's
    /// unallocated portion to the requester - funds hired out to children
    /// stay escrowed under those children and settle independently. Either
    /// way, ancestors whose subtrees are clean again thaw.
    pub async fn resolve_dispute(
        &self,
        caller: &PrincipalId,
        id: ShakeId,
        worker_wins: bool,
    ) -> Result<Shake> {
        let mut store = self.store.write().await;

        let shake = store.get(id)?.clone();
        if shake.status != ShakeStatus::Disputed {
            return Err(ShakeError::NotDisputed {
                shake_id: id,
                status: shake.status,
            });
        }
        if caller != &self.config.treasury {
            return Err(ShakeError::NotTreasury);
        }

        let settled = if worker_wins {
            let Some(worker) = shake.worker.clone() else {
                return Err(ShakeError::NotDisputed {
                    shake_id: id,
                    status: shake.status,
                });
            };
            self.pay_worker(&mut store, id, &worker).await?
        } else {
            let refund = store.remaining(id).unwrap_or(shake.amount);
            store.get_mut(id)?.status = ShakeStatus::Refunded;
            if !refund.is_zero() {
                if let Err(err) = self.ledger.push(&shake.requester, refund).await {
                    store.insert(shake.clone());
                    return Err(ShakeError::LedgerPushFailed {
                        detail: err.to_string(),
                    });
                }
            }
            if let Some(worker) = &shake.worker {
                if let Err(err) = self.reputation.record(id, worker, Units::ZERO, false).await {
                    warn!(%id, worker = %worker, error = %err, "reputation sink rejected outcome");
                }
            }
            info!(%id, requester = %shake.requester, %refund, "dispute resolved against worker");
            store.get(id)?.clone()
        };

        subtree::unfreeze_ancestors(&mut store, id);
        Ok(settled)
    }

    /// Refund an unfulfilled shake once its deadline has passed
    ///
    /// Callable by anyone; the money can only go back to the requester. A
    /// Pending shake refunds in full, an Active one refunds its
    /// unallocated remainder.
    pub async fn refund_shake(&self, id: ShakeId) -> Result<Shake> {
        let mut store = self.store.write().await;
        let now = self.clock.now();

        let shake = store.get(id)?.clone();
        let refund = match shake.status {
            ShakeStatus::Pending => shake.amount,
            ShakeStatus::Active => store.remaining(id).unwrap_or(shake.amount),
            status => {
                return Err(ShakeError::CannotRefund {
                    shake_id: id,
                    status,
                })
            }
        };
        if now < shake.deadline_at {
            return Err(ShakeError::DeadlineNotPassed {
                shake_id: id,
                now,
                deadline_at: shake.deadline_at,
            });
        }

        store.get_mut(id)?.status = ShakeStatus::Refunded;
        if !refund.is_zero() {
            if let Err(err) = self.ledger.push(&shake.requester, refund).await {
                store.insert(shake.clone());
                return Err(ShakeError::LedgerPushFailed {
                    detail: err.to_string(),
                });
            }
        }
        if let Some(worker) = &shake.worker {
            if let Err(err) = self.reputation.record(id, worker, Units::ZERO, false).await {
                warn!(%id, worker = %worker, error = %err, "reputation sink rejected outcome");
            }
        }

        info!(%id, requester = %shake.requester, %refund, "shake refunded");
        store.get(id).map(Clone::clone)
    }

    // ========================================================================
    // Views (snapshot reads)
    // ========================================================================

    /// Read a shake record
    pub async fn shake(&self, id: ShakeId) -> Result<Shake> {
        self.store.read().await.get(id).map(Clone::clone)
    }

    /// Direct children of a shake, in creation order
    pub async fn children(&self, id: ShakeId) -> Vec<ShakeId> {
        self.store.read().await.children(id).to_vec()
    }

    /// Unallocated budget of a shake (defined once Active)
    pub async fn remaining_budget(&self, id: ShakeId) -> Option<Units> {
        self.store.read().await.remaining(id)
    }

    /// Edges from a shake to its root
    pub async fn depth(&self, id: ShakeId) -> u32 {
        subtree::depth(&*self.store.read().await, id)
    }

    /// Check that no descendant of a shake is disputed
    pub async fn is_subtree_clean(&self, id: ShakeId) -> bool {
        subtree::is_subtree_clean(&*self.store.read().await, id)
    }

    /// All shakes currently in `status`
    pub async fn shakes_by_status(&self, status: ShakeStatus) -> Vec<Shake> {
        self.store
            .read()
            .await
            .iter()
            .filter(|s| s.status == status)
            .cloned()
            .collect()
    }

    /// All shakes funded by a requester
    pub async fn shakes_by_requester(&self, requester: &PrincipalId) -> Vec<Shake> {
        self.store
            .read()
            .await
            .iter()
            .filter(|s| &s.requester == requester)
            .cloned()
            .collect()
    }

    /// All shakes accepted by a worker
    pub async fn shakes_by_worker(&self, worker: &PrincipalId) -> Vec<Shake> {
        self.store
            .read()
            .await
            .iter()
            .filter(|s| s.worker.as_ref() == Some(worker))
            .cloned()
            .collect()
    }

    /// Units the custody pool must hold for the current open shakes
    ///
    /// Compare against `ledger.custody_balance()` to audit conservation.
    pub async fn expected_custody(&self) -> Units {
        self.store.read().await.expected_custody()
    }

    // ========================================================================
    // Settlement internals
    // ========================================================================

    /// Pay a shake out to its worker and mark it Released
    ///
    /// Shared by release and a worker-favored dispute resolution. The fee
    /// rate is computed on the full amount at the shake's chain depth but
    /// deducted from the shake's own settlement pool (amount minus what
    /// children consumed), so a fully sub-contracted shake cannot
    /// underflow.
    async fn pay_worker(
        &self,
        store: &mut ShakeStore,
        id: ShakeId,
        worker: &PrincipalId,
    ) -> Result<Shake> {
        let prior = store.get(id)?.clone();
        let pool = store.remaining(id).unwrap_or(prior.amount);
        let child_spend = prior.amount.saturating_sub(pool);
        let depth = subtree::depth(store, id);
        let bps = match &self.fee_policy {
            Some(policy) => policy.fee_bps(prior.amount, depth),
            None => self.config.protocol_fee_bps,
        };
        let fee = prior.amount.basis_points(bps).min(pool);
        let worker_net = pool.checked_sub(fee)?;

        store.get_mut(id)?.status = ShakeStatus::Released;

        if !worker_net.is_zero() {
            if let Err(err) = self.ledger.push(worker, worker_net).await {
                store.insert(prior);
                return Err(ShakeError::LedgerPushFailed {
                    detail: err.to_string(),
                });
            }
        }
        if !fee.is_zero() {
            if let Err(err) = self.ledger.push(&self.config.treasury, fee).await {
                store.insert(prior);
                return Err(ShakeError::LedgerPushFailed {
                    detail: err.to_string(),
                });
            }
        }

        if let Err(err) = self.reputation.record(id, worker, worker_net, true).await {
            warn!(%id, worker = %worker, error = %err, "reputation sink rejected outcome");
        }

        info!(
            %id,
            worker = %worker,
            net = %worker_net,
            %fee,
            %child_spend,
            depth,
            "shake released"
        );
        store.get(id).map(Clone::clone)
    }
}
