//! OpenShake Ledger - Stablecoin custody adapter
//!
//! The engine moves stablecoin units through a narrow capability surface:
//! `pull` draws a principal's approved funds into the engine's custody,
//! `push` pays out of custody, `custody_balance` reads the pool for sanity
//! checks.
//!
//! # Invariants
//!
//! 1. No movement without a prior allowance (pulls)
//! 2. No negative balances
//! 3. Custody never goes short; a short push is a conservation breach,
//!    not a caller error
//! 4. Zero-unit movements are rejected

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use openshake_types::{PrincipalId, Units};

/// Errors that can occur in ledger operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient allowance: approved {approved}, required {required}")]
    InsufficientAllowance { approved: Units, required: Units },

    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Units, required: Units },

    #[error("transfer failed: {reason}")]
    TransferFailed { reason: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Capability surface the engine holds over the stablecoin ledger
///
/// All operations are all-or-nothing; a failed call leaves balances
/// untouched.
#[async_trait]
pub trait LedgerAdapter: Send + Sync {
    /// Draw `amount` from `from` into the engine's custody
    async fn pull(&self, from: &PrincipalId, amount: Units) -> Result<()>;

    /// Pay `amount` out of custody to `to`
    async fn push(&self, to: &PrincipalId, amount: Units) -> Result<()>;

    /// Read the engine's custodied balance
    async fn custody_balance(&self) -> Units;
}

/// In-memory reference ledger
///
/// Tracks per-principal balances, the allowance each principal has granted
/// the engine, and the custody pool. Intended for tests and single-process
/// deployments; a production adapter wraps the real stablecoin contract.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<PrincipalId, Units>>,
    allowances: RwLock<HashMap<PrincipalId, Units>>,
    custody: RwLock<Units>,
}

impl InMemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a principal out of thin air (test/bootstrap helper)
    pub async fn mint(&self, to: &PrincipalId, amount: Units) {
        let mut accounts = self.accounts.write().await;
        let balance = accounts.entry(to.clone()).or_insert(Units::ZERO);
        *balance = balance.saturating_add(amount);
    }

    /// Set the allowance `from` grants the engine
    pub async fn approve(&self, from: &PrincipalId, amount: Units) {
        self.allowances.write().await.insert(from.clone(), amount);
    }

    /// Read a principal's balance
    pub async fn balance_of(&self, principal: &PrincipalId) -> Units {
        self.accounts
            .read()
            .await
            .get(principal)
            .copied()
            .unwrap_or(Units::ZERO)
    }

    /// Read the remaining allowance a principal has granted the engine
    pub async fn allowance_of(&self, principal: &PrincipalId) -> Units {
        self.allowances
            .read()
            .await
            .get(principal)
            .copied()
            .unwrap_or(Units::ZERO)
    }
}

#[async_trait]
impl LedgerAdapter for InMemoryLedger {
    async fn pull(&self, from: &PrincipalId, amount: Units) -> Result<()> {
        if amount.is_zero() {
            return Err(LedgerError::TransferFailed {
                reason: "zero-unit movement".to_string(),
            });
        }

        let mut accounts = self.accounts.write().await;
        let mut allowances = self.allowances.write().await;
        let mut custody = self.custody.write().await;

        let approved = allowances.get(from).copied().unwrap_or(Units::ZERO);
        let remaining_allowance =
            approved
                .raw()
                .checked_sub(amount.raw())
                .ok_or(LedgerError::InsufficientAllowance {
                    approved,
                    required: amount,
                })?;

        let available = accounts.get(from).copied().unwrap_or(Units::ZERO);
        let remaining_balance =
            available
                .raw()
                .checked_sub(amount.raw())
                .ok_or(LedgerError::InsufficientBalance {
                    available,
                    required: amount,
                })?;

        let new_custody =
            custody
                .raw()
                .checked_add(amount.raw())
                .ok_or(LedgerError::TransferFailed {
                    reason: "custody overflow".to_string(),
                })?;

        allowances.insert(from.clone(), Units::new(remaining_allowance));
        accounts.insert(from.clone(), Units::new(remaining_balance));
        *custody = Units::new(new_custody);

        debug!(from = %from, %amount, custody = %*custody, "pulled into custody");
        Ok(())
    }

    async fn push(&self, to: &PrincipalId, amount: Units) -> Result<()> {
        if amount.is_zero() {
            return Err(LedgerError::TransferFailed {
                reason: "zero-unit movement".to_string(),
            });
        }

        let mut accounts = self.accounts.write().await;
        let mut custody = self.custody.write().await;

        // A short custody pool means the engine's conservation invariant
        // is already broken; surface it as a transfer failure.
        let new_custody =
            custody
                .raw()
                .checked_sub(amount.raw())
                .ok_or(LedgerError::TransferFailed {
                    reason: format!("custody short: holds {custody}, owes {amount}"),
                })?;

        let balance = accounts.entry(to.clone()).or_insert(Units::ZERO);
        let new_balance =
            balance
                .raw()
                .checked_add(amount.raw())
                .ok_or(LedgerError::TransferFailed {
                    reason: "recipient balance overflow".to_string(),
                })?;

        *balance = Units::new(new_balance);
        *custody = Units::new(new_custody);

        debug!(to = %to, %amount, custody = %*custody, "pushed out of custody");
        Ok(())
    }

    async fn custody_balance(&self) -> Units {
        *self.custody.read().await
    }
}
