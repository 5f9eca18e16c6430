//! OpenShake Fees - Depth-adjusted protocol fee schedule
//!
//! Child shakes sit deeper in a sub-contracting chain and carry a premium
//! over the base rate, compensating the protocol for the longer settlement
//! dependency they create.
//!
//! # Fee Structure
//!
//! | Depth | Rate (defaults)        |
//! |-------|------------------------|
//! | 0     | 250 bps (2.50%)        |
//! | 1     | 275 bps (2.75%)        |
//! | 2     | 300 bps (3.00%)        |
//! | n     | 250 + n × 25, ≤ 1000   |
//!
//! The treasury may retune both scalars at runtime; nothing can raise the
//! effective rate above `MAX_FEE_BPS`.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use openshake_types::{PrincipalId, Units};

/// Hard cap on any effective fee rate
pub const MAX_FEE_BPS: u16 = 1_000;

/// Default base rate applied at depth 0
pub const DEFAULT_BASE_BPS: u16 = 250;

/// Default premium added per level of chain depth
pub const DEFAULT_DEPTH_PREMIUM_BPS: u16 = 25;

/// Fee policy errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("fee schedule updates require the treasury principal")]
    NotTreasury,

    #[error("rate {requested} bps exceeds the {cap} bps cap")]
    RateAboveCap { requested: u16, cap: u16 },
}

pub type Result<T> = std::result::Result<T, FeeError>;

/// Computes the basis-point fee for a settlement
///
/// `amount` is available for size-dependent policies; the default
/// depth-only schedule ignores it.
pub trait FeePolicy: Send + Sync {
    /// Fee rate in basis points for a settlement of `amount` at `depth`
    /// edges below its root
    fn fee_bps(&self, amount: Units, depth: u32) -> u16;
}

/// The two scalars of the depth schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Rate at depth 0
    pub base_bps: u16,
    /// Premium per depth edge
    pub depth_premium_bps: u16,
}

impl FeeSchedule {
    fn validate(&self) -> Result<()> {
        for rate in [self.base_bps, self.depth_premium_bps] {
            if rate > MAX_FEE_BPS {
                return Err(FeeError::RateAboveCap {
                    requested: rate,
                    cap: MAX_FEE_BPS,
                });
            }
        }
        Ok(())
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_bps: DEFAULT_BASE_BPS,
            depth_premium_bps: DEFAULT_DEPTH_PREMIUM_BPS,
        }
    }
}

/// Depth-adjusted fee policy with treasury-gated schedule updates
pub struct DepthFeePolicy {
    treasury: PrincipalId,
    schedule: RwLock<FeeSchedule>,
}

impl DepthFeePolicy {
    /// Create a policy with the default schedule
    pub fn new(treasury: PrincipalId) -> Self {
        Self {
            treasury,
            schedule: RwLock::new(FeeSchedule::default()),
        }
    }

    /// Create a policy with an explicit schedule
    pub fn with_schedule(treasury: PrincipalId, schedule: FeeSchedule) -> Result<Self> {
        schedule.validate()?;
        Ok(Self {
            treasury,
            schedule: RwLock::new(schedule),
        })
    }

    /// Read the current schedule
    pub fn schedule(&self) -> FeeSchedule {
        *self.schedule.read()
    }

    /// Replace the schedule; treasury only, both scalars capped
    pub fn set_schedule(&self, caller: &PrincipalId, schedule: FeeSchedule) -> Result<()> {
        if caller != &self.treasury {
            return Err(FeeError::NotTreasury);
        }
        schedule.validate()?;
        *self.schedule.write() = schedule;
        Ok(())
    }
}

impl FeePolicy for DepthFeePolicy {
    fn fee_bps(&self, _amount: Units, depth: u32) -> u16 {
        let schedule = self.schedule.read();
        let raw = schedule.base_bps as u64 + depth as u64 * schedule.depth_premium_bps as u64;
        raw.min(MAX_FEE_BPS as u64) as u16
    }
}
