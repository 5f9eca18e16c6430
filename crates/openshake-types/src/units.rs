//! Stablecoin units with fixed 6-decimal precision
//!
//! OpenShake amounts are non-negative integers in the stablecoin's smallest
//! denomination. The engine only ever adds, subtracts, and takes basis-point
//! fractions of them; all of it is overflow-checked.

use crate::error::{Result, ShakeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Number of decimal places in the settlement asset
pub const UNIT_DECIMALS: u8 = 6;

/// Smallest-denomination units per whole token
pub const UNITS_PER_WHOLE: u64 = 1_000_000;

/// A non-negative amount in smallest-denomination stablecoin units
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Units(pub u64);

impl Units {
    /// The zero amount
    pub const ZERO: Units = Units(0);

    /// Create from raw smallest-denomination units
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Create from a whole-token count (test convenience; saturates)
    pub fn whole(tokens: u64) -> Self {
        Self(tokens.saturating_mul(UNITS_PER_WHOLE))
    }

    /// Get the raw unit count
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Result<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(ShakeError::AmountOverflow)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Result<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(ShakeError::AmountUnderflow)
    }

    /// Saturating subtraction (floors at zero)
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Saturating addition (ceils at `u64::MAX`)
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Take a basis-point fraction (100 bps = 1%), rounding down
    ///
    /// Widens to u128 internally, so `u64::MAX` amounts cannot overflow for
    /// any `bps <= 10_000`.
    pub fn basis_points(self, bps: u16) -> Self {
        Self((self.0 as u128 * bps as u128 / 10_000) as u64)
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:06}",
            self.0 / UNITS_PER_WHOLE,
            self.0 % UNITS_PER_WHOLE
        )
    }
}

// Add/Sub for convenience in tests and display paths (panic on error);
// settlement arithmetic uses the checked methods.
impl Add for Units {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        self.checked_add(other).expect("Units addition overflow")
    }
}

impl Sub for Units {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        self.checked_sub(other).expect("Units subtraction underflow")
    }
}
