//! OpenShake Types - Canonical domain types for agent-to-agent escrow
//!
//! This crate contains all foundational types for OpenShake with zero
//! dependencies on other openshake crates:
//!
//! - Identity types (ShakeId, PrincipalId)
//! - Stablecoin units with fixed 6-decimal precision
//! - Opaque 32-byte digests for task and delivery fingerprints
//! - The Shake record and its status machine
//! - The injectable clock abstraction
//! - The engine-wide error taxonomy
//!
//! # Invariants these types support
//!
//! 1. A shake's `amount` is immutable after creation
//! 2. Released and Refunded are terminal - no record mutation afterwards
//! 3. All arithmetic on units is checked; overflow is an explicit error
//! 4. The engine never reads wall time directly - time comes from `Clock`

pub mod clock;
pub mod digest;
pub mod error;
pub mod identity;
pub mod shake;
pub mod units;

pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::Digest32;
pub use error::{Result, ShakeError};
pub use identity::{PrincipalId, ShakeId};
pub use shake::{Shake, ShakeStatus, FREEZE_CEILING};
pub use units::{Units, UNITS_PER_WHOLE, UNIT_DECIMALS};

/// Version of the OpenShake types schema
pub const TYPES_VERSION: &str = "0.1.0";
