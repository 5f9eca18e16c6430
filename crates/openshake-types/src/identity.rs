//! Identity types for OpenShake
//!
//! Shake ids are dense monotonic integers assigned by the engine's store;
//! principals are opaque identities the engine never interprets beyond
//! equality. Both are strongly typed wrappers to prevent accidental mixing.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a shake
///
/// Ids are dense: the first shake an engine creates is `shake_0`, the next
/// `shake_1`, and so on, across roots and children alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShakeId(pub u64);

impl ShakeId {
    /// Get the raw counter value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ShakeId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ShakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shake_{}", self.0)
    }
}

/// Unique identifier for a principal (requester, worker, or treasury)
///
/// The engine treats principals as opaque byte-addressable identities; only
/// equality matters. Key custody and signatures live outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    /// Create a new random principal id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from a string (with or without the `principal_` prefix)
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        let s = s.strip_prefix("principal_").unwrap_or(s);
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PrincipalId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "principal_{}", self.0)
    }
}
