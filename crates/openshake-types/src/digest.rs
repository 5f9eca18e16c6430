//! Opaque 32-byte digests
//!
//! Task specifications and delivery proofs enter the engine only as
//! fingerprints. The engine never interprets them; the sole verification it
//! performs anywhere is equality comparison by external observers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// An opaque 32-byte digest (task fingerprint, delivery proof, key hash)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest32(pub [u8; 32]);

impl Digest32 {
    /// Fingerprint arbitrary bytes with SHA-256
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// Get the raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest32({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(Digest32::of(b"summarize thread"), Digest32::of(b"summarize thread"));
        assert_ne!(Digest32::of(b"summarize thread"), Digest32::of(b"label dataset"));
    }

    #[test]
    fn test_hex_display() {
        let d = Digest32::from([0u8; 32]);
        assert_eq!(d.to_string(), "0".repeat(64));
        let d = Digest32::of(b"abc");
        assert_eq!(d.to_string().len(), 64);
    }
}
