//! OpenShake Engine - Recursive escrow for agent-to-agent commerce
//!
//! A requester locks stablecoin units against a task; a worker accepts,
//! delivers a proof fingerprint, and is paid after an optional dispute
//! interval. Workers sub-contract by creating child shakes funded out of
//! the parent's remaining budget, and a parent settles only once its whole
//! descendant subtree is free of open disputes and terminal.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      ShakeEngine                        │
//! │  one serialized transaction per operation               │
//! ├──────────────┬──────────────────┬───────────────────────┤
//! │  ShakeStore  │  subtree walks   │  state machine        │
//! │  shakes      │  is_subtree_clean│  create/accept/deliver│
//! │  children    │  freeze/unfreeze │  release/dispute/     │
//! │  remaining   │  depth           │  resolve/refund       │
//! └──────┬───────┴──────────────────┴──────────┬────────────┘
//!        │                                     │
//!   LedgerAdapter                       ReputationSink
//!   pull / push / custody               record (advisory)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use openshake_engine::{EngineConfig, ShakeEngine};
//!
//! let engine = ShakeEngine::new(
//!     EngineConfig::new(treasury),
//!     ledger,
//!     reputation,
//!     clock,
//! );
//!
//! let shake = engine
//!     .create_shake(&requester, amount, deadline, task_fp, None)
//!     .await?;
//! ```

pub mod engine;
pub mod store;
pub mod subtree;

pub use engine::{EngineConfig, ShakeEngine};
pub use store::ShakeStore;
