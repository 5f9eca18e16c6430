//! Keyed in-memory state for the engine
//!
//! Three maps plus a counter: shake records, parent→children adjacency, and
//! the per-shake remaining-budget scalar. The facade holds one lock over
//! the whole store so every operation observes and commits a consistent
//! snapshot.

use std::collections::HashMap;

use openshake_types::{Result, Shake, ShakeError, ShakeId, ShakeStatus, Units};

/// The engine's persisted state (logical layout per the storage contract)
#[derive(Debug, Default)]
pub struct ShakeStore {
    shakes: HashMap<ShakeId, Shake>,
    children: HashMap<ShakeId, Vec<ShakeId>>,
    remaining: HashMap<ShakeId, Units>,
    next_id: u64,
}

impl ShakeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next dense shake id
    pub fn allocate_id(&mut self) -> ShakeId {
        let id = ShakeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert or replace a shake record
    pub fn insert(&mut self, shake: Shake) {
        self.shakes.insert(shake.id, shake);
    }

    /// Look up a shake
    pub fn get(&self, id: ShakeId) -> Result<&Shake> {
        self.shakes
            .get(&id)
            .ok_or(ShakeError::ShakeNotFound { shake_id: id })
    }

    /// Look up a shake for mutation
    pub fn get_mut(&mut self, id: ShakeId) -> Result<&mut Shake> {
        self.shakes
            .get_mut(&id)
            .ok_or(ShakeError::ShakeNotFound { shake_id: id })
    }

    /// Direct children of a shake, in creation order
    pub fn children(&self, id: ShakeId) -> &[ShakeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append a child edge
    pub fn add_child(&mut self, parent: ShakeId, child: ShakeId) {
        self.children.entry(parent).or_default().push(child);
    }

    /// Unallocated budget of a shake (defined once Active)
    pub fn remaining(&self, id: ShakeId) -> Option<Units> {
        self.remaining.get(&id).copied()
    }

    /// Set the unallocated budget of a shake
    pub fn set_remaining(&mut self, id: ShakeId, units: Units) {
        self.remaining.insert(id, units);
    }

    /// Iterate over all shake records
    pub fn iter(&self) -> impl Iterator<Item = &Shake> {
        self.shakes.values()
    }

    /// Number of shakes ever created
    pub fn len(&self) -> usize {
        self.shakes.len()
    }

    /// Check if the store holds no shakes
    pub fn is_empty(&self) -> bool {
        self.shakes.is_empty()
    }

    /// Units the custody pool must hold for this store's open shakes
    ///
    /// Σ over non-terminal shakes: the full amount while Pending, the
    /// unallocated remainder afterwards (allocated portions are counted by
    /// the children carrying them).
    pub fn expected_custody(&self) -> Units {
        self.shakes
            .values()
            .filter(|s| !s.is_terminal())
            .fold(Units::ZERO, |acc, s| {
                let share = match s.status {
                    ShakeStatus::Pending => s.amount,
                    _ => self.remaining(s.id).unwrap_or(s.amount),
                };
                acc.saturating_add(share)
            })
    }
}
