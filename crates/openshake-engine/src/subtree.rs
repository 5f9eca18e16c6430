//! Subtree walks: cleanliness, depth, and the freeze/unfreeze cascade
//!
//! All walks iterate over explicit stacks or parent pointers; trees can be
//! arbitrarily deep (the budget makes depth economically self-limiting, not
//! structurally bounded) and must not exhaust the host stack.

use openshake_types::{ShakeId, ShakeStatus, FREEZE_CEILING};

use crate::store::ShakeStore;

/// First Disputed descendant of `root`, if any
///
/// Depth-first over the adjacency map; the root itself is not examined.
pub fn find_disputed(store: &ShakeStore, root: ShakeId) -> Option<ShakeId> {
    let mut stack: Vec<ShakeId> = store.children(root).to_vec();
    while let Some(id) = stack.pop() {
        if let Ok(shake) = store.get(id) {
            if shake.status == ShakeStatus::Disputed {
                return Some(id);
            }
        }
        stack.extend_from_slice(store.children(id));
    }
    None
}

/// Check that no descendant of `root` is Disputed
pub fn is_subtree_clean(store: &ShakeStore, root: ShakeId) -> bool {
    find_disputed(store, root).is_none()
}

/// Number of parent edges from `id` to its root
pub fn depth(store: &ShakeStore, id: ShakeId) -> u32 {
    let mut depth = 0;
    let mut current = id;
    while let Some(parent) = store.get(current).ok().and_then(|s| s.parent) {
        depth += 1;
        current = parent;
    }
    depth
}

/// Ancestors of `id` from parent up to the root
pub fn ancestors(store: &ShakeStore, id: ShakeId) -> Vec<ShakeId> {
    let mut chain = Vec::new();
    let mut current = id;
    while let Some(parent) = store.get(current).ok().and_then(|s| s.parent) {
        chain.push(parent);
        current = parent;
    }
    chain
}

/// Stamp the freeze sentinel on every Active or Delivered ancestor of `id`
///
/// Called when `id` enters Disputed. The sentinel keeps an ancestor's
/// effective dispute window open however much wall time elapses.
pub fn freeze_ancestors(store: &mut ShakeStore, id: ShakeId) {
    for ancestor in ancestors(store, id) {
        if let Ok(shake) = store.get_mut(ancestor) {
            if matches!(shake.status, ShakeStatus::Active | ShakeStatus::Delivered) {
                shake.dispute_frozen_until = Some(FREEZE_CEILING);
            }
        }
    }
}

/// Clear the freeze sentinel on every ancestor of `id` whose subtree is
/// clean again
///
/// Called after a dispute on `id` resolves. An ancestor stays frozen while
/// any other descendant dispute remains open.
pub fn unfreeze_ancestors(store: &mut ShakeStore, id: ShakeId) {
    for ancestor in ancestors(store, id) {
        let frozen = store
            .get(ancestor)
            .map(|s| s.is_frozen())
            .unwrap_or(false);
        if frozen && is_subtree_clean(store, ancestor) {
            if let Ok(shake) = store.get_mut(ancestor) {
                shake.dispute_frozen_until = None;
            }
        }
    }
}
