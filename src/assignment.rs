/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Layered node→part assignment with staged-flip semantics.
//!
//! An [`Assignment`] is a two-level map: a *base* holding the settled
//! node→part entries, shared by every generation of a chain, and an
//! *overlay* holding only the flips of this generation. Lookup checks the
//! overlay first, then the base.
//!
//! Wrapping an assignment with a new flip batch ([`Assignment::wrap`])
//! commits the old overlay into the shared base first, so the overlay depth
//! is bounded at 1 no matter how many generations the chain runs. Without
//! that eager commit every generation would stack another layer and lookup
//! would degrade to O(generation count).
//!
//! # Version tag
//!
//! The shared base carries a version counter, bumped whenever a commit
//! actually changes an entry. Each view records the version it was built
//! against; once a *descendant* generation commits, every older view is
//! stale and its lookups fail with
//! [`PartitionError::StaleAssignment`](crate::error::PartitionError) instead
//! of silently answering with newer-generation data.
//!
//! # Invariants
//!
//! - **ASGN-001**: every node resolves to exactly one part (overlay first,
//!   then base); unknown nodes fail, never default.
//! - **ASGN-002**: overlay keys are always a subset of base keys — a flip
//!   can reassign a node but never introduce one.
//! - **ASGN-003**: commit is idempotent and all-or-nothing; a failed commit
//!   leaves the base untouched.

use alloc::format;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use hashbrown::HashMap;

use crate::error::PartitionError;
use crate::graph::NodeId;
use crate::partition::PartId;

// ─── Base map ───────────────────────────────────────────────────────────────

/// The settled entries shared by every view of one chain, plus the version
/// counter that detects stale views.
#[derive(Debug)]
struct BaseMap<N: NodeId> {
    entries: HashMap<N, PartId>,
    version: u64,
}

// ─── Assignment ─────────────────────────────────────────────────────────────

/// A node→part mapping viewed as a shared base plus this generation's
/// staged overlay of flips.
#[derive(Debug)]
pub struct Assignment<N: NodeId> {
    base: Rc<RefCell<BaseMap<N>>>,
    /// Base version this view was built against (updated by own commits).
    seen: Cell<u64>,
    overlay: HashMap<N, PartId>,
}

impl<N: NodeId> Assignment<N> {
    /// Build a fresh assignment from a full node→part mapping. The overlay
    /// starts empty.
    pub fn from_map(map: HashMap<N, PartId>) -> Self {
        Self {
            base: Rc::new(RefCell::new(BaseMap {
                entries: map,
                version: 0,
            })),
            seen: Cell::new(0),
            overlay: HashMap::new(),
        }
    }

    /// Derive the next generation's view: commit `parent`'s overlay into the
    /// shared base, then return a new view over that base with `flips` as
    /// its overlay.
    ///
    /// Every flip key must already resolve through `parent` (ASGN-002);
    /// otherwise the wrap fails before anything is mutated.
    pub fn wrap(parent: &Self, flips: HashMap<N, PartId>) -> Result<Self, PartitionError> {
        parent.ensure_fresh()?;
        for &node in flips.keys() {
            if parent.lookup(node).is_none() {
                return Err(unknown_node(node));
            }
        }
        parent.commit()?;
        Ok(Self {
            base: Rc::clone(&parent.base),
            seen: Cell::new(parent.seen.get()),
            overlay: flips,
        })
    }

    /// Resolve a node's part: overlay first, then base.
    pub fn get(&self, node: N) -> Result<PartId, PartitionError> {
        self.ensure_fresh()?;
        self.lookup(node).ok_or_else(|| unknown_node(node))
    }

    /// Whether the node is present in the effective mapping.
    ///
    /// Membership never changes across generations, so this is safe even on
    /// a stale view.
    pub fn contains(&self, node: N) -> bool {
        self.lookup(node).is_some()
    }

    /// Number of nodes in the effective mapping.
    pub fn len(&self) -> usize {
        self.base.borrow().entries.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of staged (not yet committed) entries in this view's overlay.
    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }

    /// Whether this view is still current against the shared base.
    pub fn is_fresh(&self) -> bool {
        self.seen.get() == self.base.borrow().version
    }

    /// Snapshot the effective mapping (base shadowed by overlay).
    pub fn to_map(&self) -> Result<HashMap<N, PartId>, PartitionError> {
        self.ensure_fresh()?;
        let mut map = self.base.borrow().entries.clone();
        for (&node, &part) in &self.overlay {
            map.insert(node, part);
        }
        Ok(map)
    }

    /// Merge this view's overlay entries down into the shared base.
    ///
    /// Idempotent: entries already equal in the base are left alone, and the
    /// version is bumped only when something actually changed — so sibling
    /// views of an unchanged base stay valid. All keys are verified present
    /// before any entry is written (ASGN-003).
    pub fn commit(&self) -> Result<(), PartitionError> {
        self.ensure_fresh()?;
        let mut base = self.base.borrow_mut();
        for &node in self.overlay.keys() {
            if !base.entries.contains_key(&node) {
                return Err(unknown_node(node));
            }
        }
        let mut changed = false;
        for (&node, &part) in &self.overlay {
            if let Some(slot) = base.entries.get_mut(&node) {
                if *slot != part {
                    *slot = part;
                    changed = true;
                }
            }
        }
        if changed {
            base.version += 1;
        }
        self.seen.set(base.version);
        Ok(())
    }

    fn ensure_fresh(&self) -> Result<(), PartitionError> {
        if self.is_fresh() {
            Ok(())
        } else {
            Err(PartitionError::StaleAssignment)
        }
    }

    fn lookup(&self, node: N) -> Option<PartId> {
        if let Some(&part) = self.overlay.get(&node) {
            return Some(part);
        }
        self.base.borrow().entries.get(&node).copied()
    }
}

fn unknown_node<N: NodeId>(node: N) -> PartitionError {
    PartitionError::UnknownNode {
        node: format!("{node:?}"),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn base_map() -> HashMap<u32, PartId> {
        let mut map = HashMap::new();
        map.insert(1, 0);
        map.insert(2, 0);
        map.insert(3, 1);
        map.insert(4, 1);
        map
    }

    fn flips(pairs: &[(u32, PartId)]) -> HashMap<u32, PartId> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_overlay_shadows_base() {
        let root = Assignment::from_map(base_map());
        let child = Assignment::wrap(&root, flips(&[(2, 1)])).unwrap();

        assert_eq!(child.get(2).unwrap(), 1, "overlay value wins");
        assert_eq!(child.get(1).unwrap(), 0, "untouched node falls through");
        assert_eq!(child.len(), 4);
        assert_eq!(child.overlay_len(), 1);
    }

    #[test]
    fn test_unknown_node_fails_never_defaults() {
        let root = Assignment::from_map(base_map());
        assert!(matches!(
            root.get(99),
            Err(PartitionError::UnknownNode { .. })
        ));
    }

    #[test]
    fn test_flip_of_unknown_node_rejected_before_mutation() {
        let root = Assignment::from_map(base_map());
        let err = Assignment::wrap(&root, flips(&[(99, 0)])).unwrap_err();
        assert!(matches!(err, PartitionError::UnknownNode { .. }));
        // The failed wrap left the parent usable.
        assert!(root.is_fresh());
        assert_eq!(root.get(1).unwrap(), 0);
    }

    #[test]
    fn test_commit_on_wrap_keeps_overlay_depth_one() {
        let root = Assignment::from_map(base_map());
        let a = Assignment::wrap(&root, flips(&[(2, 1)])).unwrap();
        let b = Assignment::wrap(&a, flips(&[(3, 0)])).unwrap();
        let c = Assignment::wrap(&b, flips(&[])).unwrap();

        // Each wrap committed its parent; the newest view sees the full
        // history through base + one overlay.
        assert_eq!(c.overlay_len(), 0);
        assert_eq!(c.get(2).unwrap(), 1);
        assert_eq!(c.get(3).unwrap(), 0);
        assert_eq!(c.get(4).unwrap(), 1);
    }

    #[test]
    fn test_stale_view_detected_after_descendant_commit() {
        let root = Assignment::from_map(base_map());
        let a = Assignment::wrap(&root, flips(&[(2, 1)])).unwrap();
        // Wrapping `a` commits a's overlay — root's view is now stale.
        let _b = Assignment::wrap(&a, flips(&[(3, 0)])).unwrap();

        assert!(!root.is_fresh());
        assert_eq!(root.get(2), Err(PartitionError::StaleAssignment));
        assert!(a.is_fresh(), "the committing view itself stays current");
        assert_eq!(a.get(2).unwrap(), 1);
    }

    #[test]
    fn test_empty_and_identity_flips_do_not_invalidate_siblings() {
        let root = Assignment::from_map(base_map());
        // An overlay that restates current values changes nothing on commit.
        let a = Assignment::wrap(&root, flips(&[(1, 0)])).unwrap();
        let _b = Assignment::wrap(&a, flips(&[])).unwrap();
        assert!(root.is_fresh(), "identity commit must not bump the version");
        assert_eq!(root.get(1).unwrap(), 0);
    }

    #[test]
    fn test_commit_is_idempotent() {
        let root = Assignment::from_map(base_map());
        let a = Assignment::wrap(&root, flips(&[(2, 1)])).unwrap();
        a.commit().unwrap();
        let v = a.seen.get();
        a.commit().unwrap();
        assert_eq!(a.seen.get(), v, "second commit of same overlay is a no-op");
        assert_eq!(a.get(2).unwrap(), 1);
    }

    #[test]
    fn test_to_map_is_the_effective_view() {
        let root = Assignment::from_map(base_map());
        let a = Assignment::wrap(&root, flips(&[(2, 1), (4, 0)])).unwrap();
        let map = a.to_map().unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map[&1], 0);
        assert_eq!(map[&2], 1);
        assert_eq!(map[&3], 1);
        assert_eq!(map[&4], 0);
    }

    #[test]
    fn test_contains_survives_staleness() {
        let root = Assignment::from_map(base_map());
        let a = Assignment::wrap(&root, flips(&[(2, 1)])).unwrap();
        let _b = Assignment::wrap(&a, flips(&[(3, 0)])).unwrap();
        assert!(root.contains(2), "membership is generation-independent");
        assert!(!root.contains(99));
    }
}
