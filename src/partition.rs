/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! The parent-linked partition chain.
//!
//! A [`Partition`] is one state in a sequential chain: a shared graph, a
//! layered [`Assignment`], the materialized part→members mapping, and a
//! per-instance property cache. The root is built with one O(n) grouping
//! scan; every later generation is derived from its parent by [`merge`] in
//! O(|flip batch|), updating only the parts a flow touched.
//!
//! [`merge`]: Partition::merge
//!
//! # Sequential-chain discipline
//!
//! Deriving a child commits the parent's staged flips into the base map the
//! whole chain shares. Because of that:
//!
//! - a partition may derive **one** child; a second [`merge`] on the same
//!   instance fails with `ParentConsumed`;
//! - a consumed partition's `parts` snapshot stays valid forever, and its
//!   assignment view stays valid until its *child* derives — from then on
//!   assignment lookups on it fail with `StaleAssignment` rather than
//!   answering with newer-generation data.
//!
//! Concurrent derivation from one chain is out of scope by design: this
//! models a single sampling trajectory. Run independent trajectories on
//! independently rooted chains.
//!
//! # Invariants
//!
//! - **PART-001**: at every generation the part sets are pairwise disjoint
//!   and their union is the full node set.
//! - **PART-002**: a part untouched by any flow keeps the parent's set
//!   allocation (shared `Rc`), never a copy.
//! - **PART-003**: a failed derivation returns no instance and leaves the
//!   parent usable.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::{Cell, RefCell};
use core::fmt;

use hashbrown::{HashMap, HashSet};

use crate::assignment::Assignment;
use crate::error::PartitionError;
use crate::flows::{edge_flows_from_flips, flows_from_flips, EdgeFlow, Flow};
use crate::graph::PartitionGraph;
use crate::updaters::{PropertyValue, Updaters};

/// Part label. Parts are named, not ordered; labels carry no geometry.
pub type PartId = u32;

// ─── Initial assignment ─────────────────────────────────────────────────────

/// How a root partition assigns nodes to parts.
pub enum InitialAssignment<N> {
    /// Every node starts in part `0`.
    SinglePart,
    /// A full node→part mapping. Must cover the graph's node set exactly.
    FromMap(HashMap<N, PartId>),
}

// ─── Partition ──────────────────────────────────────────────────────────────

/// One state of the partition chain.
///
/// Immutable after construction apart from the interior bookkeeping the
/// chain needs (property memoization, the consumed flag, and the shared
/// base map the assignment layer commits into).
pub struct Partition<G: PartitionGraph> {
    graph: Rc<G>,
    assignment: Assignment<G::Node>,
    parts: HashMap<PartId, Rc<HashSet<G::Node>>>,
    parent: Option<Rc<Partition<G>>>,
    flips: Option<HashMap<G::Node, PartId>>,
    flows: Option<HashMap<PartId, Flow<G::Node>>>,
    edge_flows: Option<HashMap<PartId, EdgeFlow<G::Node>>>,
    updaters: Rc<Updaters<G>>,
    cache: RefCell<HashMap<String, Rc<PropertyValue<G::Node>>>>,
    consumed: Cell<bool>,
}

impl<G: PartitionGraph> Partition<G> {
    /// Build a root partition with an empty updater registry.
    pub fn new(
        graph: Rc<G>,
        initial: InitialAssignment<G::Node>,
    ) -> Result<Rc<Self>, PartitionError> {
        Self::with_updaters(graph, initial, Updaters::new())
    }

    /// Build a root partition carrying a registry of derived-property
    /// updaters, shared by every generation merged from it.
    ///
    /// This is the only place the full node set is scanned; every later
    /// generation updates `parts` incrementally from flows.
    pub fn with_updaters(
        graph: Rc<G>,
        initial: InitialAssignment<G::Node>,
        updaters: Updaters<G>,
    ) -> Result<Rc<Self>, PartitionError> {
        let map = match initial {
            InitialAssignment::SinglePart => graph.nodes().map(|n| (n, 0)).collect(),
            InitialAssignment::FromMap(map) => {
                for &node in map.keys() {
                    if !graph.has_node(node) {
                        return Err(PartitionError::UnknownNode {
                            node: format!("{node:?}"),
                        });
                    }
                }
                if map.len() != graph.node_count() {
                    return Err(PartitionError::IncompleteAssignment {
                        missing: graph.node_count() - map.len(),
                    });
                }
                map
            }
        };

        let mut parts: HashMap<PartId, HashSet<G::Node>> = HashMap::new();
        for (&node, &part) in &map {
            parts.entry(part).or_default().insert(node);
        }
        let parts = parts
            .into_iter()
            .map(|(part, set)| (part, Rc::new(set)))
            .collect();

        Ok(Rc::new(Self {
            graph,
            assignment: Assignment::from_map(map),
            parts,
            parent: None,
            flips: None,
            flows: None,
            edge_flows: None,
            updaters: Rc::new(updaters),
            cache: RefCell::new(HashMap::new()),
            consumed: Cell::new(false),
        }))
    }

    /// Derive the next generation by applying a flip batch.
    ///
    /// The single "apply a step" primitive: never mutates the observable
    /// state of the parent, always returns a new instance. An empty batch
    /// is a valid no-op generation. Flips must reference known nodes and
    /// target part labels that already exist in this partition; any
    /// violation fails before the parent is touched (PART-003).
    ///
    /// Takes the handle by value — the parent lives on behind the child's
    /// back-reference. `Rc::clone` the handle first to keep one (including
    /// for retrying after a failed merge).
    pub fn merge(
        self: Rc<Self>,
        flips: HashMap<G::Node, PartId>,
    ) -> Result<Rc<Self>, PartitionError> {
        if self.consumed.get() {
            return Err(PartitionError::ParentConsumed);
        }

        // Validate everything against the parent view first.
        let flows = flows_from_flips(&self.assignment, &flips)?;
        for &part in flows.keys() {
            if !self.parts.contains_key(&part) {
                return Err(PartitionError::UnknownPart { part });
            }
        }

        // Commit-on-wrap: the parent's staged flips settle into the shared
        // base and the child's overlay becomes this batch.
        let assignment = Assignment::wrap(&self.assignment, flips.clone())?;

        // Edge-level flow summary, for partitions that track properties.
        let edge_flows = if self.updaters.is_empty() {
            None
        } else {
            Some(edge_flows_from_flips(
                self.graph.as_ref(),
                &self.assignment,
                &assignment,
                &flips,
            )?)
        };

        // Rebuild only flowed parts as (parent ∪ in) − out; everything else
        // shares the parent's allocation (PART-002).
        let mut parts = self.parts.clone();
        for (&part, flow) in &flows {
            // Key presence was validated above.
            if let Some(parent_set) = self.parts.get(&part) {
                let mut set = HashSet::clone(parent_set);
                set.extend(flow.inflow.iter().copied());
                for node in &flow.outflow {
                    set.remove(node);
                }
                parts.insert(part, Rc::new(set));
            }
        }

        self.consumed.set(true);
        log::debug!(
            "derived generation: {} flips, {} parts touched",
            flips.len(),
            flows.len()
        );

        Ok(Rc::new(Self {
            graph: Rc::clone(&self.graph),
            assignment,
            parts,
            flips: Some(flips),
            flows: Some(flows),
            edge_flows,
            updaters: Rc::clone(&self.updaters),
            cache: RefCell::new(HashMap::new()),
            consumed: Cell::new(false),
            parent: Some(self),
        }))
    }

    // ── Lookups ────────────────────────────────────────────────────────────

    /// The part a node currently belongs to.
    pub fn part_of(&self, node: G::Node) -> Result<PartId, PartitionError> {
        self.assignment.get(node)
    }

    /// Whether an edge's endpoints resolve to different parts.
    pub fn crosses_parts(&self, edge: (G::Node, G::Node)) -> Result<bool, PartitionError> {
        Ok(self.assignment.get(edge.0)? != self.assignment.get(edge.1)?)
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the partition has no parts (only possible on an empty graph).
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    // ── Properties ─────────────────────────────────────────────────────────

    /// Read a named derived property, computing and memoizing it on first
    /// access.
    ///
    /// The updater runs at most once per instance; later reads return the
    /// memoized value. Updaters may read other properties of the same
    /// partition recursively. Unknown names fail with a lookup error.
    pub fn property(&self, name: &str) -> Result<Rc<PropertyValue<G::Node>>, PartitionError> {
        if let Some(value) = self.cache.borrow().get(name) {
            return Ok(Rc::clone(value));
        }
        let updater = self
            .updaters
            .get(name)
            .ok_or_else(|| PartitionError::UnknownProperty {
                name: String::from(name),
            })?;
        // The cache borrow is released before the updater runs, so updaters
        // can recursively read sibling properties.
        let value = Rc::new(updater(self)?);
        self.cache
            .borrow_mut()
            .insert(String::from(name), Rc::clone(&value));
        Ok(value)
    }

    /// Peek a memoized property without computing it.
    ///
    /// The incremental baseline updaters use this on the parent and fall
    /// back to a full scan when nothing is materialized, so laziness never
    /// forces work onto an older generation.
    pub fn cached(&self, name: &str) -> Option<Rc<PropertyValue<G::Node>>> {
        self.cache.borrow().get(name).map(Rc::clone)
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    /// The shared graph.
    pub fn graph(&self) -> &Rc<G> {
        &self.graph
    }

    /// The layered assignment backing this generation.
    pub fn assignment(&self) -> &Assignment<G::Node> {
        &self.assignment
    }

    /// Part label → member set. Sets are behind `Rc` so untouched parts can
    /// be shared between generations.
    pub fn parts(&self) -> &HashMap<PartId, Rc<HashSet<G::Node>>> {
        &self.parts
    }

    /// The parent this generation was derived from (`None` for a root).
    pub fn parent(&self) -> Option<&Rc<Partition<G>>> {
        self.parent.as_ref()
    }

    /// The flip batch that produced this generation (`None` for a root).
    pub fn flips(&self) -> Option<&HashMap<G::Node, PartId>> {
        self.flips.as_ref()
    }

    /// Per-part node flows of the producing flip batch (`None` for a root).
    pub fn flows(&self) -> Option<&HashMap<PartId, Flow<G::Node>>> {
        self.flows.as_ref()
    }

    /// Per-part cut-edge flows, present on derived generations whose
    /// registry carries at least one updater.
    pub fn edge_flows(&self) -> Option<&HashMap<PartId, EdgeFlow<G::Node>>> {
        self.edge_flows.as_ref()
    }

    /// The shared updater registry.
    pub fn updaters(&self) -> &Rc<Updaters<G>> {
        &self.updaters
    }

    /// Whether this partition has already been used to derive a child.
    pub fn is_consumed(&self) -> bool {
        self.consumed.get()
    }
}

impl<G: PartitionGraph> fmt::Display for Partition<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.parts.len();
        let plural = if n == 1 { "" } else { "s" };
        write!(f, "partition of a graph into {n} part{plural}")
    }
}

impl<G: PartitionGraph> fmt::Debug for Partition<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partition")
            .field("parts", &self.parts.len())
            .field("nodes", &self.assignment.len())
            .field("generation_flips", &self.flips.as_ref().map(HashMap::len))
            .field("consumed", &self.consumed.get())
            .finish()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;

    // Path graph 1-2-3-4 split down the middle.
    fn graph() -> Rc<AdjacencyGraph> {
        let mut g = AdjacencyGraph::new();
        for i in 1..=4 {
            g.add_node(i);
        }
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 3).unwrap();
        g.add_edge(3, 4).unwrap();
        Rc::new(g)
    }

    fn initial() -> InitialAssignment<u32> {
        InitialAssignment::FromMap([(1, 0), (2, 0), (3, 1), (4, 1)].iter().copied().collect())
    }

    fn flips(pairs: &[(u32, PartId)]) -> HashMap<u32, PartId> {
        pairs.iter().copied().collect()
    }

    fn members(p: &Partition<AdjacencyGraph>, part: PartId) -> Rc<HashSet<u32>> {
        Rc::clone(&p.parts()[&part])
    }

    #[test]
    fn test_root_groups_parts_from_map() {
        let root = Partition::new(graph(), initial()).unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(members(&root, 0).len(), 2);
        assert!(members(&root, 0).contains(&1) && members(&root, 0).contains(&2));
        assert!(members(&root, 1).contains(&3) && members(&root, 1).contains(&4));
        assert_eq!(root.part_of(3).unwrap(), 1);
    }

    #[test]
    fn test_root_defaults_to_single_part() {
        let root = Partition::new(graph(), InitialAssignment::SinglePart).unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(members(&root, 0).len(), 4);
    }

    #[test]
    fn test_incomplete_initial_assignment_fails() {
        let err = Partition::new(
            graph(),
            InitialAssignment::FromMap([(1, 0), (2, 0)].iter().copied().collect()),
        )
        .unwrap_err();
        assert_eq!(err, PartitionError::IncompleteAssignment { missing: 2 });
    }

    #[test]
    fn test_initial_assignment_with_foreign_node_fails() {
        let err = Partition::new(
            graph(),
            InitialAssignment::FromMap(
                [(1, 0), (2, 0), (3, 1), (9, 1)].iter().copied().collect(),
            ),
        )
        .unwrap_err();
        assert!(matches!(err, PartitionError::UnknownNode { .. }));
    }

    #[test]
    fn test_merge_moves_one_node() {
        let root = Partition::new(graph(), initial()).unwrap();
        let child = root.merge(flips(&[(2, 1)])).unwrap();

        assert_eq!(members(&child, 0).len(), 1);
        assert!(members(&child, 0).contains(&1));
        assert_eq!(members(&child, 1).len(), 3);
        assert_eq!(child.part_of(2).unwrap(), 1);

        let flows = child.flows().unwrap();
        assert!(flows[&0].outflow.contains(&2));
        assert!(flows[&1].inflow.contains(&2));
        assert_eq!(child.flips().unwrap()[&2], 1);
    }

    #[test]
    fn test_grandchild_continues_the_chain() {
        let root = Partition::new(graph(), initial()).unwrap();
        let child = root.merge(flips(&[(2, 1)])).unwrap();
        let grandchild = Rc::clone(&child).merge(flips(&[(3, 0)])).unwrap();

        assert!(members(&grandchild, 0).contains(&1));
        assert!(members(&grandchild, 0).contains(&3));
        assert!(members(&grandchild, 1).contains(&2));
        assert!(members(&grandchild, 1).contains(&4));
        // Part 0 changed in the grandchild, so its set is a fresh object.
        assert!(!Rc::ptr_eq(&members(&child, 0), &members(&grandchild, 0)));
    }

    #[test]
    fn test_untouched_parts_share_storage() {
        let mut g = AdjacencyGraph::new();
        for i in 0..6 {
            g.add_node(i);
        }
        for i in 0..5 {
            g.add_edge(i, i + 1).unwrap();
        }
        let map = [(0, 0), (1, 0), (2, 1), (3, 1), (4, 2), (5, 2)]
            .iter()
            .copied()
            .collect();
        let root = Partition::new(Rc::new(g), InitialAssignment::FromMap(map)).unwrap();
        let child = Rc::clone(&root).merge(flips(&[(2, 0)])).unwrap();

        // Part 2 saw no flow: identical allocation, not an equal copy.
        assert!(Rc::ptr_eq(&members(&root, 2), &members(&child, 2)));
        assert!(!Rc::ptr_eq(&members(&root, 0), &members(&child, 0)));
        assert!(!Rc::ptr_eq(&members(&root, 1), &members(&child, 1)));
    }

    #[test]
    fn test_empty_merge_is_an_equivalent_generation() {
        let root = Partition::new(graph(), initial()).unwrap();
        let child = Rc::clone(&root).merge(HashMap::new()).unwrap();

        assert_eq!(root.parts(), child.parts());
        let expected: HashMap<u32, PartId> =
            [(1, 0), (2, 0), (3, 1), (4, 1)].iter().copied().collect();
        assert_eq!(child.assignment().to_map().unwrap(), expected);
        assert!(child.flows().unwrap().is_empty());
    }

    #[test]
    fn test_parent_is_consumed_after_merge() {
        let root = Partition::new(graph(), initial()).unwrap();
        let _child = Rc::clone(&root).merge(flips(&[(2, 1)])).unwrap();
        assert!(root.is_consumed());
        assert_eq!(
            root.merge(flips(&[(3, 0)])).unwrap_err(),
            PartitionError::ParentConsumed
        );
    }

    #[test]
    fn test_consumed_parent_parts_snapshot_stays_valid() {
        let root = Partition::new(graph(), initial()).unwrap();
        let child = Rc::clone(&root).merge(flips(&[(2, 1)])).unwrap();
        let _grandchild = Rc::clone(&child).merge(flips(&[(3, 0)])).unwrap();

        // Root's assignment view is two generations back and stale now,
        // but its materialized parts are untouched history.
        assert_eq!(root.part_of(2), Err(PartitionError::StaleAssignment));
        assert!(members(&root, 0).contains(&2));
        assert_eq!(members(&root, 1).len(), 2);
    }

    #[test]
    fn test_flip_to_unknown_part_fails_and_parent_survives() {
        let root = Partition::new(graph(), initial()).unwrap();
        let err = Rc::clone(&root).merge(flips(&[(2, 7)])).unwrap_err();
        assert_eq!(err, PartitionError::UnknownPart { part: 7 });
        assert!(!root.is_consumed());
        // Still derivable after the failed attempt.
        assert!(root.merge(flips(&[(2, 1)])).is_ok());
    }

    #[test]
    fn test_flip_of_unknown_node_fails() {
        let root = Partition::new(graph(), initial()).unwrap();
        let err = Rc::clone(&root).merge(flips(&[(42, 0)])).unwrap_err();
        assert!(matches!(err, PartitionError::UnknownNode { .. }));
        assert!(!root.is_consumed());
    }

    #[test]
    fn test_crosses_parts() {
        let root = Partition::new(graph(), initial()).unwrap();
        assert!(!root.crosses_parts((1, 2)).unwrap());
        assert!(root.crosses_parts((2, 3)).unwrap());

        let child = root.merge(flips(&[(2, 1)])).unwrap();
        assert!(child.crosses_parts((1, 2)).unwrap());
        assert!(!child.crosses_parts((2, 3)).unwrap());
    }

    #[test]
    fn test_display_counts_parts() {
        use alloc::string::ToString;
        let root = Partition::new(graph(), initial()).unwrap();
        assert_eq!(root.to_string(), "partition of a graph into 2 parts");
        let single = Partition::new(graph(), InitialAssignment::SinglePart).unwrap();
        assert_eq!(single.to_string(), "partition of a graph into 1 part");
    }

    #[test]
    fn test_partition_invariant_across_many_generations() {
        let root = Partition::new(graph(), initial()).unwrap();
        let mut current = root;
        let moves: &[(u32, PartId)] = &[(2, 1), (3, 0), (2, 0), (4, 0), (1, 1)];
        for &(node, part) in moves {
            current = current.merge(flips(&[(node, part)])).unwrap();
            let mut seen: HashSet<u32> = HashSet::new();
            let mut total = 0usize;
            for set in current.parts().values() {
                total += set.len();
                for &n in set.iter() {
                    assert!(seen.insert(n), "node {n} appears in two parts");
                }
            }
            assert_eq!(total, 4, "parts must cover the node set exactly");
        }
    }
}
