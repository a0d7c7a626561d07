/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Named derived-property functions and their per-instance memoization.
//!
//! An *updater* is a function from a partition to a derived value,
//! registered under a string name in an [`Updaters`] table built once per
//! chain and shared by every generation. Reading
//! [`Partition::property`](crate::partition::Partition::property) invokes
//! the updater lazily and memoizes the result for that instance only —
//! sibling and child partitions never see each other's memoized values.
//!
//! Updaters must be pure functions of the partition's visible state
//! (assignment, parts, flows, graph, and — through
//! [`Partition::cached`](crate::partition::Partition::cached) — the
//! parent's already-materialized values, which are immutable). An updater
//! may recursively read other properties of the same partition; cyclic
//! updater sets are a caller error and are not detected here.
//!
//! Values are a tagged union ([`PropertyValue`]) rather than an erased
//! `Any`, so readers branch on a shape tag instead of downcasting.
//!
//! | Submodule | Updaters |
//! |-----------|----------|
//! | [`cut_edges`] | `cut_edges`, `cut_edges_by_part` |
//! | [`boundary`] | `boundary_nodes`, `exterior_boundaries`, `interior_boundaries`, `perimeters` |
//! | [`tally`] | attribute sums per part, built by `register_tally` |

pub mod boundary;
pub mod cut_edges;
pub mod tally;

pub use boundary::{
    BOUNDARY_NODES, EXTERIOR_BOUNDARIES, INTERIOR_BOUNDARIES, PERIMETERS,
};
pub use cut_edges::{CUT_EDGES, CUT_EDGES_BY_PART};

use alloc::boxed::Box;
use alloc::string::String;

use hashbrown::{HashMap, HashSet};

use crate::error::PartitionError;
use crate::graph::{NodeId, PartitionGraph};
use crate::partition::{PartId, Partition};

// ─── Property values ────────────────────────────────────────────────────────

/// A derived-property value, tagged by shape.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue<N: NodeId> {
    /// A single number.
    Scalar(f64),
    /// One number per part.
    PartScalars(HashMap<PartId, f64>),
    /// A set of nodes.
    NodeSet(HashSet<N>),
    /// A set of canonical edges.
    EdgeSet(HashSet<(N, N)>),
    /// One set of canonical edges per part.
    PartEdgeSets(HashMap<PartId, HashSet<(N, N)>>),
}

impl<N: NodeId> PropertyValue<N> {
    /// The scalar payload, if this is a `Scalar`.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    /// The per-part scalar map, if this is a `PartScalars`.
    pub fn as_part_scalars(&self) -> Option<&HashMap<PartId, f64>> {
        match self {
            Self::PartScalars(map) => Some(map),
            _ => None,
        }
    }

    /// The node set, if this is a `NodeSet`.
    pub fn as_node_set(&self) -> Option<&HashSet<N>> {
        match self {
            Self::NodeSet(set) => Some(set),
            _ => None,
        }
    }

    /// The edge set, if this is an `EdgeSet`.
    pub fn as_edge_set(&self) -> Option<&HashSet<(N, N)>> {
        match self {
            Self::EdgeSet(set) => Some(set),
            _ => None,
        }
    }

    /// The per-part edge sets, if this is a `PartEdgeSets`.
    pub fn as_part_edge_sets(&self) -> Option<&HashMap<PartId, HashSet<(N, N)>>> {
        match self {
            Self::PartEdgeSets(map) => Some(map),
            _ => None,
        }
    }
}

/// Shape-mismatch error for readers that expected a different
/// [`PropertyValue`] variant under a name.
pub fn shape_error(name: &str) -> PartitionError {
    PartitionError::PropertyShape {
        name: String::from(name),
    }
}

// ─── Updater registry ───────────────────────────────────────────────────────

/// A boxed updater function.
pub type UpdaterFn<G> = Box<
    dyn Fn(
        &Partition<G>,
    ) -> Result<PropertyValue<<G as PartitionGraph>::Node>, PartitionError>,
>;

/// Registry of named updater functions, built once and shared (via `Rc`)
/// across every generation of a chain.
pub struct Updaters<G: PartitionGraph> {
    funcs: HashMap<String, UpdaterFn<G>>,
}

impl<G: PartitionGraph> Default for Updaters<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: PartitionGraph> Updaters<G> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            funcs: HashMap::new(),
        }
    }

    /// Register an updater under a name, replacing any previous entry.
    pub fn insert<F>(&mut self, name: &str, updater: F)
    where
        F: Fn(&Partition<G>) -> Result<PropertyValue<G::Node>, PartitionError> + 'static,
    {
        self.funcs.insert(String::from(name), Box::new(updater));
    }

    /// Look up an updater by name.
    pub fn get(&self, name: &str) -> Option<&UpdaterFn<G>> {
        self.funcs.get(name)
    }

    /// Whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    /// Number of registered updaters.
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Iterate the registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }

    /// Absorb another registry; entries from `other` win on name conflicts.
    pub fn extend(&mut self, other: Updaters<G>) {
        for (name, func) in other.funcs {
            self.funcs.insert(name, func);
        }
    }
}

impl<G: PartitionGraph> core::fmt::Debug for Updaters<G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Updaters")
            .field("len", &self.funcs.len())
            .finish()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
