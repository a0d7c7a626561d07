//! Graph abstraction consumed by the partition chain.
//!
//! The chain never mutates graph topology or attributes; everything here is
//! read-only from the partition layer's perspective. Implement
//! [`PartitionGraph`] for your own storage, or use the built-in
//! [`AdjacencyGraph`] for tests, demos, and small deployments.
//!
//! # Implementing for your own storage
//!
//! ```rust,ignore
//! use partition_core::graph::{AttrValue, PartitionGraph};
//!
//! struct MyGraph { /* ... */ }
//!
//! impl PartitionGraph for MyGraph {
//!     type Node = u32;
//!     fn node_count(&self) -> usize { /* ... */ }
//!     fn nodes(&self) -> impl Iterator<Item = u32> + '_ { /* ... */ }
//!     // ...
//! }
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::error::PartitionError;
use crate::flows::canonical_edge;

// ─── Node identifier bounds ─────────────────────────────────────────────────

/// Blanket bound for node identifiers.
///
/// `Ord` is required so an undirected edge has a single canonical rendering
/// as a `(min, max)` pair; `Debug` so lookup failures can name the node.
pub trait NodeId: Copy + Eq + Ord + Hash + fmt::Debug {}

impl<T: Copy + Eq + Ord + Hash + fmt::Debug> NodeId for T {}

// ─── Attribute values ───────────────────────────────────────────────────────

/// A node or edge attribute value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    /// Boolean flag (e.g. "is this node on the outer boundary").
    Bool(bool),
    /// Integer quantity (e.g. a population count).
    Int(i64),
    /// Floating-point quantity (e.g. a perimeter length).
    Float(f64),
}

impl AttrValue {
    /// Return the boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Return the integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Return the value as an `f64`. `Int` coerces; `Bool` does not.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            Self::Int(i) => Some(*i as f64),
            Self::Bool(_) => None,
        }
    }
}

// ─── PartitionGraph trait ───────────────────────────────────────────────────

/// Read-only view of a graph: node identifiers, undirected edges as endpoint
/// pairs, and per-node / per-edge attributes keyed by string.
///
/// The `'static` supertrait reflects how the chain uses a graph: one shared,
/// owned instance referenced by every generation for the lifetime of the
/// chain.
pub trait PartitionGraph: 'static {
    /// Node identifier type.
    type Node: NodeId;

    /// Number of nodes.
    fn node_count(&self) -> usize;

    /// Iterate all node identifiers.
    fn nodes(&self) -> impl Iterator<Item = Self::Node> + '_;

    /// Iterate all edges as endpoint pairs. Each undirected edge appears
    /// exactly once; orientation is unspecified.
    fn edges(&self) -> impl Iterator<Item = (Self::Node, Self::Node)> + '_;

    /// Iterate the neighbors of a node. Unknown nodes yield nothing.
    fn neighbors(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_;

    /// Whether the node exists in this graph.
    fn has_node(&self, node: Self::Node) -> bool;

    /// Attribute lookup on a node. `None` if the node or key is absent.
    fn node_attr(&self, node: Self::Node, key: &str) -> Option<&AttrValue>;

    /// Attribute lookup on an edge, accepting either endpoint order.
    /// `None` if the edge or key is absent.
    fn edge_attr(&self, edge: (Self::Node, Self::Node), key: &str) -> Option<&AttrValue>;
}

// ─── AdjacencyGraph ─────────────────────────────────────────────────────────

/// A concrete adjacency-list graph with `u32` node identifiers and string-
/// keyed attribute maps.
///
/// Node iteration follows insertion order, which keeps root-partition
/// construction and the full-scan updater fallbacks deterministic.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyGraph {
    nodes: Vec<u32>,
    adjacency: HashMap<u32, Vec<u32>>,
    edges: Vec<(u32, u32)>,
    edge_set: HashSet<(u32, u32)>,
    node_attrs: HashMap<u32, HashMap<String, AttrValue>>,
    edge_attrs: HashMap<(u32, u32), HashMap<String, AttrValue>>,
}

impl AdjacencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `false` if it was already present.
    pub fn add_node(&mut self, node: u32) -> bool {
        if self.adjacency.contains_key(&node) {
            return false;
        }
        self.nodes.push(node);
        self.adjacency.insert(node, Vec::new());
        true
    }

    /// Add an undirected edge between two existing nodes.
    ///
    /// Returns `false` if the edge was already present. Fails with a lookup
    /// error when either endpoint is unknown — edges never create nodes.
    pub fn add_edge(&mut self, a: u32, b: u32) -> Result<bool, PartitionError> {
        for node in [a, b] {
            if !self.adjacency.contains_key(&node) {
                return Err(unknown_node(node));
            }
        }
        let edge = canonical_edge((a, b));
        if !self.edge_set.insert(edge) {
            return Ok(false);
        }
        self.edges.push(edge);
        if let Some(list) = self.adjacency.get_mut(&a) {
            list.push(b);
        }
        if a != b {
            if let Some(list) = self.adjacency.get_mut(&b) {
                list.push(a);
            }
        }
        Ok(true)
    }

    /// Set (or replace) an attribute on an existing node.
    pub fn set_node_attr(
        &mut self,
        node: u32,
        key: &str,
        value: AttrValue,
    ) -> Result<(), PartitionError> {
        if !self.adjacency.contains_key(&node) {
            return Err(unknown_node(node));
        }
        self.node_attrs
            .entry(node)
            .or_default()
            .insert(String::from(key), value);
        Ok(())
    }

    /// Set (or replace) an attribute on an existing edge, in either
    /// endpoint order.
    pub fn set_edge_attr(
        &mut self,
        edge: (u32, u32),
        key: &str,
        value: AttrValue,
    ) -> Result<(), PartitionError> {
        let edge = canonical_edge(edge);
        if !self.edge_set.contains(&edge) {
            return Err(PartitionError::UnknownEdge {
                edge: alloc::format!("{edge:?}"),
            });
        }
        self.edge_attrs
            .entry(edge)
            .or_default()
            .insert(String::from(key), value);
        Ok(())
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn unknown_node(node: u32) -> PartitionError {
    PartitionError::UnknownNode {
        node: alloc::format!("{node:?}"),
    }
}

impl PartitionGraph for AdjacencyGraph {
    type Node = u32;

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn nodes(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes.iter().copied()
    }

    fn edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edges.iter().copied()
    }

    fn neighbors(&self, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .copied()
    }

    fn has_node(&self, node: u32) -> bool {
        self.adjacency.contains_key(&node)
    }

    fn node_attr(&self, node: u32, key: &str) -> Option<&AttrValue> {
        self.node_attrs.get(&node)?.get(key)
    }

    fn edge_attr(&self, edge: (u32, u32), key: &str) -> Option<&AttrValue> {
        self.edge_attrs.get(&canonical_edge(edge))?.get(key)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
