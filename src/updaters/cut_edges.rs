//! Cut-edge updaters.
//!
//! A *cut edge* joins two nodes in different parts. Both updaters are
//! incremental: when the parent generation has a materialized value they
//! repair it using only the flipped nodes' incident edges (or the derived
//! edge flows); otherwise they fall back to one full edge scan on the
//! partition being read.

use hashbrown::{HashMap, HashSet};

use crate::error::PartitionError;
use crate::flows::canonical_edge;
use crate::graph::PartitionGraph;
use crate::partition::{PartId, Partition};
use crate::updaters::{shape_error, PropertyValue};

/// Property name: the set of all cut edges.
pub const CUT_EDGES: &str = "cut_edges";

/// Property name: each part's cut edges.
pub const CUT_EDGES_BY_PART: &str = "cut_edges_by_part";

/// All edges whose endpoints lie in different parts, as canonical pairs.
pub fn cut_edges<G: PartitionGraph>(
    partition: &Partition<G>,
) -> Result<PropertyValue<G::Node>, PartitionError> {
    if let (Some(parent), Some(flips)) = (partition.parent(), partition.flips()) {
        if let Some(cached) = parent.cached(CUT_EDGES) {
            let base = cached.as_edge_set().ok_or_else(|| shape_error(CUT_EDGES))?;
            let mut set = base.clone();
            // Only edges incident to a flipped node can change status.
            for &node in flips.keys() {
                for neighbor in partition.graph().neighbors(node) {
                    let edge = canonical_edge((node, neighbor));
                    if partition.crosses_parts(edge)? {
                        set.insert(edge);
                    } else {
                        set.remove(&edge);
                    }
                }
            }
            return Ok(PropertyValue::EdgeSet(set));
        }
    }

    let mut set = HashSet::new();
    for edge in partition.graph().edges() {
        let edge = canonical_edge(edge);
        if partition.crosses_parts(edge)? {
            set.insert(edge);
        }
    }
    Ok(PropertyValue::EdgeSet(set))
}

/// Cut edges grouped by part: an edge appears under both endpoint parts.
pub fn cut_edges_by_part<G: PartitionGraph>(
    partition: &Partition<G>,
) -> Result<PropertyValue<G::Node>, PartitionError> {
    if let (Some(parent), Some(edge_flows)) = (partition.parent(), partition.edge_flows()) {
        if let Some(cached) = parent.cached(CUT_EDGES_BY_PART) {
            let base = cached
                .as_part_edge_sets()
                .ok_or_else(|| shape_error(CUT_EDGES_BY_PART))?;
            let mut by_part = base.clone();
            for (&part, flow) in edge_flows {
                let mut set = by_part.remove(&part).unwrap_or_default();
                set.extend(flow.inflow.iter().copied());
                for edge in &flow.outflow {
                    set.remove(edge);
                }
                by_part.insert(part, set);
            }
            return Ok(PropertyValue::PartEdgeSets(by_part));
        }
    }

    let cut = partition.property(CUT_EDGES)?;
    let cut = cut.as_edge_set().ok_or_else(|| shape_error(CUT_EDGES))?;
    let mut by_part: HashMap<PartId, HashSet<(G::Node, G::Node)>> = HashMap::new();
    for &(a, b) in cut {
        by_part.entry(partition.part_of(a)?).or_default().insert((a, b));
        by_part.entry(partition.part_of(b)?).or_default().insert((a, b));
    }
    Ok(PropertyValue::PartEdgeSets(by_part))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
