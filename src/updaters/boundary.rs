//! Boundary and perimeter updaters for geography-carrying graphs.
//!
//! These read three graph attributes:
//!
//! | Attribute | On | Meaning |
//! |-----------|----|---------|
//! | [`BOUNDARY_NODE_ATTR`] | node, `Bool` | lies on the outer boundary of the whole graph |
//! | [`BOUNDARY_PERIM_ATTR`] | node, `Float` | length of that node's stretch of outer boundary |
//! | [`SHARED_PERIM_ATTR`] | edge, `Float` | length of the border shared by the two endpoints |
//!
//! A part's *exterior* boundary is the outer-boundary length of its member
//! nodes; its *interior* boundary is the shared length along its cut edges;
//! its perimeter is the sum of the two. Exterior and interior updaters are
//! incremental over node / edge flows with a full-scan fallback; the
//! perimeter updater composes the other two through recursive property
//! reads.

use alloc::format;

use hashbrown::HashMap;

use crate::error::PartitionError;
use crate::graph::{AttrValue, PartitionGraph};
use crate::partition::{PartId, Partition};
use crate::updaters::cut_edges::CUT_EDGES_BY_PART;
use crate::updaters::{shape_error, PropertyValue};

/// Node attribute: is this node on the graph's outer boundary?
pub const BOUNDARY_NODE_ATTR: &str = "boundary_node";

/// Node attribute: outer-boundary length contributed by this node.
pub const BOUNDARY_PERIM_ATTR: &str = "boundary_perim";

/// Edge attribute: border length shared by the endpoints.
pub const SHARED_PERIM_ATTR: &str = "shared_perim";

/// Property name: nodes flagged as outer-boundary.
pub const BOUNDARY_NODES: &str = "boundary_nodes";

/// Property name: per-part outer-boundary length.
pub const EXTERIOR_BOUNDARIES: &str = "exterior_boundaries";

/// Property name: per-part cut-edge shared length.
pub const INTERIOR_BOUNDARIES: &str = "interior_boundaries";

/// Property name: per-part total perimeter.
pub const PERIMETERS: &str = "perimeters";

/// All nodes whose [`BOUNDARY_NODE_ATTR`] is `true`.
///
/// Graph-static, so this is a plain scan on every instance.
pub fn boundary_nodes<G: PartitionGraph>(
    partition: &Partition<G>,
) -> Result<PropertyValue<G::Node>, PartitionError> {
    let mut set = hashbrown::HashSet::new();
    for node in partition.graph().nodes() {
        if matches!(
            partition.graph().node_attr(node, BOUNDARY_NODE_ATTR),
            Some(AttrValue::Bool(true))
        ) {
            set.insert(node);
        }
    }
    Ok(PropertyValue::NodeSet(set))
}

/// Per-part sum of [`BOUNDARY_PERIM_ATTR`] over boundary member nodes.
pub fn exterior_boundaries<G: PartitionGraph>(
    partition: &Partition<G>,
) -> Result<PropertyValue<G::Node>, PartitionError> {
    let boundary = partition.property(BOUNDARY_NODES)?;
    let boundary = boundary
        .as_node_set()
        .ok_or_else(|| shape_error(BOUNDARY_NODES))?;

    if let (Some(parent), Some(flows)) = (partition.parent(), partition.flows()) {
        if let Some(cached) = parent.cached(EXTERIOR_BOUNDARIES) {
            let mut sums = cached
                .as_part_scalars()
                .ok_or_else(|| shape_error(EXTERIOR_BOUNDARIES))?
                .clone();
            for (&part, flow) in flows {
                let mut total = sums.get(&part).copied().unwrap_or(0.0);
                for node in &flow.inflow {
                    if boundary.contains(node) {
                        total += boundary_perim(partition.graph().as_ref(), *node)?;
                    }
                }
                for node in &flow.outflow {
                    if boundary.contains(node) {
                        total -= boundary_perim(partition.graph().as_ref(), *node)?;
                    }
                }
                sums.insert(part, total);
            }
            return Ok(PropertyValue::PartScalars(sums));
        }
    }

    let mut sums: HashMap<PartId, f64> =
        partition.parts().keys().map(|&part| (part, 0.0)).collect();
    for &node in boundary {
        let part = partition.part_of(node)?;
        *sums.entry(part).or_insert(0.0) += boundary_perim(partition.graph().as_ref(), node)?;
    }
    Ok(PropertyValue::PartScalars(sums))
}

/// Per-part sum of [`SHARED_PERIM_ATTR`] over the part's cut edges.
pub fn interior_boundaries<G: PartitionGraph>(
    partition: &Partition<G>,
) -> Result<PropertyValue<G::Node>, PartitionError> {
    if let (Some(parent), Some(edge_flows)) = (partition.parent(), partition.edge_flows()) {
        if let Some(cached) = parent.cached(INTERIOR_BOUNDARIES) {
            let mut sums = cached
                .as_part_scalars()
                .ok_or_else(|| shape_error(INTERIOR_BOUNDARIES))?
                .clone();
            for (&part, flow) in edge_flows {
                let mut total = sums.get(&part).copied().unwrap_or(0.0);
                for &edge in &flow.inflow {
                    total += shared_perim(partition.graph().as_ref(), edge)?;
                }
                for &edge in &flow.outflow {
                    total -= shared_perim(partition.graph().as_ref(), edge)?;
                }
                sums.insert(part, total);
            }
            return Ok(PropertyValue::PartScalars(sums));
        }
    }

    let by_part = partition.property(CUT_EDGES_BY_PART)?;
    let by_part = by_part
        .as_part_edge_sets()
        .ok_or_else(|| shape_error(CUT_EDGES_BY_PART))?;
    let mut sums: HashMap<PartId, f64> =
        partition.parts().keys().map(|&part| (part, 0.0)).collect();
    for (&part, edges) in by_part {
        let mut total = 0.0;
        for &edge in edges {
            total += shared_perim(partition.graph().as_ref(), edge)?;
        }
        sums.insert(part, total);
    }
    Ok(PropertyValue::PartScalars(sums))
}

/// Per-part perimeter: exterior plus interior boundary length.
pub fn perimeters<G: PartitionGraph>(
    partition: &Partition<G>,
) -> Result<PropertyValue<G::Node>, PartitionError> {
    let exterior = partition.property(EXTERIOR_BOUNDARIES)?;
    let exterior = exterior
        .as_part_scalars()
        .ok_or_else(|| shape_error(EXTERIOR_BOUNDARIES))?;
    let interior = partition.property(INTERIOR_BOUNDARIES)?;
    let interior = interior
        .as_part_scalars()
        .ok_or_else(|| shape_error(INTERIOR_BOUNDARIES))?;

    let mut sums = HashMap::new();
    for &part in partition.parts().keys() {
        let ext = exterior.get(&part).copied().unwrap_or(0.0);
        let int = interior.get(&part).copied().unwrap_or(0.0);
        sums.insert(part, ext + int);
    }
    Ok(PropertyValue::PartScalars(sums))
}

fn boundary_perim<G: PartitionGraph>(graph: &G, node: G::Node) -> Result<f64, PartitionError> {
    graph
        .node_attr(node, BOUNDARY_PERIM_ATTR)
        .and_then(AttrValue::as_f64)
        .ok_or_else(|| missing(BOUNDARY_PERIM_ATTR, format!("node {node:?}")))
}

fn shared_perim<G: PartitionGraph>(
    graph: &G,
    edge: (G::Node, G::Node),
) -> Result<f64, PartitionError> {
    graph
        .edge_attr(edge, SHARED_PERIM_ATTR)
        .and_then(AttrValue::as_f64)
        .ok_or_else(|| missing(SHARED_PERIM_ATTR, format!("edge {edge:?}")))
}

fn missing(key: &str, on: alloc::string::String) -> PartitionError {
    PartitionError::MissingAttribute {
        key: alloc::string::String::from(key),
        on,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
