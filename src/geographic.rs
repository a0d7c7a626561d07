//! Geography-aware partition construction.
//!
//! A geographic partition is an ordinary [`Partition`] whose registry always
//! carries the boundary/perimeter baseline — callers may add their own
//! updaters, but the baseline wins any name conflict — and whose graph is
//! checked once, up front, for the attributes those updaters read. A graph
//! that fails the check never produces a partition; a graph that merely has
//! no boundary-designated node produces one with a single warning.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;

use crate::error::PartitionError;
use crate::graph::{AttrValue, PartitionGraph};
use crate::partition::{InitialAssignment, Partition};
use crate::updaters::boundary::{
    boundary_nodes, exterior_boundaries, interior_boundaries, perimeters, BOUNDARY_NODE_ATTR,
    BOUNDARY_PERIM_ATTR, SHARED_PERIM_ATTR,
};
use crate::updaters::cut_edges::{cut_edges, cut_edges_by_part};
use crate::updaters::{
    Updaters, BOUNDARY_NODES, CUT_EDGES, CUT_EDGES_BY_PART, EXTERIOR_BOUNDARIES,
    INTERIOR_BOUNDARIES, PERIMETERS,
};

/// The baseline updater set every geographic partition carries.
pub fn geographic_updaters<G: PartitionGraph>() -> Updaters<G> {
    let mut updaters = Updaters::new();
    updaters.insert(CUT_EDGES, cut_edges);
    updaters.insert(CUT_EDGES_BY_PART, cut_edges_by_part);
    updaters.insert(BOUNDARY_NODES, boundary_nodes);
    updaters.insert(EXTERIOR_BOUNDARIES, exterior_boundaries);
    updaters.insert(INTERIOR_BOUNDARIES, interior_boundaries);
    updaters.insert(PERIMETERS, perimeters);
    updaters
}

/// Check the attribute preconditions of the baseline updaters.
///
/// Fails on the first node without a boolean [`BOUNDARY_NODE_ATTR`], the
/// first boundary node without a numeric [`BOUNDARY_PERIM_ATTR`], or the
/// first edge without a numeric [`SHARED_PERIM_ATTR`]. Warns (once, without
/// failing) when no node is boundary-designated — legitimate for a graph
/// with no outer boundary, but more often a sign of missing data prep.
pub fn validate_geography<G: PartitionGraph>(graph: &G) -> Result<(), PartitionError> {
    let mut boundary_count = 0usize;
    for node in graph.nodes() {
        match graph.node_attr(node, BOUNDARY_NODE_ATTR) {
            Some(AttrValue::Bool(flag)) => {
                if *flag {
                    boundary_count += 1;
                    let perim = graph
                        .node_attr(node, BOUNDARY_PERIM_ATTR)
                        .and_then(AttrValue::as_f64);
                    if perim.is_none() {
                        return Err(missing(BOUNDARY_PERIM_ATTR, format!("node {node:?}")));
                    }
                }
            }
            _ => return Err(missing(BOUNDARY_NODE_ATTR, format!("node {node:?}"))),
        }
    }
    for edge in graph.edges() {
        let perim = graph
            .edge_attr(edge, SHARED_PERIM_ATTR)
            .and_then(AttrValue::as_f64);
        if perim.is_none() {
            return Err(missing(SHARED_PERIM_ATTR, format!("edge {edge:?}")));
        }
    }
    if boundary_count == 0 {
        log::warn!("graph has no boundary-designated nodes; exterior boundaries will all be zero");
    }
    Ok(())
}

/// Build a geographic root partition.
///
/// `extra` may carry caller-supplied updaters (tallies, custom scores);
/// the baseline set is merged over it and wins on name conflicts.
pub fn new_geographic<G: PartitionGraph>(
    graph: Rc<G>,
    initial: InitialAssignment<G::Node>,
    extra: Updaters<G>,
) -> Result<Rc<Partition<G>>, PartitionError> {
    validate_geography(graph.as_ref())?;
    let mut updaters = extra;
    updaters.extend(geographic_updaters());
    Partition::with_updaters(graph, initial, updaters)
}

fn missing(key: &str, on: String) -> PartitionError {
    PartitionError::MissingAttribute {
        key: String::from(key),
        on,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;
    use crate::updaters::PropertyValue;

    fn geo_graph() -> AdjacencyGraph {
        let mut g = AdjacencyGraph::new();
        for i in 0..4 {
            g.add_node(i);
            g.set_node_attr(i, BOUNDARY_NODE_ATTR, AttrValue::Bool(i == 0))
                .unwrap();
        }
        g.set_node_attr(0, BOUNDARY_PERIM_ATTR, AttrValue::Float(2.5))
            .unwrap();
        for (a, b) in [(0, 1), (1, 2), (2, 3)] {
            g.add_edge(a, b).unwrap();
            g.set_edge_attr((a, b), SHARED_PERIM_ATTR, AttrValue::Float(1.0))
                .unwrap();
        }
        g
    }

    #[test]
    fn test_valid_geography_constructs() {
        let partition = new_geographic(
            Rc::new(geo_graph()),
            InitialAssignment::SinglePart,
            Updaters::new(),
        )
        .unwrap();
        assert_eq!(partition.len(), 1);
        for name in [
            CUT_EDGES,
            CUT_EDGES_BY_PART,
            BOUNDARY_NODES,
            EXTERIOR_BOUNDARIES,
            INTERIOR_BOUNDARIES,
            PERIMETERS,
        ] {
            assert!(
                partition.updaters().contains(name),
                "baseline updater '{name}' must be registered"
            );
        }
    }

    #[test]
    fn test_missing_boundary_flag_fails_construction() {
        let mut g = geo_graph();
        g.add_node(9);
        g.add_edge(3, 9).unwrap();
        g.set_edge_attr((3, 9), SHARED_PERIM_ATTR, AttrValue::Float(1.0))
            .unwrap();
        let err = new_geographic(
            Rc::new(g),
            InitialAssignment::SinglePart,
            Updaters::new(),
        )
        .unwrap_err();
        assert!(
            matches!(err, PartitionError::MissingAttribute { ref key, .. } if key == BOUNDARY_NODE_ATTR)
        );
    }

    #[test]
    fn test_boundary_node_without_perim_fails_construction() {
        let mut g = geo_graph();
        g.set_node_attr(2, BOUNDARY_NODE_ATTR, AttrValue::Bool(true))
            .unwrap();
        let err = new_geographic(
            Rc::new(g),
            InitialAssignment::SinglePart,
            Updaters::new(),
        )
        .unwrap_err();
        assert!(
            matches!(err, PartitionError::MissingAttribute { ref key, .. } if key == BOUNDARY_PERIM_ATTR)
        );
    }

    #[test]
    fn test_missing_shared_perim_fails_construction() {
        let mut g = geo_graph();
        g.add_node(9);
        g.set_node_attr(9, BOUNDARY_NODE_ATTR, AttrValue::Bool(false))
            .unwrap();
        g.add_edge(3, 9).unwrap();
        let err = new_geographic(
            Rc::new(g),
            InitialAssignment::SinglePart,
            Updaters::new(),
        )
        .unwrap_err();
        assert!(
            matches!(err, PartitionError::MissingAttribute { ref key, .. } if key == SHARED_PERIM_ATTR)
        );
    }

    #[test]
    fn test_no_boundary_nodes_warns_but_constructs() {
        let mut g = AdjacencyGraph::new();
        for i in 0..2 {
            g.add_node(i);
            g.set_node_attr(i, BOUNDARY_NODE_ATTR, AttrValue::Bool(false))
                .unwrap();
        }
        g.add_edge(0, 1).unwrap();
        g.set_edge_attr((0, 1), SHARED_PERIM_ATTR, AttrValue::Float(1.0))
            .unwrap();
        let partition = new_geographic(
            Rc::new(g),
            InitialAssignment::SinglePart,
            Updaters::new(),
        )
        .unwrap();
        let ext = partition.property(EXTERIOR_BOUNDARIES).unwrap();
        assert_eq!(ext.as_part_scalars().unwrap()[&0], 0.0);
    }

    #[test]
    fn test_baseline_overrides_caller_supplied_conflicts() {
        let mut extra = Updaters::new();
        extra.insert(CUT_EDGES, |_p: &Partition<AdjacencyGraph>| {
            Ok(PropertyValue::Scalar(-1.0))
        });
        let partition = new_geographic(
            Rc::new(geo_graph()),
            InitialAssignment::SinglePart,
            extra,
        )
        .unwrap();
        // The baseline's cut_edges (an edge set) won, not the scalar stub.
        let cut = partition.property(CUT_EDGES).unwrap();
        assert!(cut.as_edge_set().is_some());
    }

    #[test]
    fn test_caller_updaters_survive_alongside_baseline() {
        let mut extra = Updaters::new();
        extra.insert("parts_count", |p: &Partition<AdjacencyGraph>| {
            Ok(PropertyValue::Scalar(p.len() as f64))
        });
        let partition = new_geographic(
            Rc::new(geo_graph()),
            InitialAssignment::SinglePart,
            extra,
        )
        .unwrap();
        assert_eq!(
            partition.property("parts_count").unwrap().as_scalar(),
            Some(1.0)
        );
    }
}
