//! Per-part sums of a node attribute (population counts, areas, vote
//! totals...).
//!
//! Unlike the fixed-name updaters, a tally is built per attribute: the
//! closure captures both the attribute key and the property name it is
//! registered under, so the incremental path can find its own value on the
//! parent.

use alloc::format;
use alloc::string::String;

use hashbrown::HashMap;

use crate::error::PartitionError;
use crate::graph::{AttrValue, PartitionGraph};
use crate::partition::{PartId, Partition};
use crate::updaters::{shape_error, PropertyValue, Updaters};

/// Register a tally of `attr_key` under the property name `name`.
///
/// The tally is incremental: with a materialized parent value it adjusts
/// per-part sums by the flowed nodes' attribute values only; otherwise it
/// scans every node once. A node missing the attribute (or carrying a
/// non-numeric one) fails the read.
pub fn register_tally<G: PartitionGraph>(updaters: &mut Updaters<G>, name: &str, attr_key: &str) {
    let prop = String::from(name);
    let key = String::from(attr_key);
    updaters.insert(name, move |partition: &Partition<G>| {
        tally(partition, &prop, &key)
    });
}

fn tally<G: PartitionGraph>(
    partition: &Partition<G>,
    prop: &str,
    key: &str,
) -> Result<PropertyValue<G::Node>, PartitionError> {
    if let (Some(parent), Some(flows)) = (partition.parent(), partition.flows()) {
        if let Some(cached) = parent.cached(prop) {
            let mut sums = cached
                .as_part_scalars()
                .ok_or_else(|| shape_error(prop))?
                .clone();
            for (&part, flow) in flows {
                let mut total = sums.get(&part).copied().unwrap_or(0.0);
                for &node in &flow.inflow {
                    total += node_value(partition.graph().as_ref(), node, key)?;
                }
                for &node in &flow.outflow {
                    total -= node_value(partition.graph().as_ref(), node, key)?;
                }
                sums.insert(part, total);
            }
            return Ok(PropertyValue::PartScalars(sums));
        }
    }

    let mut sums: HashMap<PartId, f64> =
        partition.parts().keys().map(|&part| (part, 0.0)).collect();
    for node in partition.graph().nodes() {
        let part = partition.part_of(node)?;
        *sums.entry(part).or_insert(0.0) += node_value(partition.graph().as_ref(), node, key)?;
    }
    Ok(PropertyValue::PartScalars(sums))
}

fn node_value<G: PartitionGraph>(
    graph: &G,
    node: G::Node,
    key: &str,
) -> Result<f64, PartitionError> {
    graph
        .node_attr(node, key)
        .and_then(AttrValue::as_f64)
        .ok_or_else(|| PartitionError::MissingAttribute {
            key: String::from(key),
            on: format!("node {node:?}"),
        })
}

// ─── Tests ──────────────────────────────────────────────────────────────────
