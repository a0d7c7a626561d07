//! Failure taxonomy for the partition chain.
//!
//! Two families, mirrored in the variant names:
//!
//! - **Lookup failures** — a node, part label, property name, or attribute is
//!   not present where one is required, or an assignment view has gone stale.
//!   Surfaced immediately; never silently defaulted.
//! - **Construction failures** — an invalid combination of constructor inputs
//!   (incomplete initial assignment, deriving from a consumed parent). Fatal
//!   to that construction attempt; the new instance is simply not returned.
//!
//! Structural precondition *warnings* (e.g. a geography graph with no
//! boundary-designated node) are not errors: they are reported once through
//! [`log::warn!`] at construction and never abort.

use alloc::string::String;
use core::fmt;

use crate::partition::PartId;

/// Error type for every fallible operation in the crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartitionError {
    /// A node identifier is not part of the graph / assignment.
    UnknownNode {
        /// Debug rendering of the offending node identifier.
        node: String,
    },
    /// An edge does not exist in the graph.
    UnknownEdge {
        /// Debug rendering of the offending endpoint pair.
        edge: String,
    },
    /// A flip targets a part label that does not exist in the parent.
    UnknownPart {
        /// The unknown part label.
        part: PartId,
    },
    /// No updater function is registered under the requested property name.
    UnknownProperty {
        /// The requested property name.
        name: String,
    },
    /// A required node or edge attribute is absent or has the wrong type.
    MissingAttribute {
        /// The attribute key that was looked up.
        key: String,
        /// Debug rendering of the node or edge it was expected on.
        on: String,
    },
    /// A memoized property carries a different value shape than the reader
    /// expected (an updater was overridden with an incompatible function).
    PropertyShape {
        /// The property name whose value had the wrong shape.
        name: String,
    },
    /// The assignment view is stale: a descendant generation has committed
    /// its flips into the shared base map, so lookups through this view
    /// would silently answer with newer-generation data.
    StaleAssignment,
    /// An initial node→part mapping does not cover the graph's node set.
    IncompleteAssignment {
        /// Number of graph nodes left unassigned by the supplied mapping.
        missing: usize,
    },
    /// The partition has already been used to derive a child; only the
    /// newest generation of a chain may derive further.
    ParentConsumed,
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode { node } => write!(f, "unknown node {node}"),
            Self::UnknownEdge { edge } => write!(f, "unknown edge {edge}"),
            Self::UnknownPart { part } => write!(f, "unknown part label {part}"),
            Self::UnknownProperty { name } => {
                write!(f, "no updater registered under '{name}'")
            }
            Self::MissingAttribute { key, on } => {
                write!(f, "missing or mistyped attribute '{key}' on {on}")
            }
            Self::PropertyShape { name } => {
                write!(f, "property '{name}' has an unexpected value shape")
            }
            Self::StaleAssignment => write!(
                f,
                "assignment view is stale: a descendant generation has committed into the shared base"
            ),
            Self::IncompleteAssignment { missing } => write!(
                f,
                "initial assignment does not cover the node set ({missing} nodes unassigned)"
            ),
            Self::ParentConsumed => write!(
                f,
                "partition has already derived a child; derive from the newest generation"
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PartitionError {}
