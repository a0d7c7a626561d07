//! # partition-core
//!
//! Incremental graph-partition state for long-running sampling chains.
//!
//! ---
//!
//! ## This is not a sampler. It is the state layer beneath one.
//!
//! A stochastic search loop over graph partitions proposes thousands to
//! millions of small reassignments ("flips") of nodes between labeled groups
//! ("parts"). At every step it needs the current node→part mapping, the
//! membership of every part, and an open-ended set of derived quantities —
//! without recomputing them from scratch while most of the graph is
//! untouched. Three primitives make that cheap:
//!
//! **Layered assignment** — the node→part mapping is a base map overlaid by
//! the pending flips of the newest generation. Wrapping a generation commits
//! its overlay down into the shared base, so lookup stays O(1) and the
//! overlay never stacks deeper than one layer no matter how long the chain
//! runs.
//!
//! **Flow-diffed parts** — each new partition is derived from its parent by
//! computing, per touched part, the nodes entering and leaving (the *flow*),
//! then rebuilding only those parts' member sets. Untouched parts share the
//! parent's set allocation outright.
//!
//! **Per-instance property cache** — every partition carries a registry of
//! named updater functions and memoizes each one lazily on first read. A
//! derived partition starts with an empty cache; nothing stale ever leaks
//! across generations.
//!
//! ## The pipeline
//!
//! ```text
//! flips → Assignment::wrap → flows_from_flips → parts update → fresh cache
//!              ↑                    ↑                ↑
//!        commit-on-wrap      edge flow summary   structural sharing
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`graph`] | [`graph::PartitionGraph`], [`graph::AdjacencyGraph`] | Graph abstraction with node/edge attributes; bring your own or use the built-in adjacency store |
//! | [`assignment`] | [`assignment::Assignment`] | Base + overlay node→part map with commit-on-wrap and a version tag that detects stale views |
//! | [`flows`] | [`flows::Flow`], [`flows::EdgeFlow`] | Per-part node and cut-edge movement computed from one flip batch |
//! | [`partition`] | [`partition::Partition`] | The parent-linked partition chain; `merge` is the single "apply a step" primitive |
//! | [`updaters`] | [`updaters::Updaters`], [`updaters::PropertyValue`] | Named derived-property functions with per-instance memoization |
//! | [`geographic`] | [`geographic::new_geographic`] | Boundary/perimeter baseline updater set plus graph precondition checks |
//! | [`error`] | [`error::PartitionError`] | Lookup and construction failure taxonomy |
//!
//! ## `no_std`
//!
//! This crate is `#![no_std]` by default (with `alloc`). Enable the `std`
//! feature for the `std::error::Error` impl and the demo driver. Enable the
//! `serde` feature for serialisation support on the plain data types.
//!
//! ## License
//!
//! Business Source License 1.1. Free for evaluation and non-production use.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod assignment;
pub mod error;
pub mod flows;
pub mod geographic;
pub mod graph;
pub mod partition;
pub mod updaters;
