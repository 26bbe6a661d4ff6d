//! Dependency Graph
//!
//! This module holds the per-atom records a store keeps and the ordering
//! algorithm the propagator runs over them.
//!
//! # Overview
//!
//! The graph is directed and keyed by atom identity:
//!
//! - Nodes are [`AtomState`] records, one per atom a store has touched.
//! - Every state records the atoms it read during its last evaluation,
//!   together with the epoch each one had at that time.
//! - Mounted states additionally mirror those edges and keep the reverse
//!   (dependents) edges, so a write can walk downstream.
//!
//! Edges are owned by the maps on each record rather than by pointers
//! between records, and are rebuilt from scratch on every evaluation.
//!
//! The graph is expected to be acyclic. A cycle between distinct atoms is
//! not detected and recurses until the stack overflows.

mod scheduler;
mod state;

pub(crate) use scheduler::topological_order;
pub(crate) use state::{AtomState, Mounted, Outcome, Snapshot};
