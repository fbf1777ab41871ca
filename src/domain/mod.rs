//! Domain layer containing the delta stream's core types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, entity snapshots, events, errors)
//! - `graph` - Graph deltas and the entity → graph translator

pub mod foundation;
pub mod graph;
