//! Delta Stream - Real-time graph delta fan-out
//!
//! This crate turns committed entity writes into graph deltas and fans them
//! out to a message broker and to live WebSocket subscribers.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
