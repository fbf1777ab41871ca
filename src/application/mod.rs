//! Application layer - Entity-change hooks, event handlers, and wiring.
//!
//! This layer turns committed writes into graph deltas and connects the
//! ports to their adapters.

pub mod context;
pub mod handlers;

pub use context::ServiceContext;
pub use handlers::{
    EntityChangeHooks, EntityChangeHooksBuilder, EntityCommitted, GraphSyncHandler, HookOutcome,
    HookRegistrationError,
};
