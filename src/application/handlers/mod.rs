//! Application handlers.
//!
//! - `entity_change` - Hooks turning committed writes into outbox events
//! - `graph_sync` - Event handler publishing graph deltas

mod entity_change;
mod graph_sync;

pub use entity_change::{
    EntityChangeHooks, EntityChangeHooksBuilder, EntityCommitted, HookOutcome,
    HookRegistrationError,
};
pub use graph_sync::GraphSyncHandler;
