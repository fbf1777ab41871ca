//! Graph representation of the organisational model.
//!
//! - `delta` - Node/edge upsert operations derived from one event
//! - `translator` - Entity event → graph delta mapping
//! - `projection` - In-memory graph built by applying deltas

mod delta;
mod projection;
mod translator;

pub use delta::{EdgeDetach, EdgeUpsert, GraphDelta, NodeKey, NodeUpsert, RelationLabel};
pub use projection::GraphProjection;
pub use translator::{EntityMapping, GraphSyncTranslator, RelationshipMapping, TranslationError};
