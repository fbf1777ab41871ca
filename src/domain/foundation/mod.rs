//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the entity snapshot type, events,
//! and error types that form the vocabulary of the delta stream.

mod auth;
mod entity;
mod errors;
mod events;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedPrincipal};
pub use entity::{EntityRecord, EntityType};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{ChangeKind, DomainEvent, EventId, MissingTenant};
pub use ids::{ConnectionId, EntityId, ServerId, TenantId};
pub use timestamp::Timestamp;
