//! Event infrastructure for entity lifecycle notifications.
//!
//! - `EventId` - Unique identifier for events (deduplication, log correlation)
//! - `ChangeKind` - Which lifecycle transition happened
//! - `DomainEvent` - Immutable record of one transition of one entity

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::{EntityId, EntityRecord, EntityType, TenantId, Timestamp};

/// Unique identifier for events.
///
/// Uses a String internally to allow for various ID formats (UUID, ULID,
/// broker message ids) while remaining serializable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates a new random EventId using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an EventId from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle transition observed on a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an entity without tenant identity is turned into an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity_type} '{entity_id}' carries no tenant identity")]
pub struct MissingTenant {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
}

/// Immutable record of one lifecycle transition.
///
/// Fields are private: the only way to build one is `from_record`, which
/// refuses records lacking a tenant. Every event in the fan-out path is
/// therefore tenant-scoped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    event_id: EventId,
    kind: ChangeKind,
    entity_type: EntityType,
    entity_id: EntityId,
    tenant_id: TenantId,
    occurred_at: Timestamp,
    payload: Map<String, JsonValue>,
}

impl DomainEvent {
    /// Builds an event from a committed entity snapshot.
    pub fn from_record(kind: ChangeKind, record: EntityRecord) -> Result<Self, MissingTenant> {
        let EntityRecord {
            entity_type,
            id,
            tenant_id,
            fields,
        } = record;

        let Some(tenant_id) = tenant_id else {
            return Err(MissingTenant {
                entity_type,
                entity_id: id,
            });
        };

        Ok(Self {
            event_id: EventId::new(),
            kind,
            entity_type,
            entity_id: id,
            tenant_id,
            occurred_at: Timestamp::now(),
            payload: fields,
        })
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn occurred_at(&self) -> Timestamp {
        self.occurred_at
    }

    /// Entity fields at the time of the commit.
    pub fn payload(&self) -> &Map<String, JsonValue> {
        &self.payload
    }
}

#[cfg(test)]
impl DomainEvent {
    /// Creates a test fixture event for a team in tenant `acme`.
    pub fn test_fixture() -> Self {
        let record = EntityRecord::new(
            EntityType::Team,
            EntityId::new("team-1").unwrap(),
            TenantId::new("acme").unwrap(),
        )
        .with_field("name", "Platform");
        Self::from_record(ChangeKind::Created, record).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_id_generates_unique_values() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn event_id_serializes_to_json() {
        let id = EventId::from_string("test-id");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""test-id""#);
    }

    #[test]
    fn from_record_requires_tenant() {
        let record = EntityRecord::unscoped(EntityType::Team, EntityId::new("team-9").unwrap());

        let err = DomainEvent::from_record(ChangeKind::Created, record).unwrap_err();
        assert_eq!(err.entity_type, EntityType::Team);
        assert_eq!(err.entity_id.as_str(), "team-9");
    }

    #[test]
    fn from_record_moves_fields_into_payload() {
        let event = DomainEvent::test_fixture();

        assert_eq!(event.kind(), ChangeKind::Created);
        assert_eq!(event.tenant_id().as_str(), "acme");
        assert_eq!(event.payload().get("name"), Some(&json!("Platform")));
    }

    #[test]
    fn event_serializes_camel_case() {
        let value = serde_json::to_value(DomainEvent::test_fixture()).unwrap();

        assert_eq!(value["entityType"], json!("team"));
        assert_eq!(value["tenantId"], json!("acme"));
        assert_eq!(value["kind"], json!("created"));
    }
}
