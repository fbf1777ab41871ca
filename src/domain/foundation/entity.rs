//! Snapshot of a committed organisational entity, as handed over by the
//! persistence layer after a write becomes visible.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

use super::{EntityId, TenantId, ValidationError};

/// Entity types known to the relational model.
///
/// Not every type is graph-mapped: `Notification` rows are persisted but
/// carry no graph representation, so hooks for it are refused at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Team,
    Project,
    Goal,
    Department,
    Notification,
}

impl EntityType {
    /// All entity types, in declaration order.
    pub const ALL: [EntityType; 6] = [
        EntityType::User,
        EntityType::Team,
        EntityType::Project,
        EntityType::Goal,
        EntityType::Department,
        EntityType::Notification,
    ];

    /// Returns the wire name (e.g. `"team"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Team => "team",
            EntityType::Project => "project",
            EntityType::Goal => "goal",
            EntityType::Department => "department",
            EntityType::Notification => "notification",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("entity_type", format!("unknown type '{}'", s)))
    }
}

/// Full state of one entity instance after commit.
///
/// `tenant_id` is optional here because the persistence layer also commits
/// rows that are not tenant-scoped; those never become domain events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_type: EntityType,
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub fields: Map<String, JsonValue>,
}

impl EntityRecord {
    /// Creates a tenant-scoped record with no fields.
    pub fn new(entity_type: EntityType, id: EntityId, tenant_id: TenantId) -> Self {
        Self {
            entity_type,
            id,
            tenant_id: Some(tenant_id),
            fields: Map::new(),
        }
    }

    /// Creates a record that carries no tenant identity.
    pub fn unscoped(entity_type: EntityType, id: EntityId) -> Self {
        Self {
            entity_type,
            id,
            tenant_id: None,
            fields: Map::new(),
        }
    }

    /// Sets a field value (builder style).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}
