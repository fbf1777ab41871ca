//! Graph sync translator - maps entity lifecycle events to graph deltas.
//!
//! Each mapped entity type becomes one node keyed by
//! (tenant, entity type, entity id). Relationship fields (foreign keys in the
//! relational model) become edges to the referenced node:
//!
//! ```text
//! Team { department_id: "d1" }   ──belongs_to──▶  Department d1
//! Project { team_id: "t1" }      ──owned_by────▶  Team t1
//! ```
//!
//! The translation is a pure function of the event, so translating the same
//! entity state twice yields equal deltas.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::foundation::{DomainEvent, EntityId, EntityType};

use super::delta::{EdgeDetach, EdgeUpsert, GraphDelta, NodeKey, NodeUpsert, RelationLabel};

/// Fields never copied onto node properties; they are part of the node key.
const KEY_FIELDS: &[&str] = &["id", "tenant_id"];

/// Errors raised by the translator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    /// No mapping is registered for the entity type.
    #[error("entity type '{0}' has no graph mapping")]
    Unmapped(EntityType),

    /// A relationship field holds something that cannot identify an entity.
    #[error("field '{field}' on {entity_type} is not a valid reference")]
    InvalidReference {
        entity_type: EntityType,
        field: &'static str,
    },
}

/// One relationship field and the edge it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipMapping {
    pub field: &'static str,
    pub label: RelationLabel,
    pub target: EntityType,
}

impl RelationshipMapping {
    pub const fn new(field: &'static str, label: RelationLabel, target: EntityType) -> Self {
        Self {
            field,
            label,
            target,
        }
    }
}

/// Graph mapping of one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMapping {
    relationships: Vec<RelationshipMapping>,
}

impl EntityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a relationship field (builder style).
    pub fn relate(mut self, field: &'static str, label: RelationLabel, target: EntityType) -> Self {
        self.relationships
            .push(RelationshipMapping::new(field, label, target));
        self
    }

    pub fn relationships(&self) -> &[RelationshipMapping] {
        &self.relationships
    }

    fn is_relationship_field(&self, field: &str) -> bool {
        self.relationships.iter().any(|r| r.field == field)
    }
}

/// Translates domain events into graph deltas.
#[derive(Debug, Clone, Default)]
pub struct GraphSyncTranslator {
    mappings: HashMap<EntityType, EntityMapping>,
}

impl GraphSyncTranslator {
    /// Creates a translator with no mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a translator with the organisational model's mappings.
    ///
    /// Notifications are deliberately absent: they have no graph form.
    pub fn with_default_mappings() -> Self {
        use EntityType::*;
        use RelationLabel::*;

        Self::new()
            .map(
                User,
                EntityMapping::new()
                    .relate("team_id", MemberOf, Team)
                    .relate("department_id", BelongsTo, Department),
            )
            .map(
                Team,
                EntityMapping::new()
                    .relate("department_id", BelongsTo, Department)
                    .relate("lead_id", LedBy, User),
            )
            .map(
                Project,
                EntityMapping::new()
                    .relate("team_id", OwnedBy, Team)
                    .relate("owner_id", ManagedBy, User),
            )
            .map(
                Goal,
                EntityMapping::new()
                    .relate("project_id", Supports, Project)
                    .relate("parent_goal_id", ChildOf, Goal)
                    .relate("owner_id", OwnedBy, User),
            )
            .map(
                Department,
                EntityMapping::new()
                    .relate("parent_department_id", ChildOf, Department)
                    .relate("head_id", HeadedBy, User),
            )
    }

    /// Registers (or replaces) the mapping for an entity type.
    pub fn map(mut self, entity_type: EntityType, mapping: EntityMapping) -> Self {
        self.mappings.insert(entity_type, mapping);
        self
    }

    pub fn is_mapped(&self, entity_type: EntityType) -> bool {
        self.mappings.contains_key(&entity_type)
    }

    /// Fails when `entity_type` cannot be translated. Used at hook
    /// registration so misconfiguration surfaces at startup.
    pub fn ensure_mapped(&self, entity_type: EntityType) -> Result<(), TranslationError> {
        if self.is_mapped(entity_type) {
            Ok(())
        } else {
            Err(TranslationError::Unmapped(entity_type))
        }
    }

    /// Computes the delta for one event.
    pub fn translate(&self, event: &DomainEvent) -> Result<GraphDelta, TranslationError> {
        let entity_type = event.entity_type();
        let mapping = self
            .mappings
            .get(&entity_type)
            .ok_or(TranslationError::Unmapped(entity_type))?;

        let node_key = NodeKey::new(
            event.tenant_id().clone(),
            entity_type,
            event.entity_id().clone(),
        );

        let properties: BTreeMap<String, JsonValue> = event
            .payload()
            .iter()
            .filter(|(name, _)| !KEY_FIELDS.contains(&name.as_str()))
            .filter(|(name, _)| !mapping.is_relationship_field(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let mut edges = Vec::new();
        let mut detached = Vec::new();

        for rel in mapping.relationships() {
            match event.payload().get(rel.field) {
                // Absent field: the write did not touch the relationship.
                None => {}
                Some(JsonValue::Null) => detached.push(EdgeDetach {
                    from: node_key.clone(),
                    label: rel.label,
                }),
                Some(value) => {
                    let target_id = reference_id(value).ok_or(TranslationError::InvalidReference {
                        entity_type,
                        field: rel.field,
                    })?;
                    edges.push(EdgeUpsert {
                        from: node_key.clone(),
                        label: rel.label,
                        to: NodeKey::new(event.tenant_id().clone(), rel.target, target_id),
                    });
                }
            }
        }

        Ok(GraphDelta {
            event_id: event.event_id().clone(),
            kind: event.kind(),
            tenant_id: event.tenant_id().clone(),
            occurred_at: event.occurred_at(),
            nodes: vec![NodeUpsert {
                key: node_key,
                properties,
            }],
            edges,
            detached,
        })
    }
}

/// Relational ids arrive as strings or integers.
fn reference_id(value: &JsonValue) -> Option<EntityId> {
    match value {
        JsonValue::String(s) => EntityId::new(s.clone()).ok(),
        JsonValue::Number(n) => EntityId::new(n.to_string()).ok(),
        _ => None,
    }
}
