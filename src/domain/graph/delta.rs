//! Graph delta types - the node/edge upserts derived from one domain event.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::foundation::{ChangeKind, EntityId, EntityType, EventId, TenantId, Timestamp};

/// Identity of a graph node: one node per (tenant, entity type, entity id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeKey {
    pub tenant_id: TenantId,
    pub entity_type: EntityType,
    pub entity_id: EntityId,
}

impl NodeKey {
    pub fn new(tenant_id: TenantId, entity_type: EntityType, entity_id: EntityId) -> Self {
        Self {
            tenant_id,
            entity_type,
            entity_id,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.entity_type, self.entity_id)
    }
}

/// Label of a directed relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationLabel {
    BelongsTo,
    MemberOf,
    OwnedBy,
    LedBy,
    ManagedBy,
    Supports,
    ChildOf,
    HeadedBy,
}

/// Replace-style node upsert: after applying, the node's properties are
/// exactly `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpsert {
    pub key: NodeKey,
    pub properties: BTreeMap<String, JsonValue>,
}

/// Edge upsert. Relationships are single-valued per (from, label), so an
/// upsert replaces whatever target the edge pointed at before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeUpsert {
    pub from: NodeKey,
    pub label: RelationLabel,
    pub to: NodeKey,
}

/// Removal of the (from, label) edge, emitted when the relationship field
/// is present but null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDetach {
    pub from: NodeKey,
    pub label: RelationLabel,
}

/// Node/edge operations representing one domain event in graph form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDelta {
    pub event_id: EventId,
    pub kind: ChangeKind,
    pub tenant_id: TenantId,
    pub occurred_at: Timestamp,
    pub nodes: Vec<NodeUpsert>,
    pub edges: Vec<EdgeUpsert>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detached: Vec<EdgeDetach>,
}

impl GraphDelta {
    /// True when the delta carries no graph operation at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.detached.is_empty()
    }
}
