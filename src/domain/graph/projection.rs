//! In-memory projection of the graph, built by applying deltas.
//!
//! Applying a delta is an upsert: node properties are replaced wholesale and
//! each (from, label) edge points at exactly one target. Applying the same
//! delta any number of times leaves the projection as after the first.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use super::delta::{GraphDelta, NodeKey, RelationLabel};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphProjection {
    nodes: BTreeMap<NodeKey, BTreeMap<String, JsonValue>>,
    edges: BTreeMap<(NodeKey, RelationLabel), NodeKey>,
}

impl GraphProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, delta: &GraphDelta) {
        for node in &delta.nodes {
            self.nodes.insert(node.key.clone(), node.properties.clone());
        }
        for detach in &delta.detached {
            self.edges.remove(&(detach.from.clone(), detach.label));
        }
        for edge in &delta.edges {
            self.edges
                .insert((edge.from.clone(), edge.label), edge.to.clone());
        }
    }

    pub fn node(&self, key: &NodeKey) -> Option<&BTreeMap<String, JsonValue>> {
        self.nodes.get(key)
    }

    pub fn edge_target(&self, from: &NodeKey, label: RelationLabel) -> Option<&NodeKey> {
        self.edges.get(&(from.clone(), label))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
