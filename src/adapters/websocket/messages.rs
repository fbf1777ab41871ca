//! WebSocket message types for the delta stream.
//!
//! Defines the protocol between server and connected subscribers:
//! - Server → Client: Connection status, graph deltas, pongs
//! - Client → Server: Pings (anything else is ignored)

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConnectionId, TenantId, Timestamp};
use crate::domain::graph::GraphDelta;

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection admitted and registered.
    Connected(ConnectedMessage),

    /// Graph delta derived from one entity change.
    #[serde(rename = "graph.delta")]
    GraphDelta(GraphDeltaMessage),

    /// Heartbeat response.
    Pong(PongMessage),
}

/// Sent once the connection is admitted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedMessage {
    pub connection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub timestamp: String,
}

impl ConnectedMessage {
    pub fn new(connection_id: ConnectionId, tenant_id: Option<&TenantId>) -> Self {
        Self {
            connection_id: connection_id.to_string(),
            tenant_id: tenant_id.map(|t| t.to_string()),
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }
}

/// Graph delta notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDeltaMessage {
    pub topic: String,
    pub delta: GraphDelta,
}

/// Heartbeat response.
#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl PongMessage {
    pub fn now() -> Self {
        Self {
            timestamp: Timestamp::now().to_rfc3339(),
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Heartbeat request.
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connected_message_uses_type_tag() {
        let id = ConnectionId::new();
        let tenant = TenantId::new("acme").unwrap();
        let msg = ServerMessage::Connected(ConnectedMessage::new(id, Some(&tenant)));

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], json!("connected"));
        assert_eq!(value["connectionId"], json!(id.to_string()));
        assert_eq!(value["tenantId"], json!("acme"));
    }

    #[test]
    fn global_connection_omits_tenant() {
        let msg = ServerMessage::Connected(ConnectedMessage::new(ConnectionId::new(), None));
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("tenantId").is_none());
    }

    #[test]
    fn pong_serializes_with_type() {
        let value = serde_json::to_value(ServerMessage::Pong(PongMessage::now())).unwrap();
        assert_eq!(value["type"], json!("pong"));
    }

    #[test]
    fn client_ping_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Ping);
    }

    #[test]
    fn unknown_client_message_is_an_error() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }
}
