//! Wire envelope of payloads travelling through the broker.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::ServerId;
use crate::ports::Audience;

/// Payload plus the routing data other replicas need to re-broadcast it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerEnvelope {
    /// Replica that published the payload.
    pub origin: ServerId,
    /// Connections the payload is meant for.
    pub audience: Audience,
    /// The published payload, as handed to the broadcaster.
    pub payload: JsonValue,
}
