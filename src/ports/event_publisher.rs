//! EventPublisher port - Interface for publishing payloads to all sinks.
//!
//! A publish feeds two independent consumers: the broker topic and the
//! in-process broadcaster. Losing one must never starve the other.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::TenantId;

use super::{BrokerError, Topic};

/// Which live connections a payload is meant for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "tenantId", rename_all = "snake_case")]
pub enum Audience {
    /// Every live connection.
    All,
    /// Connections admitted for the given tenant.
    Tenant(TenantId),
}

/// Port for publishing payloads.
///
/// Implementations must ensure:
/// - The broadcast segment runs whatever the broker outcome
/// - A returned error describes the broker segment only
/// - Calls on one instance reach the broker in invocation order
///
/// # Example
///
/// ```ignore
/// let audience = Audience::Tenant(event.tenant_id().clone());
/// if let Err(e) = publisher.publish(&Topic::graph_delta(), &audience, payload).await {
///     tracing::warn!(error = %e, "broker hand-off failed, live sockets still served");
/// }
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a JSON payload to the broker topic and to live connections.
    async fn publish(
        &self,
        topic: &Topic,
        audience: &Audience,
        payload: JsonValue,
    ) -> Result<(), BrokerError>;
}
