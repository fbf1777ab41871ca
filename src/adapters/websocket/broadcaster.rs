//! Delivery broadcaster - fans one message out to live connections.
//!
//! Each call serializes the message once and sends the same frame to every
//! targeted connection concurrently. A connection whose send fails or times
//! out is unregistered and asked to close; the others are unaffected.
//! Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;

use crate::domain::foundation::{ConnectionId, TenantId};
use crate::ports::{Audience, DeliveryError, SubscriberConnection};

use super::registry::ConnectionRegistry;

/// Raised when a message cannot be turned into a JSON frame.
#[derive(Debug, Error)]
#[error("failed to serialize broadcast message: {0}")]
pub struct BroadcastError(#[from] serde_json::Error);

/// Outcome of one broadcast call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the frame was sent to.
    pub attempted: usize,
    /// Connections that accepted the frame.
    pub delivered: usize,
    /// Connections removed after a failed send.
    pub pruned: Vec<ConnectionId>,
}

/// Sends messages to the connections held by a [`ConnectionRegistry`].
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    send_timeout: Duration,
    tenant_isolation: bool,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
            tenant_isolation: true,
        }
    }

    /// Deliver tenant-scoped messages to every connection instead of only the
    /// tenant's own.
    pub fn with_tenant_isolation(mut self, enabled: bool) -> Self {
        self.tenant_isolation = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Serialize `message` and send it to every registered connection.
    ///
    /// Returns immediately, without serializing, when nothing is registered.
    pub async fn broadcast<M>(&self, message: &M) -> Result<BroadcastReport, BroadcastError>
    where
        M: Serialize + ?Sized,
    {
        self.broadcast_to(&Audience::All, message).await
    }

    /// Like [`broadcast`](Self::broadcast), restricted to the connections of
    /// `tenant` when tenant isolation is enabled.
    pub async fn broadcast_to_tenant<M>(
        &self,
        tenant: &TenantId,
        message: &M,
    ) -> Result<BroadcastReport, BroadcastError>
    where
        M: Serialize + ?Sized,
    {
        self.broadcast_to(&Audience::Tenant(tenant.clone()), message)
            .await
    }

    /// Serialize `message` and send it to `audience`.
    pub async fn broadcast_to<M>(
        &self,
        audience: &Audience,
        message: &M,
    ) -> Result<BroadcastReport, BroadcastError>
    where
        M: Serialize + ?Sized,
    {
        let targets = self.targets(audience);
        if targets.is_empty() {
            return Ok(BroadcastReport::default());
        }
        let text: Arc<str> = serde_json::to_string(message)?.into();
        Ok(self.deliver(targets, text).await)
    }

    fn targets(&self, audience: &Audience) -> Vec<Arc<dyn SubscriberConnection>> {
        match audience {
            Audience::Tenant(tenant) if self.tenant_isolation => {
                self.registry.snapshot_for_tenant(tenant)
            }
            _ => self.registry.snapshot(),
        }
    }

    async fn deliver(
        &self,
        targets: Vec<Arc<dyn SubscriberConnection>>,
        text: Arc<str>,
    ) -> BroadcastReport {
        let attempted = targets.len();
        let sends = targets.into_iter().map(|connection| {
            let text = text.clone();
            async move {
                let outcome =
                    match tokio::time::timeout(self.send_timeout, connection.send_text(text)).await {
                        Ok(result) => result,
                        Err(_) => Err(DeliveryError::Timeout(self.send_timeout)),
                    };
                (connection, outcome)
            }
        });

        let mut report = BroadcastReport {
            attempted,
            ..Default::default()
        };

        for (connection, outcome) in join_all(sends).await {
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    let id = connection.id();
                    tracing::warn!(connection_id = %id, error = %e, "send failed, dropping connection");
                    self.registry.unregister(&id);
                    // A timed-out frame may still reach the peer; the session
                    // ends either way.
                    connection.close();
                    report.pruned.push(id);
                }
            }
        }

        tracing::trace!(
            attempted = report.attempted,
            delivered = report.delivered,
            "broadcast complete"
        );
        report
    }
}
