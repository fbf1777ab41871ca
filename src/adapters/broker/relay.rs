//! Broker relay - re-broadcasts payloads published by other replicas.
//!
//! The connection registry is process-local, so a delta published on one
//! replica only reaches sockets held by that replica. Every replica runs a
//! relay subscribed to the topic; envelopes stamped with the local
//! `ServerId` are skipped since the local publisher already broadcast them.
//!
//! ```text
//! replica A: publish ──▶ broadcast(A's sockets)
//!                   └──▶ broker ──▶ relay(B) ──▶ broadcast(B's sockets)
//!                               └─▶ relay(A) ──▶ skipped (own origin)
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;

use crate::adapters::websocket::{BroadcastReport, Broadcaster};
use crate::domain::foundation::ServerId;
use crate::ports::{BrokerClient, Topic};

use super::envelope::BrokerEnvelope;

/// What the relay did with one broker message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Re-broadcast to local connections.
    Delivered(BroadcastReport),
    /// Published by this replica; already delivered locally.
    SkippedOwn,
    /// Not a broker envelope.
    Malformed,
}

/// Background task relaying broker messages to local connections.
pub struct BrokerRelay {
    broker: Arc<dyn BrokerClient>,
    broadcaster: Arc<Broadcaster>,
    topic: Topic,
    origin: ServerId,
    resubscribe_delay: Duration,
}

impl BrokerRelay {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        broadcaster: Arc<Broadcaster>,
        topic: Topic,
        origin: ServerId,
    ) -> Self {
        Self {
            broker,
            broadcaster,
            topic,
            origin,
            resubscribe_delay: Duration::from_secs(1),
        }
    }

    /// Wait between subscription attempts after a failure.
    pub fn with_resubscribe_delay(mut self, delay: Duration) -> Self {
        self.resubscribe_delay = delay;
        self
    }

    /// Run the relay until shutdown is signalled.
    ///
    /// A lost or failed subscription is retried after the resubscribe delay.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            match self.broker.subscribe(&self.topic).await {
                Ok(mut messages) => {
                    tracing::info!(topic = %self.topic, "relay subscribed");
                    loop {
                        tokio::select! {
                            changed = shutdown.changed() => {
                                if changed.is_err() || *shutdown.borrow() {
                                    return;
                                }
                            }
                            message = messages.next() => match message {
                                Some(raw) => {
                                    self.relay(&raw).await;
                                }
                                None => {
                                    tracing::warn!(topic = %self.topic, "relay subscription lost");
                                    break;
                                }
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(topic = %self.topic, error = %e, "relay subscribe failed");
                }
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
                _ = tokio::time::sleep(self.resubscribe_delay) => {}
            }
        }
    }

    /// Handle one raw broker message.
    pub async fn relay(&self, raw: &str) -> RelayOutcome {
        let envelope: BrokerEnvelope = match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(topic = %self.topic, error = %e, "dropping malformed broker message");
                return RelayOutcome::Malformed;
            }
        };

        if envelope.origin == self.origin {
            return RelayOutcome::SkippedOwn;
        }

        match self
            .broadcaster
            .broadcast_to(&envelope.audience, &envelope.payload)
            .await
        {
            Ok(report) => {
                tracing::debug!(
                    origin = %envelope.origin,
                    delivered = report.delivered,
                    "relayed broker message"
                );
                RelayOutcome::Delivered(report)
            }
            // A JSON value always serializes; treat failure as malformed input.
            Err(e) => {
                tracing::warn!(error = %e, "failed to re-serialize broker payload");
                RelayOutcome::Malformed
            }
        }
    }
}
