//! FanoutPublisher - Publishes to the broker and to live sockets.
//!
//! The broker and the in-process broadcaster are independent consumers of
//! every payload. Both hand-offs run concurrently, so a slow or unreachable
//! broker neither delays nor prevents local delivery, and a failing socket
//! never affects the broker.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::adapters::broker::BrokerEnvelope;
use crate::adapters::websocket::Broadcaster;
use crate::domain::foundation::ServerId;
use crate::ports::{Audience, BrokerClient, BrokerError, EventPublisher, Topic};

/// [`EventPublisher`] feeding a broker topic and the local broadcaster.
pub struct FanoutPublisher {
    broker: Arc<dyn BrokerClient>,
    broadcaster: Arc<Broadcaster>,
    origin: ServerId,
}

impl FanoutPublisher {
    pub fn new(broker: Arc<dyn BrokerClient>, broadcaster: Arc<Broadcaster>, origin: ServerId) -> Self {
        Self {
            broker,
            broadcaster,
            origin,
        }
    }

    async fn hand_to_broker(&self, topic: &Topic, envelope: &BrokerEnvelope) -> Result<(), BrokerError> {
        let raw = serde_json::to_string(envelope).map_err(|e| BrokerError::Publish {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;
        self.broker.publish(topic, &raw).await
    }
}

#[async_trait]
impl EventPublisher for FanoutPublisher {
    async fn publish(
        &self,
        topic: &Topic,
        audience: &Audience,
        payload: JsonValue,
    ) -> Result<(), BrokerError> {
        let envelope = BrokerEnvelope {
            origin: self.origin.clone(),
            audience: audience.clone(),
            payload,
        };

        let (broker_result, broadcast_result) = tokio::join!(
            self.hand_to_broker(topic, &envelope),
            self.broadcaster.broadcast_to(audience, &envelope.payload),
        );

        if let Err(e) = &broker_result {
            tracing::warn!(topic = %topic, error = %e, "broker hand-off failed, local delivery unaffected");
        }
        match broadcast_result {
            Ok(report) => tracing::debug!(
                topic = %topic,
                delivered = report.delivered,
                pruned = report.pruned.len(),
                "payload broadcast"
            ),
            Err(e) => tracing::error!(topic = %topic, error = %e, "local broadcast failed"),
        }

        broker_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::broker::InMemoryBroker;
    use crate::adapters::websocket::ConnectionRegistry;
    use crate::domain::foundation::{ConnectionId, TenantId};
    use crate::ports::{DeliveryError, SubscriberConnection};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    struct Sink {
        id: ConnectionId,
        frames: Mutex<Vec<String>>,
        broken: bool,
    }

    #[async_trait]
    impl SubscriberConnection for Sink {
        fn id(&self) -> ConnectionId {
            self.id
        }

        fn tenant(&self) -> Option<&TenantId> {
            None
        }

        async fn send_text(&self, text: Arc<str>) -> Result<(), DeliveryError> {
            if self.broken {
                return Err(DeliveryError::Closed);
            }
            self.frames.lock().push(text.to_string());
            Ok(())
        }

        fn close(&self) {}
    }

    fn sink(broken: bool) -> Arc<Sink> {
        Arc::new(Sink {
            id: ConnectionId::new(),
            frames: Mutex::new(Vec::new()),
            broken,
        })
    }

    fn setup(broker: Arc<InMemoryBroker>) -> (FanoutPublisher, Arc<ConnectionRegistry>) {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(registry.clone(), Duration::from_millis(100)));
        let publisher = FanoutPublisher::new(broker, broadcaster, ServerId::new("replica-a"));
        (publisher, registry)
    }

    #[tokio::test]
    async fn publishes_envelope_to_broker_and_payload_to_sockets() {
        let broker = Arc::new(InMemoryBroker::new());
        let (publisher, registry) = setup(broker.clone());
        let live = sink(false);
        registry.register(live.clone());

        publisher
            .publish(&Topic::graph_delta(), &Audience::All, json!({"type": "ping"}))
            .await
            .unwrap();

        let published = broker.published();
        assert_eq!(published.len(), 1);
        let envelope: BrokerEnvelope = serde_json::from_str(&published[0].1).unwrap();
        assert_eq!(envelope.origin, ServerId::new("replica-a"));
        assert_eq!(envelope.payload, json!({"type": "ping"}));

        let frames = live.frames.lock().clone();
        assert_eq!(frames.len(), 1);
        let frame: JsonValue = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(frame, json!({"type": "ping"}));
    }

    #[tokio::test]
    async fn broker_outage_still_broadcasts_and_reports_error() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.set_offline(true);
        let (publisher, registry) = setup(broker);
        let live = sink(false);
        registry.register(live.clone());

        let result = publisher
            .publish(&Topic::graph_delta(), &Audience::All, json!({"type": "ping"}))
            .await;

        assert!(matches!(result, Err(BrokerError::Unavailable(_))));
        assert_eq!(live.frames.lock().len(), 1);
    }

    #[tokio::test]
    async fn socket_failure_does_not_affect_broker() {
        let broker = Arc::new(InMemoryBroker::new());
        let (publisher, registry) = setup(broker.clone());
        let broken = sink(true);
        registry.register(broken.clone());

        publisher
            .publish(&Topic::graph_delta(), &Audience::All, json!({"type": "ping"}))
            .await
            .unwrap();

        assert_eq!(broker.published().len(), 1);
        assert!(registry.is_empty());
    }
}
