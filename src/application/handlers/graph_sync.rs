//! GraphSyncHandler - Event handler turning domain events into graph deltas.
//!
//! Runs on the dispatch worker for every drained event:
//! 1. Translate the event into a [`GraphDelta`](crate::domain::graph::GraphDelta)
//! 2. Wrap it as a `graph.delta` server message
//! 3. Publish to the broker topic and to the tenant's live connections
//!
//! A failure here means the graph and the relational store may diverge until
//! the entity changes again. The worker logs it; nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;

use crate::adapters::websocket::{GraphDeltaMessage, ServerMessage};
use crate::domain::foundation::{DomainError, DomainEvent, ErrorCode};
use crate::domain::graph::{GraphSyncTranslator, TranslationError};
use crate::ports::{Audience, EventHandler, EventPublisher, Topic};

/// Publishes the graph delta of each handled event.
pub struct GraphSyncHandler {
    translator: Arc<GraphSyncTranslator>,
    publisher: Arc<dyn EventPublisher>,
    topic: Topic,
}

impl GraphSyncHandler {
    pub fn new(
        translator: Arc<GraphSyncTranslator>,
        publisher: Arc<dyn EventPublisher>,
        topic: Topic,
    ) -> Self {
        Self {
            translator,
            publisher,
            topic,
        }
    }
}

#[async_trait]
impl EventHandler for GraphSyncHandler {
    async fn handle(&self, event: DomainEvent) -> Result<(), DomainError> {
        let delta = self.translator.translate(&event).map_err(translation_error)?;
        let audience = Audience::Tenant(delta.tenant_id.clone());
        let event_id = delta.event_id.clone();

        let message = ServerMessage::GraphDelta(GraphDeltaMessage {
            topic: self.topic.to_string(),
            delta,
        });
        let payload = serde_json::to_value(&message)?;

        self.publisher
            .publish(&self.topic, &audience, payload)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::BrokerUnavailable, e.to_string())
                    .with_detail("topic", self.topic.as_str())
            })?;

        tracing::debug!(event_id = %event_id, topic = %self.topic, "graph delta published");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "GraphSyncHandler"
    }
}

fn translation_error(err: TranslationError) -> DomainError {
    let code = match err {
        TranslationError::Unmapped(_) => ErrorCode::UnmappedEntityType,
        TranslationError::InvalidReference { .. } => ErrorCode::ValidationFailed,
    };
    DomainError::new(code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ChangeKind, EntityId, EntityRecord, EntityType, TenantId};
    use crate::ports::BrokerError;
    use parking_lot::Mutex;
    use serde_json::{json, Value as JsonValue};

    #[derive(Default)]
    struct RecordingPublisher {
        calls: Mutex<Vec<(Topic, Audience, JsonValue)>>,
        fail: bool,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(
            &self,
            topic: &Topic,
            audience: &Audience,
            payload: JsonValue,
        ) -> Result<(), BrokerError> {
            self.calls
                .lock()
                .push((topic.clone(), audience.clone(), payload));
            if self.fail {
                return Err(BrokerError::Unavailable("connection refused".to_string()));
            }
            Ok(())
        }
    }

    fn handler(publisher: Arc<RecordingPublisher>) -> GraphSyncHandler {
        GraphSyncHandler::new(
            Arc::new(GraphSyncTranslator::with_default_mappings()),
            publisher,
            Topic::graph_delta(),
        )
    }

    #[tokio::test]
    async fn publishes_delta_to_event_tenant() {
        let publisher = Arc::new(RecordingPublisher::default());
        let record = EntityRecord::new(
            EntityType::Team,
            EntityId::new("team-1").unwrap(),
            TenantId::new("acme").unwrap(),
        )
        .with_field("department_id", "dept-7");
        let event = DomainEvent::from_record(ChangeKind::Updated, record).unwrap();

        handler(publisher.clone()).handle(event).await.unwrap();

        let calls = publisher.calls.lock();
        assert_eq!(calls.len(), 1);
        let (topic, audience, payload) = &calls[0];
        assert_eq!(topic, &Topic::graph_delta());
        assert_eq!(audience, &Audience::Tenant(TenantId::new("acme").unwrap()));
        assert_eq!(payload["type"], json!("graph.delta"));
        assert_eq!(payload["delta"]["edges"][0]["label"], json!("belongs_to"));
    }

    #[tokio::test]
    async fn broker_failure_is_reported() {
        let publisher = Arc::new(RecordingPublisher {
            fail: true,
            ..Default::default()
        });

        let err = handler(publisher.clone())
            .handle(DomainEvent::test_fixture())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::BrokerUnavailable);
        assert_eq!(publisher.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn unmapped_event_is_not_published() {
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = GraphSyncHandler::new(
            Arc::new(GraphSyncTranslator::new()),
            publisher.clone(),
            Topic::graph_delta(),
        );

        let err = handler.handle(DomainEvent::test_fixture()).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::UnmappedEntityType);
        assert!(publisher.calls.lock().is_empty());
    }
}
