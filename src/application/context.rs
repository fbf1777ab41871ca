//! Service context - the wired object graph of one delta stream replica.
//!
//! Owns the shared components (registry, broadcaster, outbox, publisher)
//! and hands out the pieces the binary needs: the HTTP router, the
//! entity-change hooks, the dispatch worker and the broker relay.
//!
//! The broker client and token validator are injected, so tests run the
//! whole pipeline on in-memory adapters.

use std::sync::Arc;

use axum::Router;

use crate::adapters::broker::BrokerRelay;
use crate::adapters::events::{BoundedOutbox, DispatchWorker, FanoutPublisher};
use crate::adapters::http::delta_router;
use crate::adapters::websocket::{Broadcaster, ConnectionRegistry, WebSocketState};
use crate::config::AppConfig;
use crate::domain::foundation::ServerId;
use crate::domain::graph::GraphSyncTranslator;
use crate::ports::{BrokerClient, EventPublisher, Topic, TokenValidator};

use super::handlers::{EntityChangeHooks, EntityChangeHooksBuilder, GraphSyncHandler, HookRegistrationError};

/// Wired components of one replica.
pub struct ServiceContext {
    server_id: ServerId,
    topic: Topic,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    publisher: Arc<dyn EventPublisher>,
    outbox: Arc<BoundedOutbox>,
    hooks: Arc<EntityChangeHooks>,
    worker: Arc<DispatchWorker>,
    relay: Option<Arc<BrokerRelay>>,
    ws_state: WebSocketState,
    cors_origins: Vec<String>,
}

impl ServiceContext {
    /// Wire a replica from configuration.
    ///
    /// Registers entity-change hooks for every type the translator maps.
    ///
    /// # Errors
    ///
    /// Returns `HookRegistrationError` if hook registration fails.
    pub fn build(
        config: &AppConfig,
        server_id: ServerId,
        broker: Arc<dyn BrokerClient>,
        validator: Arc<dyn TokenValidator>,
    ) -> Result<Self, HookRegistrationError> {
        let translator = Arc::new(GraphSyncTranslator::with_default_mappings());
        Self::build_with_translator(config, server_id, broker, validator, translator, |hooks| {
            hooks.track_all_mapped()
        })
    }

    /// Wire a replica with a custom translator and hook registration.
    pub fn build_with_translator<F>(
        config: &AppConfig,
        server_id: ServerId,
        broker: Arc<dyn BrokerClient>,
        validator: Arc<dyn TokenValidator>,
        translator: Arc<GraphSyncTranslator>,
        register: F,
    ) -> Result<Self, HookRegistrationError>
    where
        F: FnOnce(EntityChangeHooksBuilder) -> Result<EntityChangeHooksBuilder, HookRegistrationError>,
    {
        let topic = Topic::new(config.broker.topic.clone());
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(
            Broadcaster::new(registry.clone(), config.delivery.send_timeout())
                .with_tenant_isolation(config.delivery.tenant_isolation),
        );

        let publisher: Arc<dyn EventPublisher> = Arc::new(FanoutPublisher::new(
            broker.clone(),
            broadcaster.clone(),
            server_id.clone(),
        ));

        let outbox = Arc::new(BoundedOutbox::from_config(&config.dispatch));
        let hooks = register(EntityChangeHooksBuilder::new(translator.clone(), outbox.clone()))?.build();

        let handler = Arc::new(GraphSyncHandler::new(translator, publisher.clone(), topic.clone()));
        let worker = Arc::new(DispatchWorker::new(
            outbox.clone(),
            handler,
            config.dispatch.max_in_flight,
        ));

        let relay = config.broker.relay_enabled.then(|| {
            Arc::new(BrokerRelay::new(
                broker,
                broadcaster.clone(),
                topic.clone(),
                server_id.clone(),
            ))
        });

        tracing::info!(
            server_id = %server_id,
            topic = %topic,
            tenant_isolation = config.delivery.tenant_isolation,
            relay = relay.is_some(),
            outbox_capacity = outbox.capacity(),
            "service context built"
        );

        Ok(Self {
            server_id,
            topic,
            ws_state: WebSocketState::new(registry.clone(), validator),
            registry,
            broadcaster,
            publisher,
            outbox,
            hooks: Arc::new(hooks),
            worker,
            relay,
            cors_origins: config.server.cors_origins_list(),
        })
    }

    /// Axum router serving `/health` and `/ws/delta`.
    pub fn router(&self) -> Router {
        delta_router(self.ws_state.clone(), &self.cors_origins)
    }

    pub fn server_id(&self) -> &ServerId {
        &self.server_id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        &self.publisher
    }

    pub fn outbox(&self) -> &Arc<BoundedOutbox> {
        &self.outbox
    }

    /// Hooks the persistence layer calls after each commit.
    pub fn hooks(&self) -> &Arc<EntityChangeHooks> {
        &self.hooks
    }

    pub fn worker(&self) -> &Arc<DispatchWorker> {
        &self.worker
    }

    /// `None` when the relay is disabled in configuration.
    pub fn relay(&self) -> Option<&Arc<BrokerRelay>> {
        self.relay.as_ref()
    }

    pub fn ws_state(&self) -> &WebSocketState {
        &self.ws_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockTokenValidator;
    use crate::adapters::broker::InMemoryBroker;
    use crate::config::{AuthConfig, BrokerConfig};
    use crate::domain::foundation::{ChangeKind, EntityType};

    fn config(relay_enabled: bool) -> AppConfig {
        AppConfig {
            server: Default::default(),
            broker: BrokerConfig {
                bootstrap_address: "localhost:6379".to_string(),
                relay_enabled,
                ..Default::default()
            },
            auth: AuthConfig::with_secret("dev-secret"),
            delivery: Default::default(),
            dispatch: Default::default(),
        }
    }

    fn build(config: &AppConfig) -> ServiceContext {
        ServiceContext::build(
            config,
            ServerId::new("replica-a"),
            Arc::new(InMemoryBroker::new()),
            Arc::new(MockTokenValidator::new()),
        )
        .unwrap()
    }

    #[test]
    fn build_tracks_mapped_types() {
        let context = build(&config(true));

        assert!(context.hooks().is_tracked(EntityType::Team, ChangeKind::Created));
        assert!(context.hooks().is_tracked(EntityType::User, ChangeKind::Updated));
        assert!(!context.hooks().is_tracked(EntityType::Notification, ChangeKind::Created));
        assert_eq!(context.topic().as_str(), "graph-delta");
        assert!(context.relay().is_some());
    }

    #[test]
    fn relay_can_be_disabled() {
        let context = build(&config(false));
        assert!(context.relay().is_none());
    }

    #[test]
    fn unmapped_registration_aborts_build() {
        let result = ServiceContext::build_with_translator(
            &config(true),
            ServerId::new("replica-a"),
            Arc::new(InMemoryBroker::new()),
            Arc::new(MockTokenValidator::new()),
            Arc::new(GraphSyncTranslator::with_default_mappings()),
            |hooks| hooks.track(EntityType::Notification, &[ChangeKind::Created]),
        );

        assert!(matches!(result, Err(HookRegistrationError::Untranslatable { .. })));
    }
}
