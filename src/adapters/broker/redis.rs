//! Redis pub/sub broker client.
//!
//! `PUBLISH` goes over a [`ConnectionManager`] created on first use.
//! Concurrent first publishes share a single connection attempt; a failed
//! attempt leaves the client unconnected so the next publish retries. Once
//! established, the manager re-dials on its own after the server drops the
//! connection: the publish that hit the dead connection fails, later ones
//! go over the new one.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;

use crate::config::BrokerConfig;
use crate::ports::{BrokerClient, BrokerError, BrokerMessages, Topic};

/// Broker client backed by Redis pub/sub.
pub struct RedisBroker {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisBroker {
    /// Create a client for the configured broker. Performs no I/O.
    pub fn new(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let client = redis::Client::open(config.url())
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            timeout: config.timeout(),
        })
    }

    /// Whether the publish connection has been established.
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    async fn connection(&self) -> Result<ConnectionManager, BrokerError> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                tracing::info!("connecting to broker");
                let conn = tokio::time::timeout(self.timeout, ConnectionManager::new(self.client.clone()))
                    .await
                    .map_err(|_| {
                        BrokerError::Unavailable(format!("connect timed out after {:?}", self.timeout))
                    })?
                    .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
                tracing::info!("broker connection established");
                Ok::<_, BrokerError>(conn)
            })
            .await?;

        Ok(conn.clone())
    }
}

#[async_trait]
impl BrokerClient for RedisBroker {
    async fn publish(&self, topic: &Topic, payload: &str) -> Result<(), BrokerError> {
        let mut conn = self.connection().await?;

        let receivers: i64 = tokio::time::timeout(self.timeout, conn.publish(topic.as_str(), payload))
            .await
            .map_err(|_| BrokerError::Publish {
                topic: topic.to_string(),
                reason: format!("timed out after {:?}", self.timeout),
            })?
            .map_err(|e: redis::RedisError| BrokerError::Publish {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;

        tracing::trace!(topic = %topic, receivers, "published to broker");
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<BrokerMessages, BrokerError> {
        let subscribe_error = |e: redis::RedisError| BrokerError::Subscribe {
            topic: topic.to_string(),
            reason: e.to_string(),
        };

        let conn = tokio::time::timeout(self.timeout, self.client.get_async_connection())
            .await
            .map_err(|_| BrokerError::Unavailable(format!("connect timed out after {:?}", self.timeout)))?
            .map_err(subscribe_error)?;

        let mut pubsub = conn.into_pubsub();
        pubsub.subscribe(topic.as_str()).await.map_err(subscribe_error)?;

        let messages = pubsub
            .into_on_message()
            .filter_map(|msg| async move {
                match msg.get_payload::<String>() {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping non-text broker message");
                        None
                    }
                }
            })
            .boxed();

        Ok(messages)
    }
}
