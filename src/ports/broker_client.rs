//! BrokerClient port - Interface to the external message broker.
//!
//! The broker is the only cross-replica fan-out mechanism: every replica
//! publishes to a named topic and relays what it receives from the others.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Named channel identity used for routing payloads through the broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Topic graph deltas are published to unless configured otherwise.
    pub const GRAPH_DELTA: &'static str = "graph-delta";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn graph_delta() -> Self {
        Self::new(Self::GRAPH_DELTA)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised by broker clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// The broker could not be reached (connect failure or timeout).
    #[error("broker unavailable: {0}")]
    Unavailable(String),

    /// The broker was reached but rejected the publish.
    #[error("publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },

    /// Subscribing to a topic failed.
    #[error("subscribe to '{topic}' failed: {reason}")]
    Subscribe { topic: String, reason: String },
}

/// Stream of raw payloads received on a subscribed topic.
pub type BrokerMessages = BoxStream<'static, String>;

/// Port for the durable message broker.
///
/// Implementations connect lazily: constructing a client never performs I/O,
/// the first `publish` establishes the connection exactly once even when
/// called concurrently.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Hand one serialized payload to the broker.
    async fn publish(&self, topic: &Topic, payload: &str) -> Result<(), BrokerError>;

    /// Subscribe to a topic. The stream ends when the subscription is lost.
    async fn subscribe(&self, topic: &Topic) -> Result<BrokerMessages, BrokerError>;
}
