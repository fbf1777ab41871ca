//! In-memory broker for testing and single-process deployments.
//!
//! Behaves like the Redis client from the outside: the first publish or
//! subscribe "connects" exactly once, payloads fan out to every subscriber of
//! the topic, and the broker can be switched offline to exercise failure
//! paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{broadcast, OnceCell};

use crate::ports::{BrokerClient, BrokerError, BrokerMessages, Topic};

const CHANNEL_CAPACITY: usize = 256;

/// In-process stand-in for the message broker.
#[derive(Default)]
pub struct InMemoryBroker {
    bus: OnceCell<broadcast::Sender<(Topic, String)>>,
    connects: AtomicUsize,
    offline: AtomicBool,
    connect_delay: Duration,
    published: Mutex<Vec<(Topic, String)>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay the simulated connection handshake, widening the window for
    /// concurrent first use.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Make every subsequent call fail with `Unavailable` (or recover).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of times the simulated connection was established.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions across all topics.
    pub fn subscriber_count(&self) -> usize {
        self.bus.get().map_or(0, |bus| bus.receiver_count())
    }

    /// Everything successfully published so far, in order.
    pub fn published(&self) -> Vec<(Topic, String)> {
        self.published.lock().clone()
    }

    async fn bus(&self) -> Result<&broadcast::Sender<(Topic, String)>, BrokerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BrokerError::Unavailable("broker offline".to_string()));
        }
        let bus = self
            .bus
            .get_or_init(|| async {
                self.connects.fetch_add(1, Ordering::SeqCst);
                if !self.connect_delay.is_zero() {
                    tokio::time::sleep(self.connect_delay).await;
                }
                broadcast::channel(CHANNEL_CAPACITY).0
            })
            .await;
        Ok(bus)
    }
}

#[async_trait]
impl BrokerClient for InMemoryBroker {
    async fn publish(&self, topic: &Topic, payload: &str) -> Result<(), BrokerError> {
        let bus = self.bus().await?;
        self.published
            .lock()
            .push((topic.clone(), payload.to_string()));
        // No subscribers is fine, like PUBLISH with zero receivers.
        let _ = bus.send((topic.clone(), payload.to_string()));
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<BrokerMessages, BrokerError> {
        let receiver = self.bus().await?.subscribe();
        let topic = topic.clone();

        let messages = futures::stream::unfold(receiver, move |mut rx| {
            let topic = topic.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok((t, payload)) if t == topic => return Some((payload, rx)),
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "in-memory subscriber lagged");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        })
        .boxed();

        Ok(messages)
    }
}
