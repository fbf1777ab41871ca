//! DispatchWorker - Background service draining the outbox.
//!
//! Second half of the outbox pattern:
//! 1. Entity-change hooks append events to the [`BoundedOutbox`]
//! 2. **The worker takes events off the queue and runs the handler** ← This module
//!
//! Each event is handled in its own task so a slow event never holds up
//! events for other entities. Events for the same entity (tenant, type, id)
//! are chained: each waits for its predecessor to finish, so a subscriber
//! never sees an older state of an entity after a newer one. A semaphore
//! caps the number of events in flight; when it is exhausted the worker
//! stops taking events and the queue absorbs the burst (subject to its
//! overflow policy).
//!
//! ## Graceful Shutdown
//!
//! On the shutdown signal the outbox is closed, whatever is still queued is
//! dispatched, and the worker waits for in-flight events before returning.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch, Semaphore};

use crate::domain::foundation::{DomainEvent, EntityId, EntityType, TenantId};
use crate::ports::EventHandler;

use super::bounded_outbox::BoundedOutbox;

type EntityKey = (TenantId, EntityType, EntityId);

/// Completion signal of the latest dispatched event per entity.
#[derive(Default)]
struct EntityChains {
    next_seq: u64,
    tails: HashMap<EntityKey, (u64, oneshot::Receiver<()>)>,
}

impl EntityChains {
    /// Make `done` the new tail for `key`. Returns the sequence number of
    /// the new tail and the previous tail's signal, if any is still pending.
    fn push(&mut self, key: EntityKey, done: oneshot::Receiver<()>) -> (u64, Option<oneshot::Receiver<()>>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let previous = self.tails.insert(key, (seq, done)).map(|(_, rx)| rx);
        (seq, previous)
    }

    /// Forget `key` if `seq` is still its tail.
    fn finish(&mut self, key: &EntityKey, seq: u64) {
        if matches!(self.tails.get(key), Some((tail, _)) if *tail == seq) {
            self.tails.remove(key);
        }
    }
}

/// Drains a [`BoundedOutbox`] into an [`EventHandler`].
pub struct DispatchWorker {
    outbox: Arc<BoundedOutbox>,
    handler: Arc<dyn EventHandler>,
    permits: Arc<Semaphore>,
    max_in_flight: u32,
    chains: Arc<Mutex<EntityChains>>,
}

impl DispatchWorker {
    pub fn new(outbox: Arc<BoundedOutbox>, handler: Arc<dyn EventHandler>, max_in_flight: usize) -> Self {
        let max_in_flight = max_in_flight.clamp(1, u32::MAX as usize) as u32;
        Self {
            outbox,
            handler,
            permits: Arc::new(Semaphore::new(max_in_flight as usize)),
            max_in_flight,
            chains: Arc::new(Mutex::new(EntityChains::default())),
        }
    }

    /// Run the worker loop until shutdown signal is received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(handler = self.handler.name(), "dispatch worker started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                next = self.outbox.next() => match next {
                    Some(event) => self.dispatch(event).await,
                    None => break,
                }
            }
        }

        self.outbox.close();
        let drained = self.drain().await;
        self.wait_idle().await;
        tracing::info!(drained, "dispatch worker stopped");
    }

    /// Dispatch everything currently queued. Returns the number of events.
    pub async fn drain(&self) -> usize {
        let mut count = 0;
        while let Some(event) = self.outbox.pop() {
            self.dispatch(event).await;
            count += 1;
        }
        count
    }

    /// Wait until no event is in flight.
    pub async fn wait_idle(&self) {
        // Holding every permit means no handler task is running.
        if let Ok(all) = self.permits.acquire_many(self.max_in_flight).await {
            drop(all);
        }
    }

    async fn dispatch(&self, event: DomainEvent) {
        let permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::error!(event_id = %event.event_id(), "dispatch semaphore closed, dropping event");
                return;
            }
        };

        let key = (
            event.tenant_id().clone(),
            event.entity_type(),
            event.entity_id().clone(),
        );
        let (done_tx, done_rx) = oneshot::channel();
        let (seq, previous) = self.chains.lock().push(key.clone(), done_rx);

        let handler = self.handler.clone();
        let chains = self.chains.clone();
        tokio::spawn(async move {
            if let Some(previous) = previous {
                // Err means the predecessor's task died; order is still kept.
                let _ = previous.await;
            }
            process(handler.as_ref(), event).await;
            let _ = done_tx.send(());
            chains.lock().finish(&key, seq);
            drop(permit);
        });
    }
}

async fn process(handler: &dyn EventHandler, event: DomainEvent) {
    let event_id = event.event_id().clone();
    let tenant_id = event.tenant_id().clone();

    match handler.handle(event).await {
        Ok(()) => {
            tracing::debug!(handler = handler.name(), event_id = %event_id, "event handled");
        }
        Err(e) => {
            // Graph and relational state may diverge until the next change.
            tracing::warn!(
                handler = handler.name(),
                event_id = %event_id,
                tenant_id = %tenant_id,
                error = %e,
                "event handling failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverflowPolicy;
    use crate::domain::foundation::{ChangeKind, DomainError, EntityRecord, ErrorCode, EventId};
    use crate::ports::OutboxWriter;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<EventId>>,
        running: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        async fn handle(&self, event: DomainEvent) -> Result<(), DomainError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            self.seen.lock().push(event.event_id().clone());
            if self.fail {
                return Err(DomainError::new(ErrorCode::InternalError, "boom"));
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "RecordingHandler"
        }
    }

    /// Records the `version` field of each handled event; `slow` versions
    /// take longer to handle.
    #[derive(Default)]
    struct VersionHandler {
        handled: Mutex<Vec<String>>,
        slow: Vec<&'static str>,
    }

    #[async_trait]
    impl EventHandler for VersionHandler {
        async fn handle(&self, event: DomainEvent) -> Result<(), DomainError> {
            let version = event.payload()["version"].as_str().unwrap_or_default().to_string();
            if self.slow.iter().any(|slow| *slow == version) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.handled.lock().push(format!("{}@{}", event.entity_id(), version));
            Ok(())
        }

        fn name(&self) -> &'static str {
            "VersionHandler"
        }
    }

    fn team_update(team: &str, version: &str) -> DomainEvent {
        let record = EntityRecord::new(
            EntityType::Team,
            EntityId::new(team).unwrap(),
            TenantId::new("acme").unwrap(),
        )
        .with_field("version", version);
        DomainEvent::from_record(ChangeKind::Updated, record).unwrap()
    }

    fn outbox() -> Arc<BoundedOutbox> {
        Arc::new(BoundedOutbox::new(64, OverflowPolicy::DropOldest))
    }

    #[tokio::test]
    async fn drain_dispatches_every_queued_event() {
        let outbox = outbox();
        let handler = Arc::new(RecordingHandler::default());
        for _ in 0..5 {
            outbox.append(DomainEvent::test_fixture()).unwrap();
        }

        let worker = DispatchWorker::new(outbox.clone(), handler.clone(), 4);
        assert_eq!(worker.drain().await, 5);
        worker.wait_idle().await;

        assert_eq!(handler.seen.lock().len(), 5);
        assert!(outbox.is_empty());
    }

    #[tokio::test]
    async fn in_flight_events_are_bounded() {
        let outbox = outbox();
        let handler = Arc::new(RecordingHandler {
            delay: Duration::from_millis(20),
            ..Default::default()
        });
        for n in 0..12 {
            outbox.append(team_update(&format!("team-{}", n), "v1")).unwrap();
        }

        let worker = DispatchWorker::new(outbox, handler.clone(), 3);
        worker.drain().await;
        worker.wait_idle().await;

        assert_eq!(handler.seen.lock().len(), 12);
        let peak = handler.peak.load(Ordering::SeqCst);
        assert!(peak > 1 && peak <= 3, "peak in flight was {}", peak);
    }

    #[tokio::test]
    async fn updates_to_one_entity_are_handled_in_queue_order() {
        let outbox = outbox();
        let handler = Arc::new(VersionHandler {
            slow: vec!["v1"],
            ..Default::default()
        });
        outbox.append(team_update("team-1", "v1")).unwrap();
        outbox.append(team_update("team-1", "v2")).unwrap();
        outbox.append(team_update("team-1", "v3")).unwrap();

        let worker = DispatchWorker::new(outbox, handler.clone(), 4);
        worker.drain().await;
        worker.wait_idle().await;

        assert_eq!(
            *handler.handled.lock(),
            vec!["team-1@v1", "team-1@v2", "team-1@v3"]
        );
        assert!(worker.chains.lock().tails.is_empty());
    }

    #[tokio::test]
    async fn slow_entity_does_not_hold_up_other_entities() {
        let outbox = outbox();
        let handler = Arc::new(VersionHandler {
            slow: vec!["v1"],
            ..Default::default()
        });
        outbox.append(team_update("team-1", "v1")).unwrap();
        outbox.append(team_update("team-2", "v2")).unwrap();

        let worker = DispatchWorker::new(outbox, handler.clone(), 4);
        worker.drain().await;
        worker.wait_idle().await;

        assert_eq!(*handler.handled.lock(), vec!["team-2@v2", "team-1@v1"]);
    }

    #[tokio::test]
    async fn handler_errors_do_not_stop_dispatch() {
        let outbox = outbox();
        let handler = Arc::new(RecordingHandler {
            fail: true,
            ..Default::default()
        });
        outbox.append(DomainEvent::test_fixture()).unwrap();
        outbox.append(DomainEvent::test_fixture()).unwrap();

        let worker = DispatchWorker::new(outbox, handler.clone(), 1);
        worker.drain().await;
        worker.wait_idle().await;

        assert_eq!(handler.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn run_processes_live_appends_and_drains_on_shutdown() {
        let outbox = outbox();
        let handler = Arc::new(RecordingHandler {
            delay: Duration::from_millis(5),
            ..Default::default()
        });
        let worker = Arc::new(DispatchWorker::new(outbox.clone(), handler.clone(), 2));
        let (tx, rx) = watch::channel(false);

        let task = {
            let worker = worker.clone();
            tokio::spawn(async move { worker.run(rx).await })
        };

        for _ in 0..6 {
            outbox.append(DomainEvent::test_fixture()).unwrap();
        }
        tx.send(true).unwrap();
        task.await.unwrap();

        assert_eq!(handler.seen.lock().len(), 6);
        assert!(outbox.is_closed());
    }
}
