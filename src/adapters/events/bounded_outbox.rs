//! BoundedOutbox - In-memory outbox queue with an explicit overflow policy.
//!
//! The commit path appends here synchronously; the dispatch worker waits on
//! the queue and drains it. Depth is capped so a write burst cannot grow
//! memory without bound.
//!
//! ## Overflow
//!
//! | Policy | Queue full behaviour |
//! |--------|----------------------|
//! | `drop_oldest` | Evict the oldest queued event, accept the new one |
//! | `drop_newest` | Reject the new event with `OutboxError::Full` |
//!
//! Both outcomes are logged and counted in [`BoundedOutbox::dropped`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::config::{DispatchConfig, OverflowPolicy};
use crate::domain::foundation::DomainEvent;
use crate::ports::{OutboxError, OutboxWriter};

/// Bounded FIFO of domain events awaiting dispatch.
pub struct BoundedOutbox {
    queue: Mutex<VecDeque<DomainEvent>>,
    capacity: usize,
    policy: OverflowPolicy,
    ready: Notify,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl BoundedOutbox {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            policy,
            ready: Notify::new(),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.queue_capacity, config.overflow_policy)
    }

    /// Take the oldest queued event, if any.
    pub fn pop(&self) -> Option<DomainEvent> {
        self.queue.lock().pop_front()
    }

    /// Wait until an event is queued or the outbox is closed.
    ///
    /// Returns `None` once the outbox is closed and empty.
    pub async fn next(&self) -> Option<DomainEvent> {
        loop {
            // Register interest before checking, so an append between the
            // check and the await is not missed.
            let notified = self.ready.notified();
            if let Some(event) = self.pop() {
                return Some(event);
            }
            if self.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    /// Stop accepting events. Queued events can still be drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.ready.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events lost to the overflow policy since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl OutboxWriter for BoundedOutbox {
    fn append(&self, event: DomainEvent) -> Result<(), OutboxError> {
        if self.is_closed() {
            return Err(OutboxError::Closed);
        }

        {
            let mut queue = self.queue.lock();
            if queue.len() >= self.capacity {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        if let Some(evicted) = queue.pop_front() {
                            tracing::warn!(
                                event_id = %evicted.event_id(),
                                tenant_id = %evicted.tenant_id(),
                                capacity = self.capacity,
                                "outbox full, evicted oldest event"
                            );
                        }
                    }
                    OverflowPolicy::DropNewest => {
                        tracing::warn!(
                            event_id = %event.event_id(),
                            tenant_id = %event.tenant_id(),
                            capacity = self.capacity,
                            "outbox full, rejected event"
                        );
                        return Err(OutboxError::Full {
                            capacity: self.capacity,
                            event_id: event.event_id().clone(),
                        });
                    }
                }
            }
            queue.push_back(event);
        }

        self.ready.notify_one();
        Ok(())
    }
}
