//! OutboxWriter port - Hand-off point between the write path and dispatch.
//!
//! The commit path appends events here and returns immediately; a separate
//! worker drains the queue. Appending never blocks and never awaits.
//!
//! ## Pattern Overview
//!
//! 1. Entity-change hook builds a `DomainEvent` after commit
//! 2. The event is appended to the outbox (bounded, with overflow policy)
//! 3. The dispatch worker drains the outbox and runs the event handler

use thiserror::Error;

use crate::domain::foundation::{DomainEvent, EventId};

/// Errors raised when appending to the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutboxError {
    /// The queue is full and its policy rejects new events.
    #[error("outbox full ({capacity} events), event {event_id} rejected")]
    Full { capacity: usize, event_id: EventId },

    /// The outbox no longer accepts events (shutdown in progress).
    #[error("outbox closed")]
    Closed,
}

/// Port for appending events to the dispatch outbox.
pub trait OutboxWriter: Send + Sync {
    /// Append one event.
    ///
    /// Returns `Ok` when the event is queued, even if queueing it evicted an
    /// older event under a drop-oldest policy.
    fn append(&self, event: DomainEvent) -> Result<(), OutboxError>;
}
