//! SubscriberConnection port - A live, message-oriented channel to one peer.
//!
//! The registry and broadcaster only see this trait, so delivery logic is
//! independent of the transport (axum WebSocket in production, recording
//! fakes in tests).

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::{ConnectionId, TenantId};

/// Errors raised while sending to a single connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The peer already closed the channel.
    #[error("connection closed")]
    Closed,

    /// The transport rejected the frame.
    #[error("transport error: {0}")]
    Transport(String),

    /// The send did not complete in time.
    #[error("send timed out after {0:?}")]
    Timeout(Duration),
}

/// Port for one subscriber connection.
///
/// Implementations must write frames in call order: two sends awaited one
/// after the other reach the peer in that order.
#[async_trait]
pub trait SubscriberConnection: Send + Sync {
    /// Unique identity of the connection.
    fn id(&self) -> ConnectionId;

    /// Tenant the connection was admitted for, `None` for global subscribers.
    fn tenant(&self) -> Option<&TenantId>;

    /// Send one complete UTF-8 text frame.
    async fn send_text(&self, text: Arc<str>) -> Result<(), DeliveryError>;

    /// Ask the transport to close the connection.
    ///
    /// Called when the connection is dropped after a failed send. Must not
    /// block; repeated calls are no-ops. Sends after a close fail with
    /// `DeliveryError::Closed`.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn SubscriberConnection) {}

    #[test]
    fn delivery_error_messages_are_readable() {
        assert_eq!(DeliveryError::Closed.to_string(), "connection closed");
        assert_eq!(
            DeliveryError::Timeout(Duration::from_millis(5)).to_string(),
            "send timed out after 5ms"
        );
    }
}
