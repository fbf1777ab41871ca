//! WebSocket-backed subscriber connection.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message};
use futures::{Sink, SinkExt};
use tokio::sync::{Mutex, Notify};

use crate::domain::foundation::{ConnectionId, TenantId};
use crate::ports::{DeliveryError, SubscriberConnection};

/// Write half of one WebSocket, shared between the session loop (pongs)
/// and the broadcaster (deltas).
///
/// Generic over the sink so sessions can be driven by in-memory channels.
/// A close request from the broadcaster is observed by the session loop
/// through [`WsConnection::closed`].
pub struct WsConnection<S> {
    id: ConnectionId,
    tenant: Option<TenantId>,
    sink: Mutex<S>,
    closing: AtomicBool,
    close_requested: Notify,
}

impl<S> WsConnection<S> {
    pub fn new(tenant: Option<TenantId>, sink: S) -> Self {
        Self {
            id: ConnectionId::new(),
            tenant,
            sink: Mutex::new(sink),
            closing: AtomicBool::new(false),
            close_requested: Notify::new(),
        }
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Resolves once [`close`](SubscriberConnection::close) has been called.
    pub async fn closed(&self) {
        if self.is_closing() {
            return;
        }
        // notify_one stores a permit, so a close racing this call still wakes it.
        self.close_requested.notified().await;
    }
}

impl<S> WsConnection<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
{
    /// Write a close frame. Used by the session loop once closing.
    pub async fn send_close(&self, frame: CloseFrame<'static>) -> Result<(), DeliveryError> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Close(Some(frame)))
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }
}

#[async_trait]
impl<S> SubscriberConnection for WsConnection<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
{
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    async fn send_text(&self, text: Arc<str>) -> Result<(), DeliveryError> {
        if self.is_closing() {
            return Err(DeliveryError::Closed);
        }
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text.to_string()))
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }

    fn close(&self) {
        if !self.closing.swap(true, Ordering::SeqCst) {
            self.close_requested.notify_one();
        }
    }
}
