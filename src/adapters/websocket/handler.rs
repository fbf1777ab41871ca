//! WebSocket upgrade handler for delta stream subscribers.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Validate the `token` query parameter (close with 1008 on failure)
//! 2. Send the `connected` message
//! 3. Register the connection
//! 4. Answer pings until the peer goes away or delivery to it fails
//! 5. Unregister (drop guard, runs on every exit path)

use std::borrow::Cow;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;

use crate::domain::foundation::{AuthError, AuthenticatedPrincipal};
use crate::ports::{SubscriberConnection, TokenValidator};

use super::{
    connection::WsConnection,
    messages::{ClientMessage, ConnectedMessage, PongMessage, ServerMessage},
    registry::{ConnectionRegistry, RegistrationGuard},
};

/// Upper bound on writing the close frame to an evicted peer.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    /// Registry the admitted connections join.
    pub registry: Arc<ConnectionRegistry>,

    /// Validator for the connect-time bearer token.
    pub validator: Arc<dyn TokenValidator>,
}

impl WebSocketState {
    pub fn new(registry: Arc<ConnectionRegistry>, validator: Arc<dyn TokenValidator>) -> Self {
        Self {
            registry,
            validator,
        }
    }
}

/// Query parameters of the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
}

/// How a subscriber session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Closed with a policy violation before admission.
    Rejected(AuthError),
    /// Admitted, then the peer went away.
    Disconnected,
    /// Admitted, then closed by the server after a failed delivery.
    Evicted,
}

/// Handle WebSocket upgrade requests for the delta stream.
///
/// Route: `GET /ws/delta?token=<bearer>`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<WebSocketState>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        serve_connection(state, params.token, sink, stream).await;
    })
}

/// Run one subscriber session over an already upgraded socket.
pub async fn serve_connection<S, R, E>(
    state: WebSocketState,
    token: Option<String>,
    mut sink: S,
    mut inbound: R,
) -> SessionOutcome
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let principal = match authenticate(state.validator.as_ref(), token.as_deref()).await {
        Ok(principal) => principal,
        Err(err) => {
            tracing::info!(reason = err.close_reason(), "rejecting subscriber");
            let frame = CloseFrame {
                code: close_code::POLICY,
                reason: Cow::Borrowed(err.close_reason()),
            };
            if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                tracing::debug!(error = %e, "failed to send close frame");
            }
            return SessionOutcome::Rejected(err);
        }
    };

    let connection = Arc::new(WsConnection::new(principal.tenant_id.clone(), sink));
    let connection_id = connection.id();

    let connected =
        ServerMessage::Connected(ConnectedMessage::new(connection_id, principal.tenant_id.as_ref()));
    if let Err(e) = send_message(connection.as_ref(), &connected).await {
        tracing::debug!(connection_id = %connection_id, error = %e, "peer gone before admission");
        return SessionOutcome::Disconnected;
    }

    let _guard = RegistrationGuard::register(state.registry.clone(), connection.clone());
    tracing::info!(
        connection_id = %connection_id,
        subject = %principal.subject,
        tenant_id = ?principal.tenant_id.as_ref().map(|t| t.as_str()),
        "subscriber connected"
    );

    let outcome = loop {
        let next = tokio::select! {
            _ = connection.closed() => {
                tracing::info!(connection_id = %connection_id, "closing subscriber after failed delivery");
                let frame = CloseFrame {
                    code: close_code::AGAIN,
                    reason: Cow::Borrowed("delivery failed"),
                };
                match tokio::time::timeout(CLOSE_TIMEOUT, connection.send_close(frame)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::debug!(connection_id = %connection_id, error = %e, "failed to send close frame"),
                    Err(_) => tracing::debug!(connection_id = %connection_id, "close frame timed out"),
                }
                break SessionOutcome::Evicted;
            }
            next = inbound.next() => next,
        };

        match next {
            None => break SessionOutcome::Disconnected,
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Ping) => {
                    let pong = ServerMessage::Pong(PongMessage::now());
                    if let Err(e) = send_message(connection.as_ref(), &pong).await {
                        tracing::debug!(connection_id = %connection_id, error = %e, "pong failed");
                        break SessionOutcome::Disconnected;
                    }
                }
                Err(_) => {
                    tracing::trace!(connection_id = %connection_id, "ignoring client message");
                }
            },
            Some(Ok(Message::Close(_))) => {
                tracing::debug!(connection_id = %connection_id, "client sent close frame");
                break SessionOutcome::Disconnected;
            }
            // Protocol pings/pongs are answered by axum; binary is ignored
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "receive error");
                break SessionOutcome::Disconnected;
            }
        }
    };

    tracing::info!(connection_id = %connection_id, ?outcome, "subscriber disconnected");
    outcome
}

async fn authenticate(
    validator: &dyn TokenValidator,
    token: Option<&str>,
) -> Result<AuthenticatedPrincipal, AuthError> {
    match token {
        Some(token) if !token.is_empty() => validator.validate(token).await,
        _ => Err(AuthError::MissingToken),
    }
}

/// Send a JSON message over the connection.
async fn send_message(
    connection: &dyn SubscriberConnection,
    msg: &ServerMessage,
) -> Result<(), crate::ports::DeliveryError> {
    let json = serde_json::to_string(msg)
        .map_err(|e| crate::ports::DeliveryError::Transport(e.to_string()))?;
    connection.send_text(json.into()).await
}
