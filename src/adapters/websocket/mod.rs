//! WebSocket adapters for the real-time delta stream.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │        FanoutPublisher / BrokerRelay (graph deltas, relayed)         │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ broadcasts
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           Broadcaster                                │
//! │   - Serializes once per call                                         │
//! │   - Sends concurrently, prunes connections whose send fails          │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ snapshots
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       ConnectionRegistry                             │
//! │   conn-a (acme)    conn-b (acme)    conn-c (globex)    conn-d (-)    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`registry`] - Set of live connections and its drop guard
//! - [`broadcaster`] - Fan-out with failure isolation
//! - [`connection`] - `SubscriberConnection` over a WebSocket sink
//! - [`handler`] - Axum WebSocket upgrade handler and session loop

pub mod broadcaster;
pub mod connection;
pub mod handler;
pub mod messages;
pub mod registry;

pub use broadcaster::{BroadcastError, BroadcastReport, Broadcaster};
pub use connection::WsConnection;
pub use handler::{serve_connection, ws_handler, ConnectParams, SessionOutcome, WebSocketState};
pub use messages::{
    ClientMessage, ConnectedMessage, GraphDeltaMessage, PongMessage, ServerMessage,
};
pub use registry::{ConnectionRegistry, RegistrationGuard};
