//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the fan-out core to external systems:
//! - `auth` - Bearer token validation (JWT, mock)
//! - `broker` - Pub/sub broker clients (Redis, in-memory) and the relay
//! - `events` - Bounded outbox, dispatch worker, fan-out publisher
//! - `http` - Axum router (health, WebSocket upgrade)
//! - `websocket` - Connection registry, broadcaster, session handling

pub mod auth;
pub mod broker;
pub mod events;
pub mod http;
pub mod websocket;

pub use auth::{JwtTokenValidator, MockTokenValidator};
pub use broker::{BrokerRelay, InMemoryBroker, RedisBroker};
pub use events::{BoundedOutbox, DispatchWorker, FanoutPublisher};
pub use websocket::{Broadcaster, ConnectionRegistry};
