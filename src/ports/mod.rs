//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Delivery Ports
//!
//! - `SubscriberConnection` - One live subscriber channel
//! - `TokenValidator` - Bearer token validation at connect time
//!
//! ## Event Ports
//!
//! - `OutboxWriter` - Non-blocking hand-off from the write path
//! - `EventHandler` - Consumer of drained domain events
//! - `EventPublisher` - Publish to broker topic and live connections
//! - `BrokerClient` - External broker used for cross-replica relay

mod broker_client;
mod connection;
mod event_handler;
mod event_publisher;
mod outbox_writer;
mod token_validator;

pub use broker_client::{BrokerClient, BrokerError, BrokerMessages, Topic};
pub use connection::{DeliveryError, SubscriberConnection};
pub use event_handler::EventHandler;
pub use event_publisher::{Audience, EventPublisher};
pub use outbox_writer::{OutboxError, OutboxWriter};
pub use token_validator::TokenValidator;
