//! Event dispatch adapters.
//!
//! - `bounded_outbox` - Bounded in-memory outbox with overflow policy
//! - `dispatch_worker` - Drains the outbox into an event handler
//! - `fanout_publisher` - Publishes payloads to broker and live sockets

mod bounded_outbox;
mod dispatch_worker;
mod fanout_publisher;

pub use bounded_outbox::BoundedOutbox;
pub use dispatch_worker::DispatchWorker;
pub use fanout_publisher::FanoutPublisher;
