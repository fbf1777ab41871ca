//! Message broker adapters.
//!
//! - `redis` - Redis pub/sub client (production)
//! - `in_memory` - In-process broker (tests, single replica)
//! - `relay` - Re-broadcasts other replicas' payloads to local sockets
//! - `envelope` - Wire format of broker messages

mod envelope;
mod in_memory;
mod redis;
mod relay;

pub use envelope::BrokerEnvelope;
pub use in_memory::InMemoryBroker;
pub use self::redis::RedisBroker;
pub use relay::{BrokerRelay, RelayOutcome};
