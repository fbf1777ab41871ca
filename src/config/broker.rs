//! Broker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Message broker (Redis pub/sub) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Bootstrap address as `host:port`
    pub bootstrap_address: String,

    /// Connect over TLS (`rediss://`)
    #[serde(default)]
    pub tls: bool,

    /// Topic graph deltas are published to
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Connect/publish timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Re-broadcast deltas published by other replicas
    #[serde(default = "default_relay_enabled")]
    pub relay_enabled: bool,
}

impl BrokerConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connection URL derived from the bootstrap address
    pub fn url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        format!("{}://{}", scheme, self.bootstrap_address)
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bootstrap_address.is_empty() {
            return Err(ValidationError::MissingRequired("BROKER__BOOTSTRAP_ADDRESS"));
        }
        let (host, port) = self
            .bootstrap_address
            .rsplit_once(':')
            .ok_or(ValidationError::InvalidBootstrapAddress)?;
        if host.is_empty() || host.contains('/') || port.parse::<u16>().map_or(true, |p| p == 0) {
            return Err(ValidationError::InvalidBootstrapAddress);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidBrokerTimeout);
        }
        if self.topic.is_empty() || self.topic.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidTopic);
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_address: String::new(),
            tls: false,
            topic: default_topic(),
            timeout_secs: default_timeout(),
            relay_enabled: default_relay_enabled(),
        }
    }
}

fn default_topic() -> String {
    "graph-delta".to_string()
}

fn default_timeout() -> u64 {
    5
}

fn default_relay_enabled() -> bool {
    true
}
