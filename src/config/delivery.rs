//! Delivery configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Subscriber delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Per-connection send timeout in milliseconds
    #[serde(default = "default_send_timeout")]
    pub send_timeout_ms: u64,

    /// Deliver tenant-scoped messages only to connections of that tenant
    #[serde(default = "default_tenant_isolation")]
    pub tenant_isolation: bool,
}

impl DeliveryConfig {
    /// Get send timeout as Duration
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Validate delivery configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.send_timeout_ms == 0 || self.send_timeout_ms > 60_000 {
            return Err(ValidationError::InvalidSendTimeout);
        }
        Ok(())
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout(),
            tenant_isolation: default_tenant_isolation(),
        }
    }
}

fn default_send_timeout() -> u64 {
    5000
}

fn default_tenant_isolation() -> bool {
    true
}
