//! Dispatch queue configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Configuration of the bounded outbox and its dispatch worker
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of queued, not yet dispatched events
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// What to do with an event arriving while the queue is full
    #[serde(default)]
    pub overflow_policy: OverflowPolicy,

    /// Maximum events processed concurrently by the worker
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

/// Overflow policy of the bounded outbox
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued event to make room
    #[default]
    DropOldest,
    /// Reject the incoming event
    DropNewest,
}

impl DispatchConfig {
    /// Validate dispatch configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.queue_capacity == 0 {
            return Err(ValidationError::InvalidQueueCapacity);
        }
        if self.max_in_flight == 0 {
            return Err(ValidationError::InvalidMaxInFlight);
        }
        Ok(())
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            overflow_policy: OverflowPolicy::default(),
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_in_flight() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_config_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.overflow_policy, OverflowPolicy::DropOldest);
        assert_eq!(config.max_in_flight, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_capacity() {
        let config = DispatchConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidQueueCapacity));
    }

    #[test]
    fn test_validation_zero_in_flight() {
        let config = DispatchConfig {
            max_in_flight: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxInFlight));
    }
}
