//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Broker bootstrap address must be host:port")]
    InvalidBootstrapAddress,

    #[error("Broker timeout must be between 1 and 60 seconds")]
    InvalidBrokerTimeout,

    #[error("Broker topic must not be empty or contain whitespace")]
    InvalidTopic,

    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token secret must be at least {0} bytes in production")]
    SecretTooShort(usize),

    #[error("Send timeout must be between 1 and 60000 milliseconds")]
    InvalidSendTimeout,

    #[error("Dispatch queue capacity must be at least 1")]
    InvalidQueueCapacity,

    #[error("Dispatch max_in_flight must be at least 1")]
    InvalidMaxInFlight,
}
