//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DELTA_STREAM` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use delta_stream::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod broker;
mod delivery;
mod dispatch;
mod error;
mod server;

pub use auth::{AuthConfig, TokenAlgorithm};
pub use broker::BrokerConfig;
pub use delivery::DeliveryConfig;
pub use dispatch::{DispatchConfig, OverflowPolicy};
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Broker configuration (Redis pub/sub)
    pub broker: BrokerConfig,

    /// Token validation configuration
    pub auth: AuthConfig,

    /// Subscriber delivery configuration
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Outbox queue and dispatch worker configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DELTA_STREAM` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DELTA_STREAM__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `DELTA_STREAM__BROKER__BOOTSTRAP_ADDRESS=localhost:6379` -> `broker.bootstrap_address`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DELTA_STREAM")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.broker.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.delivery.validate()?;
        self.dispatch.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "DELTA_STREAM__BROKER__BOOTSTRAP_ADDRESS",
        "DELTA_STREAM__AUTH__SECRET_KEY",
        "DELTA_STREAM__AUTH__ALGORITHM",
        "DELTA_STREAM__SERVER__PORT",
        "DELTA_STREAM__SERVER__ENVIRONMENT",
        "DELTA_STREAM__DISPATCH__OVERFLOW_POLICY",
        "DELTA_STREAM__DELIVERY__TENANT_ISOLATION",
    ];

    fn set_minimal_env() {
        env::set_var("DELTA_STREAM__BROKER__BOOTSTRAP_ADDRESS", "localhost:6379");
        env::set_var("DELTA_STREAM__AUTH__SECRET_KEY", "dev-secret");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.broker.bootstrap_address, "localhost:6379");
        assert_eq!(config.auth.secret_key.expose_secret(), "dev-secret");
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.broker.topic, "graph-delta");
        assert_eq!(config.auth.algorithm, TokenAlgorithm::Hs256);
        assert!(config.delivery.tenant_isolation);
        assert_eq!(config.dispatch.overflow_policy, OverflowPolicy::DropOldest);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enum_and_bool_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("DELTA_STREAM__AUTH__ALGORITHM", "HS512");
        env::set_var("DELTA_STREAM__DISPATCH__OVERFLOW_POLICY", "drop_newest");
        env::set_var("DELTA_STREAM__DELIVERY__TENANT_ISOLATION", "false");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.auth.algorithm, TokenAlgorithm::Hs512);
        assert_eq!(config.dispatch.overflow_policy, OverflowPolicy::DropNewest);
        assert!(!config.delivery.tenant_isolation);
    }

    #[test]
    fn test_missing_broker_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("DELTA_STREAM__AUTH__SECRET_KEY", "dev-secret");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_production_rejects_short_secret() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("DELTA_STREAM__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ValidationError::SecretTooShort(32)));
    }
}
