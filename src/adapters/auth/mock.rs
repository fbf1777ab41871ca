//! Mock token validator for testing.
//!
//! Implements the `TokenValidator` port without real signatures, so
//! WebSocket sessions can be exercised with plain string tokens.
//!
//! # Example
//!
//! ```ignore
//! use delta_stream::adapters::auth::MockTokenValidator;
//! use delta_stream::domain::foundation::{AuthenticatedPrincipal, TenantId};
//!
//! let validator = MockTokenValidator::new().with_token(
//!     "valid-token",
//!     AuthenticatedPrincipal::for_tenant("user-1", TenantId::new("acme").unwrap()),
//! );
//!
//! assert!(validator.validate("valid-token").await.is_ok());
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::foundation::{AuthError, AuthenticatedPrincipal};
use crate::ports::TokenValidator;

/// Mock token validator.
///
/// Stores a map of tokens to principals. Tokens not in the map return
/// `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockTokenValidator {
    /// Map of valid tokens to their principals
    tokens: RwLock<HashMap<String, AuthenticatedPrincipal>>,
    /// Optional error to return for all validations (for error testing)
    force_error: RwLock<Option<AuthError>>,
}

impl MockTokenValidator {
    /// Creates a new empty mock validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to a principal.
    pub fn with_token(self, token: impl Into<String>, principal: AuthenticatedPrincipal) -> Self {
        self.tokens.write().insert(token.into(), principal);
        self
    }

    /// Forces all validations to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        *self.force_error.write() = Some(error);
        self
    }

    /// Removes a token, making it invalid.
    pub fn revoke(&self, token: &str) {
        self.tokens.write().remove(token);
    }
}

#[async_trait]
impl TokenValidator for MockTokenValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError> {
        if let Some(error) = self.force_error.read().clone() {
            return Err(error);
        }

        self.tokens
            .read()
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
