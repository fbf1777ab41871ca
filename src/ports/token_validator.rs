//! TokenValidator port - Validates the bearer token presented on connect.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedPrincipal};

/// Port for validating subscriber tokens.
///
/// The token arrives as a query parameter on the WebSocket upgrade request;
/// the handshake is rejected with a policy-violation close when validation
/// fails.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate a raw token and extract its principal.
    async fn validate(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn TokenValidator) {}
}
