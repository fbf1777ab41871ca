//! Authentication types for the domain layer.
//!
//! These types represent the principal behind a subscriber connection,
//! extracted from a validated bearer token. Any token format can populate
//! them via the `TokenValidator` port.

use super::TenantId;
use thiserror::Error;

/// Principal extracted from a validated bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    /// The token subject.
    pub subject: String,

    /// Tenant the token is scoped to. `None` for global (operator) tokens.
    pub tenant_id: Option<TenantId>,
}

impl AuthenticatedPrincipal {
    /// Creates a principal scoped to a tenant.
    pub fn for_tenant(subject: impl Into<String>, tenant_id: TenantId) -> Self {
        Self {
            subject: subject.into(),
            tenant_id: Some(tenant_id),
        }
    }

    /// Creates a principal without tenant scope.
    pub fn global(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            tenant_id: None,
        }
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token was supplied with the connection request.
    #[error("Missing token")]
    MissingToken,

    /// The token is malformed or has an invalid signature.
    #[error("Invalid token")]
    InvalidToken,

    /// The token signature is valid but it has expired.
    #[error("Token expired")]
    TokenExpired,
}

impl AuthError {
    /// Short reason placed in the close frame sent to the peer.
    pub fn close_reason(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing token",
            AuthError::InvalidToken => "invalid token",
            AuthError::TokenExpired => "token expired",
        }
    }
}
