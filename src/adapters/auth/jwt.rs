//! HMAC JWT validator for subscriber tokens.
//!
//! Tokens are signed with the pre-shared secret from configuration. Claims:
//!
//! | Claim | Required | Meaning |
//! |-------|----------|---------|
//! | `sub` | yes | Subject (user or service) |
//! | `exp` | yes | Expiry, seconds since epoch |
//! | `tenant_id` | no | Tenant scope of the connection |

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::{AuthConfig, TokenAlgorithm};
use crate::domain::foundation::{AuthError, AuthenticatedPrincipal, TenantId};
use crate::ports::TokenValidator;

/// Claims carried by subscriber tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberClaims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub exp: u64,
}

/// Validates HMAC-signed JWTs.
pub struct JwtTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(algorithm(config.algorithm));
        validation.leeway = config.leeway_secs;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.secret_key.expose_secret().as_bytes()),
            validation,
        }
    }
}

fn algorithm(alg: TokenAlgorithm) -> Algorithm {
    match alg {
        TokenAlgorithm::Hs256 => Algorithm::HS256,
        TokenAlgorithm::Hs384 => Algorithm::HS384,
        TokenAlgorithm::Hs512 => Algorithm::HS512,
    }
}

#[async_trait]
impl TokenValidator for JwtTokenValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError> {
        let data = decode::<SubscriberClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::warn!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            })?;

        let claims = data.claims;
        match claims.tenant_id {
            Some(tenant) => {
                let tenant = TenantId::new(tenant).map_err(|_| AuthError::InvalidToken)?;
                Ok(AuthenticatedPrincipal::for_tenant(claims.sub, tenant))
            }
            None => Ok(AuthenticatedPrincipal::global(claims.sub)),
        }
    }
}
