//! Authentication adapters.
//!
//! Implementations of the `TokenValidator` port:
//!
//! - `jwt` - HMAC-signed JWTs checked against the configured secret
//! - `mock` - Test implementation that doesn't require signed tokens

mod jwt;
mod mock;

pub use jwt::{JwtTokenValidator, SubscriberClaims};
pub use mock::MockTokenValidator;
