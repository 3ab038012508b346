//! Session tokens.
//!
//! HS256 JWTs carrying `{sub, email, role, iat, exp}`. Expiry is checked
//! against the injected [`Clock`] rather than the system time, so tests can
//! move time forward.

use super::{AuthError, Result};
use eventmingle_core::entities::{Role, User};
use eventmingle_core::environment::Clock;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    /// Email at issue time.
    pub email: String,
    /// Role at issue time. Gates use the stored user's current role.
    pub role: Role,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

/// Issues and verifies session tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a service signing with `secret`; tokens live `ttl_secs` seconds.
    #[must_use]
    pub fn new(secret: &str, ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
            clock,
        }
    }

    /// Token lifetime in seconds.
    #[must_use]
    pub const fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if encoding fails.
    pub fn issue(&self, user: &User) -> Result<String> {
        let iat = self.clock.now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat,
            exp: iat.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Check signature and expiry and return the claims.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] for a malformed or forged token,
    /// [`AuthError::Expired`] once `exp` has passed.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AuthError::InvalidToken
        })?;

        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}
