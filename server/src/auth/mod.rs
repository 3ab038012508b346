//! Authentication and role gates.
//!
//! Accounts log in with email and password. A successful login or sign-up
//! returns a signed session token (HS256 JWT) that clients send back as
//! `Authorization: Bearer <token>` or in the `session_token` cookie.
//!
//! - [`tokens`]: issue and verify session tokens
//! - [`passwords`]: bcrypt hashing on the blocking pool
//! - [`middleware`]: `SessionUser` extractors, API gates and the page gate
//! - [`handlers`]: `/api/auth/*` endpoints

pub mod handlers;
pub mod middleware;
pub mod passwords;
pub mod tokens;

pub use middleware::{AccessPolicy, Gate, MaybeSessionUser, SessionUser};
pub use passwords::PasswordHasher;
pub use tokens::{Claims, TokenService};

use eventmingle_web::AppError;

/// Authentication failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token in the request.
    #[error("Missing authentication token")]
    MissingToken,
    /// Token is malformed, forged, or names an unknown user.
    #[error("Invalid authentication token")]
    InvalidToken,
    /// Token lifetime is over.
    #[error("Session expired")]
    Expired,
    /// Unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// Authenticated, but the role is not allowed here.
    #[error("Insufficient permissions")]
    Forbidden,
    /// bcrypt failed or its worker thread died.
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    /// Token could not be signed.
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Result alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::Expired
            | AuthError::InvalidCredentials => Self::unauthorized(err.to_string()),
            AuthError::Forbidden => Self::forbidden(err.to_string()),
            AuthError::Hashing(_) | AuthError::Signing(_) => {
                Self::internal("Authentication failed").with_source(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(AuthError::Expired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::from(AuthError::Forbidden).status(), StatusCode::FORBIDDEN);

        let internal = AppError::from(AuthError::Hashing("worker panicked".into()));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message(), "Authentication failed");
    }
}
