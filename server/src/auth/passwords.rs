//! Password hashing.
//!
//! bcrypt is CPU-bound by design, so both hashing and verification run on
//! tokio's blocking pool instead of stalling a runtime worker.

use super::{AuthError, Result};
use eventmingle_core::ValidationError;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Check a new password's shape.
///
/// # Errors
///
/// Returns [`ValidationError::Invalid`] for passwords shorter than
/// [`MIN_PASSWORD_LEN`].
pub fn validate_password(password: &str) -> std::result::Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::Invalid {
            field: "password",
            reason: format!("must be at least {MIN_PASSWORD_LEN} characters"),
        });
    }
    Ok(())
}

/// bcrypt hasher with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Create a hasher. Costs outside bcrypt's 4..=31 range fail at hash time.
    #[must_use]
    pub const fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash `password`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hashing`] if bcrypt fails or the worker panics.
    pub async fn hash(&self, password: String) -> Result<String> {
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Check `password` against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Hashing`] if the stored hash is malformed or the
    /// worker panics.
    pub async fn verify(&self, password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password("ééééééé").is_err());
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash("correct horse".into()).await.expect("hash");

        assert_ne!(hash, "correct horse");
        assert!(hasher.verify("correct horse".into(), hash.clone()).await.expect("verify"));
        assert!(!hasher.verify("battery staple".into(), hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn test_malformed_hash_is_an_error() {
        let hasher = PasswordHasher::new(4);
        let result = hasher.verify("anything".into(), "not-a-bcrypt-hash".into()).await;
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }
}
