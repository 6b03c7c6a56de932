//! The process-wide token signing secret.
//!
//! # Pre-conditions
//! - The secret is loaded once at startup from configuration.
//!
//! # Post-conditions
//! - `SigningKey` instances are immutable once created.
//!
//! # Invariants
//! - The secret is never empty.
//! - The secret never appears in `Debug` output or logs.

/// Error returned when the signing secret is unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningKeyError {
    /// The HS256 secret is empty.
    #[error("HS256 secret must not be empty")]
    EmptySecret,
}

/// Symmetric HMAC-SHA256 secret shared by token issuance and verification.
#[derive(Clone)]
pub struct SigningKey {
    secret: Vec<u8>,
}

impl SigningKey {
    /// Create a new HS256 signing key.
    ///
    /// # Pre-conditions
    /// - `secret` must not be empty.
    ///
    /// # Errors
    /// Returns `SigningKeyError::EmptySecret` if the secret is empty.
    pub fn new_hs256(secret: impl Into<Vec<u8>>) -> Result<Self, SigningKeyError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SigningKeyError::EmptySecret);
        }
        Ok(Self { secret })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &"HS256")
            .field("secret", &"<redacted>")
            .finish()
    }
}
