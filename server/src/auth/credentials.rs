//! Password digests.
//!
//! Passwords are stored as Argon2id PHC strings (`$argon2id$v=19$...`) with a
//! random per-password salt and the crate's default work factor.
//!
//! # Invariants
//! - A digest never contains the plaintext.
//! - Plaintexts are never logged.
//! - Comparison of the recomputed hash against the stored one is constant time.

use std::sync::LazyLock;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Error returned when a password cannot be digested.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// Digest of a throwaway password, checked when no stored digest exists so
/// that the lookup miss costs the same Argon2 work as a real comparison.
static UNKNOWN_USER_DIGEST: LazyLock<String> =
    LazyLock::new(|| digest("lostfound-unknown-user").unwrap_or_default());

/// Digest a plaintext password with a fresh random salt.
///
/// Expensive; call from a blocking context (see `digest_blocking`).
///
/// # Errors
/// Returns `CredentialError::Hashing` if Argon2 rejects the input.
pub fn digest(plaintext: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

/// Check a plaintext password against a stored digest.
///
/// A digest that does not parse never matches.
#[must_use]
pub fn matches(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        tracing::warn!("stored password digest is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Run `digest` on the blocking thread pool.
///
/// # Errors
/// Returns `CredentialError::Hashing` if hashing fails or the task is cancelled.
pub async fn digest_blocking(plaintext: String) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || digest(&plaintext))
        .await
        .map_err(|e| CredentialError::Hashing(e.to_string()))?
}

/// Run `matches` on the blocking thread pool. A cancelled task never matches.
pub async fn matches_blocking(plaintext: String, digest: String) -> bool {
    tokio::task::spawn_blocking(move || matches(&plaintext, &digest))
        .await
        .unwrap_or(false)
}

/// Run a full verification against a throwaway digest on the blocking
/// thread pool. Always returns `false`.
pub async fn mismatch_blocking(plaintext: String) -> bool {
    tokio::task::spawn_blocking(move || {
        let _matched = matches(&plaintext, &UNKNOWN_USER_DIGEST);
        false
    })
    .await
    .unwrap_or(false)
}
