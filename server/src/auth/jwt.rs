//! JWT issuance and verification.
//!
//! Issues and verifies HS256 JSON Web Tokens that bind a user id to an
//! expiration instant.
//!
//! # Pre-conditions
//! - The `SigningKey` is non-empty (enforced by its constructor).
//!
//! # Post-conditions
//! - `issue` embeds `exp = now + lifetime` and the user id as `sub`.
//! - `verify` returns the embedded user id only if the signature matches, the
//!   header names HS256 and `now < exp`.
//!
//! # Invariants
//! - Verification is stateless: verifying a token never changes its validity.
//! - Any algorithm other than HS256 is rejected before signature checking.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::SigningKey;
use crate::time::{SystemTimeSource, TimeSource};
use crate::types::ObjectId;

/// Tokens expire 72 hours after issuance.
pub const TOKEN_LIFETIME_SECS: u64 = 72 * 60 * 60;

/// The only algorithm the server issues or accepts.
const ACCEPTED_ALGORITHM: &str = "HS256";

/// Claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Subject claim containing the user identifier.
    sub: String,
    /// Issued-at, seconds since Unix epoch.
    iat: u64,
    /// Expiration, seconds since Unix epoch.
    exp: u64,
}

/// Only the `alg` field of the header is inspected before verification.
#[derive(Debug, Deserialize)]
struct HeaderProbe {
    alg: Option<String>,
}

/// Error returned when issuing or verifying a token fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token cannot be parsed into header, claims and signature.
    #[error("malformed token")]
    Malformed,
    /// The token header names an algorithm other than HS256.
    #[error("token signed with unsupported algorithm")]
    SchemeMismatch,
    /// The signature does not match the server secret.
    #[error("token signature mismatch")]
    SignatureMismatch,
    /// The current time is at or past the embedded expiration.
    #[error("token has expired")]
    Expired,
    /// Signing failed while issuing a token.
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies identity tokens with a process-wide secret.
///
/// Cheap to share behind an `Arc`; all fields are read-only after construction.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime_secs: u64,
    time: Arc<dyn TimeSource>,
}

impl TokenCodec {
    /// Create a codec that reads the system clock.
    #[must_use]
    pub fn new(key: &SigningKey) -> Self {
        Self::with_time_source(key, Arc::new(SystemTimeSource))
    }

    /// Create a codec with an explicit clock.
    #[must_use]
    pub fn with_time_source(key: &SigningKey, time: Arc<dyn TimeSource>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `verify` so that `exp == now` counts as expired
        // and the injected clock is honoured.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
            lifetime_secs: TOKEN_LIFETIME_SECS,
            time,
        }
    }

    /// Issue a signed token for `user_id` expiring `TOKEN_LIFETIME_SECS` from now.
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if the signature cannot be computed.
    pub fn issue(&self, user_id: &ObjectId) -> Result<String, TokenError> {
        let now = self.time.now_secs();
        let claims = Claims {
            sub: user_id.to_hex(),
            iat: now,
            exp: now.saturating_add(self.lifetime_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return the user id it was issued for.
    ///
    /// # Errors
    /// - `SchemeMismatch` if the header names any algorithm other than HS256.
    /// - `SignatureMismatch` if the signature was not produced with this secret.
    /// - `Expired` if the current time is at or past `exp`.
    /// - `Malformed` for anything that does not parse.
    pub fn verify(&self, token: &str) -> Result<ObjectId, TokenError> {
        check_algorithm(token)?;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(map_jwt_error)?;
        let claims = token_data.claims;

        if claims.exp <= self.time.now_secs() {
            return Err(TokenError::Expired);
        }

        ObjectId::parse_str(&claims.sub).map_err(|_| TokenError::Malformed)
    }
}

/// Reject tokens whose header names a different algorithm.
///
/// Runs before `decode` so that `none` and unknown algorithm names are
/// reported as `SchemeMismatch` rather than as parse failures.
fn check_algorithm(token: &str) -> Result<(), TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    let header = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    let probe: HeaderProbe =
        serde_json::from_slice(&header).map_err(|_| TokenError::Malformed)?;

    match probe.alg.as_deref() {
        Some(ACCEPTED_ALGORITHM) => Ok(()),
        Some(_) => Err(TokenError::SchemeMismatch),
        None => Err(TokenError::Malformed),
    }
}

/// Maps jsonwebtoken errors to our `TokenError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidAlgorithm => TokenError::SchemeMismatch,
        _ => TokenError::Malformed,
    }
}
