//! Ownership policy for mutating handlers.
//!
//! Every update or delete follows the same steps:
//! 1. The caller's identity comes from `AuthenticatedUser` (401 if absent).
//! 2. The path identifier is parsed with `target_id` (400 if malformed).
//! 3. The storage layer performs the mutation conditioned on id AND owner in
//!    one write-lock acquisition.
//! 4. `owned_or_not_found` turns a zero-match outcome into 404.
//!
//! Not-owned and absent produce the same 404.

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::types::ObjectId;

/// Parse a path-supplied resource identifier.
///
/// # Errors
/// Returns `ApiError::InvalidIdentifier` if `raw` is not a 24-hex-character id.
pub fn target_id(raw: &str) -> Result<ObjectId, ApiError> {
    Ok(ObjectId::parse_str(raw)?)
}

/// Map the result of a compound id+owner mutation to the response policy.
///
/// # Errors
/// Returns `ApiError::NotFound(message)` when nothing matched.
pub fn owned_or_not_found<T>(matched: Option<T>, message: &'static str) -> Result<T, ApiError> {
    matched.ok_or(ApiError::NotFound(message))
}

/// Profile self-update check: the path id must be the caller's own id.
///
/// # Errors
/// - `ApiError::InvalidIdentifier` if `raw` is malformed.
/// - `ApiError::NotFound(message)` if it names anyone else.
pub fn require_self(
    user: &AuthenticatedUser,
    raw: &str,
    message: &'static str,
) -> Result<ObjectId, ApiError> {
    let id = target_id(raw)?;
    if id == user.user_id {
        Ok(id)
    } else {
        Err(ApiError::NotFound(message))
    }
}
