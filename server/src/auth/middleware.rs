//! Request authentication filter.
//!
//! `require_auth` runs in front of every protected route. It reads the
//! `Authorization` header, strips an optional `Bearer ` prefix, verifies the
//! token and stores the resolved `AuthenticatedUser` in the request
//! extensions. Any failure short-circuits with 401 before the handler runs.
//!
//! Handlers receive the identity through the `AuthenticatedUser` extractor.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::TokenCodec;
use crate::error::ApiError;
use crate::types::ObjectId;

/// Optional scheme prefix on the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// The verified identity of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: ObjectId,
}

/// Pull the raw token out of the `Authorization` header.
///
/// Returns `None` if the header is absent, not valid ASCII or empty after
/// stripping the prefix.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

/// Verify the caller's token and attach their identity to the request.
pub async fn require_auth(
    State(tokens): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()) else {
        tracing::debug!("rejecting request without authorization header");
        return Err(ApiError::Unauthorized("Authorization header required"));
    };

    let user_id = tokens.verify(token).map_err(|e| {
        tracing::debug!("rejecting request: {e}");
        ApiError::Unauthorized("Invalid token")
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or(ApiError::Unauthorized("Unauthorized"))
    }
}
