//! HTTP-facing error taxonomy.
//!
//! Every handler returns `Result<_, ApiError>`. Each variant maps to one of a
//! small fixed set of status codes and renders as
//! `{"error": "<message>", "code": "<CODE>"}`.
//!
//! `NotFound` covers both a resource that is absent and one that belongs to
//! someone else.
//!
//! `Internal` carries diagnostic detail for the log only; clients always see
//! a fixed message.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::{CredentialError, TokenError};
use crate::images::ImageStoreError;
use crate::storage::DatabaseError;
use crate::types::InvalidObjectId;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Unauthorized(&'static str),
    /// The request body or query is not acceptable.
    #[error("{0}")]
    BadRequest(String),
    /// A path or body identifier is not a well-formed object id.
    #[error("Invalid ID")]
    InvalidIdentifier,
    /// Absent, or present but not owned by the caller.
    #[error("{0}")]
    NotFound(&'static str),
    /// A unique field is already taken.
    #[error("{0}")]
    Conflict(&'static str),
    /// An unexpected collaborator failure.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'static str,
}

impl ApiError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) | Self::InvalidIdentifier => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::InvalidIdentifier => "INVALID_IDENTIFIER",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Shorthand for a bad request with a static message.
    #[must_use]
    pub fn bad_request(message: &str) -> Self {
        Self::BadRequest(message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!("request failed: {detail}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: &message,
            code: self.error_code(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<InvalidObjectId> for ApiError {
    fn from(_: InvalidObjectId) -> Self {
        Self::InvalidIdentifier
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::DuplicateEmail => Self::Conflict("Email already registered"),
            DatabaseError::DuplicateBookmark => Self::Conflict("Item already bookmarked"),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(detail) => Self::Internal(detail),
            _ => Self::Unauthorized("Invalid token"),
        }
    }
}

impl From<ImageStoreError> for ApiError {
    fn from(e: ImageStoreError) -> Self {
        match e {
            ImageStoreError::Empty | ImageStoreError::UnsupportedType(_) => {
                Self::BadRequest(e.to_string())
            }
            ImageStoreError::Io(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected JSON body: {rejection}");
        Self::bad_request("Invalid input")
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::debug!("rejected multipart body: {rejection}");
        Self::bad_request("Invalid form data")
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
