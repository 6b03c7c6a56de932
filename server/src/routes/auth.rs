//! Account routes: signup, login, session check and profiles.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use super::AppState;
use crate::auth::ownership::{owned_or_not_found, require_self, target_id};
use crate::auth::{AuthenticatedUser, credentials};
use crate::error::{ApiError, ApiResult};
use crate::storage::{Location, ProfileUpdate, UserProfile, UserRecord};
use crate::types::ObjectId;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub profession: String,
    pub location: Location,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Emails are matched case-insensitively and without surrounding whitespace.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `POST /api/auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let password_digest = credentials::digest_blocking(request.password).await?;
    let now = Utc::now();
    let user = state.database.insert_user(UserRecord {
        id: ObjectId::new(),
        username: request.username.trim().to_string(),
        email,
        phone: request.phone.trim().to_string(),
        profession: request.profession.trim().to_string(),
        location: request.location,
        password_digest,
        notifications: Vec::new(),
        created_at: now,
        updated_at: now,
    })?;

    tracing::info!("registered user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Registration successful",
            "user": user.profile(),
        })),
    ))
}

/// `POST /api/auth/login`
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let email = normalize_email(&request.email);
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let Some(user) = state.database.find_user_by_email(&email)? else {
        credentials::mismatch_blocking(request.password).await;
        tracing::debug!("login rejected: unknown email");
        return Err(ApiError::Unauthorized("Invalid credentials"));
    };
    if !credentials::matches_blocking(request.password, user.password_digest.clone()).await {
        tracing::debug!("login rejected for user {}: wrong password", user.id);
        return Err(ApiError::Unauthorized("Invalid credentials"));
    }

    let token = state.tokens.issue(&user.id)?;
    tracing::info!("user {} logged in", user.id);
    Ok(Json(json!({
        "message": "Login successful",
        "user": user.profile(),
        "token": token,
    })))
}

/// `GET /api/auth/check-session`
pub async fn check_session(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let record = state
        .database
        .find_user(&user.user_id)?
        .ok_or(ApiError::Unauthorized("User not found"))?;
    Ok(Json(json!({
        "message": "Session valid",
        "user": record.profile(),
    })))
}

/// `GET /api/auth/user/{id}`
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let id = target_id(&id)?;
    let record = state
        .database
        .find_user(&id)?
        .ok_or(ApiError::NotFound("User not found"))?;
    Ok(Json(record.profile()))
}

/// `PUT /api/auth/user/{id}`: callers may only update their own profile.
pub async fn update_profile(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = require_self(&user, &id, "User not found")?;
    let Json(mut update) = payload?;
    if let Some(email) = update.email.take() {
        let email = normalize_email(&email);
        if email.is_empty() {
            return Err(ApiError::bad_request("Email must not be empty"));
        }
        update.email = Some(email);
    }

    let updated = state.database.update_user(&id, &update, Utc::now())?;
    let record = owned_or_not_found(updated, "User not found")?;
    tracing::info!("user {} updated their profile", record.id);
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": record.profile(),
    })))
}
