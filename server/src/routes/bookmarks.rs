//! Bookmark routes.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use super::AppState;
use crate::auth::AuthenticatedUser;
use crate::auth::ownership::{owned_or_not_found, target_id};
use crate::error::{ApiError, ApiResult};
use crate::storage::{Bookmark, BookmarkWithItem};
use crate::types::ObjectId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRequest {
    pub lost_item_id: String,
}

/// `POST /api/bookmarks`
pub async fn create(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    payload: Result<Json<BookmarkRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let lost_item = target_id(&request.lost_item_id)?;
    if state.database.find_lost_item(&lost_item)?.is_none() {
        return Err(ApiError::NotFound("Lost item not found"));
    }

    let now = Utc::now();
    let bookmark = state.database.insert_bookmark(Bookmark {
        id: ObjectId::new(),
        user: user.user_id,
        lost_item,
        created_at: now,
        updated_at: now,
    })?;

    tracing::debug!("user {} bookmarked lost item {lost_item}", user.user_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Bookmark added successfully",
            "data": bookmark,
        })),
    ))
}

/// `GET /api/bookmarks`
pub async fn list(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<BookmarkWithItem>>> {
    Ok(Json(state.database.bookmarks_with_items(&user.user_id)?))
}

/// `DELETE /api/bookmarks/{id}`
pub async fn remove(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = target_id(&id)?;
    let deleted = state.database.delete_bookmark(&id, &user.user_id)?;
    owned_or_not_found(deleted.then_some(()), "Bookmark not found or not owned by user")?;

    Ok(Json(json!({ "message": "Bookmark deleted successfully" })))
}
