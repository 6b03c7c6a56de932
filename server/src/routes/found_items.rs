//! Found report routes.
//!
//! A found report may answer a specific lost report. When it does, the lost
//! report's owner is recorded as `lostPerson` and receives a notification.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::form::Form;
use super::{AppState, PageQuery};
use crate::auth::AuthenticatedUser;
use crate::auth::ownership::{owned_or_not_found, target_id};
use crate::error::{ApiError, ApiResult};
use crate::storage::{
    Database, DatabaseError, FOUND_NOTIFICATION_MESSAGE, FoundItem, FoundItemUpdate, Notification,
    UserSummary,
};
use crate::types::ObjectId;

/// A found report with the finder's and loser's names attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundItemView {
    #[serde(flatten)]
    pub item: FoundItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_by_user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_person_user: Option<UserSummary>,
}

impl FoundItemView {
    fn resolve(database: &Database, item: FoundItem) -> Result<Self, DatabaseError> {
        let found_by_user = database.user_summary(&item.found_person)?;
        let lost_person_user = match &item.lost_person {
            Some(id) => database.user_summary(id)?,
            None => None,
        };
        Ok(Self {
            item,
            found_by_user,
            lost_person_user,
        })
    }

    fn resolve_all(database: &Database, items: Vec<FoundItem>) -> Result<Vec<Self>, DatabaseError> {
        items
            .into_iter()
            .map(|item| Self::resolve(database, item))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct FoundStatusRequest {
    pub found: bool,
}

/// `POST /api/founditems` (multipart)
pub async fn create(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut form = Form::read(multipart).await?;
    let image = form.take_image()?;

    let lost_item = form.text("lostItem").map(target_id).transpose()?;
    let lost_person = match &lost_item {
        Some(lost_item) => {
            let answered = state
                .database
                .find_lost_item(lost_item)?
                .ok_or(ApiError::NotFound("Lost item not found"))?;
            Some(answered.created_by)
        }
        None => form.text("lostPerson").map(target_id).transpose()?,
    };

    let image_url = state
        .images
        .store(image.file_name.as_deref(), &image.bytes)
        .await?;

    let now = Utc::now();
    let inserted = state.database.insert_found_item(FoundItem {
        id: ObjectId::new(),
        lost_item,
        lost_person,
        found_person: user.user_id,
        found_person_phone: form.text_or_empty("foundPersonPhone"),
        location_found: form.text_or_empty("locationFound"),
        date_found: now,
        name: form.text_or_empty("name"),
        image_url: image_url.clone(),
        description: form.text_or_empty("description"),
        found: false,
        created_at: now,
        updated_at: now,
    });
    let item_id = match inserted {
        Ok(item_id) => item_id,
        Err(e) => {
            state.images.discard(&image_url).await;
            return Err(e.into());
        }
    };
    tracing::info!("user {} reported found item {item_id}", user.user_id);

    if let Some(lost_person) = lost_person {
        let notification = Notification::unread(FOUND_NOTIFICATION_MESSAGE, now);
        if !state.database.push_notification(&lost_person, notification)? {
            tracing::warn!("found item {item_id} names unknown user {lost_person}");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Found item reported successfully",
            "itemId": item_id,
        })),
    ))
}

/// `GET /api/founditems`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<FoundItemView>>> {
    let items = state.database.list_found_items(query.page())?;
    Ok(Json(FoundItemView::resolve_all(&state.database, items)?))
}

/// `GET /api/founditems/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FoundItemView>> {
    let id = target_id(&id)?;
    let item = state
        .database
        .find_found_item(&id)?
        .ok_or(ApiError::NotFound("Item not found"))?;
    Ok(Json(FoundItemView::resolve(&state.database, item)?))
}

/// `GET /api/founditems/lostItem/{lost_item_id}`
pub async fn for_lost_item(
    State(state): State<AppState>,
    Path(lost_item_id): Path<String>,
) -> ApiResult<Json<Vec<FoundItemView>>> {
    let lost_item_id = target_id(&lost_item_id)?;
    let items = state.database.found_items_for_lost_item(&lost_item_id)?;
    Ok(Json(FoundItemView::resolve_all(&state.database, items)?))
}

/// `GET /api/founditems/foundPerson/{user_id}`
pub async fn by_finder(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<FoundItemView>>> {
    let user_id = target_id(&user_id)?;
    let items = state.database.found_items_by_finder(&user_id)?;
    Ok(Json(FoundItemView::resolve_all(&state.database, items)?))
}

/// `PUT /api/founditems/{id}`
pub async fn update(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FoundItemUpdate>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = target_id(&id)?;
    let Json(update) = payload?;
    let updated = state
        .database
        .update_found_item(&id, &user.user_id, &update, Utc::now())?;
    owned_or_not_found(updated, "Item not found or not owned by user")?;

    tracing::info!("user {} updated found item {id}", user.user_id);
    Ok(Json(json!({
        "message": "Item updated successfully",
        "itemId": id,
    })))
}

/// `PUT /api/founditems/{id}/found`
pub async fn set_status(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<FoundStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let id = target_id(&id)?;
    let Json(request) = payload?;
    let updated = state
        .database
        .set_found_status(&id, &user.user_id, request.found, Utc::now())?;
    owned_or_not_found(updated.then_some(()), "Item not found or not owned by user")?;

    Ok(Json(json!({
        "message": "Status updated successfully",
        "found": request.found,
    })))
}

/// `DELETE /api/founditems/{id}`
pub async fn remove(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = target_id(&id)?;
    let deleted = state.database.delete_found_item(&id, &user.user_id)?;
    owned_or_not_found(deleted.then_some(()), "Item not found or not owned by user")?;

    tracing::info!("user {} deleted found item {id}", user.user_id);
    Ok(Json(json!({
        "message": "Item deleted successfully",
        "itemId": id,
    })))
}
