//! Lost report routes.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
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
use crate::storage::{LostItem, LostItemFacets, LostItemFilter, Page, UserSummary};
use crate::types::ObjectId;

/// Query parameters accepted by `GET /api/lostitems`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LostItemQuery {
    pub name: Option<String>,
    pub category: Option<String>,
    pub district: Option<String>,
    pub user_only: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

impl LostItemQuery {
    fn filter(&self, caller: &AuthenticatedUser) -> LostItemFilter {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        LostItemFilter {
            name: non_empty(&self.name),
            category: non_empty(&self.category),
            district: non_empty(&self.district),
            created_by: (self.user_only.as_deref() == Some("true")).then_some(caller.user_id),
        }
    }
}

/// A lost report with its owner's name and email attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LostItemView {
    #[serde(flatten)]
    pub item: LostItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_user: Option<UserSummary>,
}

/// `POST /api/lostitems` (multipart)
pub async fn create(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut form = Form::read(multipart).await?;
    let image = form.take_image()?;
    let (Some(district), Some(region)) = (form.text("district"), form.text("state")) else {
        return Err(ApiError::bad_request("District and state are required"));
    };
    let (district, region) = (district.to_string(), region.to_string());

    let image_url = state
        .images
        .store(image.file_name.as_deref(), &image.bytes)
        .await?;

    let now = Utc::now();
    let inserted = state.database.insert_lost_item(LostItem {
        id: ObjectId::new(),
        name: form.text_or_empty("name"),
        description: form.text_or_empty("description"),
        category: form.text_or_empty("category"),
        image_url: image_url.clone(),
        district,
        state: region,
        locations: form.all("locations"),
        date_lost: now,
        created_by: user.user_id,
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

    tracing::info!("user {} reported lost item {item_id}", user.user_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Item created successfully",
            "itemId": item_id,
            "imageURL": image_url,
        })),
    ))
}

/// `GET /api/lostitems`
pub async fn list(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<LostItemQuery>,
) -> ApiResult<Json<Vec<LostItem>>> {
    let items = state
        .database
        .list_lost_items(&query.filter(&user), query.page.page())?;
    Ok(Json(items))
}

/// `GET /api/lostitems/filters`
pub async fn filters(State(state): State<AppState>) -> ApiResult<Json<LostItemFacets>> {
    Ok(Json(state.database.lost_item_facets()?))
}

/// `GET /api/lostitems/user/{user_id}`
pub async fn by_owner(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<LostItem>>> {
    let filter = LostItemFilter {
        created_by: Some(target_id(&user_id)?),
        ..LostItemFilter::default()
    };
    Ok(Json(state.database.list_lost_items(&filter, Page::default())?))
}

/// `GET /api/lostitems/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<LostItemView>> {
    let id = target_id(&id)?;
    let item = state
        .database
        .find_lost_item(&id)?
        .ok_or(ApiError::NotFound("Item not found"))?;
    let created_by_user = state.database.user_summary(&item.created_by)?;
    Ok(Json(LostItemView {
        item,
        created_by_user,
    }))
}

/// `DELETE /api/lostitems/{id}`
pub async fn remove(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = target_id(&id)?;
    let deleted = state.database.delete_lost_item(&id, &user.user_id)?;
    owned_or_not_found(deleted.then_some(()), "Item not found or not owned by user")?;

    tracing::info!("user {} deleted lost item {id}", user.user_id);
    Ok(Json(json!({
        "message": "Item deleted successfully",
        "itemId": id,
    })))
}
