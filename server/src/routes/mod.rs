//! HTTP surface.
//!
//! All resources live under `/api`. Signup and login are public; every other
//! route sits behind [`require_auth`], so handlers that take an
//! [`AuthenticatedUser`](crate::auth::AuthenticatedUser) only ever run for
//! callers with a valid token. Uploaded images are served from `/uploads`.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, ORIGIN};
use axum::routing::{delete, get, post, put};
use axum::{Router, middleware};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{TokenCodec, require_auth};
use crate::images::{ImageStore, UPLOADS_ROUTE};
use crate::storage::{Database, Page};

pub mod auth;
pub mod bookmarks;
pub mod form;
pub mod found_items;
pub mod lost_items;

/// Largest accepted request body, sized for one image plus form fields.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<Database>,
    pub tokens: Arc<TokenCodec>,
    pub images: Arc<ImageStore>,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login));

    let protected = Router::new()
        .route("/auth/check-session", get(auth::check_session))
        .route(
            "/auth/user/{id}",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/lostitems", post(lost_items::create).get(lost_items::list))
        .route("/lostitems/filters", get(lost_items::filters))
        .route("/lostitems/user/{user_id}", get(lost_items::by_owner))
        .route(
            "/lostitems/{id}",
            get(lost_items::get_one).delete(lost_items::remove),
        )
        .route("/founditems", post(found_items::create).get(found_items::list))
        .route(
            "/founditems/lostItem/{lost_item_id}",
            get(found_items::for_lost_item),
        )
        .route("/founditems/foundPerson/{user_id}", get(found_items::by_finder))
        .route(
            "/founditems/{id}",
            get(found_items::get_one)
                .put(found_items::update)
                .delete(found_items::remove),
        )
        .route("/founditems/{id}/found", put(found_items::set_status))
        .route("/bookmarks", post(bookmarks::create).get(bookmarks::list))
        .route("/bookmarks/{id}", delete(bookmarks::remove))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.tokens),
            require_auth,
        ));

    Router::new()
        .nest("/api", public.merge(protected))
        .nest_service(UPLOADS_ROUTE, ServeDir::new(state.images.directory()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ORIGIN, CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([CONTENT_LENGTH])
        .max_age(CORS_MAX_AGE)
}

/// `limit`/`skip` query parameters. Values that are not non-negative
/// integers are ignored rather than rejected, and a zero limit means no limit.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub skip: Option<String>,
}

impl PageQuery {
    #[must_use]
    pub fn page(&self) -> Page {
        Page {
            skip: parse_count(self.skip.as_deref()),
            limit: parse_count(self.limit.as_deref()).filter(|&limit| limit > 0),
        }
    }
}

fn parse_count(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse().ok()
}
