//! Common helpers for end-to-end tests.
//!
//! A `TestServer` owns the full router over an in-memory database, a
//! temporary upload directory and a manually driven clock, and sends
//! requests through it with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::auth::{SigningKey, TokenCodec};
use crate::images::ImageStore;
use crate::routes::{AppState, router};
use crate::storage::Database;
use crate::time::{ManualTimeSource, TimeSource};
use crate::types::ObjectId;

pub const TEST_SECRET: &str = "e2e-test-secret";
pub const PUBLIC_URL: &str = "http://localhost:5000";
pub const PASSWORD: &str = "correct horse battery staple";

const BOUNDARY: &str = "lostfound-test-boundary";

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub bytes: Bytes,
}

/// A signed-up, logged-in user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: ObjectId,
    pub email: String,
    pub token: String,
}

pub struct TestServer {
    app: Router,
    pub database: Arc<Database>,
    pub clock: Arc<ManualTimeSource>,
    uploads: TempDir,
}

impl TestServer {
    /// Create a server with an empty database and the clock at the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_database(Database::in_memory())
    }

    /// Create a server over `database`, e.g. one backed by a snapshot file.
    #[must_use]
    pub fn with_database(database: Database) -> Self {
        #[allow(clippy::expect_used)]
        let uploads = tempfile::tempdir().expect("Failed to create upload directory");
        #[allow(clippy::cast_possible_truncation)]
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        let clock = Arc::new(ManualTimeSource::new(now_ms));

        #[allow(clippy::expect_used)]
        let key = SigningKey::new_hs256(TEST_SECRET).expect("valid secret");
        let database = Arc::new(database);
        let state = AppState {
            database: Arc::clone(&database),
            tokens: Arc::new(TokenCodec::with_time_source(
                &key,
                Arc::clone(&clock) as Arc<dyn TimeSource>,
            )),
            images: Arc::new(ImageStore::new(uploads.path(), PUBLIC_URL)),
        };

        Self {
            app: router(state),
            database,
            clock,
            uploads,
        }
    }

    #[must_use]
    pub fn upload_count(&self) -> usize {
        std::fs::read_dir(self.uploads.path()).map_or(0, Iterator::count)
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        #[allow(clippy::expect_used)]
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        #[allow(clippy::expect_used)]
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            body,
            bytes,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(build(Method::GET, uri, token, None, Body::empty()))
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(build(Method::DELETE, uri, token, None, Body::empty()))
            .await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send(json_request(Method::POST, uri, token, body)).await
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send(json_request(Method::PUT, uri, token, body)).await
    }

    /// POST a multipart form. `image` is `(file name, contents)`.
    pub async fn post_multipart(
        &self,
        uri: &str,
        token: Option<&str>,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
        let body = multipart_body(fields, image);
        self.send(build(
            Method::POST,
            uri,
            token,
            Some(&content_type),
            Body::from(body),
        ))
        .await
    }

    /// Sign up and log in a user with the shared test password.
    pub async fn register(&self, username: &str) -> TestUser {
        let email = format!("{username}@example.com");
        let signup = self
            .post_json(
                "/api/auth/signup",
                None,
                &json!({
                    "username": username,
                    "email": email,
                    "password": PASSWORD,
                    "phone": "555-0100",
                    "profession": "engineer",
                    "location": {"district": "Ernakulam", "state": "Kerala"},
                }),
            )
            .await;
        assert_eq!(signup.status, StatusCode::CREATED, "signup: {:?}", signup.body);

        let login = self
            .post_json(
                "/api/auth/login",
                None,
                &json!({"email": email, "password": PASSWORD}),
            )
            .await;
        assert_eq!(login.status, StatusCode::OK, "login: {:?}", login.body);

        TestUser {
            id: object_id(&login.body["user"]["id"]),
            email,
            token: string(&login.body["token"]),
        }
    }

    /// Report a lost item as `user` and return its id.
    pub async fn report_lost_item(&self, user: &TestUser, name: &str, category: &str) -> ObjectId {
        let response = self
            .post_multipart(
                "/api/lostitems",
                Some(&user.token),
                &[
                    ("name", name),
                    ("description", "last seen on the ferry"),
                    ("category", category),
                    ("district", "Ernakulam"),
                    ("state", "Kerala"),
                    ("locations", "Fort Kochi jetty"),
                ],
                Some(("photo.jpg", b"\xFF\xD8\xFF\xE0fake-jpeg".as_slice())),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        object_id(&response.body["itemId"])
    }

    /// Report a found item as `user`, optionally answering a lost report.
    pub async fn report_found_item(&self, user: &TestUser, lost_item: Option<ObjectId>) -> ObjectId {
        let lost_item = lost_item.map(|id| id.to_hex());
        let mut fields = vec![
            ("name", "Blue umbrella"),
            ("description", "left at the counter"),
            ("locationFound", "Ernakulam South station"),
            ("foundPersonPhone", "555-0199"),
        ];
        if let Some(lost_item) = &lost_item {
            fields.push(("lostItem", lost_item.as_str()));
        }
        let response = self
            .post_multipart(
                "/api/founditems",
                Some(&user.token),
                &fields,
                Some(("found.png", b"\x89PNG fake".as_slice())),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        object_id(&response.body["itemId"])
    }
}

fn build(
    method: Method,
    uri: &str,
    token: Option<&str>,
    content_type: Option<&str>,
    body: Body,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    #[allow(clippy::expect_used)]
    builder.body(body).expect("valid request")
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    build(
        method,
        uri,
        token,
        Some("application/json"),
        Body::from(body.to_string()),
    )
}

#[must_use]
pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, contents)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Read a JSON string value, panicking if it is anything else.
#[must_use]
pub fn string(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => panic!("expected string, got {value}"),
    }
}

/// Read a JSON object id value.
#[must_use]
pub fn object_id(value: &Value) -> ObjectId {
    match ObjectId::parse_str(&string(value)) {
        Ok(id) => id,
        Err(e) => panic!("{e}"),
    }
}

/// Assert an error response's status and `code`.
pub fn assert_error(response: &TestResponse, status: StatusCode, code: &str) {
    assert_eq!(response.status, status, "body: {:?}", response.body);
    assert_eq!(response.body["code"], code, "body: {:?}", response.body);
}
