//! Signup, login and the request authentication filter.

use axum::http::StatusCode;
use serde_json::json;

use crate::auth::{SigningKey, TOKEN_LIFETIME_SECS, TokenCodec};
use crate::e2e_tests::helpers::{PASSWORD, TestServer, assert_error, object_id, string};

#[tokio::test]
async fn test_signup_then_login() {
    let server = TestServer::new();

    let signup = server
        .post_json(
            "/api/auth/signup",
            None,
            &json!({
                "username": "asha",
                "email": "  Asha@Example.com ",
                "password": PASSWORD,
                "location": {"district": "Thrissur", "state": "Kerala"},
            }),
        )
        .await;
    assert_eq!(signup.status, StatusCode::CREATED);
    assert_eq!(signup.body["message"], "Registration successful");
    assert_eq!(signup.body["user"]["email"], "asha@example.com");
    assert_eq!(signup.body["user"]["location"]["district"], "Thrissur");
    assert!(signup.body["user"].get("passwordDigest").is_none());
    assert!(!signup.body.to_string().contains(PASSWORD));

    let login = server
        .post_json(
            "/api/auth/login",
            None,
            &json!({"email": "ASHA@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["message"], "Login successful");
    assert_eq!(login.body["user"]["id"], signup.body["user"]["id"]);
    assert!(!string(&login.body["token"]).is_empty());
}

#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
    let server = TestServer::new();
    server.register("asha").await;

    let response = server
        .post_json(
            "/api/auth/signup",
            None,
            &json!({"username": "other", "email": "ASHA@example.com", "password": "pw"}),
        )
        .await;
    assert_error(&response, StatusCode::CONFLICT, "CONFLICT");
    assert_eq!(response.body["error"], "Email already registered");
}

#[tokio::test]
async fn test_signup_requires_email_and_password() {
    let server = TestServer::new();

    let response = server
        .post_json("/api/auth/signup", None, &json!({"email": "a@example.com"}))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "BAD_REQUEST");

    let response = server
        .post_json("/api/auth/signup", None, &json!({"password": "pw"}))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = TestServer::new();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = server.send(request).await;
    assert_error(&response, StatusCode::BAD_REQUEST, "BAD_REQUEST");
    assert_eq!(response.body["error"], "Invalid input");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let server = TestServer::new();
    let user = server.register("asha").await;

    let wrong_password = server
        .post_json(
            "/api/auth/login",
            None,
            &json!({"email": user.email, "password": "wrong"}),
        )
        .await;
    let unknown_email = server
        .post_json(
            "/api/auth/login",
            None,
            &json!({"email": "nobody@example.com", "password": PASSWORD}),
        )
        .await;

    assert_error(&wrong_password, StatusCode::UNAUTHORIZED, "UNAUTHORIZED");
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.status, unknown_email.status);
    assert_eq!(wrong_password.body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_check_session() {
    let server = TestServer::new();
    let user = server.register("asha").await;

    let response = server
        .get("/api/auth/check-session", Some(&user.token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Session valid");
    assert_eq!(object_id(&response.body["user"]["id"]), user.id);
}

#[tokio::test]
async fn test_missing_or_invalid_token_is_rejected() {
    let server = TestServer::new();

    let missing = server.get("/api/auth/check-session", None).await;
    assert_error(&missing, StatusCode::UNAUTHORIZED, "UNAUTHORIZED");
    assert_eq!(missing.body["error"], "Authorization header required");

    let garbage = server
        .get("/api/auth/check-session", Some("not.a.token"))
        .await;
    assert_error(&garbage, StatusCode::UNAUTHORIZED, "UNAUTHORIZED");
    assert_eq!(garbage.body["error"], "Invalid token");

    let protected = server.get("/api/lostitems", None).await;
    assert_eq!(protected.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_without_bearer_prefix_is_accepted() {
    let server = TestServer::new();
    let user = server.register("asha").await;

    let request = axum::http::Request::builder()
        .uri("/api/auth/check-session")
        .header("authorization", user.token.as_str())
        .body(axum::body::Body::empty())
        .unwrap();
    let response = server.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_from_another_secret_is_rejected() {
    let server = TestServer::new();
    let user = server.register("asha").await;

    let foreign = TokenCodec::new(&SigningKey::new_hs256("some-other-secret").unwrap());
    let token = foreign.issue(&user.id).unwrap();

    let response = server.get("/api/auth/check-session", Some(&token)).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_expires_after_lifetime() {
    let server = TestServer::new();
    let user = server.register("asha").await;

    server.clock.advance((TOKEN_LIFETIME_SECS - 1) * 1000);
    let still_valid = server
        .get("/api/auth/check-session", Some(&user.token))
        .await;
    assert_eq!(still_valid.status, StatusCode::OK);

    server.clock.advance(1000);
    let expired = server
        .get("/api/auth/check-session", Some(&user.token))
        .await;
    assert_error(&expired, StatusCode::UNAUTHORIZED, "UNAUTHORIZED");
    assert_eq!(expired.body["error"], "Invalid token");
}
