//! Reading and updating user profiles.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::{PASSWORD, TestServer, assert_error};
use crate::types::ObjectId;

#[tokio::test]
async fn test_get_profile() {
    let server = TestServer::new();
    let asha = server.register("asha").await;
    let ravi = server.register("ravi").await;

    let response = server
        .get(&format!("/api/auth/user/{}", asha.id), Some(&ravi.token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "asha");
    assert_eq!(response.body["location"]["state"], "Kerala");
    assert!(response.body.get("passwordDigest").is_none());

    let missing = server
        .get(&format!("/api/auth/user/{}", ObjectId::new()), Some(&ravi.token))
        .await;
    assert_error(&missing, StatusCode::NOT_FOUND, "NOT_FOUND");
}

#[tokio::test]
async fn test_update_own_profile() {
    let server = TestServer::new();
    let asha = server.register("asha").await;

    let response = server
        .put_json(
            &format!("/api/auth/user/{}", asha.id),
            Some(&asha.token),
            &json!({"email": " Asha.New@Example.com", "district": "Kozhikode"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Profile updated successfully");
    assert_eq!(response.body["user"]["email"], "asha.new@example.com");
    assert_eq!(response.body["user"]["location"]["district"], "Kozhikode");
    assert_eq!(response.body["user"]["location"]["state"], "Kerala");
    assert_eq!(response.body["user"]["username"], "asha");

    // The new email logs in; the old one no longer does.
    let login = server
        .post_json(
            "/api/auth/login",
            None,
            &json!({"email": "asha.new@example.com", "password": PASSWORD}),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let old = server
        .post_json(
            "/api/auth/login",
            None,
            &json!({"email": asha.email, "password": PASSWORD}),
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_to_taken_email_conflicts() {
    let server = TestServer::new();
    let asha = server.register("asha").await;
    let ravi = server.register("ravi").await;

    let response = server
        .put_json(
            &format!("/api/auth/user/{}", asha.id),
            Some(&asha.token),
            &json!({"email": ravi.email}),
        )
        .await;
    assert_error(&response, StatusCode::CONFLICT, "CONFLICT");

    let stored = server.database.find_user(&asha.id).unwrap().unwrap();
    assert_eq!(stored.email, asha.email);
}
