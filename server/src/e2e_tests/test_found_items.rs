//! Reporting found items and notifying the person who lost them.

use axum::http::StatusCode;
use serde_json::json;

use crate::e2e_tests::helpers::{TestServer, assert_error, object_id};
use crate::storage::FOUND_NOTIFICATION_MESSAGE;
use crate::types::ObjectId;

#[tokio::test]
async fn test_found_item_notifies_owner_of_lost_item() {
    let server = TestServer::new();
    let loser = server.register("loser").await;
    let finder = server.register("finder").await;
    let lost = server.report_lost_item(&loser, "Umbrella", "Misc").await;

    let found = server.report_found_item(&finder, Some(lost)).await;

    let stored = server.database.find_found_item(&found).unwrap().unwrap();
    assert_eq!(stored.lost_item, Some(lost));
    assert_eq!(stored.lost_person, Some(loser.id));
    assert_eq!(stored.found_person, finder.id);
    assert!(!stored.found);

    let session = server
        .get("/api/auth/check-session", Some(&loser.token))
        .await;
    let notifications = &session.body["user"]["notifications"];
    assert_eq!(notifications.as_array().map(Vec::len), Some(1));
    assert_eq!(notifications[0]["message"], FOUND_NOTIFICATION_MESSAGE);
    assert_eq!(notifications[0]["read"], false);

    // The finder is not notified.
    let session = server
        .get("/api/auth/check-session", Some(&finder.token))
        .await;
    assert_eq!(
        session.body["user"]["notifications"].as_array().map(Vec::len),
        Some(0)
    );
}

#[tokio::test]
async fn test_found_item_for_unknown_lost_item() {
    let server = TestServer::new();
    let finder = server.register("finder").await;
    let unknown = ObjectId::new().to_hex();

    let response = server
        .post_multipart(
            "/api/founditems",
            Some(&finder.token),
            &[("name", "Keys"), ("lostItem", unknown.as_str())],
            Some(("keys.png", b"png".as_slice())),
        )
        .await;
    assert_error(&response, StatusCode::NOT_FOUND, "NOT_FOUND");
    assert_eq!(server.upload_count(), 0);

    let response = server
        .post_multipart(
            "/api/founditems",
            Some(&finder.token),
            &[("name", "Keys"), ("lostItem", "bogus")],
            Some(("keys.png", b"png".as_slice())),
        )
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "INVALID_IDENTIFIER");
}

#[tokio::test]
async fn test_list_and_lookup_found_items() {
    let server = TestServer::new();
    let loser = server.register("loser").await;
    let finder = server.register("finder").await;
    let lost = server.report_lost_item(&loser, "Umbrella", "Misc").await;
    let answering = server.report_found_item(&finder, Some(lost)).await;
    server.report_found_item(&finder, None).await;

    let all = server.get("/api/founditems", Some(&loser.token)).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body.as_array().map(Vec::len), Some(2));

    let limited = server
        .get("/api/founditems?limit=1", Some(&loser.token))
        .await;
    assert_eq!(limited.body.as_array().map(Vec::len), Some(1));

    let one = server
        .get(&format!("/api/founditems/{answering}"), Some(&loser.token))
        .await;
    assert_eq!(one.status, StatusCode::OK);
    assert_eq!(one.body["foundByUser"]["username"], "finder");
    assert_eq!(one.body["lostPersonUser"]["username"], "loser");
    assert_eq!(one.body["lostItem"], lost.to_hex());

    let for_lost = server
        .get(&format!("/api/founditems/lostItem/{lost}"), Some(&loser.token))
        .await;
    let for_lost = for_lost.body.as_array().cloned().unwrap_or_default();
    assert_eq!(for_lost.len(), 1);
    assert_eq!(object_id(&for_lost[0]["id"]), answering);

    let by_finder = server
        .get(
            &format!("/api/founditems/foundPerson/{}", finder.id),
            Some(&loser.token),
        )
        .await;
    assert_eq!(by_finder.body.as_array().map(Vec::len), Some(2));

    let missing = server
        .get(&format!("/api/founditems/{}", ObjectId::new()), Some(&loser.token))
        .await;
    assert_error(&missing, StatusCode::NOT_FOUND, "NOT_FOUND");
}

#[tokio::test]
async fn test_finder_updates_and_deletes() {
    let server = TestServer::new();
    let finder = server.register("finder").await;
    let item = server.report_found_item(&finder, None).await;
    let uri = format!("/api/founditems/{item}");

    let update = server
        .put_json(
            &uri,
            Some(&finder.token),
            &json!({"description": "navy blue, wooden handle"}),
        )
        .await;
    assert_eq!(update.status, StatusCode::OK);
    assert_eq!(update.body["message"], "Item updated successfully");
    let stored = server.database.find_found_item(&item).unwrap().unwrap();
    assert_eq!(stored.description, "navy blue, wooden handle");
    assert_eq!(stored.name, "Blue umbrella");

    let status = server
        .put_json(
            &format!("{uri}/found"),
            Some(&finder.token),
            &json!({"found": true}),
        )
        .await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["found"], true);
    assert!(server.database.find_found_item(&item).unwrap().unwrap().found);

    let bad_status = server
        .put_json(
            &format!("{uri}/found"),
            Some(&finder.token),
            &json!({"found": "yes"}),
        )
        .await;
    assert_error(&bad_status, StatusCode::BAD_REQUEST, "BAD_REQUEST");

    let deleted = server.delete(&uri, Some(&finder.token)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["itemId"], item.to_hex());
    assert!(server.database.find_found_item(&item).unwrap().is_none());
}
