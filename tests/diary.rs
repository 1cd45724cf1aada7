//! Diary flow tests: draft in the session store, publish with a location,
//! area search with session-scoped browse results.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;

// ===========================================================================
// Draft and publish
// ===========================================================================

#[tokio::test]
async fn draft_then_publish_creates_location_and_post() {
    let app = app().await;
    let user = app.create_user("diary_flow").await;
    let session = "diary-flow-session";

    let resp = app
        .post_json_session(
            "/v1/diary/draft",
            json!({ "content": "Walked across the square at sunset" }),
            Some(&user.access_token),
            session,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["session_id"].as_str().unwrap(), session);

    let resp = app
        .post_json_session(
            "/v1/diary/publish",
            json!({ "description": "Alexanderplatz", "lat": 52.521918, "lng": 13.413215 }),
            Some(&user.access_token),
            session,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();

    // Location and post share the point; the post carries the draft text
    assert_eq!(body["location"]["description"].as_str().unwrap(), "Alexanderplatz");
    assert_eq!(
        body["post"]["content"].as_str().unwrap(),
        "Walked across the square at sunset"
    );
    assert_eq!(body["location"]["location"], body["post"]["location"]);
    assert!((body["post"]["location"]["lat"].as_f64().unwrap() - 52.521918).abs() < 1e-6);

    // Both rows are retrievable
    let location_id = body["location"]["id"].as_str().unwrap();
    let post_id = body["post"]["id"].as_str().unwrap();
    let resp = app.get(&format!("/v1/locations/{}", location_id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let resp = app.get(&format!("/v1/posts/{}", post_id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn publish_consumes_the_draft() {
    let app = app().await;
    let user = app.create_user("diary_consume").await;
    let session = "diary-consume-session";

    app.post_json_session(
        "/v1/diary/draft",
        json!({ "content": "only published once" }),
        Some(&user.access_token),
        session,
    )
    .await;

    let resp = app
        .post_json_session(
            "/v1/diary/publish",
            json!({ "description": "first", "lat": 41.0, "lng": 41.0 }),
            Some(&user.access_token),
            session,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .post_json_session(
            "/v1/diary/publish",
            json!({ "description": "second", "lat": 41.0, "lng": 41.0 }),
            Some(&user.access_token),
            session,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "no draft entry to publish");
}

#[tokio::test]
async fn draft_validates_length() {
    let app = app().await;
    let user = app.create_user("diary_len").await;

    let resp = app
        .post_json_session(
            "/v1/diary/draft",
            json!({ "content": "x" }),
            Some(&user.access_token),
            "diary-len-session",
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "your entry is too short");

    let resp = app
        .post_json_session(
            "/v1/diary/draft",
            json!({ "content": "y".repeat(241) }),
            Some(&user.access_token),
            "diary-len-session",
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "your entry is too long");
}

#[tokio::test]
async fn draft_requires_auth() {
    let app = app().await;

    let resp = app
        .post_json_session(
            "/v1/diary/draft",
            json!({ "content": "anonymous diary" }),
            None,
            "diary-anon-session",
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn publish_without_draft() {
    let app = app().await;
    let user = app.create_user("diary_nodraft").await;

    let resp = app
        .post_json_session(
            "/v1/diary/publish",
            json!({ "description": "nowhere", "lat": 42.0, "lng": 42.0 }),
            Some(&user.access_token),
            "diary-nodraft-session",
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "no draft entry to publish");
}

#[tokio::test]
async fn draft_generates_session_id_when_missing() {
    let app = app().await;
    let user = app.create_user("diary_gensid").await;

    let resp = app
        .post_json(
            "/v1/diary/draft",
            json!({ "content": "who am I talking to" }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let session_id = resp.json()["session_id"].as_str().unwrap().to_string();
    assert!(!session_id.is_empty());

    // The generated id addresses the stored draft
    let resp = app
        .post_json_session(
            "/v1/diary/publish",
            json!({ "description": "found it", "lat": 43.0, "lng": 43.0 }),
            Some(&user.access_token),
            &session_id,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

// ===========================================================================
// Area search and browse
// ===========================================================================

#[tokio::test]
async fn area_search_results_are_browsable_per_session() {
    let app = app().await;
    let user = app.create_user("diary_area").await;
    // Isolated area near (60, 60)
    app.create_post(user.id, "in the area", 60.0005, 60.0).await;
    app.create_post(user.id, "out of the area", 60.5, 60.0).await;
    let session = "diary-area-session";

    let resp = app
        .post_json_session(
            "/v1/search/area",
            json!({ "lat": 60.0, "lng": 60.0, "radius": 300 }),
            None,
            session,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["content"].as_str().unwrap(), "in the area");

    // Browse returns the remembered result set
    let resp = app.get_session("/v1/search/results", session).await;
    assert_eq!(resp.status, StatusCode::OK);
    let browsed = resp.json()["items"].as_array().unwrap().clone();
    assert_eq!(browsed.len(), 1);
    assert_eq!(browsed[0]["content"].as_str().unwrap(), "in the area");

    // A different session has nothing stored
    let resp = app.get_session("/v1/search/results", "some-other-session").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json()["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn new_search_overwrites_previous_results() {
    let app = app().await;
    let user = app.create_user("diary_overwrite").await;
    // Two separate areas near (62, 62) and (63, 63)
    app.create_post(user.id, "first area entry", 62.0, 62.0).await;
    app.create_post(user.id, "second area entry", 63.0, 63.0).await;
    let session = "diary-overwrite-session";

    app.post_json_session(
        "/v1/search/area",
        json!({ "lat": 62.0, "lng": 62.0, "radius": 200 }),
        None,
        session,
    )
    .await;
    app.post_json_session(
        "/v1/search/area",
        json!({ "lat": 63.0, "lng": 63.0, "radius": 200 }),
        None,
        session,
    )
    .await;

    let resp = app.get_session("/v1/search/results", session).await;
    let items = resp.json()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["content"].as_str().unwrap(), "second area entry");
}
