//! Location CRUD and radius-query tests.
//!
//! Radius behavior: geodesic distance, boundary inclusive, capped at 100
//! rows. Each test works in its own patch of the map so searches don't
//! pick up rows from other tests.

mod common;

use axum::http::StatusCode;
use common::{app, haversine_meters};
use serde_json::json;
use uuid::Uuid;

// ===========================================================================
// Radius search
// ===========================================================================

#[tokio::test]
async fn store_and_find_brandenburger_tor() {
    let app = app().await;
    let user = app.create_user("loc_tor").await;

    let resp = app
        .post_json(
            "/v1/locations",
            json!({
                "description": "Brandenburger Tor",
                "lat": 52.516247,
                "lng": 13.377711
            }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let created = resp.json();
    assert_eq!(created["description"].as_str().unwrap(), "Brandenburger Tor");

    // ~6 m away, 200 m radius
    let resp = app
        .get("/v1/locations/nearby?lat=52.5163&lng=13.3777&radius=200", None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();

    let found = items
        .iter()
        .find(|item| item["id"] == created["id"])
        .expect("stored location missing from radius search");
    assert!((found["location"]["lat"].as_f64().unwrap() - 52.516247).abs() < 1e-6);
    assert!((found["location"]["lng"].as_f64().unwrap() - 13.377711).abs() < 1e-6);
}

#[tokio::test]
async fn radius_search_far_away_is_empty() {
    let app = app().await;
    let user = app.create_user("loc_far").await;
    app.create_location(user.id, "Brandenburger Tor", 52.516247, 13.377711)
        .await;

    // ~50 km west of the stored point, 100 m radius
    let resp = app
        .get("/v1/locations/nearby?lat=52.5163&lng=12.64&radius=100", None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json()["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn radius_boundary_is_inclusive() {
    let app = app().await;
    let user = app.create_user("loc_boundary").await;
    // Isolated area in the South Atlantic
    let center = (-35.0, -10.0);
    let id = app
        .create_location(user.id, "boundary point", -35.0, -10.005)
        .await;

    // Ask PostGIS for the exact geodesic distance, then search with that
    // radius: "within" semantics must include the boundary point.
    let exact: f64 = sqlx::query_scalar(
        "SELECT ST_Distance(geom::geography, ST_GeomFromEWKT($1)::geography) \
         FROM locations WHERE id = $2",
    )
    .bind(format!("SRID=4326;POINT({} {})", center.1, center.0))
    .bind(id)
    .fetch_one(app.pool())
    .await
    .expect("distance query failed");

    let resp = app
        .get(
            &format!(
                "/v1/locations/nearby?lat={}&lng={}&radius={}",
                center.0, center.1, exact
            ),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();
    assert!(items.iter().any(|item| item["id"] == json!(id.to_string())));
}

#[tokio::test]
async fn radius_search_has_no_false_positives() {
    let app = app().await;
    let user = app.create_user("loc_scatter").await;
    // Isolated area near (10, 10); ~1100 m per 0.01 degree of latitude
    let center = (10.0, 10.0);
    app.create_location(user.id, "inside a", 10.001, 10.0).await;
    app.create_location(user.id, "inside b", 10.0, 10.003).await;
    app.create_location(user.id, "outside a", 10.02, 10.0).await;
    app.create_location(user.id, "outside b", 10.0, 10.03).await;

    let radius = 500.0;
    let resp = app
        .get(
            &format!(
                "/v1/locations/nearby?lat={}&lng={}&radius={}",
                center.0, center.1, radius
            ),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 2);

    for item in &items {
        let lat = item["location"]["lat"].as_f64().unwrap();
        let lng = item["location"]["lng"].as_f64().unwrap();
        let distance = haversine_meters(center.0, center.1, lat, lng);
        // Haversine vs. ellipsoidal distance differ well under 1%.
        assert!(
            distance <= radius * 1.01,
            "false positive at {} m for radius {} m",
            distance,
            radius
        );
    }
}

#[tokio::test]
async fn radius_results_are_capped_at_100() {
    let app = app().await;
    let user = app.create_user("loc_cap").await;
    // Tight cluster in an isolated area near (-50, 100)
    for i in 0..105 {
        let jitter = (i as f64) * 1e-6;
        app.create_location(user.id, &format!("cluster {}", i), -50.0 + jitter, 100.0)
            .await;
    }

    let resp = app
        .get("/v1/locations/nearby?lat=-50.0&lng=100.0&radius=5000", None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["items"].as_array().unwrap().len(), 100);
}

#[tokio::test]
async fn radius_search_rejects_bad_input() {
    let app = app().await;

    let resp = app
        .get("/v1/locations/nearby?lat=120.0&lng=10.0&radius=100", None)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .get("/v1/locations/nearby?lat=10.0&lng=10.0&radius=-5", None)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// CRUD and ownership
// ===========================================================================

#[tokio::test]
async fn create_location_requires_auth() {
    let app = app().await;

    let resp = app
        .post_json(
            "/v1/locations",
            json!({ "description": "nope", "lat": 1.0, "lng": 1.0 }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_location_validates_description() {
    let app = app().await;
    let user = app.create_user("loc_desc").await;

    let resp = app
        .post_json(
            "/v1/locations",
            json!({ "description": "", "lat": 1.0, "lng": 1.0 }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post_json(
            "/v1/locations",
            json!({ "description": "x".repeat(81), "lat": 1.0, "lng": 1.0 }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "description must be 1 to 80 characters");
}

#[tokio::test]
async fn create_location_rejects_out_of_range_point() {
    let app = app().await;
    let user = app.create_user("loc_range").await;

    let resp = app
        .post_json(
            "/v1/locations",
            json!({ "description": "off the map", "lat": 91.0, "lng": 0.0 }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post_json(
            "/v1/locations",
            json!({ "description": "off the map", "lat": 0.0, "lng": -180.5 }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_location() {
    let app = app().await;
    let user = app.create_user("loc_get").await;
    let id = app.create_location(user.id, "somewhere", 20.0, 20.0).await;

    let resp = app.get(&format!("/v1/locations/{}", id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["description"].as_str().unwrap(), "somewhere");
    assert!((body["location"]["lat"].as_f64().unwrap() - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn get_nonexistent_location() {
    let app = app().await;

    let resp = app
        .get(&format!("/v1/locations/{}", Uuid::new_v4()), None)
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "location not found");
}

#[tokio::test]
async fn update_location() {
    let app = app().await;
    let user = app.create_user("loc_update").await;
    let id = app.create_location(user.id, "old name", 21.0, 21.0).await;

    let resp = app
        .patch_json(
            &format!("/v1/locations/{}", id),
            json!({ "description": "new name", "lat": 21.5, "lng": 21.5 }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["description"].as_str().unwrap(), "new name");
    assert!((body["location"]["lat"].as_f64().unwrap() - 21.5).abs() < 1e-9);
}

#[tokio::test]
async fn update_location_wrong_user() {
    let app = app().await;
    let owner = app.create_user("loc_upd_owner").await;
    let other = app.create_user("loc_upd_other").await;
    let id = app.create_location(owner.id, "mine", 22.0, 22.0).await;

    let resp = app
        .patch_json(
            &format!("/v1/locations/{}", id),
            json!({ "description": "hijacked" }),
            Some(&other.access_token),
        )
        .await;
    // Ownership enforced — returns 404 (not 403) to avoid leaking existence
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.get(&format!("/v1/locations/{}", id), None).await;
    assert_eq!(resp.json()["description"].as_str().unwrap(), "mine");
}

#[tokio::test]
async fn update_location_requires_paired_coordinates() {
    let app = app().await;
    let user = app.create_user("loc_pair").await;
    let id = app.create_location(user.id, "paired", 23.0, 23.0).await;

    let resp = app
        .patch_json(
            &format!("/v1/locations/{}", id),
            json!({ "lat": 24.0 }),
            Some(&user.access_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "lat and lng must be given together");
}

#[tokio::test]
async fn delete_location() {
    let app = app().await;
    let user = app.create_user("loc_delete").await;
    let id = app.create_location(user.id, "doomed", 25.0, 25.0).await;

    let resp = app
        .delete(&format!("/v1/locations/{}", id), Some(&user.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/v1/locations/{}", id), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_location_wrong_user() {
    let app = app().await;
    let owner = app.create_user("loc_del_owner").await;
    let other = app.create_user("loc_del_other").await;
    let id = app.create_location(owner.id, "still mine", 26.0, 26.0).await;

    let resp = app
        .delete(&format!("/v1/locations/{}", id), Some(&other.access_token))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.get(&format!("/v1/locations/{}", id), None).await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn list_user_locations_ordered_by_description() {
    let app = app().await;
    let user = app.create_user("loc_list").await;
    app.create_location(user.id, "b second", 27.0, 27.0).await;
    app.create_location(user.id, "a first", 27.1, 27.1).await;

    let resp = app
        .get(&format!("/v1/users/{}/locations", user.id), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let items = resp.json()["items"].as_array().unwrap().clone();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["description"].as_str().unwrap(), "a first");
    assert_eq!(items[1]["description"].as_str().unwrap(), "b second");
}
