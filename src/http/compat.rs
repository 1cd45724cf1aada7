//! Legacy `/api/*` surface kept wire-compatible with the first-generation
//! map frontend: query-string input, `{"success": ...}` envelopes, and a
//! single generic 500 for every failure.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::app::locations::LocationService;
use crate::domain::geo::GeoPoint;
use crate::AppState;

/// Every legacy failure collapses to this fixed envelope.
pub struct LegacyError;

impl IntoResponse for LegacyError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": 500,
                "message": "server error",
            })),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
pub struct StoreItemQuery {
    lat: Option<String>,
    lng: Option<String>,
    description: Option<String>,
    user_id: Option<String>,
}

pub async fn store_item(
    State(state): State<AppState>,
    Query(query): Query<StoreItemQuery>,
) -> Result<Json<serde_json::Value>, LegacyError> {
    let lat: f64 = parse_param(query.lat, "lat")?;
    let lng: f64 = parse_param(query.lng, "lng")?;
    let user_id: Uuid = parse_param(query.user_id, "user_id")?;
    let description = query.description.ok_or_else(|| {
        tracing::error!("store_item called without description");
        LegacyError
    })?;

    let service = LocationService::new(state.db.clone());
    let location = service
        .create(user_id, description, GeoPoint::new(lat, lng))
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "store_item failed");
            LegacyError
        })?;

    Ok(Json(json!({
        "success": true,
        "location": location,
    })))
}

#[derive(Deserialize)]
pub struct RadiusItemsQuery {
    lat: Option<String>,
    lng: Option<String>,
    radius: Option<String>,
}

pub async fn get_items_in_radius(
    State(state): State<AppState>,
    Query(query): Query<RadiusItemsQuery>,
) -> Result<Json<serde_json::Value>, LegacyError> {
    let lat: f64 = parse_param(query.lat, "lat")?;
    let lng: f64 = parse_param(query.lng, "lng")?;
    let radius: f64 = parse_param(query.radius, "radius")?;

    let service = LocationService::new(state.db.clone());
    let results = service
        .within_radius(GeoPoint::new(lat, lng), radius)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, "get_items_in_radius failed");
            LegacyError
        })?;

    Ok(Json(json!({
        "success": true,
        "results": results,
    })))
}

fn parse_param<T: std::str::FromStr>(value: Option<String>, name: &str) -> Result<T, LegacyError> {
    value
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| {
            tracing::error!(param = name, "missing or malformed legacy query param");
            LegacyError
        })
}
