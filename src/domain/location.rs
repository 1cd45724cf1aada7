use serde::Serialize;
use uuid::Uuid;

use crate::domain::geo::GeoPoint;

/// A discoverable point of interest. The wire shape nests the coordinates
/// under `location`, matching the original API:
/// `{id, description, location: {lat, lng}}`.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub id: Uuid,
    pub description: String,
    #[serde(rename = "location")]
    pub point: GeoPoint,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
}
