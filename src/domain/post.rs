use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::geo::GeoPoint;

/// A geotagged diary entry. Same wire shape as `Location` plus the entry
/// text and server-assigned timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub content: String,
    pub description: String,
    #[serde(rename = "location")]
    pub point: GeoPoint,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub date_posted: OffsetDateTime,
}
