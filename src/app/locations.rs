use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::RADIUS_RESULT_LIMIT;
use crate::domain::geo::GeoPoint;
use crate::domain::location::Location;
use crate::infra::db::Db;

const LOCATION_COLUMNS: &str = "id, description, ST_AsEWKT(geom) AS geom, user_id";

#[derive(Clone)]
pub struct LocationService {
    db: Db,
}

impl LocationService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        description: String,
        point: GeoPoint,
    ) -> Result<Location> {
        let row = sqlx::query(&format!(
            "INSERT INTO locations (description, geom, user_id) \
             VALUES ($1, ST_GeomFromEWKT($2), $3) \
             RETURNING {}",
            LOCATION_COLUMNS
        ))
        .bind(description)
        .bind(point.ewkt())
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        location_from_row(&row)
    }

    pub async fn get(&self, location_id: Uuid) -> Result<Option<Location>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM locations WHERE id = $1",
            LOCATION_COLUMNS
        ))
        .bind(location_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(location_from_row).transpose()
    }

    /// Owner-scoped update; returns None for a missing row or a
    /// non-owner caller.
    pub async fn update(
        &self,
        location_id: Uuid,
        user_id: Uuid,
        description: Option<String>,
        point: Option<GeoPoint>,
    ) -> Result<Option<Location>> {
        let row = sqlx::query(&format!(
            "UPDATE locations \
             SET description = COALESCE($3, description), \
                 geom = COALESCE(ST_GeomFromEWKT($4), geom) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            LOCATION_COLUMNS
        ))
        .bind(location_id)
        .bind(user_id)
        .bind(description)
        .bind(point.map(|p| p.ewkt()))
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(location_from_row).transpose()
    }

    pub async fn delete(&self, location_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1 AND user_id = $2")
            .bind(location_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All locations within `radius_meters` of `center`, geodesic distance,
    /// boundary inclusive. Capped at RADIUS_RESULT_LIMIT rows.
    pub async fn within_radius(&self, center: GeoPoint, radius_meters: f64) -> Result<Vec<Location>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM locations \
             WHERE ST_DWithin(geom::geography, ST_GeomFromEWKT($1)::geography, $2) \
             LIMIT $3",
            LOCATION_COLUMNS
        ))
        .bind(center.ewkt())
        .bind(radius_meters)
        .bind(RADIUS_RESULT_LIMIT)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(location_from_row).collect()
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Location>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM locations WHERE user_id = $1 ORDER BY description",
            LOCATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(location_from_row).collect()
    }
}

fn location_from_row(row: &PgRow) -> Result<Location> {
    let geom: String = row.get("geom");
    Ok(Location {
        id: row.get("id"),
        description: row.get("description"),
        point: GeoPoint::parse_ewkt(&geom)?,
        user_id: row.get("user_id"),
    })
}
