use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::app::RADIUS_RESULT_LIMIT;
use crate::domain::geo::GeoPoint;
use crate::domain::post::Post;
use crate::infra::db::Db;

const POST_COLUMNS: &str =
    "id, content, description, ST_AsEWKT(geom) AS geom, user_id, date_posted";

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        content: String,
        description: String,
        point: GeoPoint,
    ) -> Result<Post> {
        let row = sqlx::query(&format!(
            "INSERT INTO posts (content, description, geom, user_id) \
             VALUES ($1, $2, ST_GeomFromEWKT($3), $4) \
             RETURNING {}",
            POST_COLUMNS
        ))
        .bind(content)
        .bind(description)
        .bind(point.ewkt())
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await?;

        post_from_row(&row)
    }

    pub async fn get(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS))
            .bind(post_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    /// Owner-scoped update; returns None for a missing row or a
    /// non-owner caller.
    pub async fn update(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: Option<String>,
        description: Option<String>,
        point: Option<GeoPoint>,
    ) -> Result<Option<Post>> {
        let row = sqlx::query(&format!(
            "UPDATE posts \
             SET content = COALESCE($3, content), \
                 description = COALESCE($4, description), \
                 geom = COALESCE(ST_GeomFromEWKT($5), geom) \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {}",
            POST_COLUMNS
        ))
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .bind(description)
        .bind(point.map(|p| p.ewkt()))
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    pub async fn delete(&self, post_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All entries within `radius_meters` of `center`, geodesic distance,
    /// boundary inclusive. Capped at RADIUS_RESULT_LIMIT rows.
    pub async fn within_radius(&self, center: GeoPoint, radius_meters: f64) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts \
             WHERE ST_DWithin(geom::geography, ST_GeomFromEWKT($1)::geography, $2) \
             LIMIT $3",
            POST_COLUMNS
        ))
        .bind(center.ewkt())
        .bind(radius_meters)
        .bind(RADIUS_RESULT_LIMIT)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    /// Entries stored with exactly this geometry (no distance tolerance).
    pub async fn at_point(&self, point: GeoPoint) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE geom = ST_GeomFromEWKT($1) LIMIT $2",
            POST_COLUMNS
        ))
        .bind(point.ewkt())
        .bind(RADIUS_RESULT_LIMIT)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    /// Public listing, newest first.
    pub async fn list_all(&self, limit: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts ORDER BY date_posted DESC, id DESC LIMIT $1",
            POST_COLUMNS
        ))
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE user_id = $1 ORDER BY date_posted DESC, id DESC",
            POST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(post_from_row).collect()
    }
}

fn post_from_row(row: &PgRow) -> Result<Post> {
    let geom: String = row.get("geom");
    Ok(Post {
        id: row.get("id"),
        content: row.get("content"),
        description: row.get("description"),
        point: GeoPoint::parse_ewkt(&geom)?,
        user_id: row.get("user_id"),
        date_posted: row.get("date_posted"),
    })
}
