use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::geo::GeoPoint;
use crate::domain::location::Location;
use crate::domain::post::Post;
use crate::infra::db::Db;

/// Publishing a diary entry creates the named location and the entry
/// itself at the same point. Both rows land in one transaction so a
/// failed post insert never leaves a dangling location.
#[derive(Clone)]
pub struct DiaryService {
    db: Db,
}

impl DiaryService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn publish(
        &self,
        user_id: Uuid,
        content: String,
        description: String,
        point: GeoPoint,
    ) -> Result<(Location, Post)> {
        let mut tx = self.db.pool().begin().await?;

        let location_row = sqlx::query(
            "INSERT INTO locations (description, geom, user_id) \
             VALUES ($1, ST_GeomFromEWKT($2), $3) \
             RETURNING id, description, ST_AsEWKT(geom) AS geom, user_id",
        )
        .bind(&description)
        .bind(point.ewkt())
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let post_row = sqlx::query(
            "INSERT INTO posts (content, description, geom, user_id) \
             VALUES ($1, $2, ST_GeomFromEWKT($3), $4) \
             RETURNING id, content, description, ST_AsEWKT(geom) AS geom, user_id, date_posted",
        )
        .bind(&content)
        .bind(&description)
        .bind(point.ewkt())
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let location = location_from_row(&location_row)?;
        let post = post_from_row(&post_row)?;
        Ok((location, post))
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
