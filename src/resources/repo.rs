use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateResourceRequest, UpdateResourceRequest};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub quantity: i32,
    pub location: String,
    pub minimum_threshold: i32,
    #[serde(serialize_with = "time::serde::rfc3339::serialize")]
    pub created_at: OffsetDateTime,
    #[serde(serialize_with = "time::serde::rfc3339::serialize")]
    pub updated_at: OffsetDateTime,
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Resource>> {
    let rows = sqlx::query_as::<_, Resource>(
        r#"
        SELECT id, name, category, quantity, location, minimum_threshold, created_at, updated_at
        FROM resources
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Resource>> {
    let row = sqlx::query_as::<_, Resource>(
        r#"
        SELECT id, name, category, quantity, location, minimum_threshold, created_at, updated_at
        FROM resources
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create(db: &PgPool, req: &CreateResourceRequest) -> anyhow::Result<Resource> {
    let row = sqlx::query_as::<_, Resource>(
        r#"
        INSERT INTO resources (id, name, category, quantity, location, minimum_threshold)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, category, quantity, location, minimum_threshold, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&req.name)
    .bind(&req.category)
    .bind(req.quantity)
    .bind(&req.location)
    .bind(req.minimum_threshold)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    req: &UpdateResourceRequest,
) -> anyhow::Result<Option<Resource>> {
    let row = sqlx::query_as::<_, Resource>(
        r#"
        UPDATE resources
        SET name = COALESCE($2, name),
            category = COALESCE($3, category),
            quantity = COALESCE($4, quantity),
            location = COALESCE($5, location),
            minimum_threshold = COALESCE($6, minimum_threshold),
            updated_at = now()
        WHERE id = $1
        RETURNING id, name, category, quantity, location, minimum_threshold, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(req.name.as_deref())
    .bind(req.category.as_deref())
    .bind(req.quantity)
    .bind(req.location.as_deref())
    .bind(req.minimum_threshold)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let rows = sqlx::query("DELETE FROM resources WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();
    Ok(rows > 0)
}

pub async fn low_stock(db: &PgPool) -> anyhow::Result<Vec<Resource>> {
    let rows = sqlx::query_as::<_, Resource>(
        r#"
        SELECT id, name, category, quantity, location, minimum_threshold, created_at, updated_at
        FROM resources
        WHERE quantity < minimum_threshold
        ORDER BY quantity
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}
