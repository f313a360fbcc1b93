//! Restaurant database operations

use serde_json::Value;
use shared::models::{Restaurant, RestaurantSummary};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode_json, encode_json};
use crate::error::SyncResult;

#[derive(sqlx::FromRow)]
struct Row {
    id: Uuid,
    name: String,
    slug: String,
    cuisine_type: Option<String>,
    description: Option<String>,
    avatar_config: Option<Value>,
    theme_config: Option<Value>,
    ai_config: Option<Value>,
    contact_info: Option<Value>,
    settings: Option<Value>,
    is_active: bool,
}

impl Row {
    fn into_model(self) -> SyncResult<(Uuid, Restaurant)> {
        let slug = self.slug;
        let what = |field: &str| format!("restaurant '{slug}' {field}");
        let restaurant = Restaurant {
            avatar_config: decode_json(self.avatar_config, || what("avatar_config"))?,
            theme_config: decode_json(self.theme_config, || what("theme_config"))?,
            ai_config: decode_json(self.ai_config, || what("ai_config"))?,
            contact_info: self.contact_info.filter(|v| !v.is_null()),
            settings: self.settings.filter(|v| !v.is_null()),
            name: self.name,
            cuisine_type: self.cuisine_type,
            description: self.description,
            is_active: self.is_active,
            slug,
        };
        Ok((self.id, restaurant))
    }
}

const SELECT: &str = r#"
    SELECT id, name, slug, cuisine_type, description,
           avatar_config, theme_config, ai_config, contact_info, settings,
           is_active
    FROM restaurants
"#;

pub async fn find_by_slug(
    conn: &mut PgConnection,
    slug: &str,
) -> SyncResult<Option<(Uuid, Restaurant)>> {
    let row: Option<Row> = sqlx::query_as(&format!("{SELECT} WHERE slug = $1"))
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Row::into_model).transpose()
}

/// All restaurants ordered by name
pub async fn list(
    conn: &mut PgConnection,
    include_inactive: bool,
) -> SyncResult<Vec<(Uuid, Restaurant)>> {
    let rows: Vec<Row> = sqlx::query_as(&format!(
        "{SELECT} WHERE is_active OR $1 ORDER BY name, slug"
    ))
    .bind(include_inactive)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(Row::into_model).collect()
}

/// Lightweight listing without decoding the JSON columns
pub async fn list_summaries(
    conn: &mut PgConnection,
    include_inactive: bool,
) -> SyncResult<Vec<RestaurantSummary>> {
    let rows: Vec<(String, String, bool)> = sqlx::query_as(
        "SELECT slug, name, is_active FROM restaurants WHERE is_active OR $1 ORDER BY name, slug",
    )
    .bind(include_inactive)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(slug, name, is_active)| RestaurantSummary {
            slug,
            name,
            is_active,
        })
        .collect())
}

pub async fn insert(conn: &mut PgConnection, r: &Restaurant) -> SyncResult<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO restaurants (
            name, slug, cuisine_type, description,
            avatar_config, theme_config, ai_config, contact_info, settings,
            is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(&r.name)
    .bind(&r.slug)
    .bind(&r.cuisine_type)
    .bind(&r.description)
    .bind(encode_json(r.avatar_config.as_ref())?)
    .bind(encode_json(r.theme_config.as_ref())?)
    .bind(encode_json(r.ai_config.as_ref())?)
    .bind(&r.contact_info)
    .bind(&r.settings)
    .bind(r.is_active)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn update(conn: &mut PgConnection, id: Uuid, r: &Restaurant) -> SyncResult<()> {
    sqlx::query(
        r#"
        UPDATE restaurants SET
            name = $2, cuisine_type = $3, description = $4,
            avatar_config = $5, theme_config = $6, ai_config = $7,
            contact_info = $8, settings = $9, is_active = $10,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&r.name)
    .bind(&r.cuisine_type)
    .bind(&r.description)
    .bind(encode_json(r.avatar_config.as_ref())?)
    .bind(encode_json(r.theme_config.as_ref())?)
    .bind(encode_json(r.ai_config.as_ref())?)
    .bind(&r.contact_info)
    .bind(&r.settings)
    .bind(r.is_active)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
