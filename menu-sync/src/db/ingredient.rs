//! Ingredient catalog database operations
//!
//! Ingredients are global: the natural key is the name alone.

use serde_json::Value;
use shared::models::Ingredient;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode_json_or_default, encode_json};
use crate::error::SyncResult;

#[derive(sqlx::FromRow)]
struct Row {
    id: Uuid,
    name: String,
    category: Option<String>,
    allergen_info: Option<Value>,
    nutritional_info: Option<Value>,
    is_active: bool,
}

impl Row {
    fn into_model(self) -> SyncResult<(Uuid, Ingredient)> {
        let name = self.name;
        let allergen_info =
            decode_json_or_default(self.allergen_info, || format!("ingredient '{name}' allergen_info"))?;
        Ok((
            self.id,
            Ingredient {
                name,
                category: self.category,
                allergen_info,
                nutritional_info: self.nutritional_info.filter(|v| !v.is_null()),
                is_active: self.is_active,
            },
        ))
    }
}

pub async fn find_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> SyncResult<Option<(Uuid, Ingredient)>> {
    let row: Option<Row> = sqlx::query_as(
        r#"
        SELECT id, name, category, allergen_info, nutritional_info, is_active
        FROM ingredients
        WHERE name = $1
        "#,
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(Row::into_model).transpose()
}

/// Ingredients with the given names, ordered by name
pub async fn find_by_names(
    conn: &mut PgConnection,
    names: &[String],
    include_inactive: bool,
) -> SyncResult<Vec<(Uuid, Ingredient)>> {
    if names.is_empty() {
        return Ok(vec![]);
    }
    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT id, name, category, allergen_info, nutritional_info, is_active
        FROM ingredients
        WHERE name = ANY($1) AND (is_active OR $2)
        ORDER BY name
        "#,
    )
    .bind(names)
    .bind(include_inactive)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(Row::into_model).collect()
}

pub async fn insert(conn: &mut PgConnection, i: &Ingredient) -> SyncResult<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO ingredients (name, category, allergen_info, nutritional_info, is_active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&i.name)
    .bind(&i.category)
    .bind(encode_json(Some(&i.allergen_info))?)
    .bind(&i.nutritional_info)
    .bind(i.is_active)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn update(conn: &mut PgConnection, id: Uuid, i: &Ingredient) -> SyncResult<()> {
    sqlx::query(
        r#"
        UPDATE ingredients SET
            category = $2, allergen_info = $3, nutritional_info = $4, is_active = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&i.category)
    .bind(encode_json(Some(&i.allergen_info))?)
    .bind(&i.nutritional_info)
    .bind(i.is_active)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
