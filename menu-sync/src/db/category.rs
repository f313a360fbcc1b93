//! Menu category database operations

use shared::models::MenuCategory;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::SyncResult;

#[derive(sqlx::FromRow)]
struct Row {
    id: Uuid,
    name: String,
    description: Option<String>,
    display_order: i32,
    is_active: bool,
}

impl Row {
    fn into_model(self) -> (Uuid, MenuCategory) {
        (
            self.id,
            MenuCategory {
                name: self.name,
                description: self.description,
                display_order: self.display_order,
                is_active: self.is_active,
            },
        )
    }
}

/// Categories of a restaurant ordered by (display_order, name)
pub async fn list_for_restaurant(
    conn: &mut PgConnection,
    restaurant_id: Uuid,
) -> SyncResult<Vec<(Uuid, MenuCategory)>> {
    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT id, name, description, display_order, is_active
        FROM menu_categories
        WHERE restaurant_id = $1
        ORDER BY display_order, name
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(Row::into_model).collect())
}

pub async fn find_by_name(
    conn: &mut PgConnection,
    restaurant_id: Uuid,
    name: &str,
) -> SyncResult<Option<(Uuid, MenuCategory)>> {
    let row: Option<Row> = sqlx::query_as(
        r#"
        SELECT id, name, description, display_order, is_active
        FROM menu_categories
        WHERE restaurant_id = $1 AND name = $2
        "#,
    )
    .bind(restaurant_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(Row::into_model))
}

pub async fn insert(
    conn: &mut PgConnection,
    restaurant_id: Uuid,
    c: &MenuCategory,
) -> SyncResult<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO menu_categories (restaurant_id, name, description, display_order, is_active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(restaurant_id)
    .bind(&c.name)
    .bind(&c.description)
    .bind(c.display_order)
    .bind(c.is_active)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn update(conn: &mut PgConnection, id: Uuid, c: &MenuCategory) -> SyncResult<()> {
    sqlx::query(
        r#"
        UPDATE menu_categories SET
            description = $2, display_order = $3, is_active = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&c.description)
    .bind(c.display_order)
    .bind(c.is_active)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
