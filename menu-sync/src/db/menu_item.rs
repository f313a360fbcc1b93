//! Menu item and item↔ingredient database operations

use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{ItemIngredient, MenuItem};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode_json_or_default, encode_json};
use crate::error::SyncResult;

/// Stored item with its surrogate ids
#[derive(Debug, Clone)]
pub struct ItemRecord {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    /// `ingredients` is left empty; callers attach the associations they keep
    pub item: MenuItem,
}

/// One join row, with the ingredient's active flag for export filtering
#[derive(Debug, Clone)]
pub struct Association {
    pub menu_item_id: Uuid,
    pub ingredient_active: bool,
    pub link: ItemIngredient,
}

#[derive(sqlx::FromRow)]
struct Row {
    id: Uuid,
    category_id: Option<Uuid>,
    category_name: Option<String>,
    name: String,
    description: Option<String>,
    price: Decimal,
    image_url: Option<String>,
    is_available: bool,
    is_signature: bool,
    spice_level: i32,
    preparation_time: Option<i32>,
    nutritional_info: Option<Value>,
    allergen_info: Option<Value>,
    tags: Option<Value>,
    display_order: i32,
}

impl Row {
    fn into_record(self) -> SyncResult<ItemRecord> {
        let name = self.name;
        let allergen_info =
            decode_json_or_default(self.allergen_info, || format!("menu item '{name}' allergen_info"))?;
        let tags = decode_json_or_default(self.tags, || format!("menu item '{name}' tags"))?;
        Ok(ItemRecord {
            id: self.id,
            category_id: self.category_id,
            item: MenuItem {
                name,
                description: self.description,
                price: self.price,
                image_url: self.image_url,
                is_available: self.is_available,
                is_signature: self.is_signature,
                spice_level: self.spice_level,
                preparation_time: self.preparation_time,
                nutritional_info: self.nutritional_info.filter(|v| !v.is_null()),
                allergen_info,
                tags,
                display_order: self.display_order,
                category_name: self.category_name,
                ingredients: vec![],
            },
        })
    }
}

const SELECT: &str = r#"
    SELECT m.id, m.category_id, c.name AS category_name,
           m.name, m.description, m.price, m.image_url,
           m.is_available, m.is_signature, m.spice_level, m.preparation_time,
           m.nutritional_info, m.allergen_info, m.tags, m.display_order
    FROM menu_items m
    LEFT JOIN menu_categories c ON c.id = m.category_id
"#;

/// Items of a restaurant ordered by (display_order, name)
pub async fn list_for_restaurant(
    conn: &mut PgConnection,
    restaurant_id: Uuid,
) -> SyncResult<Vec<ItemRecord>> {
    let rows: Vec<Row> = sqlx::query_as(&format!(
        "{SELECT} WHERE m.restaurant_id = $1 ORDER BY m.display_order, m.name"
    ))
    .bind(restaurant_id)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(Row::into_record).collect()
}

/// Look up an item by name, with its category name and every association
pub async fn find_by_name(
    conn: &mut PgConnection,
    restaurant_id: Uuid,
    name: &str,
) -> SyncResult<Option<(Uuid, MenuItem)>> {
    let row: Option<Row> = sqlx::query_as(&format!(
        "{SELECT} WHERE m.restaurant_id = $1 AND m.name = $2"
    ))
    .bind(restaurant_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let mut record = row.into_record()?;
    record.item.ingredients = associations(conn, &[record.id])
        .await?
        .into_iter()
        .map(|a| a.link)
        .collect();
    Ok(Some((record.id, record.item)))
}

/// Join rows for the given items, ordered by item then ingredient name
pub async fn associations(
    conn: &mut PgConnection,
    item_ids: &[Uuid],
) -> SyncResult<Vec<Association>> {
    if item_ids.is_empty() {
        return Ok(vec![]);
    }

    #[derive(sqlx::FromRow)]
    struct LinkRow {
        menu_item_id: Uuid,
        ingredient_name: String,
        ingredient_active: bool,
        quantity: Option<String>,
        unit: Option<String>,
        is_optional: bool,
        is_primary: bool,
    }

    let rows: Vec<LinkRow> = sqlx::query_as(
        r#"
        SELECT mi.menu_item_id, i.name AS ingredient_name, i.is_active AS ingredient_active,
               mi.quantity, mi.unit, mi.is_optional, mi.is_primary
        FROM menu_item_ingredients mi
        JOIN ingredients i ON i.id = mi.ingredient_id
        WHERE mi.menu_item_id = ANY($1)
        ORDER BY mi.menu_item_id, i.name
        "#,
    )
    .bind(item_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Association {
            menu_item_id: r.menu_item_id,
            ingredient_active: r.ingredient_active,
            link: ItemIngredient {
                ingredient_name: r.ingredient_name,
                quantity: r.quantity,
                unit: r.unit,
                is_optional: r.is_optional,
                is_primary: r.is_primary,
            },
        })
        .collect())
}

pub async fn insert(
    conn: &mut PgConnection,
    restaurant_id: Uuid,
    category_id: Option<Uuid>,
    m: &MenuItem,
) -> SyncResult<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO menu_items (
            restaurant_id, category_id, name, description, price, image_url,
            is_available, is_signature, spice_level, preparation_time,
            nutritional_info, allergen_info, tags, display_order
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING id
        "#,
    )
    .bind(restaurant_id)
    .bind(category_id)
    .bind(&m.name)
    .bind(&m.description)
    .bind(m.price)
    .bind(&m.image_url)
    .bind(m.is_available)
    .bind(m.is_signature)
    .bind(m.spice_level)
    .bind(m.preparation_time)
    .bind(&m.nutritional_info)
    .bind(encode_json(Some(&m.allergen_info))?)
    .bind(encode_json(Some(&m.tags))?)
    .bind(m.display_order)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    category_id: Option<Uuid>,
    m: &MenuItem,
) -> SyncResult<()> {
    sqlx::query(
        r#"
        UPDATE menu_items SET
            category_id = $2, description = $3, price = $4, image_url = $5,
            is_available = $6, is_signature = $7, spice_level = $8,
            preparation_time = $9, nutritional_info = $10, allergen_info = $11,
            tags = $12, display_order = $13, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(category_id)
    .bind(&m.description)
    .bind(m.price)
    .bind(&m.image_url)
    .bind(m.is_available)
    .bind(m.is_signature)
    .bind(m.spice_level)
    .bind(m.preparation_time)
    .bind(&m.nutritional_info)
    .bind(encode_json(Some(&m.allergen_info))?)
    .bind(encode_json(Some(&m.tags))?)
    .bind(m.display_order)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Replace an item's ingredient associations wholesale.
///
/// `links` pairs each association with the resolved ingredient id.
pub async fn replace_ingredients(
    conn: &mut PgConnection,
    menu_item_id: Uuid,
    links: &[(Uuid, &ItemIngredient)],
) -> SyncResult<()> {
    sqlx::query("DELETE FROM menu_item_ingredients WHERE menu_item_id = $1")
        .bind(menu_item_id)
        .execute(&mut *conn)
        .await?;

    if links.is_empty() {
        return Ok(());
    }

    let item_ids: Vec<Uuid> = links.iter().map(|_| menu_item_id).collect();
    let ingredient_ids: Vec<Uuid> = links.iter().map(|(id, _)| *id).collect();
    let quantities: Vec<Option<String>> = links.iter().map(|(_, l)| l.quantity.clone()).collect();
    let units: Vec<Option<String>> = links.iter().map(|(_, l)| l.unit.clone()).collect();
    let optional: Vec<bool> = links.iter().map(|(_, l)| l.is_optional).collect();
    let primary: Vec<bool> = links.iter().map(|(_, l)| l.is_primary).collect();

    sqlx::query(
        r#"
        INSERT INTO menu_item_ingredients
            (menu_item_id, ingredient_id, quantity, unit, is_optional, is_primary)
        SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::varchar[], $4::varchar[], $5::bool[], $6::bool[])
        "#,
    )
    .bind(&item_ids)
    .bind(&ingredient_ids)
    .bind(&quantities)
    .bind(&units)
    .bind(&optional)
    .bind(&primary)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
