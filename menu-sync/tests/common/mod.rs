//! Shared helpers for database-backed tests
//!
//! Tests run against the PostgreSQL named by `MENU_SYNC_TEST_DATABASE_URL`
//! and are skipped when it is unset. Each database handle lives in its own
//! freshly migrated schema, dropped by [`TestDb::teardown`].

#![allow(dead_code)]

use std::time::Duration;

use menu_sync::{DatabaseConfig, db};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_DATABASE_URL: &str = "MENU_SYNC_TEST_DATABASE_URL";

pub struct TestDb {
    pub config: DatabaseConfig,
    pub pool: PgPool,
    admin: PgPool,
}

impl TestDb {
    /// Create and migrate an isolated schema, or `None` when no test database is configured
    pub async fn setup(label: &str) -> Option<Self> {
        Self::create(label, true).await
    }

    /// Like [`TestDb::setup`], leaving the schema empty unless `migrate`
    pub async fn create(label: &str, migrate: bool) -> Option<Self> {
        let Ok(url) = std::env::var(TEST_DATABASE_URL) else {
            eprintln!("{TEST_DATABASE_URL} not set, skipping");
            return None;
        };

        let schema = format!("menu_sync_{label}_{}", Uuid::new_v4().simple());
        let admin = PgPool::connect(&url).await.expect("connect test database");
        sqlx::query(&format!("CREATE SCHEMA \"{schema}\""))
            .execute(&admin)
            .await
            .expect("create schema");

        let config = DatabaseConfig {
            label: label.to_string(),
            url,
            max_connections: 2,
            connect_timeout: Duration::from_secs(10),
            schema: Some(schema),
        };
        let pool = db::connect(&config).await.expect("connect test schema");
        if migrate {
            db::migrate(&pool).await.expect("migrate test schema");
        }

        Some(Self {
            config,
            pool,
            admin,
        })
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("count rows");
        n
    }

    pub async fn execute(&self, sql: &str) {
        sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .expect("execute test SQL");
    }

    pub async fn teardown(self) {
        self.pool.close().await;
        if let Some(schema) = &self.config.schema {
            let _ = sqlx::query(&format!("DROP SCHEMA \"{schema}\" CASCADE"))
                .execute(&self.admin)
                .await;
        }
        self.admin.close().await;
    }
}

/// The chip-cookies restaurant: 2 categories, 9 items, 6 ingredients
pub const SEED_CHIP_COOKIES: &str = r##"
INSERT INTO restaurants (name, slug, cuisine_type, description, avatar_config, theme_config, contact_info, settings)
VALUES (
    'Chip Cookies', 'chip-cookies', 'Bakery', 'Warm cookies, baked to order',
    '{"name": "Chip", "personality": "friendly_knowledgeable", "greeting": "Hi! Craving a cookie?", "tone": "warm"}',
    '{"primary": "#8B4513", "accent": "#F4A460", "gradients": {"hero": "linear-gradient(135deg, #8B4513, #F4A460)"}}',
    '{"phone": "555-0100", "address": "12 Baker St"}',
    '{"currency": "USD", "tax_rate": 0.08}'
);

INSERT INTO menu_categories (restaurant_id, name, description, display_order)
SELECT id, c.name, c.description, c.display_order
FROM restaurants,
     (VALUES ('Classic Cookies', 'Everyday favourites', 1),
             ('Specialty Cookies', 'Rotating specials', 2)) AS c(name, description, display_order)
WHERE slug = 'chip-cookies';

INSERT INTO ingredients (name, category, allergen_info) VALUES
    ('Butter', 'dairy', '["milk"]'),
    ('Flour', 'grain', '["gluten"]'),
    ('Milk Chocolate', 'chocolate', '["milk", "soy"]'),
    ('Dark Chocolate', 'chocolate', '["soy"]'),
    ('Sea Salt', 'seasoning', '[]'),
    ('Walnuts', 'nuts', '["tree_nuts"]');

INSERT INTO menu_items (restaurant_id, category_id, name, description, price, is_signature, preparation_time, allergen_info, tags, nutritional_info, display_order)
SELECT r.id, c.id, i.name, i.description, i.price, i.is_signature, 15, i.allergens::jsonb, i.tags::jsonb, i.nutrition::jsonb, i.display_order
FROM restaurants r
JOIN menu_categories c ON c.restaurant_id = r.id
JOIN (VALUES
    ('Classic Cookies', 'Milk Chocolate Chip', 'The original', 18.99, TRUE, '["milk", "gluten"]', '["bestseller"]', '{"calories": 220, "sugar_g": 18}', 1),
    ('Classic Cookies', 'Dark Chocolate Chunk', NULL, 19.49, FALSE, '["gluten"]', '[]', NULL, 2),
    ('Classic Cookies', 'Sugar Cookie', NULL, 12.00, FALSE, '["milk", "gluten"]', '[]', NULL, 3),
    ('Classic Cookies', 'Oatmeal Raisin', NULL, 14.50, FALSE, '["gluten"]', '["fiber"]', NULL, 4),
    ('Classic Cookies', 'Snickerdoodle', NULL, 13.25, FALSE, '["milk", "gluten"]', '[]', NULL, 5),
    ('Specialty Cookies', 'Salted Caramel', NULL, 21.00, TRUE, '["milk", "gluten"]', '["seasonal"]', NULL, 1),
    ('Specialty Cookies', 'Walnut Brownie', NULL, 22.75, FALSE, '["tree_nuts", "gluten"]', '[]', NULL, 2),
    ('Specialty Cookies', 'Double Chocolate', NULL, 20.00, FALSE, '["milk", "soy", "gluten"]', '["vegan"]', NULL, 3),
    ('Specialty Cookies', 'Lemon Crinkle', NULL, 16.00, FALSE, '["gluten"]', '[]', NULL, 4)
) AS i(category, name, description, price, is_signature, allergens, tags, nutrition, display_order)
  ON i.category = c.name
WHERE r.slug = 'chip-cookies';

INSERT INTO menu_item_ingredients (menu_item_id, ingredient_id, quantity, unit, is_optional, is_primary)
SELECT m.id, g.id, l.quantity, l.unit, l.is_optional, l.is_primary
FROM (VALUES
    ('Milk Chocolate Chip', 'Butter', '100', 'g', FALSE, FALSE),
    ('Milk Chocolate Chip', 'Flour', '200', 'g', FALSE, FALSE),
    ('Milk Chocolate Chip', 'Milk Chocolate', '150', 'g', FALSE, TRUE),
    ('Dark Chocolate Chunk', 'Dark Chocolate', '150', 'g', FALSE, TRUE),
    ('Dark Chocolate Chunk', 'Sea Salt', NULL, NULL, TRUE, FALSE),
    ('Salted Caramel', 'Sea Salt', '2', 'g', FALSE, FALSE),
    ('Walnut Brownie', 'Walnuts', '50', 'g', FALSE, TRUE),
    ('Walnut Brownie', 'Dark Chocolate', '80', 'g', FALSE, FALSE)
) AS l(item, ingredient, quantity, unit, is_optional, is_primary)
JOIN menu_items m ON m.name = l.item
JOIN ingredients g ON g.name = l.ingredient;
"##;

/// Two restaurants whose persona columns are partial or carry values this
/// build has no variant for
pub const SEED_ODD_PERSONAS: &str = r##"
INSERT INTO restaurants (name, slug, avatar_config, theme_config, ai_config, settings) VALUES
(
    'Persona Cafe', 'persona-cafe',
    '{"personality": "grumpy", "voice": "nova"}',
    '{"primary": "#112233", "gradients": {}}',
    '{"mode": "hybrid", "model_config": {"temperature": 0.5}}',
    '{"currency": "EUR"}'
),
(
    'Greeting Only', 'greeting-only',
    '{"greeting": "Hello!"}',
    NULL,
    '{"features": {"streaming": "beta"}, "provider": "local-llm"}',
    NULL
);
"##;

/// Persona and free-form JSON columns of one restaurant, as stored
pub async fn stored_persona(db: &TestDb, slug: &str) -> Value {
    let (avatar, theme, ai, contact, settings): (
        Option<Value>,
        Option<Value>,
        Option<Value>,
        Option<Value>,
        Option<Value>,
    ) = sqlx::query_as(
        "SELECT avatar_config, theme_config, ai_config, contact_info, settings
         FROM restaurants WHERE slug = $1",
    )
    .bind(slug)
    .fetch_one(&db.pool)
    .await
    .expect("load persona columns");
    json!([avatar, theme, ai, contact, settings])
}

/// A minimal valid bundle for document-level tests
pub fn bundle(slug: &str, price: f64) -> Value {
    json!({
        "restaurant": { "name": format!("Restaurant {slug}"), "slug": slug, "cuisine_type": "Cafe" },
        "categories": [{ "name": "Drinks", "display_order": 1 }],
        "items": [{
            "name": "Latte",
            "price": price,
            "category_name": "Drinks",
            "allergen_info": ["milk"],
            "ingredients": [
                { "ingredient_name": "Espresso", "is_primary": true },
                { "ingredient_name": "Whole Milk", "quantity": "200", "unit": "ml" }
            ]
        }],
        "ingredients": [
            { "name": "Espresso", "category": "coffee" },
            { "name": "Whole Milk", "category": "dairy", "allergen_info": ["milk"] }
        ]
    })
}

/// Wrap bundles in a versioned document
pub fn document(version: &str, bundles: Vec<Value>) -> Value {
    match <[Value; 1]>::try_from(bundles) {
        Ok([single]) => {
            let mut doc = single;
            doc["version"] = json!(version);
            doc["exported_at"] = json!("2024-05-01T12:00:00Z");
            doc
        }
        Err(bundles) => json!({
            "version": version,
            "exported_at": "2024-05-01T12:00:00Z",
            "metadata": { "export_type": "all_restaurants" },
            "restaurants": bundles,
        }),
    }
}

/// Write `doc` into a temp dir and return both (the dir must outlive the path)
pub fn write_temp(doc: &Value) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("export.json");
    std::fs::write(&path, serde_json::to_vec_pretty(doc).expect("encode")).expect("write");
    (dir, path)
}
