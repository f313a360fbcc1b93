//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Highest allowed spice level
pub const MAX_SPICE_LEVEL: i32 = 5;

/// Menu item, unique by name within its restaurant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in currency units, serialized as a JSON number.
    /// Older exports wrote free items as `null`.
    #[serde(
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "price_or_zero"
    )]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_signature: bool,
    /// 0 (mild) ..= [`MAX_SPICE_LEVEL`]
    #[serde(default)]
    pub spice_level: i32,
    /// Minutes
    #[serde(default)]
    pub preparation_time: Option<i32>,
    #[serde(default)]
    pub nutritional_info: Option<Value>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub allergen_info: BTreeSet<String>,
    /// Dietary / marketing tags, e.g. "vegan", "gluten-free"
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub display_order: i32,
    /// Name of the owning category (same restaurant), if any
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub ingredients: Vec<ItemIngredient>,
}

/// Association between a menu item and a catalog ingredient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemIngredient {
    pub ingredient_name: String,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
    /// Main ingredient vs garnish/seasoning
    #[serde(default)]
    pub is_primary: bool,
}

fn default_true() -> bool {
    true
}

fn price_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(rust_decimal::serde::float_option::deserialize(deserializer)?.unwrap_or_default())
}
