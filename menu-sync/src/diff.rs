//! Natural keys and field-level comparison
//!
//! Import planning and compare both match entities by natural key and look
//! at the same set of fields. [`Entity`] describes that for each model type.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::models::{Ingredient, ItemIngredient, MenuCategory, MenuItem, Restaurant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Restaurant,
    Category,
    Item,
    Ingredient,
    /// Item ↔ ingredient join row
    Association,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Restaurant => "restaurant",
            EntityKind::Category => "category",
            EntityKind::Item => "item",
            EntityKind::Ingredient => "ingredient",
            EntityKind::Association => "association",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A model matched across sources by natural key
pub trait Entity: Sized {
    const KIND: EntityKind;

    fn natural_key(&self) -> &str;

    /// Compared fields, excluding the natural key
    fn fields(&self) -> Vec<(&'static str, Value)>;

    /// Names of the fields that differ from `other`
    fn changed_fields(&self, other: &Self) -> Vec<&'static str> {
        field_changes(self, other)
            .into_iter()
            .map(|c| c.field)
            .collect()
    }
}

/// One differing field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: &'static str,
    pub left: Value,
    pub right: Value,
}

/// Fields whose values differ between `left` and `right`.
///
/// JSON values compare structurally, so object key order never matters.
pub fn field_changes<T: Entity>(left: &T, right: &T) -> Vec<FieldChange> {
    left.fields()
        .into_iter()
        .zip(right.fields())
        .filter(|((_, l), (_, r))| l != r)
        .map(|((field, left), (_, right))| FieldChange { field, left, right })
        .collect()
}

/// Index entities by natural key
pub fn by_key<T: Entity>(entities: &[T]) -> BTreeMap<&str, &T> {
    entities.iter().map(|e| (e.natural_key(), e)).collect()
}

fn json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_default()
}

/// Prices as JSON numbers, so 18.99 and 18.990 compare equal
fn price(value: Decimal) -> Value {
    rust_decimal::serde::float::serialize(&value, serde_json::value::Serializer)
        .unwrap_or_default()
}

impl Entity for Restaurant {
    const KIND: EntityKind = EntityKind::Restaurant;

    fn natural_key(&self) -> &str {
        &self.slug
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", json(&self.name)),
            ("cuisine_type", json(&self.cuisine_type)),
            ("description", json(&self.description)),
            ("avatar_config", json(&self.avatar_config)),
            ("theme_config", json(&self.theme_config)),
            ("ai_config", json(&self.ai_config)),
            ("contact_info", json(&self.contact_info)),
            ("settings", json(&self.settings)),
            ("is_active", json(&self.is_active)),
        ]
    }
}

impl Entity for MenuCategory {
    const KIND: EntityKind = EntityKind::Category;

    fn natural_key(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("description", json(&self.description)),
            ("display_order", json(&self.display_order)),
            ("is_active", json(&self.is_active)),
        ]
    }
}

impl Entity for MenuItem {
    const KIND: EntityKind = EntityKind::Item;

    fn natural_key(&self) -> &str {
        &self.name
    }

    /// Associations are compared separately, by ingredient name
    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("description", json(&self.description)),
            ("price", price(self.price)),
            ("image_url", json(&self.image_url)),
            ("is_available", json(&self.is_available)),
            ("is_signature", json(&self.is_signature)),
            ("spice_level", json(&self.spice_level)),
            ("preparation_time", json(&self.preparation_time)),
            ("nutritional_info", json(&self.nutritional_info)),
            ("allergen_info", json(&self.allergen_info)),
            ("tags", json(&self.tags)),
            ("display_order", json(&self.display_order)),
            ("category_name", json(&self.category_name)),
        ]
    }

    fn changed_fields(&self, other: &Self) -> Vec<&'static str> {
        let mut changed: Vec<&'static str> = field_changes(self, other)
            .into_iter()
            .map(|c| c.field)
            .collect();
        if !same_associations(&self.ingredients, &other.ingredients) {
            changed.push("ingredients");
        }
        changed
    }
}

impl Entity for Ingredient {
    const KIND: EntityKind = EntityKind::Ingredient;

    fn natural_key(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("category", json(&self.category)),
            ("allergen_info", json(&self.allergen_info)),
            ("nutritional_info", json(&self.nutritional_info)),
            ("is_active", json(&self.is_active)),
        ]
    }
}

impl Entity for ItemIngredient {
    const KIND: EntityKind = EntityKind::Association;

    fn natural_key(&self) -> &str {
        &self.ingredient_name
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("quantity", json(&self.quantity)),
            ("unit", json(&self.unit)),
            ("is_optional", json(&self.is_optional)),
            ("is_primary", json(&self.is_primary)),
        ]
    }
}

/// Association lists are equal as sets keyed by ingredient name
pub fn same_associations(left: &[ItemIngredient], right: &[ItemIngredient]) -> bool {
    let (l, r) = (by_key(left), by_key(right));
    l.len() == r.len()
        && l.iter().all(|(key, a)| {
            r.get(key)
                .is_some_and(|b| field_changes(*a, *b).is_empty())
        })
}
