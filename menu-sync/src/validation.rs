//! Bundle validation
//!
//! Pure checks run on an incoming bundle before its import transaction
//! opens. Limits follow the column sizes in `migrations/`.

use std::collections::HashSet;

use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{MAX_SPICE_LEVEL, MenuItem, is_valid_slug};

use crate::document::Bundle;
use crate::error::{SyncError, SyncResult};

// ── Text length limits ──────────────────────────────────────────────

/// Restaurant, category, item and ingredient names
pub const MAX_NAME_LEN: usize = 255;

/// Cuisine type, ingredient category
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Image references
pub const MAX_URL_LEN: usize = 500;

/// Association quantity
pub const MAX_QUANTITY_LEN: usize = 50;

/// Association unit
pub const MAX_UNIT_LEN: usize = 20;

/// `NUMERIC(10, 2)`
const PRICE_SCALE: u32 = 2;
const MAX_PRICE_EXCLUSIVE: i64 = 100_000_000;

// ── Helpers ─────────────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> SyncResult<()> {
    if value.trim().is_empty() {
        return Err(SyncError::invalid(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        ));
    }
    if value.chars().count() > max_len {
        return Err(SyncError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(value: &Option<String>, field: &str, max_len: usize) -> SyncResult<()> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(SyncError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        )));
    }
    Ok(())
}

// ── Bundle ──────────────────────────────────────────────────────────

/// Check a bundle's fields and natural-key uniqueness.
///
/// Category and ingredient references that point outside the bundle are not
/// checked here; they may exist in the target database.
pub fn validate_bundle(bundle: &Bundle) -> SyncResult<()> {
    let r = &bundle.restaurant;
    if !is_valid_slug(&r.slug) {
        return Err(SyncError::invalid(
            ErrorCode::InvalidSlug,
            format!(
                "restaurant slug '{}' must be lowercase letters, digits and single hyphens",
                r.slug
            ),
        ));
    }
    validate_required_text(&r.name, "restaurant.name", MAX_NAME_LEN)?;
    validate_optional_text(&r.cuisine_type, "restaurant.cuisine_type", MAX_SHORT_TEXT_LEN)?;

    let mut seen = HashSet::new();
    for c in &bundle.categories {
        validate_required_text(&c.name, "category.name", MAX_NAME_LEN)?;
        if !seen.insert(c.name.as_str()) {
            return Err(SyncError::constraint(
                ErrorCode::CategoryNameExists,
                format!("category '{}' appears more than once", c.name),
            ));
        }
    }

    let mut seen = HashSet::new();
    for i in &bundle.ingredients {
        validate_required_text(&i.name, "ingredient.name", MAX_NAME_LEN)?;
        validate_optional_text(&i.category, "ingredient.category", MAX_SHORT_TEXT_LEN)?;
        if !seen.insert(i.name.as_str()) {
            return Err(SyncError::constraint(
                ErrorCode::IngredientDuplicate,
                format!("ingredient '{}' appears more than once", i.name),
            ));
        }
    }

    let mut seen = HashSet::new();
    for item in &bundle.items {
        validate_item(item)?;
        if !seen.insert(item.name.as_str()) {
            return Err(SyncError::constraint(
                ErrorCode::ItemNameExists,
                format!("menu item '{}' appears more than once", item.name),
            ));
        }
    }

    Ok(())
}

fn validate_item(item: &MenuItem) -> SyncResult<()> {
    validate_required_text(&item.name, "item.name", MAX_NAME_LEN)?;
    validate_optional_text(&item.image_url, "item.image_url", MAX_URL_LEN)?;

    if item.price < Decimal::ZERO {
        return Err(SyncError::invalid(
            ErrorCode::ItemInvalidPrice,
            format!("menu item '{}' has negative price {}", item.name, item.price),
        ));
    }
    if item.price.round_dp(PRICE_SCALE) != item.price
        || item.price >= Decimal::from(MAX_PRICE_EXCLUSIVE)
    {
        return Err(SyncError::invalid(
            ErrorCode::ItemInvalidPrice,
            format!(
                "menu item '{}' price {} does not fit NUMERIC(10, 2)",
                item.name, item.price
            ),
        ));
    }
    if !(0..=MAX_SPICE_LEVEL).contains(&item.spice_level) {
        return Err(SyncError::invalid(
            ErrorCode::SpiceLevelOutOfRange,
            format!(
                "menu item '{}' spice level {} is outside 0..={MAX_SPICE_LEVEL}",
                item.name, item.spice_level
            ),
        ));
    }
    if item.preparation_time.is_some_and(|t| t < 0) {
        return Err(SyncError::invalid(
            ErrorCode::ValueOutOfRange,
            format!("menu item '{}' has negative preparation time", item.name),
        ));
    }

    let mut seen = HashSet::new();
    for link in &item.ingredients {
        validate_required_text(&link.ingredient_name, "item.ingredients.ingredient_name", MAX_NAME_LEN)?;
        validate_optional_text(&link.quantity, "item.ingredients.quantity", MAX_QUANTITY_LEN)?;
        validate_optional_text(&link.unit, "item.ingredients.unit", MAX_UNIT_LEN)?;
        if !seen.insert(link.ingredient_name.as_str()) {
            return Err(SyncError::constraint(
                ErrorCode::IngredientDuplicate,
                format!(
                    "menu item '{}' lists ingredient '{}' more than once",
                    item.name, link.ingredient_name
                ),
            ));
        }
    }
    Ok(())
}
