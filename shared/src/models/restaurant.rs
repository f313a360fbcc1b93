//! Restaurant Model

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::persona::{AiConfig, AvatarConfig, ThemeConfig};

/// Maximum slug length (matches `restaurants.slug VARCHAR(100)`)
pub const MAX_SLUG_LEN: usize = 100;

/// Restaurant aggregate root
///
/// The slug is the stable external identifier: internal ids differ between
/// environments and never appear in export documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub cuisine_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_config: Option<AvatarConfig>,
    #[serde(default)]
    pub theme_config: Option<ThemeConfig>,
    #[serde(default)]
    pub ai_config: Option<AiConfig>,
    /// Free-form contact block (phone, address, hours, ...)
    #[serde(default)]
    pub contact_info: Option<Value>,
    /// Free-form application settings
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Listing row for `menu-sync list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantSummary {
    pub slug: String,
    pub name: String,
    pub is_active: bool,
}

/// Check that a slug is URL-safe: lowercase ASCII letters, digits and single
/// inner hyphens, at most [`MAX_SLUG_LEN`] characters.
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > MAX_SLUG_LEN {
        return false;
    }
    if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return false;
    }
    slug.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn default_true() -> bool {
    true
}
