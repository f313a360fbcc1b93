//! Menu Category Model

use serde::{Deserialize, Serialize};

/// Menu category, unique by name within its restaurant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Sort key for menu display
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}
