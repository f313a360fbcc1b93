//! Data models
//!
//! These are the document-level shapes shared by export, import and compare.
//! Surrogate ids and timestamps stay in the database layer; everything here
//! is identified by natural key (slug, name).

pub mod ingredient;
pub mod menu_category;
pub mod menu_item;
pub mod persona;
pub mod restaurant;

// Re-exports
pub use ingredient::*;
pub use menu_category::*;
pub use menu_item::*;
pub use persona::*;
pub use restaurant::*;

use serde::{Deserialize, Deserializer};

/// Treat an explicit JSON `null` like a missing field.
///
/// Older exports wrote `"tags": null` for items without tags.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
