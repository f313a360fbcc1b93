//! Compare: two sources → structural diff
//!
//! Sources are live databases or export documents. Both sides load into a
//! [`Snapshot`] (slug → bundle) and are matched by natural key at every
//! level, so row order and internal ids never matter. Compare never writes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::error::{EXIT_DIFFERENCES, EXIT_OK};

use crate::config::DatabaseConfig;
use crate::db;
use crate::diff::{Entity, EntityKind, by_key, field_changes};
use crate::document::{Bundle, parse_document};
use crate::error::{SyncError, SyncResult};
use crate::export;

/// One side of a comparison
#[derive(Debug, Clone)]
pub enum Source {
    Database(DatabaseConfig),
    Document(PathBuf),
}

impl Source {
    pub fn label(&self) -> String {
        match self {
            Source::Database(config) => config.label.clone(),
            Source::Document(path) => path.display().to_string(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Database(config) => write!(f, "database '{}'", config.label),
            Source::Document(path) => write!(f, "document {}", path.display()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompareOptions {
    /// Restrict to these slugs; empty compares the union of both sides
    pub slugs: Vec<String>,
    /// Database sources only; documents are compared as written
    pub include_inactive: bool,
}

/// Bundles loaded from one source
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub label: String,
    pub bundles: BTreeMap<String, Bundle>,
}

impl Snapshot {
    pub fn from_bundles(label: impl Into<String>, bundles: impl IntoIterator<Item = Bundle>) -> Self {
        Self {
            label: label.into(),
            bundles: bundles
                .into_iter()
                .map(|b| (b.restaurant.slug.clone(), b))
                .collect(),
        }
    }
}

/// Load a source.
///
/// Database sources go through the export read path, so a database compared
/// against its own fresh export is identical. A slug missing from a
/// database is simply absent from the snapshot.
pub async fn load_snapshot(source: &Source, options: &CompareOptions) -> SyncResult<Snapshot> {
    let label = source.label();
    let bundles = match source {
        Source::Database(config) => {
            let pool = db::connect(config).await?;
            let mut tx = export::begin_snapshot(&pool).await?;
            let bundles = if options.slugs.is_empty() {
                export::load_all(&mut *tx, options.include_inactive).await?
            } else {
                let mut bundles = Vec::new();
                for slug in &options.slugs {
                    match export::load_bundle_by_slug(&mut *tx, slug, options.include_inactive)
                        .await
                    {
                        Ok(bundle) => bundles.push(bundle),
                        Err(SyncError::NotFound(_)) => {
                            tracing::debug!(source = %label, slug = %slug, "Restaurant absent")
                        }
                        Err(e) => return Err(e),
                    }
                }
                bundles
            };
            tx.rollback().await?;
            pool.close().await;
            bundles
        }
        Source::Document(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| SyncError::io(path, e))?;
            parse_document(&bytes)?
                .into_bundles()?
                .into_iter()
                .filter(|b| options.slugs.is_empty() || options.slugs.iter().any(|s| s == b.slug()))
                .collect()
        }
    };

    tracing::info!(source = %label, restaurants = bundles.len(), "Loaded snapshot");
    Ok(Snapshot::from_bundles(label, bundles))
}

/// Load both sources and diff them
pub async fn compare(
    left: &Source,
    right: &Source,
    options: &CompareOptions,
) -> SyncResult<ComparisonReport> {
    let left = load_snapshot(left, options).await?;
    let right = load_snapshot(right, options).await?;
    Ok(compare_snapshots(&left, &right, &options.slugs))
}

// ── Report types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    LeftOnly,
    RightOnly,
    /// Requested by slug but found on neither side
    Neither,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideCounts {
    pub categories: usize,
    pub items: usize,
    pub ingredients: usize,
}

impl SideCounts {
    fn of(bundle: &Bundle) -> Self {
        Self {
            categories: bundle.categories.len(),
            items: bundle.items.len(),
            ingredients: bundle.ingredients.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub entity: EntityKind,
    /// Natural key; associations use `item/ingredient`
    pub key: String,
    pub field: String,
    pub left: Value,
    pub right: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity: EntityKind,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantDiff {
    pub slug: String,
    pub presence: Presence,
    pub left: Option<SideCounts>,
    pub right: Option<SideCounts>,
    pub fields: Vec<FieldDiff>,
    /// Present on the right only
    pub added: Vec<EntityRef>,
    /// Present on the left only
    pub removed: Vec<EntityRef>,
}

impl RestaurantDiff {
    pub fn is_identical(&self) -> bool {
        self.presence == Presence::Both
            && self.fields.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
    }

    /// Field differences plus added/removed entities; a one-sided restaurant counts once
    pub fn difference_count(&self) -> usize {
        match self.presence {
            Presence::Both => self.fields.len() + self.added.len() + self.removed.len(),
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub left: String,
    pub right: String,
    pub restaurants: Vec<RestaurantDiff>,
}

impl ComparisonReport {
    pub fn is_identical(&self) -> bool {
        self.restaurants.iter().all(RestaurantDiff::is_identical)
    }

    pub fn difference_count(&self) -> usize {
        self.restaurants.iter().map(RestaurantDiff::difference_count).sum()
    }

    pub fn exit_status(&self) -> u8 {
        if self.is_identical() {
            EXIT_OK
        } else {
            EXIT_DIFFERENCES
        }
    }
}

// ── Diffing ─────────────────────────────────────────────────────────

/// Diff two snapshots; `slugs` restricts the restaurants compared
pub fn compare_snapshots(left: &Snapshot, right: &Snapshot, slugs: &[String]) -> ComparisonReport {
    let keys: BTreeSet<&str> = if slugs.is_empty() {
        left.bundles
            .keys()
            .chain(right.bundles.keys())
            .map(String::as_str)
            .collect()
    } else {
        slugs.iter().map(String::as_str).collect()
    };

    ComparisonReport {
        left: left.label.clone(),
        right: right.label.clone(),
        restaurants: keys
            .into_iter()
            .map(|slug| diff_restaurant(slug, left.bundles.get(slug), right.bundles.get(slug)))
            .collect(),
    }
}

/// Diff one restaurant's bundles
pub fn diff_restaurant(slug: &str, left: Option<&Bundle>, right: Option<&Bundle>) -> RestaurantDiff {
    let mut diff = RestaurantDiff {
        slug: slug.to_string(),
        presence: match (left, right) {
            (Some(_), Some(_)) => Presence::Both,
            (Some(_), None) => Presence::LeftOnly,
            (None, Some(_)) => Presence::RightOnly,
            (None, None) => Presence::Neither,
        },
        left: left.map(SideCounts::of),
        right: right.map(SideCounts::of),
        fields: vec![],
        added: vec![],
        removed: vec![],
    };

    let (Some(l), Some(r)) = (left, right) else {
        return diff;
    };

    diff.push_changes(None, &l.restaurant, &r.restaurant);
    diff.diff_keyed(None, &l.categories, &r.categories);
    diff.diff_keyed(None, &l.ingredients, &r.ingredients);
    for (a, b) in diff.diff_keyed(None, &l.items, &r.items) {
        diff.diff_keyed(Some(a.name.as_str()), &a.ingredients, &b.ingredients);
    }
    diff
}

impl RestaurantDiff {
    fn push_changes<T: Entity>(&mut self, scope: Option<&str>, left: &T, right: &T) {
        let key = scoped(scope, left.natural_key());
        self.fields.extend(field_changes(left, right).into_iter().map(|c| FieldDiff {
            entity: T::KIND,
            key: key.clone(),
            field: c.field.to_string(),
            left: c.left,
            right: c.right,
        }));
    }

    /// Match by natural key, record field changes and one-sided entities,
    /// and return the matched pairs
    fn diff_keyed<'b, T: Entity>(
        &mut self,
        scope: Option<&str>,
        left: &'b [T],
        right: &'b [T],
    ) -> Vec<(&'b T, &'b T)> {
        let (l, r) = (by_key(left), by_key(right));
        let mut matched = Vec::new();

        for (key, a) in &l {
            match r.get(key) {
                Some(b) => {
                    self.push_changes(scope, *a, *b);
                    matched.push((*a, *b));
                }
                None => self.removed.push(EntityRef {
                    entity: T::KIND,
                    key: scoped(scope, key),
                }),
            }
        }
        for key in r.keys().filter(|k| !l.contains_key(*k)) {
            self.added.push(EntityRef {
                entity: T::KIND,
                key: scoped(scope, key),
            });
        }
        matched
    }
}

fn scoped(scope: Option<&str>, key: &str) -> String {
    match scope {
        Some(scope) => format!("{scope}/{key}"),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle(slug: &str, price: f64) -> Bundle {
        serde_json::from_value(json!({
            "restaurant": { "name": "Chip Cookies", "slug": slug,
                            "settings": { "currency": "USD", "tax": 0.08 } },
            "categories": [
                { "name": "Classics", "display_order": 1 },
                { "name": "Seasonal", "display_order": 2 }
            ],
            "items": [
                { "name": "Milk Chocolate Chip", "price": price, "category_name": "Classics",
                  "ingredients": [{ "ingredient_name": "Butter" }, { "ingredient_name": "Chocolate" }] },
                { "name": "Pumpkin Spice", "price": 4.25, "category_name": "Seasonal" }
            ],
            "ingredients": [{ "name": "Butter" }, { "name": "Chocolate" }]
        }))
        .unwrap()
    }

    fn snapshot(label: &str, bundles: Vec<Bundle>) -> Snapshot {
        Snapshot::from_bundles(label, bundles)
    }

    #[test]
    fn test_identical_snapshots() {
        let report = compare_snapshots(
            &snapshot("local", vec![bundle("chip-cookies", 18.99)]),
            &snapshot("remote", vec![bundle("chip-cookies", 18.99)]),
            &[],
        );
        assert!(report.is_identical());
        assert_eq!(report.exit_status(), 0);
        assert_eq!(report.restaurants[0].left.unwrap().items, 2);
    }

    #[test]
    fn test_single_price_difference() {
        let report = compare_snapshots(
            &snapshot("local", vec![bundle("chip-cookies", 18.99)]),
            &snapshot("remote", vec![bundle("chip-cookies", 19.99)]),
            &[],
        );
        assert!(!report.is_identical());
        assert_eq!(report.difference_count(), 1);
        let diff = &report.restaurants[0].fields[0];
        assert_eq!(diff.entity, EntityKind::Item);
        assert_eq!(diff.key, "Milk Chocolate Chip");
        assert_eq!(diff.field, "price");
        assert_eq!(diff.left, json!(18.99));
        assert_eq!(diff.right, json!(19.99));
        assert_eq!(report.exit_status(), 1);
    }

    #[test]
    fn test_order_independence() {
        let left = bundle("chip-cookies", 18.99);
        let mut right = left.clone();
        right.categories.reverse();
        right.items.reverse();
        right.ingredients.reverse();
        right.items[1].ingredients.reverse();
        let diff = diff_restaurant("chip-cookies", Some(&left), Some(&right));
        assert!(diff.is_identical(), "{diff:?}");
    }

    #[test]
    fn test_added_and_removed_entities() {
        let left = bundle("chip-cookies", 18.99);
        let mut right = left.clone();
        right.categories.pop();
        right.items[0].ingredients.pop();
        right.ingredients.push(serde_json::from_value(json!({ "name": "Sea Salt" })).unwrap());

        let diff = diff_restaurant("chip-cookies", Some(&left), Some(&right));
        assert_eq!(
            diff.removed,
            vec![
                EntityRef { entity: EntityKind::Category, key: "Seasonal".into() },
                EntityRef { entity: EntityKind::Association, key: "Milk Chocolate Chip/Chocolate".into() },
            ]
        );
        assert_eq!(
            diff.added,
            vec![EntityRef { entity: EntityKind::Ingredient, key: "Sea Salt".into() }]
        );
        assert_eq!(diff.left.unwrap().categories, 2);
        assert_eq!(diff.right.unwrap().categories, 1);
    }

    #[test]
    fn test_association_field_difference_is_scoped() {
        let left = bundle("chip-cookies", 18.99);
        let mut right = left.clone();
        right.items[0].ingredients[0].is_primary = true;

        let diff = diff_restaurant("chip-cookies", Some(&left), Some(&right));
        assert_eq!(diff.fields.len(), 1);
        assert_eq!(diff.fields[0].entity, EntityKind::Association);
        assert_eq!(diff.fields[0].key, "Milk Chocolate Chip/Butter");
        assert_eq!(diff.fields[0].field, "is_primary");
    }

    #[test]
    fn test_presence_and_slug_filter() {
        let left = snapshot("local", vec![bundle("chip-cookies", 1.0), bundle("only-left", 1.0)]);
        let right = snapshot("remote", vec![bundle("chip-cookies", 1.0), bundle("only-right", 1.0)]);

        let report = compare_snapshots(&left, &right, &[]);
        let presence: Vec<_> = report.restaurants.iter().map(|r| (r.slug.as_str(), r.presence)).collect();
        assert_eq!(
            presence,
            vec![
                ("chip-cookies", Presence::Both),
                ("only-left", Presence::LeftOnly),
                ("only-right", Presence::RightOnly),
            ]
        );
        assert_eq!(report.difference_count(), 2);

        let report = compare_snapshots(&left, &right, &["chip-cookies".to_string()]);
        assert_eq!(report.restaurants.len(), 1);
        assert!(report.is_identical());

        let report = compare_snapshots(&left, &right, &["ghost".to_string()]);
        assert_eq!(report.restaurants[0].presence, Presence::Neither);
        assert!(!report.is_identical());
    }

    #[test]
    fn test_restaurant_json_fields_compare_structurally() {
        let left = bundle("chip-cookies", 18.99);
        let mut right = left.clone();
        right.restaurant.settings = Some(json!({ "tax": 0.08, "currency": "USD" }));
        assert!(diff_restaurant("chip-cookies", Some(&left), Some(&right)).is_identical());

        right.restaurant.settings = Some(json!({ "tax": 0.09, "currency": "USD" }));
        let diff = diff_restaurant("chip-cookies", Some(&left), Some(&right));
        assert_eq!(diff.fields[0].entity, EntityKind::Restaurant);
        assert_eq!(diff.fields[0].key, "chip-cookies");
        assert_eq!(diff.fields[0].field, "settings");
    }
}
