//! Export: database → versioned JSON document
//!
//! All reads for one invocation run in a single `REPEATABLE READ, READ ONLY`
//! transaction, so a multi-restaurant export is one consistent snapshot.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use shared::models::{MenuItem, Restaurant, RestaurantSummary};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db;
use crate::document::{
    Bundle, BundleDocument, CURRENT_VERSION, CatalogDocument, EXPORT_TYPE_ALL, EXPORTER, Metadata,
};
use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    /// Keep inactive restaurants/categories/ingredients and unavailable items
    pub include_inactive: bool,
}

/// Open the read-only snapshot transaction used by export and compare
pub(crate) async fn begin_snapshot(pool: &PgPool) -> SyncResult<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Export one restaurant by slug
pub async fn export_restaurant(
    pool: &PgPool,
    slug: &str,
    options: &ExportOptions,
) -> SyncResult<BundleDocument> {
    let mut tx = begin_snapshot(pool).await?;
    let bundle = load_bundle_by_slug(&mut *tx, slug, options.include_inactive).await?;
    tx.rollback().await?;

    tracing::info!(
        slug,
        categories = bundle.categories.len(),
        items = bundle.items.len(),
        ingredients = bundle.ingredients.len(),
        "Exported restaurant"
    );
    Ok(bundle_document(bundle, options, timestamp()))
}

/// Export every restaurant (active only unless `include_inactive`), ordered by name
pub async fn export_all(pool: &PgPool, options: &ExportOptions) -> SyncResult<CatalogDocument> {
    let mut tx = begin_snapshot(pool).await?;
    let bundles = load_all(&mut *tx, options.include_inactive).await?;
    tx.rollback().await?;

    tracing::info!(restaurants = bundles.len(), "Exported all restaurants");

    let exported_at = timestamp();
    Ok(CatalogDocument {
        version: CURRENT_VERSION.to_string(),
        metadata: Metadata {
            restaurant_slug: None,
            include_inactive: options.include_inactive,
            exporter: Some(EXPORTER.to_string()),
            export_type: Some(EXPORT_TYPE_ALL.to_string()),
            restaurant_count: Some(bundles.len()),
        },
        restaurants: bundles
            .into_iter()
            .map(|b| bundle_document(b, options, exported_at.clone()))
            .collect(),
        exported_at,
    })
}

/// Restaurants available for export
pub async fn list_restaurants(
    pool: &PgPool,
    include_inactive: bool,
) -> SyncResult<Vec<RestaurantSummary>> {
    let mut conn = pool.acquire().await?;
    db::restaurant::list_summaries(&mut *conn, include_inactive).await
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn bundle_document(bundle: Bundle, options: &ExportOptions, exported_at: String) -> BundleDocument {
    BundleDocument {
        version: CURRENT_VERSION.to_string(),
        exported_at,
        metadata: Metadata {
            restaurant_slug: Some(bundle.restaurant.slug.clone()),
            include_inactive: options.include_inactive,
            exporter: Some(EXPORTER.to_string()),
            export_type: None,
            restaurant_count: None,
        },
        bundle,
    }
}

// ── Read path (shared with compare) ─────────────────────────────────

/// Load one restaurant's bundle by slug.
///
/// An inactive restaurant counts as missing unless `include_inactive`.
pub async fn load_bundle_by_slug(
    conn: &mut PgConnection,
    slug: &str,
    include_inactive: bool,
) -> SyncResult<Bundle> {
    match db::restaurant::find_by_slug(conn, slug).await? {
        Some((id, restaurant)) if restaurant.is_active || include_inactive => {
            load_bundle(conn, id, restaurant, include_inactive).await
        }
        Some(_) => Err(SyncError::NotFound(format!(
            "active restaurant '{slug}' (it is inactive; use --include-inactive)"
        ))),
        None => Err(SyncError::NotFound(format!("restaurant '{slug}'"))),
    }
}

/// Load every restaurant's bundle, ordered by name
pub async fn load_all(conn: &mut PgConnection, include_inactive: bool) -> SyncResult<Vec<Bundle>> {
    let restaurants = db::restaurant::list(conn, include_inactive).await?;
    let mut bundles = Vec::with_capacity(restaurants.len());
    for (id, restaurant) in restaurants {
        bundles.push(load_bundle(conn, id, restaurant, include_inactive).await?);
    }
    Ok(bundles)
}

/// Assemble a bundle for a loaded restaurant.
///
/// Without `include_inactive`: inactive categories, unavailable items and
/// associations to inactive ingredients are dropped, and an item whose
/// category was dropped exports with no category. The ingredient list is
/// exactly the set referenced by the exported items.
pub async fn load_bundle(
    conn: &mut PgConnection,
    restaurant_id: Uuid,
    restaurant: Restaurant,
    include_inactive: bool,
) -> SyncResult<Bundle> {
    let categories: Vec<_> = db::category::list_for_restaurant(conn, restaurant_id)
        .await?
        .into_iter()
        .filter(|(_, c)| include_inactive || c.is_active)
        .collect();
    let category_names: HashMap<Uuid, &str> = categories
        .iter()
        .map(|(id, c)| (*id, c.name.as_str()))
        .collect();

    let records: Vec<_> = db::menu_item::list_for_restaurant(conn, restaurant_id)
        .await?
        .into_iter()
        .filter(|r| include_inactive || r.item.is_available)
        .collect();

    let item_ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
    let mut links: HashMap<Uuid, Vec<_>> = HashMap::new();
    for a in db::menu_item::associations(conn, &item_ids).await? {
        if include_inactive || a.ingredient_active {
            links.entry(a.menu_item_id).or_default().push(a.link);
        }
    }

    let items: Vec<MenuItem> = records
        .into_iter()
        .map(|r| MenuItem {
            category_name: r
                .category_id
                .and_then(|id| category_names.get(&id))
                .map(|name| name.to_string()),
            ingredients: links.remove(&r.id).unwrap_or_default(),
            ..r.item
        })
        .collect();

    let used: BTreeSet<&str> = items
        .iter()
        .flat_map(|i| i.ingredients.iter().map(|l| l.ingredient_name.as_str()))
        .collect();
    let used: Vec<String> = used.into_iter().map(str::to_string).collect();
    let ingredients = db::ingredient::find_by_names(conn, &used, include_inactive)
        .await?
        .into_iter()
        .map(|(_, i)| i)
        .collect();

    Ok(Bundle {
        restaurant,
        categories: categories.into_iter().map(|(_, c)| c).collect(),
        items,
        ingredients,
    })
}

// ── Files ───────────────────────────────────────────────────────────

/// `{slug}_export_{YYYYmmdd_HHMMSS}.json`, or `all_restaurants_export_...`
/// when no slug is given. Hyphens and spaces in the slug become underscores.
pub fn export_file_name(slug: Option<&str>, at: NaiveDateTime) -> String {
    let stamp = at.format("%Y%m%d_%H%M%S");
    match slug {
        Some(slug) => format!("{}_export_{stamp}.json", slug.replace(['-', ' '], "_")),
        None => format!("{EXPORT_TYPE_ALL}_export_{stamp}.json"),
    }
}

/// Write `doc` as pretty JSON to `dir/file_name`, creating `dir` if needed
pub async fn write_document<T: Serialize>(
    dir: &Path,
    file_name: &str,
    doc: &T,
) -> SyncResult<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SyncError::io(dir, e))?;

    let path = dir.join(file_name);
    let mut bytes = serde_json::to_vec_pretty(doc)
        .map_err(|e| SyncError::validation(format!("failed to encode export document: {e}")))?;
    bytes.push(b'\n');
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| SyncError::io(&path, e))?;

    tracing::info!(path = %path.display(), "Export written");
    Ok(path)
}
