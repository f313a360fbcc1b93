//! Import: export document → target database
//!
//! Each bundle is applied in its own transaction, in foreign-key order:
//! restaurant, ingredients, categories, items, then item↔ingredient rows.
//! Every incoming entity goes through the same three steps:
//!
//! 1. keyed lookup by natural key → [`Match`]
//! 2. [`plan`] (pure) → [`Action`] plus the changed fields
//! 3. apply the action
//!
//! Unchanged rows are never written, so importing the same document twice
//! leaves the target as it was after the first import.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::MenuItem;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db;
use crate::diff::{Entity, EntityKind};
use crate::document::{Bundle, ParsedDocument, parse_document};
use crate::error::{SyncError, SyncResult};
use crate::validation::validate_bundle;

// ── Options ─────────────────────────────────────────────────────────

/// What to do with a matched row whose fields differ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Update the row in place and report the conflict
    #[default]
    Overwrite,
    /// Leave the row untouched and report it as skipped
    Skip,
}

/// Whether a bundle transaction is committed.
///
/// `DryRun` applies exactly the same plan and rolls back, whatever the
/// conflict policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    #[default]
    Commit,
    DryRun,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub policy: ConflictPolicy,
    pub mode: WriteMode,
}

// ── Planning ────────────────────────────────────────────────────────

/// Result of looking up an incoming entity by natural key
#[derive(Debug, Clone, PartialEq)]
pub enum Match<T> {
    Existing { id: Uuid, current: T },
    New,
}

impl<T> From<Option<(Uuid, T)>> for Match<T> {
    fn from(found: Option<(Uuid, T)>) -> Self {
        match found {
            Some((id, current)) => Match::Existing { id, current },
            None => Match::New,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Insert,
    Update,
    Unchanged,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub action: Action,
    /// Fields that differ from the stored row
    pub changes: Vec<&'static str>,
}

/// Decide what to do with one incoming entity.
///
/// | match    | fields differ | Overwrite | Skip      |
/// |----------|---------------|-----------|-----------|
/// | New      | n/a           | Insert    | Insert    |
/// | Existing | no            | Unchanged | Unchanged |
/// | Existing | yes           | Update    | Skip      |
pub fn plan<T: Entity>(policy: ConflictPolicy, incoming: &T, matched: &Match<T>) -> Plan {
    match matched {
        Match::New => Plan {
            action: Action::Insert,
            changes: vec![],
        },
        Match::Existing { current, .. } => {
            let changes = current.changed_fields(incoming);
            let action = match (changes.is_empty(), policy) {
                (true, _) => Action::Unchanged,
                (false, ConflictPolicy::Overwrite) => Action::Update,
                (false, ConflictPolicy::Skip) => Action::Skip,
            };
            Plan { action, changes }
        }
    }
}

// ── Report ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl Counts {
    fn record(&mut self, action: Action) {
        match action {
            Action::Insert => self.created += 1,
            Action::Update => self.updated += 1,
            Action::Unchanged => self.unchanged += 1,
            Action::Skip => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleStats {
    pub restaurants: Counts,
    pub categories: Counts,
    pub items: Counts,
    pub ingredients: Counts,
    /// Items whose ingredient rows were rewritten
    pub associations_replaced: usize,
}

impl BundleStats {
    fn counts_mut(&mut self, kind: EntityKind) -> &mut Counts {
        match kind {
            EntityKind::Restaurant => &mut self.restaurants,
            EntityKind::Category => &mut self.categories,
            EntityKind::Ingredient => &mut self.ingredients,
            EntityKind::Item | EntityKind::Association => &mut self.items,
        }
    }

    /// Number of rows inserted or updated
    pub fn writes(&self) -> usize {
        [self.restaurants, self.categories, self.items, self.ingredients]
            .iter()
            .map(|c| c.created + c.updated)
            .sum::<usize>()
            + self.associations_replaced
    }
}

/// A matched row whose fields differed from the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConflict {
    pub entity: EntityKind,
    pub key: String,
    /// `Update` under Overwrite, `Skip` under Skip
    pub action: Action,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleReport {
    /// Restaurant slug, or `#<position>` when the bundle had none
    pub label: String,
    pub stats: BundleStats,
    pub conflicts: Vec<ResolvedConflict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AppError>,
}

impl BundleReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub policy: ConflictPolicy,
    pub bundles: Vec<BundleReport>,
}

impl ImportReport {
    pub fn failed(&self) -> impl Iterator<Item = &BundleReport> {
        self.bundles.iter().filter(|b| !b.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    /// 0 when every bundle applied, 2 when none did, 1 otherwise
    pub fn exit_status(&self) -> u8 {
        let failed = self.failed().count();
        if failed == 0 {
            ErrorCode::Success.exit_status()
        } else if failed == self.bundles.len() {
            ErrorCode::InternalError.exit_status()
        } else {
            ErrorCode::BundleFailed.exit_status()
        }
    }
}

// ── Entry points ────────────────────────────────────────────────────

/// Read, validate and import a document file.
///
/// The document is parsed before any connection is opened, so a bad version
/// tag or shape fails without touching the target.
pub async fn import_file(
    target: &DatabaseConfig,
    path: &Path,
    options: &ImportOptions,
    run_migrations: bool,
) -> SyncResult<ImportReport> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    let parsed = parse_document(&bytes)?;
    tracing::info!(
        path = %path.display(),
        version = %parsed.version,
        bundles = parsed.entries.len(),
        "Loaded export document"
    );

    let pool = db::connect(target).await?;
    if run_migrations {
        db::migrate(&pool).await?;
    }
    let report = import_document(&pool, parsed, options).await;
    pool.close().await;
    Ok(report)
}

/// Import every bundle of a parsed document, one transaction each.
///
/// A bundle that fails (decode, validation, database) is rolled back and
/// reported by label; its siblings still run.
pub async fn import_document(
    pool: &PgPool,
    parsed: ParsedDocument,
    options: &ImportOptions,
) -> ImportReport {
    let mut report = ImportReport {
        dry_run: options.mode == WriteMode::DryRun,
        policy: options.policy,
        bundles: Vec::with_capacity(parsed.entries.len()),
    };

    for entry in parsed.entries {
        let result = match entry.bundle {
            Ok(bundle) => import_bundle(pool, &bundle, options).await,
            Err(e) => Err(e),
        };

        let bundle_report = match result {
            Ok(applied) => BundleReport {
                label: entry.label,
                stats: applied.stats,
                conflicts: applied.conflicts,
                error: None,
            },
            Err(e) => {
                let error = AppError::from(e).with_detail("bundle", entry.label.clone());
                error.log();
                BundleReport {
                    label: entry.label,
                    stats: BundleStats::default(),
                    conflicts: vec![],
                    error: Some(error),
                }
            }
        };
        report.bundles.push(bundle_report);
    }
    report
}

/// Stats and conflicts of one applied bundle
#[derive(Debug, Default)]
pub struct AppliedBundle {
    pub stats: BundleStats,
    pub conflicts: Vec<ResolvedConflict>,
}

/// Import one bundle atomically
pub async fn import_bundle(
    pool: &PgPool,
    bundle: &Bundle,
    options: &ImportOptions,
) -> SyncResult<AppliedBundle> {
    validate_bundle(bundle)?;

    let mut tx = pool.begin().await?;
    let applied = BundleImport::new(bundle, options.policy)
        .run(&mut *tx)
        .await?;

    match options.mode {
        WriteMode::Commit => tx.commit().await?,
        WriteMode::DryRun => tx.rollback().await?,
    }

    tracing::info!(
        slug = bundle.slug(),
        dry_run = options.mode == WriteMode::DryRun,
        writes = applied.stats.writes(),
        conflicts = applied.conflicts.len(),
        "Imported restaurant bundle"
    );
    Ok(applied)
}

// ── Apply ───────────────────────────────────────────────────────────

struct BundleImport<'a> {
    bundle: &'a Bundle,
    policy: ConflictPolicy,
    /// Natural key → id, filled as rows are matched or created
    categories: HashMap<String, Uuid>,
    ingredients: HashMap<String, Uuid>,
    applied: AppliedBundle,
}

impl<'a> BundleImport<'a> {
    fn new(bundle: &'a Bundle, policy: ConflictPolicy) -> Self {
        Self {
            bundle,
            policy,
            categories: HashMap::new(),
            ingredients: HashMap::new(),
            applied: AppliedBundle::default(),
        }
    }

    fn plan<T: Entity>(&mut self, incoming: &T, matched: &Match<T>) -> Plan {
        let plan = plan(self.policy, incoming, matched);
        self.applied.stats.counts_mut(T::KIND).record(plan.action);

        if matches!(plan.action, Action::Update | Action::Skip) {
            tracing::debug!(
                entity = %T::KIND,
                key = incoming.natural_key(),
                action = ?plan.action,
                fields = ?plan.changes,
                "Resolved conflict"
            );
            self.applied.conflicts.push(ResolvedConflict {
                entity: T::KIND,
                key: incoming.natural_key().to_string(),
                action: plan.action,
                fields: plan.changes.iter().map(|f| f.to_string()).collect(),
            });
        }
        plan
    }

    async fn run(mut self, conn: &mut PgConnection) -> SyncResult<AppliedBundle> {
        let bundle = self.bundle;

        // Restaurant
        let r = &bundle.restaurant;
        let matched = Match::from(db::restaurant::find_by_slug(conn, &r.slug).await?);
        let plan = self.plan(r, &matched);
        let restaurant_id = match matched {
            Match::New => db::restaurant::insert(conn, r).await?,
            Match::Existing { id, .. } => {
                if plan.action == Action::Update {
                    db::restaurant::update(conn, id, r).await?;
                }
                id
            }
        };

        // Ingredients
        for ing in &bundle.ingredients {
            let matched = Match::from(db::ingredient::find_by_name(conn, &ing.name).await?);
            let plan = self.plan(ing, &matched);
            let id = match matched {
                Match::New => db::ingredient::insert(conn, ing).await?,
                Match::Existing { id, .. } => {
                    if plan.action == Action::Update {
                        db::ingredient::update(conn, id, ing).await?;
                    }
                    id
                }
            };
            self.ingredients.insert(ing.name.clone(), id);
        }

        // Categories
        for cat in &bundle.categories {
            let matched = Match::from(
                db::category::find_by_name(conn, restaurant_id, &cat.name).await?,
            );
            let plan = self.plan(cat, &matched);
            let id = match matched {
                Match::New => db::category::insert(conn, restaurant_id, cat).await?,
                Match::Existing { id, .. } => {
                    if plan.action == Action::Update {
                        db::category::update(conn, id, cat).await?;
                    }
                    id
                }
            };
            self.categories.insert(cat.name.clone(), id);
        }

        // Items, then their ingredient rows
        for incoming in &bundle.items {
            let matched = Match::from(
                db::menu_item::find_by_name(conn, restaurant_id, &incoming.name).await?,
            );
            let item = self
                .retain_hidden_category(conn, restaurant_id, incoming, &matched)
                .await?;

            let category_id = match &item.category_name {
                Some(name) => Some(self.category_id(conn, restaurant_id, &item.name, name).await?),
                None => None,
            };
            let mut links = Vec::with_capacity(item.ingredients.len());
            for link in &incoming.ingredients {
                let id = self
                    .ingredient_id(conn, &item.name, &link.ingredient_name)
                    .await?;
                links.push((id, link));
            }

            let plan = self.plan(&*item, &matched);
            let item_id = match matched {
                Match::New => Some(db::menu_item::insert(conn, restaurant_id, category_id, &item).await?),
                Match::Existing { id, .. } if plan.action == Action::Update => {
                    db::menu_item::update(conn, id, category_id, &item).await?;
                    Some(id)
                }
                Match::Existing { .. } => None,
            };
            if let Some(item_id) = item_id {
                db::menu_item::replace_ingredients(conn, item_id, &links).await?;
                self.applied.stats.associations_replaced += 1;
            }
        }

        Ok(self.applied)
    }

    /// A default export lists items of an inactive category with no category.
    /// When the stored item sits in such a category and the bundle does not
    /// carry it, keep the stored category instead of detaching the item.
    async fn retain_hidden_category<'b>(
        &mut self,
        conn: &mut PgConnection,
        restaurant_id: Uuid,
        incoming: &'b MenuItem,
        matched: &Match<MenuItem>,
    ) -> SyncResult<Cow<'b, MenuItem>> {
        let stored = match (&incoming.category_name, matched) {
            (None, Match::Existing { current, .. }) => current.category_name.as_deref(),
            _ => None,
        };
        let Some(stored) = stored else {
            return Ok(Cow::Borrowed(incoming));
        };
        if self.categories.contains_key(stored) {
            return Ok(Cow::Borrowed(incoming));
        }

        match db::category::find_by_name(conn, restaurant_id, stored).await? {
            Some((id, category)) if !category.is_active => {
                tracing::debug!(
                    item = %incoming.name,
                    category = %stored,
                    "Keeping inactive category of stored item"
                );
                self.categories.insert(stored.to_string(), id);
                Ok(Cow::Owned(MenuItem {
                    category_name: Some(stored.to_string()),
                    ..incoming.clone()
                }))
            }
            _ => Ok(Cow::Borrowed(incoming)),
        }
    }

    /// Resolve a category reference: this bundle first, then the target
    async fn category_id(
        &mut self,
        conn: &mut PgConnection,
        restaurant_id: Uuid,
        item: &str,
        name: &str,
    ) -> SyncResult<Uuid> {
        if let Some(id) = self.categories.get(name) {
            return Ok(*id);
        }
        match db::category::find_by_name(conn, restaurant_id, name).await? {
            Some((id, _)) => {
                self.categories.insert(name.to_string(), id);
                Ok(id)
            }
            None => Err(SyncError::invalid(
                ErrorCode::CategoryNotFound,
                format!("menu item '{item}' references unknown category '{name}'"),
            )),
        }
    }

    /// Resolve an ingredient reference: this bundle first, then the catalog
    async fn ingredient_id(
        &mut self,
        conn: &mut PgConnection,
        item: &str,
        name: &str,
    ) -> SyncResult<Uuid> {
        if let Some(id) = self.ingredients.get(name) {
            return Ok(*id);
        }
        match db::ingredient::find_by_name(conn, name).await? {
            Some((id, _)) => {
                self.ingredients.insert(name.to_string(), id);
                Ok(id)
            }
            None => Err(SyncError::invalid(
                ErrorCode::IngredientNotFound,
                format!("menu item '{item}' references unknown ingredient '{name}'"),
            )),
        }
    }
}
