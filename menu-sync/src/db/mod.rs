//! PostgreSQL access layer
//!
//! Free async functions over `&mut PgConnection`, so the same code runs on a
//! pooled connection or inside a transaction (`&mut *tx`). Rows are decoded
//! into local `Row` structs and mapped onto `shared::models` types; surrogate
//! ids stay in this layer.

pub mod category;
pub mod ingredient;
pub mod menu_item;
pub mod restaurant;

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::error::{SyncError, SyncResult};

/// Open a connection pool for `config`
pub async fn connect(config: &DatabaseConfig) -> SyncResult<PgPool> {
    let mut options = PgConnectOptions::from_str(&config.url).map_err(|e| {
        SyncError::Config(format!(
            "invalid {} database URL {}: {e}",
            config.label,
            config.redacted_url()
        ))
    })?;
    if let Some(schema) = &config.schema {
        options = options.options([("search_path", schema.as_str())]);
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await?;

    tracing::info!(
        target_db = %config.label,
        url = %config.redacted_url(),
        "Connected to database"
    );
    Ok(pool)
}

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply pending schema migrations
pub async fn migrate(pool: &PgPool) -> SyncResult<()> {
    MIGRATOR.run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Applied,
    Pending,
    /// Recorded as applied, but the file has changed since
    ChecksumMismatch,
    /// Recorded with `success = false`
    Failed,
    /// Recorded in the database but unknown to this build
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub state: MigrationState,
}

/// Stored migration row: success flag, checksum, description
type AppliedRow = (bool, Vec<u8>, String);

/// Compare the embedded migrations with `_sqlx_migrations` without applying anything
pub async fn migration_status(pool: &PgPool) -> SyncResult<Vec<MigrationStatus>> {
    let mut conn = pool.acquire().await?;
    let (tracked,): (bool,) =
        sqlx::query_as("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(&mut *conn)
            .await?;

    let rows: Vec<(i64, bool, Vec<u8>, String)> = if tracked {
        sqlx::query_as(
            "SELECT version, success, checksum, description FROM _sqlx_migrations ORDER BY version",
        )
        .fetch_all(&mut *conn)
        .await?
    } else {
        vec![]
    };
    let applied: BTreeMap<i64, AppliedRow> = rows
        .into_iter()
        .map(|(version, success, checksum, description)| (version, (success, checksum, description)))
        .collect();

    Ok(classify_migrations(
        MIGRATOR
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .map(|m| (m.version, &*m.description, &*m.checksum)),
        applied,
    ))
}

fn classify_migrations<'m>(
    known: impl Iterator<Item = (i64, &'m str, &'m [u8])>,
    mut applied: BTreeMap<i64, AppliedRow>,
) -> Vec<MigrationStatus> {
    let mut statuses: Vec<MigrationStatus> = known
        .map(|(version, description, checksum)| {
            let state = match applied.remove(&version) {
                None => MigrationState::Pending,
                Some((false, ..)) => MigrationState::Failed,
                Some((true, stored, _)) if stored != checksum => MigrationState::ChecksumMismatch,
                Some(_) => MigrationState::Applied,
            };
            MigrationStatus {
                version,
                description: description.to_string(),
                state,
            }
        })
        .collect();

    statuses.extend(
        applied
            .into_iter()
            .map(|(version, (_, _, description))| MigrationStatus {
                version,
                description,
                state: MigrationState::Unknown,
            }),
    );
    statuses.sort_by_key(|s| s.version);
    statuses
}

/// Decode an optional JSONB column into a typed value.
///
/// `what` names the column for the error message, e.g. `restaurant 'x' avatar_config`.
pub(crate) fn decode_json<T: DeserializeOwned>(
    value: Option<Value>,
    what: impl FnOnce() -> String,
) -> SyncResult<Option<T>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v)
            .map(Some)
            .map_err(|e| SyncError::validation(format!("{} is malformed: {e}", what()))),
    }
}

/// Like [`decode_json`], with `NULL` read as the type's default
pub(crate) fn decode_json_or_default<T: DeserializeOwned + Default>(
    value: Option<Value>,
    what: impl FnOnce() -> String,
) -> SyncResult<T> {
    Ok(decode_json(value, what)?.unwrap_or_default())
}

/// Encode a value for a JSONB bind; `None` binds SQL `NULL`
pub(crate) fn encode_json<T: Serialize>(value: Option<&T>) -> SyncResult<Option<Value>> {
    value
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| SyncError::validation(format!("value cannot be stored as JSON: {e}")))
}
