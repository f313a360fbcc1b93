//! Error taxonomy for menu-sync
//!
//! `SyncError` is what the database, document and pipeline layers return.
//! It converts into the serializable [`AppError`] carried by reports and
//! printed by the CLI, so every failure ends up with a stable [`ErrorCode`].

use std::path::PathBuf;

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Selector matched no record
    #[error("{0} not found")]
    NotFound(String),

    /// Document or bundle content is unusable
    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    /// Database unreachable or authentication failed
    #[error("database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// Natural-key collision or other constraint violation
    #[error("{message}")]
    Constraint { code: ErrorCode, message: String },

    /// Filesystem read/write failure
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other query failure
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
        }
    }

    pub fn invalid(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn constraint(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Constraint {
            code,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::NotFound(_) => ErrorCode::NotFound,
            SyncError::Validation { code, .. } | SyncError::Constraint { code, .. } => *code,
            SyncError::Connection(_) => ErrorCode::ConnectionFailed,
            SyncError::Io { .. } => ErrorCode::IoError,
            SyncError::Database(_) | SyncError::Migrate(_) => ErrorCode::DatabaseError,
            SyncError::Config(_) => ErrorCode::ConfigError,
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match &e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_) => SyncError::Connection(e),
            // 28xxx: invalid authorization, 3D000: unknown database
            sqlx::Error::Database(db)
                if db
                    .code()
                    .is_some_and(|c| c.starts_with("28") || c == "3D000") =>
            {
                SyncError::Connection(e)
            }
            sqlx::Error::Database(db)
                if matches!(
                    db.kind(),
                    ErrorKind::UniqueViolation
                        | ErrorKind::ForeignKeyViolation
                        | ErrorKind::NotNullViolation
                        | ErrorKind::CheckViolation
                ) =>
            {
                let message = match db.constraint() {
                    Some(constraint) => format!("{} ({constraint})", db.message()),
                    None => db.message().to_string(),
                };
                SyncError::constraint(ErrorCode::ConstraintViolation, message)
            }
            _ => SyncError::Database(e),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::invalid(ErrorCode::MalformedDocument, e.to_string())
    }
}

impl From<SyncError> for AppError {
    fn from(e: SyncError) -> Self {
        let code = e.code();
        let message = e.to_string();
        match e {
            SyncError::NotFound(resource) => {
                AppError::with_message(code, message).with_detail("resource", resource)
            }
            SyncError::Io { path, .. } => AppError::with_message(code, message)
                .with_detail("path", path.display().to_string()),
            _ => AppError::with_message(code, message),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
