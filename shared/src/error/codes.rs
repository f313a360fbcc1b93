//! Unified error codes for menu-sync
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Catalog errors (restaurants, categories, items, ingredients)
//! - 2xxx: Transfer errors (export documents, import bundles)
//! - 9xxx: System errors (database, filesystem, configuration)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Represented as u16 so reports stay compact when serialized as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Catalog ====================
    /// Restaurant slug is not URL-safe
    InvalidSlug = 1002,
    /// Category referenced by an item does not exist
    CategoryNotFound = 1101,
    /// Two categories share a name inside one restaurant
    CategoryNameExists = 1102,
    /// Two items share a name inside one restaurant
    ItemNameExists = 1201,
    /// Item price is negative
    ItemInvalidPrice = 1202,
    /// Spice level outside 0..=5
    SpiceLevelOutOfRange = 1203,
    /// Ingredient referenced by an item does not exist
    IngredientNotFound = 1301,
    /// Ingredient listed twice in the same scope
    IngredientDuplicate = 1302,

    // ==================== 2xxx: Transfer ====================
    /// Document version tag is missing or unsupported
    UnsupportedVersion = 2001,
    /// Document does not have the expected shape
    MalformedDocument = 2002,
    /// One bundle of a multi-restaurant import failed
    BundleFailed = 2003,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Database unreachable or authentication failed
    ConnectionFailed = 9003,
    /// Natural-key collision or other constraint violation
    ConstraintViolation = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Filesystem read/write failure
    IoError = 9401,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Catalog
            ErrorCode::InvalidSlug => "Restaurant slug is not URL-safe",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryNameExists => "Category name already exists",
            ErrorCode::ItemNameExists => "Menu item name already exists",
            ErrorCode::ItemInvalidPrice => "Menu item has invalid price",
            ErrorCode::SpiceLevelOutOfRange => "Spice level must be between 0 and 5",
            ErrorCode::IngredientNotFound => "Ingredient not found",
            ErrorCode::IngredientDuplicate => "Ingredient listed more than once",

            // Transfer
            ErrorCode::UnsupportedVersion => "Unsupported export document version",
            ErrorCode::MalformedDocument => "Malformed export document",
            ErrorCode::BundleFailed => "Restaurant bundle failed to import",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConnectionFailed => "Database connection failed",
            ErrorCode::ConstraintViolation => "Constraint violation",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::IoError => "File read/write failed",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Catalog
            1002 => Ok(ErrorCode::InvalidSlug),
            1101 => Ok(ErrorCode::CategoryNotFound),
            1102 => Ok(ErrorCode::CategoryNameExists),
            1201 => Ok(ErrorCode::ItemNameExists),
            1202 => Ok(ErrorCode::ItemInvalidPrice),
            1203 => Ok(ErrorCode::SpiceLevelOutOfRange),
            1301 => Ok(ErrorCode::IngredientNotFound),
            1302 => Ok(ErrorCode::IngredientDuplicate),

            // Transfer
            2001 => Ok(ErrorCode::UnsupportedVersion),
            2002 => Ok(ErrorCode::MalformedDocument),
            2003 => Ok(ErrorCode::BundleFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConnectionFailed),
            9004 => Ok(ErrorCode::ConstraintViolation),
            9005 => Ok(ErrorCode::ConfigError),
            9401 => Ok(ErrorCode::IoError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
