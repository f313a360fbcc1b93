//! Unified error system for menu-sync
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Catalog errors
//! - 2xxx: Transfer errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::UnsupportedVersion);
//! assert_eq!(err.exit_status(), 2);
//!
//! let err = AppError::with_message(ErrorCode::RequiredField, "Missing restaurant.slug")
//!     .with_detail("bundle", "#0");
//! assert_eq!(err.exit_status(), 2);
//! ```

mod category;
mod codes;
mod exit;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use exit::{EXIT_DIFFERENCES, EXIT_FATAL, EXIT_OK};
pub use types::AppError;
