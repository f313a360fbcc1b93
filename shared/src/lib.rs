//! Shared types for menu-sync
//!
//! Domain models carried by export documents and the unified error-code
//! system used in reports and CLI output.

pub mod error;
pub mod models;

// Re-exports
pub use error::{AppError, ErrorCode};
pub use serde::{Deserialize, Serialize};
