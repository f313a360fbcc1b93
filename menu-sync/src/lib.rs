//! menu-sync: move restaurant data between PostgreSQL environments
//!
//! - [`export`]: one or all restaurants → versioned JSON document
//! - [`import`]: document → target database, upsert by natural key
//! - [`compare`]: two databases or documents → structural diff
//!
//! Configuration is loaded once ([`config::Config`]) and passed down; no
//! module below the CLI reads the environment.

pub mod compare;
pub mod config;
pub mod db;
pub mod diff;
pub mod document;
pub mod error;
pub mod export;
pub mod import;
pub mod report;
pub mod validation;

pub use config::{Config, DatabaseConfig, Target};
pub use error::{SyncError, SyncResult};
