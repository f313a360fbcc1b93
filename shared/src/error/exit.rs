//! Process exit status mapping for error codes
//!
//! The CLI follows the `diff(1)` convention: 0 means success / identical,
//! 1 means the run completed but found differences or partial failures,
//! 2 means a fatal error stopped the run.

use super::codes::ErrorCode;

/// Run completed and nothing needs attention
pub const EXIT_OK: u8 = 0;
/// Run completed with differences (compare) or failed bundles (import)
pub const EXIT_DIFFERENCES: u8 = 1;
/// Run aborted by a fatal error
pub const EXIT_FATAL: u8 = 2;

impl ErrorCode {
    /// Get the process exit status for an invocation that ended with this code
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Success => EXIT_OK,
            Self::BundleFailed => EXIT_DIFFERENCES,
            _ => EXIT_FATAL,
        }
    }
}
