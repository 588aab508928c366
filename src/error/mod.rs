// Error types for the activity recognizer
//
// The recognition pipeline itself never fails: degenerate input becomes a
// status value. Errors only arise at the edges, so this module covers
// persistence, the sync mailboxes, and configuration validation.

mod config;
mod storage;
mod sync;

pub use config::{log_config_error, ConfigError, ConfigErrorCodes};
pub use storage::{log_storage_error, StorageError, StorageErrorCodes};
pub use sync::{log_sync_error, SyncError, SyncErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so the sampling and display loops can log
/// failures uniformly.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
