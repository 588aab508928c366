// Storage error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Storage error code constants
///
/// Error code range: 3001-3005
pub struct StorageErrorCodes {}

impl StorageErrorCodes {
    /// Reading or writing the backing file failed
    pub const IO: i32 = 3001;

    /// The persisted document could not be parsed
    pub const CORRUPT: i32 = 3002;

    /// A key holds a value of a different kind than requested
    pub const TYPE_MISMATCH: i32 = 3003;

    /// The shared store mutex was poisoned
    pub const LOCK_POISONED: i32 = 3004;

    /// The data-log sink rejected a record
    pub const DATA_LOG: i32 = 3005;
}

/// Log a storage error with structured context
///
/// Storage failures are never fatal for the loops; callers log and fall
/// back to defaults.
pub fn log_storage_error(err: &StorageError, context: &str) {
    error!(
        "Storage error in {}: code={}, component=KeyValueStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Persistence errors
///
/// Error code range: 3001-3005
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    Io { path: String, reason: String },

    /// The persisted document could not be parsed
    Corrupt { reason: String },

    /// A key holds a value of a different kind than requested
    TypeMismatch { key: u32, expected: &'static str },

    /// The shared store mutex was poisoned
    LockPoisoned,

    /// The data-log sink rejected a record
    DataLog { reason: String },
}

impl ErrorCode for StorageError {
    fn code(&self) -> i32 {
        match self {
            StorageError::Io { .. } => StorageErrorCodes::IO,
            StorageError::Corrupt { .. } => StorageErrorCodes::CORRUPT,
            StorageError::TypeMismatch { .. } => StorageErrorCodes::TYPE_MISMATCH,
            StorageError::LockPoisoned => StorageErrorCodes::LOCK_POISONED,
            StorageError::DataLog { .. } => StorageErrorCodes::DATA_LOG,
        }
    }

    fn message(&self) -> String {
        match self {
            StorageError::Io { path, reason } => format!("I/O failure on {}: {}", path, reason),
            StorageError::Corrupt { reason } => format!("Corrupt store document: {}", reason),
            StorageError::TypeMismatch { key, expected } => {
                format!("Key {} does not hold a {} value", key, expected)
            }
            StorageError::LockPoisoned => "Shared store lock poisoned".to_string(),
            StorageError::DataLog { reason } => format!("Data log write failed: {}", reason),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StorageError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for StorageError {}
