// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 5001-5003
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// A recognition pipeline parameter is unusable
    pub const INVALID_PIPELINE: i32 = 5001;

    /// A sampling parameter is unusable
    pub const INVALID_SAMPLING: i32 = 5002;

    /// A gravity filter constant is unusable
    pub const INVALID_FILTER: i32 = 5003;
}

/// Log a configuration error with structured context
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=AppConfig, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A recognition pipeline parameter is unusable
    InvalidPipeline { field: &'static str, reason: String },

    /// A sampling parameter is unusable
    InvalidSampling { field: &'static str, reason: String },

    /// A gravity filter constant is unusable
    InvalidFilter { field: &'static str, reason: String },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidPipeline { .. } => ConfigErrorCodes::INVALID_PIPELINE,
            ConfigError::InvalidSampling { .. } => ConfigErrorCodes::INVALID_SAMPLING,
            ConfigError::InvalidFilter { .. } => ConfigErrorCodes::INVALID_FILTER,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidPipeline { field, reason } => {
                format!("Invalid pipeline.{}: {}", field, reason)
            }
            ConfigError::InvalidSampling { field, reason } => {
                format!("Invalid sampling.{}: {}", field, reason)
            }
            ConfigError::InvalidFilter { field, reason } => {
                format!("Invalid filter.{}: {}", field, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
