//! Configuration management for the recognition pipeline
//!
//! This module provides runtime configuration loading from JSON files so
//! sampling, filter and pipeline parameters can be adjusted without
//! recompilation. User-facing settings (sensitivity, reset time, driving)
//! are not part of this document; they live in the key-value store and
//! arrive over the sync mailboxes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampling: SamplingConfig,
    pub filter: FilterConfig,
    pub pipeline: PipelineConfig,
    pub data_log: DataLogConfig,
    pub storage: StorageConfig,
}

/// Sensor sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Nominal accelerometer sampling rate
    pub rate_hz: u32,
    /// Samples delivered per sensor callback
    pub batch_size: usize,
    /// Seconds of data per classification window
    pub interval_secs: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rate_hz: 10,
            batch_size: 10,
            interval_secs: 8,
        }
    }
}

impl SamplingConfig {
    /// Number of samples held by one classification window
    ///
    /// Saturates on absurd values; `validate` rejects those.
    pub fn window_size(&self) -> usize {
        self.batch_size.saturating_mul(self.interval_secs)
    }

    /// Reject parameters that cannot produce a usable window
    ///
    /// Feature statistics divide by `window_size - 1`, so at least two
    /// samples are required.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_hz == 0 {
            return Err(ConfigError::InvalidSampling {
                field: "rate_hz",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidSampling {
                field: "batch_size",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.batch_size.checked_mul(self.interval_secs).is_none() {
            return Err(ConfigError::InvalidSampling {
                field: "interval_secs",
                reason: "window size overflows".to_string(),
            });
        }
        if self.window_size() < 2 {
            return Err(ConfigError::InvalidSampling {
                field: "interval_secs",
                reason: format!(
                    "window of {} samples is smaller than 2",
                    self.window_size()
                ),
            });
        }
        Ok(())
    }
}

/// Gravity low-pass filter constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Filter update rate used to derive the sample period
    pub rate_hz: f64,
    /// Cutoff frequency used to derive RC
    pub cutoff_hz: f64,
    /// Magnitude change treated as noise floor
    pub min_step: f64,
    /// Damping divisor applied while the signal looks like steady gravity
    pub noise_attenuation: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rate_hz: 100.0,
            cutoff_hz: 100.0,
            min_step: 0.02,
            noise_attenuation: 3.0,
        }
    }
}

impl FilterConfig {
    /// Blend constant `dt / (dt + RC)`
    pub fn filter_constant(&self) -> f64 {
        let dt = 1.0 / self.rate_hz;
        let rc = 1.0 / self.cutoff_hz;
        dt / (dt + rc)
    }

    /// Every constant must be a finite positive number, otherwise the
    /// blend factor turns into NaN or infinity
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("rate_hz", self.rate_hz),
            ("cutoff_hz", self.cutoff_hz),
            ("min_step", self.min_step),
            ("noise_attenuation", self.noise_attenuation),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidFilter {
                    field,
                    reason: format!("{} is not a positive number", value),
                });
            }
        }
        Ok(())
    }
}

/// What happens to the window after a classification pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Empty the window; the next pass needs a full window of new samples
    FullReset,
    /// Keep the newest half as the seed of the next window
    HalfSlide,
}

/// Recognition pipeline variant parameters
///
/// The two shipped variants differ only in these knobs: how the window is
/// drained, where the step scan starts (index 0 or 1), the crossing divisor
/// (2 or 4) and the walking ceiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub drain_policy: DrainPolicy,
    /// First window index examined by the step scan
    pub scan_start: usize,
    /// Raw crossings per counted step
    pub step_divisor: u32,
    /// Steps-per-second ceiling for walking; `None` disables the correction
    pub max_walking_speed: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::sliding()
    }
}

impl PipelineConfig {
    /// Half-window slide, scan from index 0, four crossings per step
    pub fn sliding() -> Self {
        Self {
            drain_policy: DrainPolicy::HalfSlide,
            scan_start: 0,
            step_divisor: 4,
            max_walking_speed: Some(3),
        }
    }

    /// Full reset after each pass, scan from index 1, two crossings per step
    pub fn full_reset() -> Self {
        Self {
            drain_policy: DrainPolicy::FullReset,
            scan_start: 1,
            step_divisor: 2,
            max_walking_speed: Some(2),
        }
    }

    /// Check the variant parameters against the window they will run on
    ///
    /// # Arguments
    /// * `window_size` - Capacity of the sliding window
    pub fn validate(&self, window_size: usize) -> Result<(), ConfigError> {
        if self.step_divisor == 0 {
            return Err(ConfigError::InvalidPipeline {
                field: "step_divisor",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.scan_start >= window_size {
            return Err(ConfigError::InvalidPipeline {
                field: "scan_start",
                reason: format!("{} is outside a window of {}", self.scan_start, window_size),
            });
        }
        if self.max_walking_speed == Some(0) {
            return Err(ConfigError::InvalidPipeline {
                field: "max_walking_speed",
                reason: "use null to disable the ceiling".to_string(),
            });
        }
        Ok(())
    }
}

/// Data-log cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataLogConfig {
    /// Minimum counter time advance between two records
    pub interval_secs: u32,
}

impl Default for DataLogConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

/// File locations for persisted state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON key-value document holding counter and settings
    pub state_path: PathBuf,
    /// Append-only binary data-log file
    pub data_log_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("tracker_state.json"),
            data_log_path: PathBuf::from("tracker_datalog.bin"),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or defaults if the file doesn't exist or
    /// its JSON is invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Validate every section that can make the pipeline unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampling.validate()?;
        self.filter.validate()?;
        self.pipeline.validate(self.sampling.window_size())
    }
}
