// TrackerSettings - user settings read by the recognition pipeline
//
// Settings are supplied from outside: loaded from the key-value store at
// start-up and updated by sync messages from the display side. Defaults
// match a fresh install.

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::sync::MessageTag;

/// Sensitivity applied when none has been stored
pub const DEFAULT_SENSITIVITY: u8 = 20;

pub const MAX_SENSITIVITY: u8 = 100;

/// Reset time is minutes since local midnight
pub const MAX_RESET_MINUTES: u16 = 24 * 60 - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// Pedometer sensitivity, 0..=100
    #[serde(default = "default_sensitivity")]
    pub sensitivity: u8,
    /// Daily reset time, minutes since local midnight
    #[serde(default)]
    pub reset_minutes: u16,
    /// Vehicle detected; Walk and Jog are reported as Sit
    #[serde(default)]
    pub driving: bool,
}

fn default_sensitivity() -> u8 {
    DEFAULT_SENSITIVITY
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            reset_minutes: 0,
            driving: false,
        }
    }
}

impl TrackerSettings {
    pub fn set_sensitivity(&mut self, value: u16) -> Result<(), SyncError> {
        if value > MAX_SENSITIVITY as u16 {
            return Err(SyncError::InvalidValue {
                tag: MessageTag::Sensitivity.id(),
                value,
            });
        }
        self.sensitivity = value as u8;
        Ok(())
    }

    pub fn set_reset_minutes(&mut self, value: u16) -> Result<(), SyncError> {
        if value > MAX_RESET_MINUTES {
            return Err(SyncError::InvalidValue {
                tag: MessageTag::ResetTime.id(),
                value,
            });
        }
        self.reset_minutes = value;
        Ok(())
    }

    /// Any non-zero value means driving
    pub fn set_driving(&mut self, value: u16) {
        self.driving = value != 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TrackerSettings::default();
        assert_eq!(settings.sensitivity, 20);
        assert_eq!(settings.reset_minutes, 0);
        assert!(!settings.driving);
    }

    #[test]
    fn test_range_checks() {
        let mut settings = TrackerSettings::default();
        assert!(settings.set_sensitivity(100).is_ok());
        assert_eq!(
            settings.set_sensitivity(101),
            Err(SyncError::InvalidValue {
                tag: 101,
                value: 101
            })
        );
        assert_eq!(settings.sensitivity, 100);

        assert!(settings.set_reset_minutes(1439).is_ok());
        assert!(settings.set_reset_minutes(1440).is_err());
        assert_eq!(settings.reset_minutes, 1439);
    }

    #[test]
    fn test_driving_flag() {
        let mut settings = TrackerSettings::default();
        settings.set_driving(1);
        assert!(settings.driving);
        settings.set_driving(0);
        assert!(!settings.driving);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: TrackerSettings = serde_json::from_str(r#"{ "driving": true }"#).unwrap();
        assert_eq!(settings.sensitivity, 20);
        assert!(settings.driving);
    }
}
