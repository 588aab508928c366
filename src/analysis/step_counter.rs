// StepCounter - hysteresis step detection over vertical projections
//
// A Schmitt trigger on the window's vertical component: rising above the
// upper threshold after having been below the lower one counts a crossing,
// and so does the reverse. The band sits between the window mean and its
// extremes, scaled by the pedometer sensitivity for walking. Jogging uses
// no band at all.
//
// Raw crossings are divided by the configured divisor to get steps.

use crate::analysis::classifier::ActivityType;
use crate::analysis::features::WindowFeatures;
use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    None,
    Up,
    Down,
}

/// Hysteresis band for one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepThresholds {
    pub upper: f64,
    pub lower: f64,
}

impl StepThresholds {
    /// # Arguments
    /// * `window` - Features of the classified window
    /// * `activity` - Final activity; only Walk uses the sensitivity ratio
    /// * `sensitivity` - Pedometer sensitivity, 0..=100
    pub fn new(window: &WindowFeatures, activity: ActivityType, sensitivity: u8) -> Self {
        let ratio = if activity == ActivityType::Walk {
            sensitivity.min(100) as f64 / 100.0
        } else {
            0.0
        };
        let mean = window.feature.mean_v;
        Self {
            upper: mean + (window.max_v as f64 - mean) * ratio,
            lower: mean + (window.min_v as f64 - mean) * ratio,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepCounter {
    scan_start: usize,
    divisor: u32,
    max_walking_speed: Option<u32>,
}

impl StepCounter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            scan_start: config.scan_start,
            divisor: config.step_divisor.max(1),
            max_walking_speed: config.max_walking_speed,
        }
    }

    /// Direction reversals across the band, before division
    pub fn crossings(&self, window: &WindowFeatures, thresholds: StepThresholds) -> u32 {
        let mut direction = Direction::None;
        let mut crossings = 0;

        for projection in window.projections.iter().skip(self.scan_start) {
            let v = projection.vertical as f64;
            if v > thresholds.upper {
                if direction == Direction::Down {
                    crossings += 1;
                }
                direction = Direction::Up;
            } else if v < thresholds.lower {
                if direction == Direction::Up {
                    crossings += 1;
                }
                direction = Direction::Down;
            }
        }
        crossings
    }

    /// Steps detected in one window
    ///
    /// Sleep and Sit windows never contain steps.
    pub fn count(&self, window: &WindowFeatures, activity: ActivityType, sensitivity: u8) -> u32 {
        if !activity.is_ambulatory() {
            return 0;
        }
        let thresholds = StepThresholds::new(window, activity, sensitivity);
        self.crossings(window, thresholds) / self.divisor
    }

    /// Walking faster than the ceiling is vehicle vibration, not walking
    ///
    /// # Arguments
    /// * `activity` - Final activity of the window
    /// * `steps` - Steps counted in the window
    /// * `elapsed_secs` - Seconds accounted to the window
    pub fn is_implausible(&self, activity: ActivityType, steps: u32, elapsed_secs: u32) -> bool {
        match self.max_walking_speed {
            Some(ceiling) if activity == ActivityType::Walk => {
                steps as u64 > elapsed_secs as u64 * ceiling as u64
            }
            _ => false,
        }
    }
}
