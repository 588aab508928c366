// Classifier - fixed linear activity model
//
// Four linear discriminants, one per activity, evaluated over the window
// Feature. The highest score wins; classes are evaluated in index order and
// a later class must score strictly higher to replace the running best, so
// exact ties go to the lower index.
//
// The weights come from an offline-trained model and are never tuned at
// runtime.
//
// A driving override turns Walk and Jog into Sit: vehicle vibration must not
// be counted as exercise.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::features::Feature;

/// Activity classes, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ActivityType {
    Sleep = 0,
    Sit = 1,
    Walk = 2,
    Jog = 3,
}

impl ActivityType {
    pub const ALL: [ActivityType; 4] = [
        ActivityType::Sleep,
        ActivityType::Sit,
        ActivityType::Walk,
        ActivityType::Jog,
    ];

    /// Wire and storage index
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u16) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Walk and Jog
    pub fn is_ambulatory(self) -> bool {
        matches!(self, ActivityType::Walk | ActivityType::Jog)
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivityType::Sleep => "sleep",
            ActivityType::Sit => "sit",
            ActivityType::Walk => "walk",
            ActivityType::Jog => "jog",
        };
        f.write_str(name)
    }
}

/// One linear discriminant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassWeights {
    pub bias: f64,
    pub mean_v: f64,
    pub mean_h: f64,
    pub deviation_v: f64,
    pub deviation_h: f64,
}

impl ClassWeights {
    const fn new(bias: f64, mean_v: f64, mean_h: f64, deviation_v: f64, deviation_h: f64) -> Self {
        Self {
            bias,
            mean_v,
            mean_h,
            deviation_v,
            deviation_h,
        }
    }

    /// `bias + w·feature`, summed in a fixed order
    pub fn score(&self, feature: &Feature) -> f64 {
        self.bias
            + feature.mean_v * self.mean_v
            + feature.mean_h * self.mean_h
            + feature.deviation_v * self.deviation_v
            + feature.deviation_h * self.deviation_h
    }
}

/// Pretrained weights, indexed by `ActivityType`
pub const ACTIVITY_WEIGHTS: [ClassWeights; 4] = [
    ClassWeights::new(6.95, 0.87, -0.26, -0.03, -0.11),
    ClassWeights::new(2.7, 0.05, -0.05, 0.0, 0.0),
    ClassWeights::new(-3.73, -0.16, 0.1, 0.0, 0.0),
    ClassWeights::new(-65.76, 0.0, 0.31, 0.0, 0.0),
];

/// Result of classifying one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Argmax of the linear model
    pub raw: ActivityType,
    /// After the driving override
    pub activity: ActivityType,
}

impl Classification {
    pub fn driving_override_applied(&self) -> bool {
        self.raw != self.activity
    }
}

/// Classifier evaluates the linear model over a window Feature
#[derive(Debug, Clone)]
pub struct Classifier {
    weights: [ClassWeights; 4],
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    /// Classifier with the pretrained weights
    pub fn new() -> Self {
        Self {
            weights: ACTIVITY_WEIGHTS,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_weights(weights: [ClassWeights; 4]) -> Self {
        Self { weights }
    }

    /// Per-class scores in class order
    pub fn scores(&self, feature: &Feature) -> [f64; 4] {
        let mut scores = [0.0; 4];
        for (score, weights) in scores.iter_mut().zip(self.weights.iter()) {
            *score = weights.score(feature);
        }
        scores
    }

    /// Argmax class, first-evaluated class winning ties
    ///
    /// A NaN score never replaces the running best.
    pub fn classify(&self, feature: &Feature) -> ActivityType {
        let scores = self.scores(feature);
        let mut best = 0;
        for index in 1..scores.len() {
            if scores[index] > scores[best] {
                best = index;
            }
        }
        ActivityType::ALL[best]
    }

    /// Classify and apply the driving override
    ///
    /// # Arguments
    /// * `feature` - Window statistics
    /// * `driving` - Externally supplied driving flag
    pub fn classify_with_override(&self, feature: &Feature, driving: bool) -> Classification {
        let raw = self.classify(feature);
        let activity = if driving && raw.is_ambulatory() {
            ActivityType::Sit
        } else {
            raw
        };
        Classification { raw, activity }
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod classifier_tests;
