// Types module - Data structures for window features
//
// This module defines the values produced by one pass of the feature
// extractor: the classifier's feature vector and the per-sample gravity
// projections the step counter scans.

use serde::{Deserialize, Serialize};

/// Summary statistics of one window
///
/// Vertical values are the linear acceleration projected onto the gravity
/// estimate (signed); horizontal values are the magnitude orthogonal to it.
/// Means and deviations divide by `N - 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Mean vertical linear acceleration
    pub mean_v: f64,
    /// Mean horizontal linear acceleration
    pub mean_h: f64,
    /// Mean of squares minus squared mean, vertical
    pub deviation_v: f64,
    /// Mean of squares minus squared mean, horizontal
    pub deviation_h: f64,
}

/// Gravity-aligned split of one sample's linear acceleration
///
/// Both components are truncated to integers; the step counter compares
/// these truncated values against the thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub vertical: i16,
    pub horizontal: u16,
}

/// Everything the rest of the pipeline needs from one window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowFeatures {
    pub feature: Feature,
    /// One projection per window sample, in window order
    pub projections: Vec<Projection>,
    /// Smallest truncated vertical value
    pub min_v: i16,
    /// Largest truncated vertical value
    pub max_v: i16,
}
