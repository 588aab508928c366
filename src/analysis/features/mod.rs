// FeatureExtractor - gravity-relative motion statistics for activity classification
//
// Every window sample is folded into the gravity low-pass filter, then its
// linear acceleration (sample minus gravity estimate) is split into a
// vertical component along gravity and a horizontal magnitude orthogonal to
// it. Window statistics of both components form the classifier's feature
// vector.
//
// Module organization:
// - types: Data structures (Feature, Projection, WindowFeatures)
// - projection: Per-sample gravity split
// - statistics: Running sums and vertical extremes
// - mod.rs: Coordinator (FeatureExtractor)
//
// The filter lives here and persists across windows. With a half-slide
// window the retained samples are filtered a second time on the next pass.

mod projection;
mod statistics;
mod types;

pub use types::{Feature, Projection, WindowFeatures};

use crate::analysis::filter::LowPassFilter;
use crate::config::FilterConfig;
use crate::sensor::Sample;
use statistics::RunningMoments;

/// FeatureExtractor owns the gravity filter and turns windows into features
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    filter: LowPassFilter,
}

impl FeatureExtractor {
    /// Create an extractor with a freshly zeroed gravity estimate
    ///
    /// # Arguments
    /// * `config` - Filter constants
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            filter: LowPassFilter::new(config),
        }
    }

    /// Current gravity estimate
    pub fn gravity(&self) -> Sample {
        self.filter.gravity()
    }

    /// Extract features from one full window
    ///
    /// # Arguments
    /// * `samples` - Raw window samples in arrival order (at least two)
    ///
    /// # Returns
    /// Feature vector, per-sample projections and the vertical extremes
    pub fn extract(&mut self, samples: &[Sample]) -> WindowFeatures {
        let mut moments = RunningMoments::new();
        let mut projections = Vec::with_capacity(samples.len());

        for &sample in samples {
            self.filter.update(sample);
            let (v, h) = projection::split(sample, self.filter.gravity());

            let vertical = v as i16;
            moments.push(v, h as f64, vertical);
            projections.push(Projection {
                vertical,
                horizontal: h.min(u16::MAX as u32) as u16,
            });
        }

        WindowFeatures {
            feature: moments.finish(samples.len()),
            projections,
            min_v: moments.min_v,
            max_v: moments.max_v,
        }
    }
}
