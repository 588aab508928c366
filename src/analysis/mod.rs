// Analysis module - activity recognition pipeline
//
// This module turns accelerometer batches into activity classifications,
// step counts and elapsed-time accounting. All mutable recognition state is
// owned by one RecognitionPipeline per process.
//
// Architecture:
// - SlidingWindow: collects batches until a full window is available
// - Pipeline: LowPassFilter -> FeatureExtractor -> Classifier -> StepCounter
// - Output: WindowOutcome for every batch; ActivityTimeAccumulator updated
//   on each classification
//
// The daily reset is applied separately through `apply_daily_reset` so the
// caller can emit its data-log record for the pass before counters are
// zeroed.

use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, PipelineConfig};
use crate::error::ConfigError;
use crate::sensor::Sample;
use crate::tracking::{ActivityTimeAccumulator, Counter, TrackerSettings};

pub mod classifier;
pub mod features;
pub mod filter;
pub mod step_counter;
pub mod window;

use classifier::{ActivityType, Classifier};
use features::{Feature, FeatureExtractor};
use step_counter::StepCounter;
use window::SlidingWindow;

/// Everything decided during one classification pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Argmax of the linear model
    pub raw_activity: ActivityType,
    /// Activity the elapsed time was finally accounted to
    pub activity: ActivityType,
    /// Walk or Jog turned into Sit because of the driving flag
    pub driving_override: bool,
    /// Walk turned into Sit because the step rate was implausible
    pub reclassified: bool,
    pub feature: Feature,
    pub min_v: i16,
    pub max_v: i16,
    /// Steps added to the counter by this pass
    pub steps: u32,
    /// Seconds added to the counter by this pass
    pub elapsed_secs: u32,
    /// Counter timestamp before this pass
    pub previous_timestamp: u32,
    /// Counter after this pass
    pub counter: Counter,
}

/// Result of feeding one sensor batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WindowOutcome {
    /// Empty batch; nothing changed
    NoSamples,
    /// Window not full yet; counters untouched
    Collecting { filled: usize, capacity: usize },
    /// Window classified and counters updated
    Classified(ClassificationReport),
}

/// Owns the window, gravity filter, model and durable counter
pub struct RecognitionPipeline {
    config: PipelineConfig,
    window: SlidingWindow,
    extractor: FeatureExtractor,
    classifier: Classifier,
    step_counter: StepCounter,
    accumulator: ActivityTimeAccumulator,
}

impl RecognitionPipeline {
    /// Create a pipeline around an existing counter
    ///
    /// # Arguments
    /// * `config` - Application configuration (sampling, filter, pipeline)
    /// * `counter` - Counter to continue from
    ///
    /// # Returns
    /// * `Ok(RecognitionPipeline)` - Ready to accept batches
    /// * `Err(ConfigError)` - If the window or variant parameters are unusable
    pub fn new(config: &AppConfig, counter: Counter) -> Result<Self, ConfigError> {
        config.validate()?;
        let window_size = config.sampling.window_size();

        log::info!(
            "[Recognizer] Window {} samples, drain {:?}, scan from {}, divisor {}, walking ceiling {:?}",
            window_size,
            config.pipeline.drain_policy,
            config.pipeline.scan_start,
            config.pipeline.step_divisor,
            config.pipeline.max_walking_speed
        );

        Ok(Self {
            config: config.pipeline.clone(),
            window: SlidingWindow::new(window_size),
            extractor: FeatureExtractor::new(&config.filter),
            classifier: Classifier::new(),
            step_counter: StepCounter::new(&config.pipeline),
            accumulator: ActivityTimeAccumulator::new(counter),
        })
    }

    pub fn counter(&self) -> &Counter {
        self.accumulator.counter()
    }

    /// Samples currently held by the window
    pub fn window_fill(&self) -> usize {
        self.window.len()
    }

    /// Resume the loaded counter at start-up (see [`ActivityTimeAccumulator::resume`])
    pub fn resume(&mut self, now: u32, reset_at: u32) -> bool {
        self.accumulator.resume(now, reset_at)
    }

    /// Apply the daily reset rule to the counter
    pub fn apply_daily_reset(&mut self, previous: u32, now: u32, reset_at: u32) -> bool {
        self.accumulator.apply_daily_reset(previous, now, reset_at)
    }

    /// Feed one sensor batch
    ///
    /// Samples that do not fit into the window are dropped. The batch that
    /// fills the window is classified in the same call.
    ///
    /// # Arguments
    /// * `batch` - Raw samples in arrival order
    /// * `settings` - Current sensitivity and driving flag
    /// * `now` - Current unix time in seconds
    pub fn process_batch(
        &mut self,
        batch: &[Sample],
        settings: &TrackerSettings,
        now: u32,
    ) -> WindowOutcome {
        if batch.is_empty() {
            log::info!("[Recognizer] No acceleration samples in batch");
            return WindowOutcome::NoSamples;
        }

        let accepted = self.window.extend(batch);
        if accepted < batch.len() {
            log::debug!(
                "[Recognizer] Window full, dropped {} samples",
                batch.len() - accepted
            );
        }

        if !self.window.is_full() {
            log::info!(
                "[Recognizer] Sample collector: {}/{}",
                self.window.len(),
                self.window.capacity()
            );
            return WindowOutcome::Collecting {
                filled: self.window.len(),
                capacity: self.window.capacity(),
            };
        }

        let report = self.classify_window(settings, now);
        self.window.drain(self.config.drain_policy);
        WindowOutcome::Classified(report)
    }

    fn classify_window(&mut self, settings: &TrackerSettings, now: u32) -> ClassificationReport {
        let window = self.extractor.extract(self.window.samples());
        let feature = window.feature;
        let classification = self
            .classifier
            .classify_with_override(&feature, settings.driving);

        log::info!(
            "[Recognizer] {} {} {} {}: {}",
            feature.mean_v as i64,
            feature.mean_h as i64,
            feature.deviation_v as i64,
            feature.deviation_h as i64,
            classification.raw
        );

        let previous_timestamp = self.accumulator.counter().timestamp;
        let mut activity = classification.activity;
        let elapsed_secs = self.accumulator.record(activity, now);

        let mut steps = self
            .step_counter
            .count(&window, activity, settings.sensitivity);
        let reclassified = self
            .step_counter
            .is_implausible(activity, steps, elapsed_secs);
        if reclassified {
            log::info!(
                "[Recognizer] {} steps in {}s is faster than walking, counting as sit",
                steps,
                elapsed_secs
            );
            self.accumulator.reclassify_walk_as_sit(elapsed_secs);
            activity = ActivityType::Sit;
            steps = 0;
        }
        self.accumulator.add_steps(steps);

        ClassificationReport {
            raw_activity: classification.raw,
            activity,
            driving_override: classification.driving_override_applied(),
            reclassified,
            feature,
            min_v: window.min_v,
            max_v: window.max_v,
            steps,
            elapsed_secs,
            previous_timestamp,
            counter: *self.accumulator.counter(),
        }
    }
}

#[cfg(test)]
mod tests;
