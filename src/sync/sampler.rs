// SamplerService - the sampling loop
//
// Owns the recognition pipeline, the user settings it reads, the durable
// store and the data log. Per sensor batch:
//
//   control messages -> pipeline -> data log -> daily reset -> publish
//
// Persistence happens at start-up (load), on settings changes (settings
// only) and at shutdown (everything, then flush). Nothing here blocks on
// the display side: every outgoing message goes to a latest-value slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::mailbox::SamplerLink;
use super::{snapshot_messages, MessageTag, SyncMessage};
use crate::analysis::classifier::ActivityType;
use crate::analysis::{ClassificationReport, RecognitionPipeline, WindowOutcome};
use crate::clock::TimeSource;
use crate::config::AppConfig;
use crate::error::{
    log_config_error, log_storage_error, log_sync_error, ConfigError, StorageError, SyncError,
};
use crate::sensor::{Sample, SamplerChannels};
use crate::storage::{
    load_counter, load_settings, save_counter, save_settings, DataLogRecord, DataLogSink,
    DataLogger, KeyValueStore,
};
use crate::tracking::{reset_instant, Counter, TrackerSettings};

/// Idle wait between queue polls when no batch is pending
const IDLE_POLL: Duration = Duration::from_millis(1);

pub struct SamplerService<S, L> {
    pipeline: RecognitionPipeline,
    settings: TrackerSettings,
    store: S,
    data_log: L,
    logger: DataLogger,
    link: SamplerLink,
    clock: Arc<dyn TimeSource>,
    activity: ActivityType,
}

impl<S: KeyValueStore, L: DataLogSink> SamplerService<S, L> {
    /// Load persisted state and prepare the pipeline
    ///
    /// Unreadable persisted values are logged and replaced by defaults. The
    /// counter is zeroed if today's reset time passed while nothing was
    /// running, and the full snapshot is published once so the display has
    /// values immediately.
    ///
    /// # Returns
    /// * `Ok(SamplerService)` - Ready to accept batches
    /// * `Err(ConfigError)` - If the pipeline configuration is unusable
    pub fn start(
        config: &AppConfig,
        store: S,
        data_log: L,
        link: SamplerLink,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        let now = clock.now();
        let counter = load_counter(&store, now).unwrap_or_else(|err| {
            log_storage_error(&err, "SamplerService::start");
            Counter::starting_at(now)
        });
        let settings = load_settings(&store).unwrap_or_else(|err| {
            log_storage_error(&err, "SamplerService::start");
            TrackerSettings::default()
        });

        let mut pipeline = RecognitionPipeline::new(config, counter).map_err(|err| {
            log_config_error(&err, "SamplerService::start");
            err
        })?;
        let reset_at = reset_instant(clock.start_of_local_day(now), settings.reset_minutes);
        if pipeline.resume(now, reset_at) {
            log::info!("[Sampler] Reset time passed while stopped, counters cleared");
        }

        log::info!(
            "[Sampler] Started at {} with {:?}, {:?}",
            now,
            pipeline.counter(),
            settings
        );

        let logger = DataLogger::new(config.data_log.interval_secs, *pipeline.counter());
        let service = Self {
            pipeline,
            settings,
            store,
            data_log,
            logger,
            link,
            clock,
            activity: ActivityType::Sleep,
        };
        service.publish();
        Ok(service)
    }

    pub fn counter(&self) -> &Counter {
        self.pipeline.counter()
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Activity of the most recent classification
    pub fn activity(&self) -> ActivityType {
        self.activity
    }

    /// Process one sensor batch
    pub fn handle_batch(&mut self, batch: &[Sample]) -> WindowOutcome {
        self.handle_control();

        let now = self.clock.now();
        let outcome = self.pipeline.process_batch(batch, &self.settings, now);
        if let WindowOutcome::Classified(report) = &outcome {
            self.after_classification(report, now);
        }
        outcome
    }

    /// Data log, daily reset, then publish
    fn after_classification(&mut self, report: &ClassificationReport, now: u32) {
        self.activity = report.activity;

        let record = self.logger.observe(&report.counter);
        self.append_record(record);

        let reset_at = reset_instant(
            self.clock.start_of_local_day(now),
            self.settings.reset_minutes,
        );
        if self
            .pipeline
            .apply_daily_reset(report.previous_timestamp, now, reset_at)
        {
            // Close out the day before measuring from the cleared counter
            let record = self.logger.flush(&report.counter);
            self.append_record(record);
            self.logger.rebase(self.pipeline.counter());
        }

        self.publish();
    }

    fn append_record(&mut self, record: Option<DataLogRecord>) {
        let Some(record) = record else {
            return;
        };
        log::debug!("[Sampler] Data log record {:?}", record);
        if let Err(err) = self.data_log.append(&record) {
            log_storage_error(&err, "SamplerService::append_record");
        }
    }

    /// Apply every pending message from the display side
    ///
    /// # Returns
    /// Number of messages applied
    pub fn handle_control(&mut self) -> usize {
        let messages = self.link.from_display.drain();
        let mut applied = 0;
        let mut settings_changed = false;

        for message in messages {
            match self.apply_control(message) {
                Ok(changed) => {
                    applied += 1;
                    settings_changed |= changed;
                }
                Err(err) => log_sync_error(&err, "SamplerService::handle_control"),
            }
        }

        if settings_changed {
            if let Err(err) = save_settings(&mut self.store, &self.settings) {
                log_storage_error(&err, "SamplerService::handle_control");
            }
        }
        applied
    }

    /// Returns whether the settings changed
    fn apply_control(&mut self, message: SyncMessage) -> Result<bool, SyncError> {
        let before = self.settings;
        match message.tag {
            MessageTag::Refresh => {
                log::debug!("[Sampler] Refresh requested");
                self.publish();
            }
            MessageTag::Sensitivity => self.settings.set_sensitivity(message.value)?,
            MessageTag::ResetTime => self.settings.set_reset_minutes(message.value)?,
            MessageTag::Driving => self.settings.set_driving(message.value),
            tag => return Err(SyncError::NotRouted { tag: tag.id() }),
        }

        let changed = before != self.settings;
        if changed {
            log::info!("[Sampler] Settings now {:?}", self.settings);
        }
        Ok(changed)
    }

    /// Push the full counter snapshot and current activity to the display
    pub fn publish(&self) {
        for message in snapshot_messages(self.pipeline.counter(), self.activity) {
            if let Err(err) = self.link.to_display.post(message) {
                log_sync_error(&err, "SamplerService::publish");
            }
        }
    }

    /// Persist the counter and settings, then flush the store
    ///
    /// # Returns
    /// The final counter
    pub fn shutdown(mut self) -> Result<Counter, StorageError> {
        self.handle_control();
        let counter = *self.pipeline.counter();
        save_counter(&mut self.store, &counter)?;
        save_settings(&mut self.store, &self.settings)?;
        self.store.flush()?;
        log::info!("[Sampler] Persisted {:?}", counter);
        Ok(counter)
    }
}

impl<S, L> SamplerService<S, L>
where
    S: KeyValueStore + 'static,
    L: DataLogSink + 'static,
{
    /// Run the sampling loop on its own thread
    ///
    /// Consumes batches until `running` is cleared and the queue is empty,
    /// then persists state.
    pub fn run(mut self, mut channels: SamplerChannels, running: Arc<AtomicBool>) -> SamplerHandle {
        let flag = Arc::clone(&running);
        let join = thread::spawn(move || {
            let span = tracing::info_span!("sampler");
            let _guard = span.enter();
            tracing::info!("[Sampler] Loop started");

            loop {
                let Some(batch) = channels.next_batch() else {
                    self.handle_control();
                    if !flag.load(Ordering::SeqCst) {
                        tracing::info!("[Sampler] Shutdown requested and queue empty, exiting");
                        break;
                    }
                    thread::sleep(IDLE_POLL);
                    continue;
                };

                if let WindowOutcome::Classified(report) = self.handle_batch(&batch) {
                    tracing::debug!(
                        activity = %report.activity,
                        steps = report.steps,
                        elapsed = report.elapsed_secs,
                        "window classified"
                    );
                }
                channels.recycle(batch);
            }

            self.shutdown()
        });

        SamplerHandle { join, running }
    }
}

/// Handle to a running sampling loop
pub struct SamplerHandle {
    join: JoinHandle<Result<Counter, StorageError>>,
    running: Arc<AtomicBool>,
}

impl SamplerHandle {
    /// Ask the loop to finish the queued batches and persist
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Stop the loop and wait for its final counter
    pub fn stop(self) -> thread::Result<Result<Counter, StorageError>> {
        self.request_stop();
        self.join.join()
    }
}
