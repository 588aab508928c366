// Counter - per-activity time buckets and step total
//
// Each classification pass hands the accumulator an activity and the
// current time. The seconds since the previous pass go to that activity's
// bucket and the counter timestamp moves forward. Steps are added
// separately once the step counter has run.
//
// The daily reset zeroes everything when the configured time of day falls
// between the previous observation and now. A boundary that has already
// caused a reset is remembered so evaluating it again is a no-op.

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::ActivityType;

/// Durable activity totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub sleep_time: u32,
    pub sit_time: u32,
    pub walk_time: u32,
    pub jog_time: u32,
    pub steps: u32,
    /// Unix seconds of the last update
    pub timestamp: u32,
}

impl Counter {
    /// Empty counter stamped at `now`
    pub fn starting_at(now: u32) -> Self {
        Self {
            timestamp: now,
            ..Self::default()
        }
    }

    /// Seconds accounted to `activity`
    pub fn time_for(&self, activity: ActivityType) -> u32 {
        match activity {
            ActivityType::Sleep => self.sleep_time,
            ActivityType::Sit => self.sit_time,
            ActivityType::Walk => self.walk_time,
            ActivityType::Jog => self.jog_time,
        }
    }

    fn bucket_mut(&mut self, activity: ActivityType) -> &mut u32 {
        match activity {
            ActivityType::Sleep => &mut self.sleep_time,
            ActivityType::Sit => &mut self.sit_time,
            ActivityType::Walk => &mut self.walk_time,
            ActivityType::Jog => &mut self.jog_time,
        }
    }

    /// Sum of the four time buckets
    pub fn total_time(&self) -> u64 {
        self.sleep_time as u64 + self.sit_time as u64 + self.walk_time as u64 + self.jog_time as u64
    }

    /// Walking plus jogging seconds
    pub fn active_time(&self) -> u32 {
        self.walk_time.saturating_add(self.jog_time)
    }

    /// Zero the buckets and steps, stamping the counter at `now`
    pub fn clear(&mut self, now: u32) {
        *self = Self::starting_at(now);
    }
}

/// Instant at which the daily reset fires for the local day starting at `day_start`
pub fn reset_instant(day_start: u32, reset_minutes: u16) -> u32 {
    day_start.saturating_add(reset_minutes as u32 * 60)
}

/// Sole mutator of the durable Counter
#[derive(Debug, Clone)]
pub struct ActivityTimeAccumulator {
    counter: Counter,
    last_reset: Option<u32>,
}

impl ActivityTimeAccumulator {
    pub fn new(counter: Counter) -> Self {
        Self {
            counter,
            last_reset: None,
        }
    }

    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    /// Add the time since the last update to `activity`
    ///
    /// A clock that went backwards accounts zero seconds; the timestamp
    /// still follows the clock.
    ///
    /// # Returns
    /// Elapsed seconds added to the bucket
    pub fn record(&mut self, activity: ActivityType, now: u32) -> u32 {
        let elapsed = match now.checked_sub(self.counter.timestamp) {
            Some(elapsed) => elapsed,
            None => {
                log::warn!(
                    "[Counter] Clock moved backwards ({} -> {}), accounting 0s",
                    self.counter.timestamp,
                    now
                );
                0
            }
        };

        let bucket = self.counter.bucket_mut(activity);
        *bucket = bucket.saturating_add(elapsed);
        self.counter.timestamp = now;
        elapsed
    }

    /// Move `elapsed` seconds just recorded as walking over to sitting
    pub fn reclassify_walk_as_sit(&mut self, elapsed: u32) {
        self.counter.walk_time = self.counter.walk_time.saturating_sub(elapsed);
        self.counter.sit_time = self.counter.sit_time.saturating_add(elapsed);
    }

    pub fn add_steps(&mut self, steps: u32) {
        self.counter.steps = self.counter.steps.saturating_add(steps);
    }

    /// Resume a counter loaded from storage
    ///
    /// Zeroes it if today's reset instant passed while the process was not
    /// running, then stamps it at `now` so downtime is not accounted to any
    /// activity.
    ///
    /// # Returns
    /// `true` if the counter was zeroed
    pub fn resume(&mut self, now: u32, reset_at: u32) -> bool {
        let reset = self.apply_daily_reset(self.counter.timestamp, now, reset_at);
        self.counter.timestamp = now;
        reset
    }

    /// Apply the daily reset rule
    ///
    /// # Arguments
    /// * `previous` - Timestamp of the previous observation
    /// * `now` - Current time
    /// * `reset_at` - Today's reset instant (see [`reset_instant`])
    ///
    /// # Returns
    /// `true` if the counter was zeroed
    pub fn apply_daily_reset(&mut self, previous: u32, now: u32, reset_at: u32) -> bool {
        let crossed = previous <= reset_at && reset_at <= now;
        if !crossed || self.last_reset == Some(reset_at) {
            return false;
        }

        log::info!(
            "[Counter] Daily reset at {} (previous {}, now {}): {:?}",
            reset_at,
            previous,
            now,
            self.counter
        );
        self.counter.clear(now);
        self.last_reset = Some(reset_at);
        true
    }
}
