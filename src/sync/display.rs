// DisplayState - the display loop's view of the sampler
//
// Holds the last value delivered for every sampler tag and a dirty flag so
// the display redraws only when something changed. User-facing settings
// are pushed back to the sampler through the same latest-value mailboxes.
//
// Driving detection: when a speed threshold is configured, a speed check is
// due every five minutes of wall-clock time. While a check is pending the
// driving flag is cleared; the reported speed then decides it again and the
// result is sent on every report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::mailbox::DisplayLink;
use super::{MessageTag, SyncMessage};
use crate::analysis::classifier::ActivityType;
use crate::error::{log_sync_error, StorageError, SyncError};
use crate::storage::{value_or_default, KeyValueStore, PersistKey};
use crate::tracking::TrackerSettings;

/// Wall-clock spacing of speed checks
pub const SPEED_CHECK_INTERVAL_SECS: u32 = 5 * 60;

pub const DEFAULT_STEP_GOAL: u32 = 10_000;

pub const DEFAULT_ACTIVE_GOAL_MINUTES: u32 = 60;

/// Display-only preferences, persisted by the display side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    /// Speed in cm/s at or above which the wearer is driving; 0 disables checks
    pub speed_threshold: u16,
    pub step_goal: u32,
    pub active_goal_minutes: u32,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            speed_threshold: 0,
            step_goal: DEFAULT_STEP_GOAL,
            active_goal_minutes: DEFAULT_ACTIVE_GOAL_MINUTES,
        }
    }
}

impl DisplayPreferences {
    /// Load from the store; missing keys take their defaults
    pub fn load(store: &dyn KeyValueStore) -> Result<Self, StorageError> {
        let defaults = Self::default();
        let read = |key, default: u32| -> Result<u32, StorageError> {
            let value = value_or_default(store.read_int(key), default as i32)?;
            Ok(value.max(0) as u32)
        };

        Ok(Self {
            speed_threshold: read(PersistKey::SpeedThreshold, 0)?.min(u16::MAX as u32) as u16,
            step_goal: read(PersistKey::StepGoal, defaults.step_goal)?,
            active_goal_minutes: read(PersistKey::ActiveTimeGoal, defaults.active_goal_minutes)?,
        })
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StorageError> {
        store.write_int(PersistKey::SpeedThreshold, self.speed_threshold as i32)?;
        store.write_int(PersistKey::StepGoal, self.step_goal as i32)?;
        store.write_int(PersistKey::ActiveTimeGoal, self.active_goal_minutes as i32)
    }
}

/// Speed check scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SpeedCheck {
    /// No threshold configured
    Disabled,
    /// Next check becomes due at `due_at`
    Scheduled { due_at: u32 },
    /// Check requested at `since`, waiting for a speed report
    Pending { since: u32 },
}

/// What the display currently shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub activity: Option<ActivityType>,
    pub sleep_time: u16,
    pub sit_time: u16,
    pub walk_time: u16,
    pub jog_time: u16,
    pub steps: u16,
    pub step_progress: u8,
    pub active_progress: u8,
    pub settings: TrackerSettings,
    pub speed_check: SpeedCheck,
}

pub struct DisplayState {
    link: DisplayLink,
    values: BTreeMap<MessageTag, u16>,
    activity: Option<ActivityType>,
    dirty: bool,
    preferences: DisplayPreferences,
    settings: TrackerSettings,
    speed_check: SpeedCheck,
}

impl DisplayState {
    /// Create the display state and ask the sampler for a full snapshot
    ///
    /// # Arguments
    /// * `link` - Display end of the sync link
    /// * `preferences` - Persisted display preferences
    /// * `settings` - Settings last pushed to the sampler
    /// * `now` - Current unix time; a configured speed check is due immediately
    pub fn launch(
        link: DisplayLink,
        preferences: DisplayPreferences,
        settings: TrackerSettings,
        now: u32,
    ) -> Self {
        let speed_check = if preferences.speed_threshold == 0 {
            SpeedCheck::Disabled
        } else {
            SpeedCheck::Scheduled { due_at: now }
        };
        tracing::info!("[Display] Launched at {}, speed check {:?}", now, speed_check);
        let state = Self {
            link,
            values: BTreeMap::new(),
            activity: None,
            dirty: true,
            preferences,
            settings,
            speed_check,
        };
        state.request_refresh();
        state
    }

    /// Ask the sampler to republish its full snapshot
    pub fn request_refresh(&self) {
        self.send(MessageTag::Refresh, 1);
    }

    fn send(&self, tag: MessageTag, value: u16) {
        if let Err(err) = self.link.to_sampler.post(SyncMessage::new(tag, value)) {
            log_sync_error(&err, "DisplayState::send");
        }
    }

    /// Apply every pending message from the sampler
    ///
    /// # Returns
    /// Number of messages that changed the displayed state
    pub fn poll(&mut self) -> usize {
        let mut changed = 0;
        for message in self.link.from_sampler.drain() {
            match self.apply(message) {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(err) => log_sync_error(&err, "DisplayState::poll"),
            }
        }
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }

    fn apply(&mut self, message: SyncMessage) -> Result<bool, SyncError> {
        if message.tag == MessageTag::Activity {
            let activity =
                ActivityType::from_index(message.value).ok_or(SyncError::InvalidValue {
                    tag: message.tag.id(),
                    value: message.value,
                })?;
            let changed = self.activity != Some(activity);
            self.activity = Some(activity);
            return Ok(changed);
        }
        Ok(self.values.insert(message.tag, message.value) != Some(message.value))
    }

    /// Whether a redraw is needed; clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Last delivered value for a counter tag, 0 until one arrives
    pub fn value(&self, tag: MessageTag) -> u16 {
        self.values.get(&tag).copied().unwrap_or(0)
    }

    pub fn steps(&self) -> u16 {
        self.value(MessageTag::Steps)
    }

    /// Seconds shown for `activity`
    pub fn time_for(&self, activity: ActivityType) -> u16 {
        let tag = match activity {
            ActivityType::Sleep => MessageTag::SleepTime,
            ActivityType::Sit => MessageTag::SitTime,
            ActivityType::Walk => MessageTag::WalkTime,
            ActivityType::Jog => MessageTag::JogTime,
        };
        self.value(tag)
    }

    pub fn activity(&self) -> Option<ActivityType> {
        self.activity
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn preferences(&self) -> &DisplayPreferences {
        &self.preferences
    }

    pub fn speed_check(&self) -> SpeedCheck {
        self.speed_check
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            activity: self.activity,
            sleep_time: self.time_for(ActivityType::Sleep),
            sit_time: self.time_for(ActivityType::Sit),
            walk_time: self.time_for(ActivityType::Walk),
            jog_time: self.time_for(ActivityType::Jog),
            steps: self.steps(),
            step_progress: self.step_progress(),
            active_progress: self.active_progress(),
            settings: self.settings,
            speed_check: self.speed_check,
        }
    }

    /// Step goal progress in percent, capped at 100
    pub fn step_progress(&self) -> u8 {
        progress(self.steps() as u32, self.preferences.step_goal)
    }

    /// Walking plus jogging progress toward the active-time goal, capped at 100
    pub fn active_progress(&self) -> u8 {
        let active = self.time_for(ActivityType::Walk) as u32 + self.time_for(ActivityType::Jog) as u32;
        progress(active, self.preferences.active_goal_minutes.saturating_mul(60))
    }

    pub fn set_sensitivity(&mut self, sensitivity: u16) -> Result<(), SyncError> {
        self.settings.set_sensitivity(sensitivity)?;
        self.send(MessageTag::Sensitivity, sensitivity);
        self.dirty = true;
        Ok(())
    }

    pub fn set_reset_minutes(&mut self, minutes: u16) -> Result<(), SyncError> {
        self.settings.set_reset_minutes(minutes)?;
        self.send(MessageTag::ResetTime, minutes);
        self.dirty = true;
        Ok(())
    }

    /// Change the speed threshold; 0 turns speed checks off
    pub fn set_speed_threshold(&mut self, threshold: u16, now: u32) {
        self.preferences.speed_threshold = threshold;
        self.speed_check = if threshold == 0 {
            SpeedCheck::Disabled
        } else {
            SpeedCheck::Scheduled { due_at: now }
        };
        self.dirty = true;
    }

    /// Advance the speed check schedule
    ///
    /// # Returns
    /// `true` if a speed check should be requested now
    pub fn tick(&mut self, now: u32) -> bool {
        match self.speed_check {
            SpeedCheck::Scheduled { due_at } if now >= due_at => {
                log::debug!("[Display] Speed check due at {}", now);
                self.speed_check = SpeedCheck::Pending { since: now };
                if self.settings.driving {
                    self.settings.driving = false;
                    self.send(MessageTag::Driving, 0);
                    self.dirty = true;
                }
                true
            }
            _ => false,
        }
    }

    /// Speed reported by the location source, in cm/s
    ///
    /// Decides the driving flag, sends it to the sampler and schedules the
    /// next check.
    pub fn report_speed(&mut self, speed_cm_s: u16, now: u32) {
        if self.speed_check == SpeedCheck::Disabled {
            log::debug!("[Display] Ignoring speed report, no threshold configured");
            return;
        }
        let driving = speed_cm_s >= self.preferences.speed_threshold;
        tracing::info!(
            "[Display] Speed {} cm/s against {} cm/s: driving={}",
            speed_cm_s,
            self.preferences.speed_threshold,
            driving
        );
        self.settings.driving = driving;
        self.send(MessageTag::Driving, driving as u16);
        self.speed_check = SpeedCheck::Scheduled {
            due_at: now.saturating_add(SPEED_CHECK_INTERVAL_SECS),
        };
        self.dirty = true;
    }
}

fn progress(value: u32, goal: u32) -> u8 {
    if goal == 0 {
        return 100;
    }
    (value as u64 * 100 / goal as u64).min(100) as u8
}
