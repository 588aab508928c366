// Clock abstraction for counter timestamps and the daily reset boundary
//
// Counters store whole unix seconds in 32 bits. The reset rule needs the
// start of the local day, so the time source also answers that question
// for an arbitrary instant.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{FixedOffset, Local, Offset, TimeZone, Timelike, Utc};

/// Source of wall-clock time in unix seconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u32;

    /// Unix second at which the local day containing `at` began.
    fn start_of_local_day(&self, at: u32) -> u32;
}

/// Wall clock in the host's local time zone.
#[derive(Debug, Default)]
pub struct SystemClock {
    _unit: (),
}

impl TimeSource for SystemClock {
    fn now(&self) -> u32 {
        Local::now().timestamp().clamp(0, u32::MAX as i64) as u32
    }

    fn start_of_local_day(&self, at: u32) -> u32 {
        match Local.timestamp_opt(at as i64, 0).earliest() {
            Some(local) => at.saturating_sub(local.num_seconds_from_midnight()),
            None => at,
        }
    }
}

/// Manually driven clock with a fixed UTC offset.
///
/// Used by tests and simulations to step time forward deterministically.
/// Shareable across the sampling and display threads.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU32,
    offset: FixedOffset,
}

impl ManualClock {
    /// Clock at `start` in UTC.
    pub fn new(start: u32) -> Self {
        Self::with_offset(start, 0)
    }

    /// Clock at `start` with the local day shifted by `offset_secs` east of UTC.
    ///
    /// Offsets outside +/- 24h are treated as UTC.
    pub fn with_offset(start: u32, offset_secs: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_secs).unwrap_or_else(|| {
            log::warn!("[Clock] Offset {}s out of range, using UTC", offset_secs);
            Utc.fix()
        });
        Self {
            now: AtomicU32::new(start),
            offset,
        }
    }

    pub fn set(&self, at: u32) {
        self.now.store(at, Ordering::SeqCst);
    }

    /// Move the clock forward and return the new time.
    pub fn advance(&self, secs: u32) -> u32 {
        self.now.fetch_add(secs, Ordering::SeqCst).wrapping_add(secs)
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }

    fn start_of_local_day(&self, at: u32) -> u32 {
        match self.offset.timestamp_opt(at as i64, 0).single() {
            Some(local) => at.saturating_sub(local.num_seconds_from_midnight()),
            None => at,
        }
    }
}
