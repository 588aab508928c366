// Tracking module - durable activity counters
//
// Module organization:
// - counter: Counter (the durable state) and ActivityTimeAccumulator, its
//   only mutator
// - settings: TrackerSettings supplied by the user through the display side

mod counter;
mod settings;

pub use counter::{reset_instant, ActivityTimeAccumulator, Counter};
pub use settings::{
    TrackerSettings, DEFAULT_SENSITIVITY, MAX_RESET_MINUTES, MAX_SENSITIVITY,
};
