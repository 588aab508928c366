// Activity Recognizer - accelerometer activity tracking core
// Gravity isolation, window features, linear classification and step
// counting, with a lossy latest-value sync contract to a display loop

// Module declarations
pub mod analysis;
pub mod clock;
pub mod config;
pub mod error;
pub mod sensor;
pub mod storage;
pub mod sync;
pub mod tracking;

// Re-exports for convenience
pub use analysis::classifier::ActivityType;
pub use analysis::{ClassificationReport, RecognitionPipeline, WindowOutcome};
pub use config::AppConfig;
pub use sensor::Sample;
pub use tracking::{Counter, TrackerSettings};

/// Install the fmt subscriber for binaries
///
/// `log` records from library code are captured as well. Safe to call more
/// than once; later calls are ignored.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        // Verify the public surface is reachable from the crate root
        let _pipeline = RecognitionPipeline::new(&AppConfig::default(), Counter::default())
            .expect("default config is valid");
        assert_eq!(ActivityType::from_index(3), Some(ActivityType::Jog));
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(false);
        init_logging(true);
        log::info!("[Test] logging initialized");
    }
}
