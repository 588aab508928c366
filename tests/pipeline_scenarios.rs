//! End-to-end recognition scenarios through the public pipeline API.

use activity_recognizer::config::{PipelineConfig, SamplingConfig};
use activity_recognizer::sensor::synthetic::{MotionPattern, SyntheticMotion};
use activity_recognizer::{
    ActivityType, AppConfig, Counter, RecognitionPipeline, TrackerSettings, WindowOutcome,
};

const START: u32 = 1_710_032_400;

/// Feed one-second batches of `pattern` and return the final pipeline
fn run(config: &AppConfig, pattern: MotionPattern, seconds: u32, settings: &TrackerSettings) -> RecognitionPipeline {
    let mut pipeline =
        RecognitionPipeline::new(config, Counter::starting_at(START)).expect("valid config");
    let mut motion = SyntheticMotion::new(pattern, config.sampling.rate_hz);
    for second in 1..=seconds {
        pipeline.process_batch(
            &motion.next_batch(config.sampling.batch_size),
            settings,
            START + second,
        );
    }
    pipeline
}

#[test]
fn walking_minute_counts_steps() {
    let pipeline = run(
        &AppConfig::default(),
        MotionPattern::Walk,
        60,
        &TrackerSettings::default(),
    );
    let counter = pipeline.counter();

    // Windows complete at 8s and every 4s after that
    assert_eq!(counter.walk_time, 60);
    assert_eq!(counter.timestamp, START + 60);
    assert!(counter.steps > 0);
    assert_eq!(counter.sleep_time + counter.sit_time + counter.jog_time, 0);
}

#[test]
fn sitting_has_no_steps() {
    let pipeline = run(
        &AppConfig::default(),
        MotionPattern::Sit,
        32,
        &TrackerSettings::default(),
    );
    let counter = pipeline.counter();

    assert_eq!(counter.steps, 0);
    assert_eq!(counter.walk_time + counter.jog_time, 0);
    assert_eq!(counter.total_time(), 32);
}

#[test]
fn driving_never_accumulates_exercise() {
    let settings = TrackerSettings {
        driving: true,
        ..TrackerSettings::default()
    };
    for pattern in [MotionPattern::Walk, MotionPattern::Jog] {
        let pipeline = run(&AppConfig::default(), pattern, 40, &settings);
        let counter = pipeline.counter();
        assert_eq!(counter.walk_time + counter.jog_time, 0, "{}", pattern);
        assert_eq!(counter.steps, 0, "{}", pattern);
        assert_eq!(counter.sit_time, 40, "{}", pattern);
    }
}

#[test]
fn total_time_tracks_timestamp_advance() {
    let config = AppConfig {
        pipeline: PipelineConfig::full_reset(),
        ..AppConfig::default()
    };
    for pattern in [
        MotionPattern::Rest,
        MotionPattern::Sit,
        MotionPattern::Walk,
        MotionPattern::Jog,
    ] {
        let pipeline = run(&config, pattern, 48, &TrackerSettings::default());
        let counter = pipeline.counter();
        assert_eq!(
            counter.total_time(),
            (counter.timestamp - START) as u64,
            "{}",
            pattern
        );
    }
}

#[test]
fn window_size_follows_sampling_config() {
    let config = AppConfig {
        sampling: SamplingConfig {
            interval_secs: 4,
            ..SamplingConfig::default()
        },
        ..AppConfig::default()
    };
    let mut pipeline =
        RecognitionPipeline::new(&config, Counter::starting_at(START)).expect("valid config");
    let mut motion = SyntheticMotion::new(MotionPattern::Rest, 10);

    let outcomes: Vec<WindowOutcome> = (1..=4)
        .map(|second| {
            pipeline.process_batch(
                &motion.next_batch(10),
                &TrackerSettings::default(),
                START + second,
            )
        })
        .collect();

    assert!(matches!(
        outcomes[2],
        WindowOutcome::Collecting {
            filled: 30,
            capacity: 40
        }
    ));
    match &outcomes[3] {
        WindowOutcome::Classified(report) => {
            assert_eq!(report.elapsed_secs, 4);
            assert_ne!(report.activity, ActivityType::Jog);
        }
        other => panic!("expected a classification, got {:?}", other),
    }
}

#[test]
fn config_file_selects_pipeline_variant() {
    let path = std::env::temp_dir().join(format!(
        "activity_recognizer_config_{}.json",
        std::process::id()
    ));
    std::fs::write(
        &path,
        r#"{ "pipeline": { "drain_policy": "full_reset", "scan_start": 1, "step_divisor": 2, "max_walking_speed": 2 } }"#,
    )
    .unwrap();

    let config = AppConfig::load_from_file(&path);
    assert_eq!(config.pipeline, PipelineConfig::full_reset());
    assert_eq!(config.sampling, SamplingConfig::default());
    let _ = std::fs::remove_file(&path);

    let pipeline = run(&config, MotionPattern::Walk, 16, &TrackerSettings::default());
    assert_eq!(pipeline.counter().steps, 28);
    assert_eq!(pipeline.window_fill(), 0);
}
