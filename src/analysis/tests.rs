use super::*;
use crate::config::{DrainPolicy, PipelineConfig};
use crate::sensor::synthetic::{MotionPattern, SyntheticMotion};

const START: u32 = 1000;

fn pipeline_with(pipeline: PipelineConfig) -> RecognitionPipeline {
    let config = AppConfig {
        pipeline,
        ..AppConfig::default()
    };
    RecognitionPipeline::new(&config, Counter::starting_at(START)).expect("valid config")
}

/// Feed `batches` one-second batches of `pattern`, collecting classifications
fn run_pattern(
    pipeline: &mut RecognitionPipeline,
    pattern: MotionPattern,
    batches: u32,
    settings: &TrackerSettings,
) -> Vec<ClassificationReport> {
    let mut source = SyntheticMotion::new(pattern, 10);
    (1..=batches)
        .filter_map(
            |i| match pipeline.process_batch(&source.next_batch(10), settings, START + i) {
                WindowOutcome::Classified(report) => Some(report),
                _ => None,
            },
        )
        .collect()
}

#[test]
fn test_empty_batch_is_a_no_op() {
    let mut pipeline = pipeline_with(PipelineConfig::sliding());
    let outcome = pipeline.process_batch(&[], &TrackerSettings::default(), START + 50);

    assert_eq!(outcome, WindowOutcome::NoSamples);
    assert_eq!(*pipeline.counter(), Counter::starting_at(START));
    assert_eq!(pipeline.window_fill(), 0);
}

#[test]
fn test_insufficient_data_leaves_counter_untouched() {
    let mut pipeline = pipeline_with(PipelineConfig::sliding());
    let mut source = SyntheticMotion::new(MotionPattern::Walk, 10);
    let settings = TrackerSettings::default();

    for i in 1..8 {
        let outcome = pipeline.process_batch(&source.next_batch(10), &settings, START + i);
        assert_eq!(
            outcome,
            WindowOutcome::Collecting {
                filled: 10 * i as usize,
                capacity: 80
            }
        );
    }
    assert_eq!(*pipeline.counter(), Counter::starting_at(START));

    let outcome = pipeline.process_batch(&source.next_batch(10), &settings, START + 8);
    assert!(matches!(outcome, WindowOutcome::Classified(_)));
}

#[test]
fn test_overflowing_batch_is_truncated() {
    let mut pipeline = pipeline_with(PipelineConfig::full_reset());
    let settings = TrackerSettings::default();
    let batch = vec![Sample::new(0, 0, 1000); 75];
    pipeline.process_batch(&batch, &settings, START + 1);

    let outcome = pipeline.process_batch(&batch[..10], &settings, START + 2);
    assert!(matches!(outcome, WindowOutcome::Classified(_)));
    // The five samples past capacity were dropped, not carried over
    assert_eq!(pipeline.window_fill(), 0);
}

#[test]
fn test_walking_with_half_slide() {
    let mut pipeline = pipeline_with(PipelineConfig::sliding());
    let reports = run_pattern(
        &mut pipeline,
        MotionPattern::Walk,
        16,
        &TrackerSettings::default(),
    );

    assert_eq!(reports.len(), 3);
    let elapsed: Vec<u32> = reports.iter().map(|r| r.elapsed_secs).collect();
    assert_eq!(elapsed, vec![8, 4, 4]);
    assert!(reports
        .iter()
        .all(|r| r.activity == ActivityType::Walk && r.steps == 7 && !r.reclassified));

    let counter = pipeline.counter();
    assert_eq!(counter.walk_time, 16);
    assert_eq!(counter.steps, 21);
    assert_eq!(counter.timestamp, START + 16);
    assert_eq!(pipeline.window_fill(), 40);
}

#[test]
fn test_walking_with_full_reset() {
    let mut pipeline = pipeline_with(PipelineConfig::full_reset());
    let reports = run_pattern(
        &mut pipeline,
        MotionPattern::Walk,
        16,
        &TrackerSettings::default(),
    );

    assert_eq!(reports.len(), 2);
    assert!(reports
        .iter()
        .all(|r| r.activity == ActivityType::Walk && r.steps == 14 && r.elapsed_secs == 8));
    assert_eq!(pipeline.counter().steps, 28);
    assert_eq!(pipeline.window_fill(), 0);
}

#[test]
fn test_implausible_walking_becomes_sitting() {
    let mut pipeline = pipeline_with(PipelineConfig {
        max_walking_speed: Some(1),
        ..PipelineConfig::sliding()
    });
    let reports = run_pattern(
        &mut pipeline,
        MotionPattern::Walk,
        12,
        &TrackerSettings::default(),
    );

    assert_eq!(reports.len(), 2);
    assert!(!reports[0].reclassified);
    let second = &reports[1];
    assert!(second.reclassified);
    assert_eq!(second.raw_activity, ActivityType::Walk);
    assert_eq!(second.activity, ActivityType::Sit);
    assert_eq!(second.steps, 0);

    let counter = pipeline.counter();
    assert_eq!(counter.walk_time, 8);
    assert_eq!(counter.sit_time, 4);
    assert_eq!(counter.steps, 7);
}

#[test]
fn test_jogging_counts_steps() {
    let mut pipeline = pipeline_with(PipelineConfig::sliding());
    let reports = run_pattern(
        &mut pipeline,
        MotionPattern::Jog,
        12,
        &TrackerSettings::default(),
    );

    assert_eq!(reports.len(), 2);
    assert!(reports
        .iter()
        .all(|r| r.activity == ActivityType::Jog && r.steps == 10));
    assert_eq!(pipeline.counter().jog_time, 12);
    assert_eq!(pipeline.counter().steps, 20);
}

#[test]
fn test_driving_turns_walking_into_sitting() {
    let mut pipeline = pipeline_with(PipelineConfig::sliding());
    let settings = TrackerSettings {
        driving: true,
        ..TrackerSettings::default()
    };
    let reports = run_pattern(&mut pipeline, MotionPattern::Walk, 8, &settings);

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].raw_activity, ActivityType::Walk);
    assert_eq!(reports[0].activity, ActivityType::Sit);
    assert!(reports[0].driving_override);
    assert_eq!(pipeline.counter().sit_time, 8);
    assert_eq!(pipeline.counter().steps, 0);
}

#[test]
fn test_rest_settles_into_sleep() {
    let mut pipeline = pipeline_with(PipelineConfig::sliding());
    let reports = run_pattern(
        &mut pipeline,
        MotionPattern::Rest,
        16,
        &TrackerSettings::default(),
    );

    // First window sees the gravity estimate rising from zero
    let activities: Vec<ActivityType> = reports.iter().map(|r| r.activity).collect();
    assert_eq!(
        activities,
        vec![ActivityType::Sit, ActivityType::Sleep, ActivityType::Sleep]
    );
    assert_eq!(pipeline.counter().sleep_time, 8);
    assert_eq!(pipeline.counter().sit_time, 8);
}

#[test]
fn test_sensitivity_narrows_walking_band() {
    let at = |sensitivity: u8| {
        let mut pipeline = pipeline_with(PipelineConfig::sliding());
        let settings = TrackerSettings {
            sensitivity,
            ..TrackerSettings::default()
        };
        run_pattern(&mut pipeline, MotionPattern::Walk, 8, &settings)[0].steps
    };

    assert_eq!(at(0), 7);
    assert_eq!(at(100), 0);
    assert!(at(0) >= at(100));
}

#[test]
fn test_single_spike_scenarios() {
    let classify_spike = |amplitude: i16| {
        let mut pipeline = pipeline_with(PipelineConfig::full_reset());
        let settings = TrackerSettings::default();
        // Settle the gravity estimate on a still window first
        pipeline.process_batch(&[Sample::new(0, 0, 1000); 80], &settings, START + 8);

        let mut window = vec![Sample::new(0, 0, 1000); 80];
        window[40] = Sample::new(amplitude, 0, 1000);
        match pipeline.process_batch(&window, &settings, START + 16) {
            WindowOutcome::Classified(report) => report.activity,
            other => panic!("expected classification, got {:?}", other),
        }
    };

    assert_eq!(classify_spike(600), ActivityType::Sit);
    assert_eq!(classify_spike(30_000), ActivityType::Walk);
}

#[test]
fn test_report_serializes_with_status_tag() {
    let mut pipeline = pipeline_with(PipelineConfig::sliding());
    let settings = TrackerSettings::default();
    let outcome = pipeline.process_batch(&[Sample::new(0, 0, 1000); 10], &settings, START + 1);
    let json = serde_json::to_value(&outcome).unwrap();

    assert_eq!(json["status"], "collecting");
    assert_eq!(json["filled"], 10);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = AppConfig {
        pipeline: PipelineConfig {
            drain_policy: DrainPolicy::HalfSlide,
            step_divisor: 0,
            ..PipelineConfig::sliding()
        },
        ..AppConfig::default()
    };
    assert!(RecognitionPipeline::new(&config, Counter::default()).is_err());
}
