use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use activity_recognizer::clock::{ManualClock, SystemClock, TimeSource};
use activity_recognizer::sensor::synthetic::{MotionPattern, SyntheticMotion};
use activity_recognizer::sensor::BatchPool;
use activity_recognizer::storage::{
    load_counter, load_settings, read_data_log, FileDataLog, JsonFileStore, KeyValueStore,
    StoredValue,
};
use activity_recognizer::sync::{
    sync_link, DisplayPreferences, DisplaySnapshot, DisplayState, SamplerService,
};
use activity_recognizer::{AppConfig, Counter, RecognitionPipeline, Sample, TrackerSettings};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

/// Speed threshold used when simulating a drive, in cm/s
const SIMULATED_DRIVING_THRESHOLD: u16 = 1044;

/// One batch in flight keeps the simulated clock in lockstep with the sampler
const SIMULATED_BATCH_COUNT: usize = 1;

#[derive(Parser, Debug)]
#[command(
    name = "tracker_cli",
    about = "Offline harness for the accelerometer activity recognizer"
)]
struct Cli {
    /// JSON configuration document (defaults apply when absent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay recorded samples and print one JSON line per batch outcome
    Classify {
        /// JSON array of {"x", "y", "z"} samples in milli-g
        #[arg(long)]
        input: PathBuf,
        /// Unix time of the first sample
        #[arg(long, default_value_t = 0)]
        start: u32,
    },
    /// Run the sampling and display loops over a synthetic motion pattern
    Simulate {
        /// rest, sleep, sit, walk or jog
        #[arg(long)]
        activity: MotionPattern,
        #[arg(long, default_value_t = 10)]
        minutes: u32,
        /// Report a vehicle speed above the driving threshold
        #[arg(long)]
        driving: bool,
        /// Pedometer sensitivity pushed from the display, 0-100
        #[arg(long)]
        sensitivity: Option<u16>,
        /// Add seeded random jitter to the waveform
        #[arg(long)]
        jitter: bool,
        /// Unix time the simulation starts at (defaults to now)
        #[arg(long)]
        start: Option<u32>,
    },
    /// Print a persisted key-value document
    DumpStore {
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Print every record of a binary data log as a JSON line
    DecodeLog {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    activity_recognizer::init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };
    config.validate().context("validating configuration")?;

    match cli.command {
        Commands::Classify { input, start } => run_classify(&config, &input, start),
        Commands::Simulate {
            activity,
            minutes,
            driving,
            sensitivity,
            jitter,
            start,
        } => {
            let options = SimulationOptions {
                pattern: activity,
                minutes,
                driving,
                sensitivity,
                jitter,
                start: start.unwrap_or_else(|| SystemClock::default().now()),
            };
            run_simulate(&config, options)
        }
        Commands::DumpStore { store } => {
            let path = store.unwrap_or_else(|| config.storage.state_path.clone());
            run_dump_store(&path)
        }
        Commands::DecodeLog { file } => {
            let path = file.unwrap_or_else(|| config.storage.data_log_path.clone());
            run_decode_log(&path)
        }
    }
}

fn run_classify(config: &AppConfig, input: &Path, start: u32) -> Result<ExitCode> {
    let json = fs::read_to_string(input)
        .with_context(|| format!("reading samples from {}", input.display()))?;
    let samples: Vec<Sample> = serde_json::from_str(&json)
        .with_context(|| format!("parsing samples in {}", input.display()))?;

    let mut pipeline = RecognitionPipeline::new(config, Counter::starting_at(start))
        .context("building recognition pipeline")?;
    let settings = TrackerSettings::default();
    let batch_size = config.sampling.batch_size;
    let batch_secs = (batch_size as u32 / config.sampling.rate_hz.max(1)).max(1);

    for (index, batch) in samples.chunks(batch_size).enumerate() {
        let now = start.saturating_add(batch_secs * (index as u32 + 1));
        let outcome = pipeline.process_batch(batch, &settings, now);
        println!("{}", serde_json::to_string(&outcome)?);
    }

    eprintln!("Final counter: {:?}", pipeline.counter());
    Ok(ExitCode::from(0))
}

struct SimulationOptions {
    pattern: MotionPattern,
    minutes: u32,
    driving: bool,
    sensitivity: Option<u16>,
    jitter: bool,
    start: u32,
}

#[derive(Serialize)]
struct SimulationSummary {
    pattern: String,
    display: DisplaySnapshot,
    counter: Counter,
    dropped_batches: u64,
}

fn run_simulate(config: &AppConfig, options: SimulationOptions) -> Result<ExitCode> {
    let clock = Arc::new(ManualClock::new(options.start));
    let store = JsonFileStore::open_or_empty(&config.storage.state_path);
    let preferences = DisplayPreferences::load(&store).unwrap_or_default();
    let data_log = FileDataLog::open(&config.storage.data_log_path)
        .context("opening data log")?;

    let (sampler_link, display_link) = sync_link();
    let service = SamplerService::start(
        config,
        store,
        data_log,
        sampler_link,
        Arc::clone(&clock) as Arc<dyn TimeSource>,
    )
    .context("starting sampler")?;
    // The display loop runs on this thread for the rest of the simulation
    let display_span = tracing::info_span!("display");
    let _display_guard = display_span.enter();
    let mut display = DisplayState::launch(
        display_link,
        preferences,
        *service.settings(),
        options.start,
    );

    if let Some(sensitivity) = options.sensitivity {
        display
            .set_sensitivity(sensitivity)
            .context("applying --sensitivity")?;
    }
    if options.driving {
        display.set_speed_threshold(SIMULATED_DRIVING_THRESHOLD, options.start);
    }

    let batch_size = config.sampling.batch_size;
    let (mut sensor, sampler_channels) =
        BatchPool::new(SIMULATED_BATCH_COUNT, batch_size).split();
    let handle = service.run(sampler_channels, Arc::new(AtomicBool::new(true)));

    let mut motion = SyntheticMotion::new(options.pattern, config.sampling.rate_hz);
    if options.jitter {
        motion = motion.with_jitter(u64::from(options.start), 25);
    }
    let batch_secs = (batch_size as u32 / config.sampling.rate_hz.max(1)).max(1);
    let batches = options.minutes.saturating_mul(60) / batch_secs;

    for _ in 0..batches {
        // Wait for the previous batch to be processed instead of dropping data
        while !sensor.has_free_batch() {
            thread::sleep(Duration::from_millis(1));
        }
        let now = clock.advance(batch_secs);
        if display.tick(now) {
            let speed = if options.driving { 2_000 } else { 0 };
            display.report_speed(speed, now);
        }
        sensor.submit(&motion.next_batch(batch_size));
        display.poll();
    }

    let counter = handle
        .stop()
        .map_err(|_| anyhow!("sampler thread panicked"))?
        .context("persisting sampler state")?;
    display.poll();

    let mut store = JsonFileStore::open(&config.storage.state_path)
        .context("reopening state for display preferences")?;
    display
        .preferences()
        .save(&mut store)
        .context("saving display preferences")?;
    store.flush().context("flushing display preferences")?;

    let summary = SimulationSummary {
        pattern: options.pattern.to_string(),
        display: display.snapshot(),
        counter,
        dropped_batches: sensor.dropped_batches(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct StoreDump {
    entries: BTreeMap<u32, StoredValue>,
    counter: Counter,
    settings: TrackerSettings,
    display: DisplayPreferences,
}

fn run_dump_store(path: &Path) -> Result<ExitCode> {
    if !path.exists() {
        println!("No state stored at {}", path.display());
        return Ok(ExitCode::from(0));
    }
    let store = JsonFileStore::open(path)
        .with_context(|| format!("opening store {}", path.display()))?;

    let dump = StoreDump {
        entries: store.entries().clone(),
        counter: load_counter(&store, 0).context("decoding counter")?,
        settings: load_settings(&store).context("decoding settings")?,
        display: DisplayPreferences::load(&store).context("decoding display preferences")?,
    };
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(ExitCode::from(0))
}

fn run_decode_log(path: &Path) -> Result<ExitCode> {
    let records = read_data_log(path)
        .with_context(|| format!("reading data log {}", path.display()))?;
    if records.is_empty() {
        eprintln!("No records in {}", path.display());
    }
    for record in records {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(ExitCode::from(0))
}
