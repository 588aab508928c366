// Synthetic accelerometer source
//
// Deterministic waveforms for the four activity classes, used by the CLI
// simulator and by tests. Gravity sits on the z axis at 1000 milli-g.
// Walking and jogging add a vertical bounce at stride frequency plus a
// slower lateral sway; sitting is a small bounded fidget pattern.
// Optional seeded jitter perturbs every axis.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::Sample;

/// 1 g in sensor units
pub const GRAVITY_MILLI_G: i16 = 1000;

/// Motion pattern to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPattern {
    /// Perfectly still, gravity only
    Rest,
    /// Small fidgeting around gravity
    Sit,
    /// 1.8 Hz vertical bounce, moderate sway
    Walk,
    /// 2.6 Hz vertical bounce, strong sway
    Jog,
}

impl FromStr for MotionPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rest" | "sleep" => Ok(MotionPattern::Rest),
            "sit" => Ok(MotionPattern::Sit),
            "walk" => Ok(MotionPattern::Walk),
            "jog" => Ok(MotionPattern::Jog),
            other => Err(format!("unknown motion pattern '{}'", other)),
        }
    }
}

impl fmt::Display for MotionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MotionPattern::Rest => "rest",
            MotionPattern::Sit => "sit",
            MotionPattern::Walk => "walk",
            MotionPattern::Jog => "jog",
        };
        f.write_str(name)
    }
}

/// Infinite sample stream for one motion pattern
pub struct SyntheticMotion {
    pattern: MotionPattern,
    rate_hz: f64,
    index: u64,
    jitter: Option<(StdRng, i16)>,
}

impl SyntheticMotion {
    /// # Arguments
    /// * `pattern` - Motion to synthesize
    /// * `rate_hz` - Sampling rate the waveform is evaluated at
    pub fn new(pattern: MotionPattern, rate_hz: u32) -> Self {
        Self {
            pattern,
            rate_hz: rate_hz.max(1) as f64,
            index: 0,
            jitter: None,
        }
    }

    /// Add uniform jitter in `-amplitude..=amplitude` to every axis
    pub fn with_jitter(mut self, seed: u64, amplitude: i16) -> Self {
        if amplitude > 0 {
            self.jitter = Some((StdRng::seed_from_u64(seed), amplitude));
        }
        self
    }

    pub fn next_sample(&mut self) -> Sample {
        let k = self.index;
        self.index += 1;
        let mut sample = waveform(self.pattern, k, k as f64 / self.rate_hz);

        if let Some((rng, amplitude)) = self.jitter.as_mut() {
            let a = *amplitude;
            sample.x = sample.x.saturating_add(rng.gen_range(-a..=a));
            sample.y = sample.y.saturating_add(rng.gen_range(-a..=a));
            sample.z = sample.z.saturating_add(rng.gen_range(-a..=a));
        }
        sample
    }

    /// Next `len` samples as one batch
    pub fn next_batch(&mut self, len: usize) -> Vec<Sample> {
        (0..len).map(|_| self.next_sample()).collect()
    }
}

fn waveform(pattern: MotionPattern, k: u64, t: f64) -> Sample {
    match pattern {
        MotionPattern::Rest => Sample::new(0, 0, GRAVITY_MILLI_G),
        MotionPattern::Sit => {
            let fidget = |mul: u64, span: u64| ((k * mul) % (2 * span + 1)) as i16 - span as i16;
            Sample::new(fidget(37, 40), fidget(53, 40), GRAVITY_MILLI_G + fidget(17, 10))
        }
        MotionPattern::Walk => stride(t, 1.8, 220.0, 120.0, 300.0),
        MotionPattern::Jog => stride(t, 2.6, 700.0, 400.0, 900.0),
    }
}

fn stride(t: f64, freq_hz: f64, sway: f64, surge: f64, bounce: f64) -> Sample {
    let phase = 2.0 * PI * freq_hz * t;
    Sample::new(
        (sway * (phase / 2.0).sin()) as i16,
        (surge * phase.cos()) as i16,
        (GRAVITY_MILLI_G as f64 + bounce * phase.sin()) as i16,
    )
}
