// LowPassFilter - adaptive gravity estimator
//
// Blends each raw sample into a running gravity estimate. When the sample's
// magnitude matches the estimate the blend is damped by the noise
// attenuation factor; when the magnitude jumps past the noise floor the
// filter adapts at the full filter constant.
//
// The estimate is held in 16-bit integers and every update truncates toward
// zero, so a constant input settles one count short when approached from
// below. Magnitudes use a bit-exact integer square root.

use crate::config::FilterConfig;
use crate::sensor::Sample;

/// Integer square root by the binary digit-by-digit method
///
/// Returns `floor(sqrt(n))` for every `u32`. No floating point is involved,
/// so results are identical on every target.
pub fn isqrt(n: u32) -> u32 {
    let mut rem = n;
    let mut root: u32 = 0;
    for shift in (0..16).rev() {
        let trial = root + (1 << shift);
        if rem >= trial << shift {
            rem -= trial << shift;
            root |= 2 << shift;
        }
    }
    root >> 1
}

/// Integer magnitude of a 16-bit vector
pub fn norm(x: i16, y: i16, z: i16) -> u32 {
    let square = |v: i16| (v as i32 * v as i32) as u32;
    isqrt(square(x) + square(y) + square(z))
}

#[derive(Debug, Clone)]
pub struct LowPassFilter {
    x: i16,
    y: i16,
    z: i16,
    filter_constant: f64,
    min_step: f64,
    noise_attenuation: f64,
}

impl LowPassFilter {
    /// Filter with a zeroed gravity estimate
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            filter_constant: config.filter_constant(),
            min_step: config.min_step,
            noise_attenuation: config.noise_attenuation,
        }
    }

    /// Current gravity estimate
    pub fn gravity(&self) -> Sample {
        Sample::new(self.x, self.y, self.z)
    }

    /// Blend factor for a sample of the given magnitude
    fn blend_factor(&self, sample_norm: u32) -> f64 {
        let estimate_norm = norm(self.x, self.y, self.z);
        let diff = (estimate_norm as i64 - sample_norm as i64).abs() as f64;
        let delta = (diff / self.min_step - 1.0).clamp(0.0, 1.0);

        (1.0 - delta) * self.filter_constant / self.noise_attenuation
            + delta * self.filter_constant
    }

    /// Fold one raw sample into the gravity estimate
    pub fn update(&mut self, sample: Sample) {
        let alpha = self.blend_factor(norm(sample.x, sample.y, sample.z));
        let blend = |raw: i16, est: i16| (raw as f64 * alpha + est as f64 * (1.0 - alpha)) as i16;

        self.x = blend(sample.x, self.x);
        self.y = blend(sample.y, self.y);
        self.z = blend(sample.z, self.z);
    }
}
