// Projection - split linear acceleration along the gravity estimate

use crate::analysis::filter::{isqrt, norm};
use crate::sensor::Sample;

/// Vertical (signed, unrounded) and horizontal components of one sample
///
/// `gravity` is the filter estimate after this sample was folded in. A zero
/// gravity estimate has no direction, so everything counts as horizontal.
pub(crate) fn split(sample: Sample, gravity: Sample) -> (f64, u32) {
    let lx = (sample.x as i32 - gravity.x as i32) as f64;
    let ly = (sample.y as i32 - gravity.y as i32) as f64;
    let lz = (sample.z as i32 - gravity.z as i32) as f64;

    let gravity_norm = norm(gravity.x, gravity.y, gravity.z);
    let vertical = if gravity_norm == 0 {
        0.0
    } else {
        (lx * gravity.x as f64 + ly * gravity.y as f64 + lz * gravity.z as f64)
            / gravity_norm as f64
    };

    // Quantization can push the difference slightly negative; the cast
    // saturates it to zero.
    let horizontal_sq = lx * lx + ly * ly + lz * lz - vertical * vertical;
    (vertical, isqrt(horizontal_sq as u32))
}
