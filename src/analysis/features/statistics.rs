// Running moments over one window

use super::types::Feature;

/// Sums and vertical extremes accumulated sample by sample
#[derive(Debug, Clone)]
pub(crate) struct RunningMoments {
    sum_v: f64,
    sum_h: f64,
    sum_sq_v: f64,
    sum_sq_h: f64,
    pub(crate) min_v: i16,
    pub(crate) max_v: i16,
}

impl RunningMoments {
    pub(crate) fn new() -> Self {
        Self {
            sum_v: 0.0,
            sum_h: 0.0,
            sum_sq_v: 0.0,
            sum_sq_h: 0.0,
            // Symmetric sentinels, one short of i16::MIN on the low side
            min_v: 32_767,
            max_v: -32_767,
        }
    }

    pub(crate) fn push(&mut self, v: f64, h: f64, v_truncated: i16) {
        self.sum_v += v;
        self.sum_h += h;
        self.sum_sq_v += v * v;
        self.sum_sq_h += h * h;
        self.max_v = self.max_v.max(v_truncated);
        self.min_v = self.min_v.min(v_truncated);
    }

    /// Means and deviations over `n` samples, dividing by `n - 1`
    pub(crate) fn finish(&self, n: usize) -> Feature {
        let denom = n.saturating_sub(1).max(1) as f64;
        let mean_v = self.sum_v / denom;
        let mean_h = self.sum_h / denom;
        Feature {
            mean_v,
            mean_h,
            deviation_v: self.sum_sq_v / denom - mean_v * mean_v,
            deviation_h: self.sum_sq_h / denom - mean_h * mean_h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divides_by_n_minus_one() {
        let mut moments = RunningMoments::new();
        for v in [2.0, 4.0, 6.0] {
            moments.push(v, 1.0, v as i16);
        }
        let feature = moments.finish(3);
        assert_eq!(feature.mean_v, 6.0);
        assert_eq!(feature.deviation_v, 28.0 - 36.0);
        assert_eq!(feature.mean_h, 1.5);
        assert_eq!(moments.min_v, 2);
        assert_eq!(moments.max_v, 6);
    }

    #[test]
    fn test_empty_extremes_keep_sentinels() {
        let moments = RunningMoments::new();
        assert_eq!(moments.min_v, 32_767);
        assert_eq!(moments.max_v, -32_767);
    }
}
