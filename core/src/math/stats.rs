pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: &[i16]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|&v| f64::from(v) * f64::from(v)).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Largest absolute sample value, widened so `i16::MIN` does not overflow.
    pub fn peak(samples: &[i16]) -> u16 {
        samples.iter().map(|v| v.unsigned_abs()).max().unwrap_or(0)
    }

    /// Samples sitting on either rail of the 16-bit range.
    pub fn clipped(samples: &[i16]) -> usize {
        samples
            .iter()
            .filter(|&&v| v == i16::MAX || v == i16::MIN)
            .count()
    }
}
