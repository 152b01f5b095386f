//! Min/avg/max over repeated-run timings.

/// Derived statistics of one timing series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// Aggregates per-iteration milliseconds, skipping zero entries (failed
/// iterations). All statistics are 0 when no iteration succeeded.
pub fn aggregate(times: &[f64]) -> TimingStats {
    let succeeded: Vec<f64> = times.iter().copied().filter(|t| *t > 0.0).collect();
    if succeeded.is_empty() {
        return TimingStats::default();
    }

    let sum: f64 = succeeded.iter().sum();
    let min = succeeded.iter().copied().fold(f64::INFINITY, f64::min);
    let max = succeeded.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Rounding in the sum can push the mean just outside the observed range.
    TimingStats {
        average: (sum / succeeded.len() as f64).clamp(min, max),
        min,
        max,
    }
}
