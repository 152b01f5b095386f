use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::BenchError;

/// Records carry an `INT` user id, so a write run cannot go past this.
pub const MAX_WRITE_COUNT: usize = i32::MAX as usize;

/// Workload shape and pacing of a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    /// Records generated for every write test.
    #[serde(default = "BenchConfig::default_write_count")]
    pub write_count: usize,
    /// Upper bound on ids examined by read and update tests.
    #[serde(default = "BenchConfig::default_sample_cap")]
    pub sample_cap: usize,
    /// Inserts in flight at once during a write test.
    #[serde(default = "BenchConfig::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "BenchConfig::default_repeat_count")]
    pub repeat_count: usize,
    #[serde(with = "humantime_serde", default = "BenchConfig::default_cell_pause")]
    pub cell_pause: Duration,
    #[serde(
        with = "humantime_serde",
        default = "BenchConfig::default_iteration_pause"
    )]
    pub iteration_pause: Duration,
}

impl BenchConfig {
    fn default_write_count() -> usize {
        10_000
    }

    fn default_sample_cap() -> usize {
        1_000
    }

    fn default_chunk_size() -> usize {
        100
    }

    fn default_repeat_count() -> usize {
        10
    }

    fn default_cell_pause() -> Duration {
        Duration::from_secs(1)
    }

    fn default_iteration_pause() -> Duration {
        Duration::from_millis(500)
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        if self.write_count > MAX_WRITE_COUNT {
            return Err(BenchError::ConfigParsingError(format!(
                "bench.write_count {} exceeds {}",
                self.write_count, MAX_WRITE_COUNT
            )));
        }
        Ok(())
    }

    /// Ids handed to read and update tests.
    pub fn candidate_count(&self) -> usize {
        self.write_count.min(self.sample_cap)
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            write_count: Self::default_write_count(),
            sample_cap: Self::default_sample_cap(),
            chunk_size: Self::default_chunk_size(),
            repeat_count: Self::default_repeat_count(),
            cell_pause: Self::default_cell_pause(),
            iteration_pause: Self::default_iteration_pause(),
        }
    }
}
