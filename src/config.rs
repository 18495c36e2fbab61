//! Explicit immutable sweep configuration
//!
//! All knobs a shard run depends on live here and are passed into the driver
//! at construction. Nothing in the crate reads process-wide mutable defaults.

use std::ops::Range;
use std::path::PathBuf;

use crate::calendar::CropCalendar;
use crate::tables::SanitizeRules;

/// Default inner sweep resolution `n` (indices range over `0..=n`).
pub const DEFAULT_RESOLUTION: usize = 8;

/// Default year range of the reference sweep (2015 through 2019).
pub const DEFAULT_YEARS: Range<i32> = 2015..2020;

/// Persist the checkpoint whenever the accumulator's row count lands on a
/// multiple of this interval.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 1_000;

/// Configuration for one sweep shard.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Directory holding the per-variable interval CSVs
    pub interval_dir: PathBuf,
    /// Path of the low-reference series CSV
    pub low_series_path: PathBuf,
    /// Directory receiving checkpoint and cursor files
    pub output_dir: PathBuf,
    /// Inner sweep resolution `n`
    pub resolution: usize,
    /// Half-open year range swept per crop
    pub years: Range<i32>,
    /// Crop catalog and calendar templates
    pub calendar: CropCalendar,
    /// Clamp thresholds applied before assembly
    pub sanitize_rules: SanitizeRules,
    /// Row-count multiple triggering a periodic checkpoint save
    pub checkpoint_interval: usize,
}

impl SweepConfig {
    /// Create a configuration with reference defaults for everything but the
    /// three paths.
    pub fn new<P, Q, R>(interval_dir: P, low_series_path: Q, output_dir: R) -> Self
    where
        P: Into<PathBuf>,
        Q: Into<PathBuf>,
        R: Into<PathBuf>,
    {
        Self {
            interval_dir: interval_dir.into(),
            low_series_path: low_series_path.into(),
            output_dir: output_dir.into(),
            resolution: DEFAULT_RESOLUTION,
            years: DEFAULT_YEARS,
            calendar: CropCalendar::default(),
            sanitize_rules: SanitizeRules::default(),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }

    /// Set the inner sweep resolution.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the swept year range.
    pub fn with_years(mut self, years: Range<i32>) -> Self {
        self.years = years;
        self
    }

    /// Replace the crop catalog.
    pub fn with_calendar(mut self, calendar: CropCalendar) -> Self {
        self.calendar = calendar;
        self
    }

    /// Replace the sanitizer thresholds.
    pub fn with_sanitize_rules(mut self, rules: SanitizeRules) -> Self {
        self.sanitize_rules = rules;
        self
    }

    /// Set the periodic checkpoint interval.
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Checkpoint path for the `(x1, x2)` shard.
    pub fn checkpoint_path(&self, x1: usize, x2: usize) -> PathBuf {
        self.output_dir.join(format!("yields_{x1}_{x2}.csv"))
    }

    /// Inner tuples visited per shard: `(resolution + 1)^4`.
    pub fn inner_tuple_count(&self) -> u64 {
        let side = self.resolution as u64 + 1;
        side.pow(4)
    }

    /// Expected row count for a fully convergent shard, derived from the
    /// shard's actual parameters rather than a fixed constant.
    pub fn expected_total(&self) -> u64 {
        self.calendar.len() as u64 * self.years.len() as u64 * self.inner_tuple_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SweepConfig::new("a", "b", "c");
        assert_eq!(config.resolution, 8);
        assert_eq!(config.years, 2015..2020);
        assert_eq!(config.checkpoint_interval, 1000);
    }

    #[test]
    fn test_expected_total_derived_from_parameters() {
        let config = SweepConfig::new("a", "b", "c");
        // 3 crops x 5 years x 9^4 inner tuples
        assert_eq!(config.expected_total(), 3 * 5 * 6561);

        let config = config.with_resolution(0).with_years(2015..2016);
        assert_eq!(config.inner_tuple_count(), 1);
        assert_eq!(config.expected_total(), 3);
    }

    #[test]
    fn test_checkpoint_path() {
        let config = SweepConfig::new("a", "b", "/out");
        assert_eq!(
            config.checkpoint_path(3, 7),
            PathBuf::from("/out/yields_3_7.csv")
        );
    }
}
