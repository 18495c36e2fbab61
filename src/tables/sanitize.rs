//! Scenario sanitizer: clamp interval-table values into engine-accepted ranges
//!
//! The simulation engine rejects meteorological values outside its physical
//! bounds and aborts the run. Clamping keeps a sweep alive instead of failing
//! a whole shard on a single out-of-range sample; it trades a small amount of
//! accuracy for robustness and does not correct the source data.

use tracing::debug;

use super::{IntervalTable, WeatherVariable};

/// One-sided clamp: values past `bound` become `replacement`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampRule {
    /// Exclusive bound triggering the clamp
    pub bound: f64,
    /// Value substituted for out-of-range samples
    pub replacement: f64,
}

/// Per-variable clamp thresholds, passed in as explicit configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanitizeRules {
    /// Lower clamp for irradiation (`< bound` -> replacement)
    pub irrad_lower: ClampRule,
    /// Upper clamp for irradiation (`> bound` -> replacement)
    pub irrad_upper: ClampRule,
    /// Lower clamp for vapor pressure
    pub vap_lower: ClampRule,
    /// Upper clamp for vapor pressure
    pub vap_upper: ClampRule,
    /// Lower clamp for wind
    pub wind_lower: ClampRule,
}

impl Default for SanitizeRules {
    /// The engine's accepted physical ranges.
    fn default() -> Self {
        Self {
            irrad_lower: ClampRule {
                bound: 0.0,
                replacement: 0.0,
            },
            irrad_upper: ClampRule {
                bound: 4.0e7,
                replacement: 4.0e7 - 1.0,
            },
            vap_lower: ClampRule {
                bound: 0.06,
                replacement: 0.07,
            },
            vap_upper: ClampRule {
                bound: 199.3,
                replacement: 199.3 - 1.0,
            },
            wind_lower: ClampRule {
                bound: 0.0,
                replacement: 0.07,
            },
        }
    }
}

impl SanitizeRules {
    /// Clamp one value of `variable` into range. Pure and total.
    pub fn clamp(&self, variable: WeatherVariable, value: f64) -> f64 {
        match variable {
            WeatherVariable::Irradiation => {
                if value < self.irrad_lower.bound {
                    self.irrad_lower.replacement
                } else if value > self.irrad_upper.bound {
                    self.irrad_upper.replacement
                } else {
                    value
                }
            }
            WeatherVariable::VaporPressure => {
                if value < self.vap_lower.bound {
                    self.vap_lower.replacement
                } else if value > self.vap_upper.bound {
                    self.vap_upper.replacement
                } else {
                    value
                }
            }
            WeatherVariable::Wind => {
                if value < self.wind_lower.bound {
                    self.wind_lower.replacement
                } else {
                    value
                }
            }
            // Temperature and rain carry no clamps
            WeatherVariable::TempMin | WeatherVariable::TempMax | WeatherVariable::Rain => value,
        }
    }

    /// Clamp every value of every column of `table`. Never fails.
    pub fn sanitize(&self, table: &IntervalTable) -> IntervalTable {
        let variable = table.variable();
        debug!(variable = %variable, columns = table.column_count(), "Sanitizing interval table");
        table.map_values(|v| self.clamp(variable, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> SanitizeRules {
        SanitizeRules::default()
    }

    #[test]
    fn test_irrad_clamps() {
        let r = rules();
        assert_eq!(r.clamp(WeatherVariable::Irradiation, -5.0), 0.0);
        assert_eq!(r.clamp(WeatherVariable::Irradiation, 5.0e7), 39_999_999.0);
        assert_eq!(r.clamp(WeatherVariable::Irradiation, 1.0e6), 1.0e6);
        assert_eq!(r.clamp(WeatherVariable::Irradiation, 0.0), 0.0);
    }

    #[test]
    fn test_vap_clamps() {
        let r = rules();
        assert_eq!(r.clamp(WeatherVariable::VaporPressure, 0.05), 0.07);
        assert_eq!(r.clamp(WeatherVariable::VaporPressure, 250.0), 198.3);
        assert_eq!(r.clamp(WeatherVariable::VaporPressure, 10.0), 10.0);
        // 0.06 itself is not below the bound
        assert_eq!(r.clamp(WeatherVariable::VaporPressure, 0.06), 0.06);
    }

    #[test]
    fn test_wind_lower_clamp_only() {
        let r = rules();
        assert_eq!(r.clamp(WeatherVariable::Wind, -1.0), 0.07);
        assert_eq!(r.clamp(WeatherVariable::Wind, 0.0), 0.0);
        assert_eq!(r.clamp(WeatherVariable::Wind, 9000.0), 9000.0);
    }

    #[test]
    fn test_temperature_and_rain_untouched() {
        let r = rules();
        for v in [-273.0, -5.0, 0.0, 45.0, 1.0e9] {
            assert_eq!(r.clamp(WeatherVariable::TempMin, v), v);
            assert_eq!(r.clamp(WeatherVariable::TempMax, v), v);
            assert_eq!(r.clamp(WeatherVariable::Rain, v), v);
        }
    }

    #[test]
    fn test_sanitize_table_elementwise() {
        let table = IntervalTable::new(
            WeatherVariable::Irradiation,
            vec![vec![-5.0, 1.0e6], vec![5.0e7, 2.0e6]],
        );
        let out = rules().sanitize(&table);
        assert_eq!(out.column(0).unwrap(), &[0.0, 1.0e6]);
        assert_eq!(out.column(1).unwrap(), &[39_999_999.0, 2.0e6]);
    }

    #[test]
    fn test_sanitize_idempotent() {
        let table = IntervalTable::new(
            WeatherVariable::VaporPressure,
            vec![vec![0.01, 300.0, 42.0, -7.0]],
        );
        let r = rules();
        let once = r.sanitize(&table);
        let twice = r.sanitize(&once);
        assert_eq!(once, twice);
    }
}
