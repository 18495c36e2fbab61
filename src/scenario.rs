//! Weather scenario assembly
//!
//! Builds one daily weather series per scenario identifier by selecting the
//! matching column from each sanitized interval table. The day axis and snow
//! depth come from the fixed low-reference series.

use tracing::debug;

use crate::tables::{IntervalTable, LowSeries, WeatherVariable};
use crate::{DailyWeather, ScenarioId, WeatherScenario};

/// Scenario assembly errors
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    /// A table's day axis does not line up with the low-reference series
    #[error("misaligned series for {variable}: expected {expected} days, found {found}")]
    MisalignedSeries {
        /// Offending variable
        variable: WeatherVariable,
        /// Day count of the low-reference series
        expected: usize,
        /// Day count of the table
        found: usize,
    },

    /// A requested discretization index exceeds a table's column count
    #[error("column {index} not found in {variable} table ({available} columns)")]
    ColumnNotFound {
        /// Offending variable
        variable: WeatherVariable,
        /// Requested discretization index
        index: usize,
        /// Columns actually present
        available: usize,
    },
}

/// Result type for assembly operations
pub type AssembleResult<T> = Result<T, AssembleError>;

/// Stateless assembler over the six sanitized interval tables plus the
/// low-reference series. Alignment is validated once at construction.
#[derive(Debug)]
pub struct ScenarioAssembler {
    tables: [IntervalTable; 6],
    low: LowSeries,
}

impl ScenarioAssembler {
    /// Create an assembler, verifying that every table shares the
    /// low-reference series' day count.
    ///
    /// `tables` must be ordered `(irrad, tmin, tmax, vap, wind, rain)`.
    pub fn new(tables: [IntervalTable; 6], low: LowSeries) -> AssembleResult<Self> {
        let expected = low.day_count();
        for table in &tables {
            if table.day_count() != expected {
                return Err(AssembleError::MisalignedSeries {
                    variable: table.variable(),
                    expected,
                    found: table.day_count(),
                });
            }
        }
        Ok(Self { tables, low })
    }

    /// Number of calendar days per assembled scenario.
    pub fn day_count(&self) -> usize {
        self.low.day_count()
    }

    fn column_for(&self, id: ScenarioId, variable: WeatherVariable) -> AssembleResult<&[f64]> {
        let table = &self.tables[variable as usize];
        let index = id.index_for(variable);
        table
            .column(index)
            .ok_or_else(|| AssembleError::ColumnNotFound {
                variable,
                index,
                available: table.column_count(),
            })
    }

    /// Assemble the daily weather series identified by `id`.
    ///
    /// Deterministic: the same identifier over the same tables always yields
    /// an identical scenario.
    pub fn assemble(&self, id: ScenarioId) -> AssembleResult<WeatherScenario> {
        let irrad = self.column_for(id, WeatherVariable::Irradiation)?;
        let tmin = self.column_for(id, WeatherVariable::TempMin)?;
        let tmax = self.column_for(id, WeatherVariable::TempMax)?;
        let vap = self.column_for(id, WeatherVariable::VaporPressure)?;
        let wind = self.column_for(id, WeatherVariable::Wind)?;
        let rain = self.column_for(id, WeatherVariable::Rain)?;

        let days = self
            .low
            .days
            .iter()
            .enumerate()
            .map(|(i, day)| DailyWeather {
                day: *day,
                irradiation: irrad[i],
                temp_min: tmin[i],
                temp_max: tmax[i],
                vapor_pressure: vap[i],
                wind: wind[i],
                rain: rain[i],
                snow_depth: self.low.snow_depth[i],
            })
            .collect();

        debug!(weather_uuid = %id, "Scenario assembled");
        Ok(WeatherScenario { id, days })
    }
}
