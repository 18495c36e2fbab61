//! Crop run orchestration
//!
//! For one fixed weather scenario, iterates crop catalog x year range, derives
//! the calendar entry per pair, invokes the simulation engine, and extracts
//! the final storage-organ weight as the scalar yield.

use std::ops::Range;
use tracing::{debug, warn};

use crate::calendar::{CalendarError, CropCalendar};
use crate::engine::{CropEndType, EngineError, SimulationEngine};
use crate::{SimulationResult, WeatherScenario};

/// Orchestration errors
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Calendar derivation failed
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// The engine failed in a non-recoverable way
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Runs the crop catalog x year range over fixed scenarios.
pub struct CropRunner<'a, E> {
    engine: &'a E,
    calendar: &'a CropCalendar,
    years: Range<i32>,
}

impl<'a, E: SimulationEngine> CropRunner<'a, E> {
    /// Create a runner over `calendar` and the half-open `years` range.
    pub fn new(engine: &'a E, calendar: &'a CropCalendar, years: Range<i32>) -> Self {
        Self {
            engine,
            calendar,
            years,
        }
    }

    /// Rows produced per fully convergent scenario.
    pub fn rows_per_scenario(&self) -> usize {
        self.calendar.len() * self.years.len()
    }

    /// Run every (crop, year) pair over `scenario`.
    ///
    /// A run that terminates with an empty output series did not converge:
    /// the row is skipped with a warning and the sweep continues. Any other
    /// engine failure aborts the shard.
    pub fn run(
        &self,
        scenario: &WeatherScenario,
    ) -> Result<Vec<SimulationResult>, OrchestratorError> {
        let weather_uuid = scenario.weather_uuid();
        let mut rows = Vec::with_capacity(self.rows_per_scenario());

        for crop in self.calendar.crop_names() {
            for year in self.years.clone() {
                let entry = self.calendar.entry_for(crop, year)?;
                let states = self.engine.run(scenario, &entry, CropEndType::Harvest)?;

                let Some(last) = states.last() else {
                    warn!(
                        crop,
                        year,
                        weather_uuid = %weather_uuid,
                        "Engine produced no output, skipping non-convergent run"
                    );
                    continue;
                };

                debug!(
                    crop,
                    year,
                    weather_uuid = %weather_uuid,
                    yield_value = last.storage_organ_weight,
                    "Simulation complete"
                );
                rows.push(SimulationResult {
                    crop: crop.to_string(),
                    year,
                    yield_value: last.storage_organ_weight,
                    weather_uuid: weather_uuid.clone(),
                });
            }
        }
        Ok(rows)
    }
}
