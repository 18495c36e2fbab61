//! # Crop Sweep Library
//!
//! A batch scenario driver for large combinatorial sweeps of crop-growth
//! simulations over perturbed weather scenarios. Designed for yield-sensitivity
//! studies where a crop simulator is run once per weather scenario and the
//! scalar yields are aggregated into a durable, resumable result table.
//!
//! ## Features
//!
//! - **Combinatorial Enumeration**: stable lexicographic sweep over
//!   discretization-index tuples, sharded by the outer two indices
//! - **Scenario Assembly**: per-scenario daily weather series built by column
//!   selection from interval-quantile source tables
//! - **Defensive Sanitization**: out-of-range meteorological values clamped
//!   into the simulation engine's accepted physical ranges
//! - **Resume Capability**: periodic atomic checkpointing with a progress
//!   cursor, idempotent restart of completed shards
//! - **Engine Agnostic**: the crop-growth model sits behind a trait; a
//!   process-spawning adapter is provided for external simulator commands
//!
//! ## Quick Start
//!
//! ```no_run
//! use crop_sweep::config::SweepConfig;
//! use crop_sweep::driver::SweepDriver;
//! use crop_sweep::engine::ProcessEngine;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SweepConfig::new("./interval_data", "./prophet_low.csv", "./out")
//!     .with_resolution(8);
//! let engine = ProcessEngine::new("wofost-cli");
//!
//! let driver = SweepDriver::new(config, engine);
//! let results = driver.run_shard(0, 0)?;
//! println!("{} rows", results.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`tables`] - Interval table loading and value sanitization
//! - [`scenario`] - Weather scenario assembly from index tuples
//! - [`calendar`] - Crop catalog and sowing/harvest calendar templates
//! - [`engine`] - Simulation engine trait, weather staging, process adapter
//! - [`orchestrator`] - Crop x year runs over a fixed scenario
//! - [`results`] - Result accumulation and checkpoint persistence
//! - [`driver`] - Shard-level sweep driver with resume
//! - [`config`] - Explicit immutable sweep configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tables::WeatherVariable;

/// Crop catalog and calendar templates
pub mod calendar;

/// Sweep configuration
pub mod config;

/// Shard-level sweep driver
pub mod driver;

/// Simulation engine seam
pub mod engine;

/// Crop run orchestration
pub mod orchestrator;

/// Result accumulation and checkpointing
pub mod results;

/// Weather scenario assembly
pub mod scenario;

/// Interval table loading and sanitization
pub mod tables;

/// Identifier of one weather scenario: the 6-tuple of discretization indices
/// `(i_irrad, i_tmin, i_tmax, i_vap, i_wind, i_rain)`.
///
/// Rendered as the underscore-joined `weather_uuid` string (e.g. `"0_3_1_0_2_4"`)
/// that tags every simulation result and staged weather file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScenarioId {
    indices: [usize; 6],
}

impl ScenarioId {
    /// Create a scenario identifier from the six per-variable indices,
    /// ordered `(irrad, tmin, tmax, vap, wind, rain)`.
    pub fn new(indices: [usize; 6]) -> Self {
        Self { indices }
    }

    /// Build the identifier from the shard indices and one inner-sweep tuple.
    ///
    /// The outer shard fixes the irradiation and minimum-temperature columns;
    /// the inner tuple selects the remaining four.
    pub fn from_shard(x1: usize, x2: usize, inner: [usize; 4]) -> Self {
        Self {
            indices: [x1, x2, inner[0], inner[1], inner[2], inner[3]],
        }
    }

    /// The discretization index selecting the column for `variable`.
    pub fn index_for(&self, variable: WeatherVariable) -> usize {
        self.indices[variable as usize]
    }

    /// All six indices in variable order.
    pub fn indices(&self) -> [usize; 6] {
        self.indices
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.indices;
        write!(f, "{a}_{b}_{c}_{d}_{e}_{g}")
    }
}

impl FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        if parts.len() != 6 {
            return Err(format!("expected 6 underscore-joined indices, got: {s}"));
        }
        let mut indices = [0usize; 6];
        for (slot, part) in indices.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid scenario index '{part}' in: {s}"))?;
        }
        Ok(Self { indices })
    }
}

/// One day of assembled scenario weather.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    /// Calendar day
    #[serde(rename = "DAY")]
    pub day: NaiveDate,
    /// Daily global irradiation (J/m2)
    #[serde(rename = "IRRAD")]
    pub irradiation: f64,
    /// Daily minimum temperature (C)
    #[serde(rename = "TMIN")]
    pub temp_min: f64,
    /// Daily maximum temperature (C)
    #[serde(rename = "TMAX")]
    pub temp_max: f64,
    /// Mean daily vapor pressure (hPa)
    #[serde(rename = "VAP")]
    pub vapor_pressure: f64,
    /// Mean daily wind speed (m/s)
    #[serde(rename = "WIND")]
    pub wind: f64,
    /// Daily precipitation (mm)
    #[serde(rename = "RAIN")]
    pub rain: f64,
    /// Snow depth (cm)
    #[serde(rename = "SNOWDEPTH")]
    pub snow_depth: f64,
}

/// A fully assembled daily weather series for one scenario.
///
/// Ephemeral: built from the sanitized interval tables, consumed by one
/// orchestration pass, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherScenario {
    /// The scenario's identifying index tuple
    pub id: ScenarioId,
    /// One record per calendar day of the fixed horizon
    pub days: Vec<DailyWeather>,
}

impl WeatherScenario {
    /// The underscore-joined scenario identifier string.
    pub fn weather_uuid(&self) -> String {
        self.id.to_string()
    }
}

/// The scalar yield extracted from one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Crop name
    pub crop: String,
    /// Target year
    pub year: i32,
    /// Total storage-organ weight at the final time step (kg/ha)
    pub yield_value: f64,
    /// Underscore-joined scenario identifier
    pub weather_uuid: String,
}

impl SimulationResult {
    /// The accumulator's unique key for this row.
    pub fn key(&self) -> (String, i32, String) {
        (self.crop.clone(), self.year, self.weather_uuid.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_id_display() {
        let id = ScenarioId::new([0, 3, 1, 0, 2, 4]);
        assert_eq!(id.to_string(), "0_3_1_0_2_4");
    }

    #[test]
    fn test_scenario_id_from_shard() {
        let id = ScenarioId::from_shard(7, 2, [0, 1, 2, 3]);
        assert_eq!(id.to_string(), "7_2_0_1_2_3");
    }

    #[test]
    fn test_scenario_id_round_trip() {
        let id = ScenarioId::new([8, 8, 0, 5, 1, 7]);
        let parsed = ScenarioId::from_str(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_scenario_id_from_str_invalid() {
        assert!(ScenarioId::from_str("1_2_3").is_err());
        assert!(ScenarioId::from_str("a_b_c_d_e_f").is_err());
        assert!(ScenarioId::from_str("").is_err());
    }

    #[test]
    fn test_scenario_id_index_for() {
        let id = ScenarioId::new([10, 20, 30, 40, 50, 60]);
        assert_eq!(id.index_for(WeatherVariable::Irradiation), 10);
        assert_eq!(id.index_for(WeatherVariable::TempMin), 20);
        assert_eq!(id.index_for(WeatherVariable::TempMax), 30);
        assert_eq!(id.index_for(WeatherVariable::VaporPressure), 40);
        assert_eq!(id.index_for(WeatherVariable::Wind), 50);
        assert_eq!(id.index_for(WeatherVariable::Rain), 60);
    }
}
