//! Simulation engine seam
//!
//! The crop-growth model is an external collaborator. The driver only knows
//! that it can submit a (weather scenario, calendar entry, end type) tuple and
//! receive back an ordered series of daily states, from which the last
//! storage-organ weight is read as the scalar yield.

pub mod process;
pub mod stage;

pub use process::ProcessEngine;
pub use stage::WeatherStage;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::CropCalendarEntry;
use crate::WeatherScenario;

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Weather staging failed
    #[error("staging error: {0}")]
    Staging(String),

    /// The engine process could not be spawned or waited on
    #[error("engine spawn error: {0}")]
    Spawn(String),

    /// The engine terminated unsuccessfully
    #[error("engine failed ({status}): {stderr}")]
    Engine {
        /// Exit status description
        status: String,
        /// Captured stderr tail
        stderr: String,
    },

    /// The engine's output could not be parsed
    #[error("engine output parse error: {0}")]
    Parse(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// How the engine should terminate the crop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropEndType {
    /// Terminate at the harvest date
    Harvest,
    /// Terminate at physiological maturity
    Maturity,
}

impl std::fmt::Display for CropEndType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropEndType::Harvest => f.write_str("harvest"),
            CropEndType::Maturity => f.write_str("maturity"),
        }
    }
}

/// One time step of engine output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyState {
    /// Simulation day
    pub day: NaiveDate,
    /// Total storage-organ weight (kg/ha); the last value is the yield
    pub storage_organ_weight: f64,
}

/// The crop-growth simulation engine.
///
/// Implementations are blocking and synchronous; a call either returns the
/// full daily state series or an engine error. An empty series signals a
/// non-convergent run and is handled by the orchestrator, not here.
pub trait SimulationEngine {
    /// Run one simulation over `scenario` for the given calendar entry.
    fn run(
        &self,
        scenario: &WeatherScenario,
        entry: &CropCalendarEntry,
        end_type: CropEndType,
    ) -> EngineResult<Vec<DailyState>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_type_display() {
        assert_eq!(CropEndType::Harvest.to_string(), "harvest");
        assert_eq!(CropEndType::Maturity.to_string(), "maturity");
    }
}
